use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin tag carried by every update record.
///
/// The engine emits four known tags. Anything else arriving on the wire
/// deserialises to [`Source::Unknown`], which the dispatcher drops without
/// rendering — the one defined failure-absorption policy in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Source {
    /// Story text appended to the content stream.
    Main,
    /// Left header slot (room name in the original engine).
    Left,
    /// Right header slot (score and move count).
    Right,
    /// Focus restoration for the input line; carries no renderable content.
    Input,
    Unknown,
}

impl From<String> for Source {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "main" => Source::Main,
            "left" => Source::Left,
            "right" => Source::Right,
            "input" => Source::Input,
            _ => Source::Unknown,
        }
    }
}

impl Source {
    /// Stable lowercase wire tag, mirroring the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Main => "main",
            Source::Left => "left",
            Source::Right => "right",
            Source::Input => "input",
            Source::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record delivered by the engine bus.
///
/// Immutable once constructed and consumed synchronously by the dispatcher;
/// nothing retains a reference after handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub source: Source,
    pub content: String,
}

impl Update {
    pub fn new(source: Source, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
        }
    }

    pub fn main(content: impl Into<String>) -> Self {
        Self::new(Source::Main, content)
    }

    pub fn left(content: impl Into<String>) -> Self {
        Self::new(Source::Left, content)
    }

    pub fn right(content: impl Into<String>) -> Self {
        Self::new(Source::Right, content)
    }

    pub fn input() -> Self {
        Self::new(Source::Input, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        let update = Update::left("West of House");
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"source":"left","content":"West of House"}"#);
        let back: Update = serde_json::from_str(&json).unwrap();
        assert_eq!(back, update);
    }

    #[test]
    fn unrecognised_tag_becomes_unknown() {
        let update: Update =
            serde_json::from_str(r#"{"source":"debug","content":"trace"}"#).unwrap();
        assert_eq!(update.source, Source::Unknown);
        assert_eq!(update.content, "trace");
    }

    #[test]
    fn display_matches_wire_tag() {
        assert_eq!(Source::Main.to_string(), "main");
        assert_eq!(Source::Unknown.to_string(), "unknown");
    }
}
