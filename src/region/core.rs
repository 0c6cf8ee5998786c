use std::collections::HashSet;

use blake3::Hash;

use crate::geometry::Rect;
use crate::layout::ScreenPlan;

/// Addressable display surfaces. The set is closed: one content stream and
/// two header slots, created at startup and alive for the session lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Content,
    HeaderLeft,
    HeaderRight,
}

impl Region {
    /// Paint order. Content first so the header overlay lands on top.
    pub const ALL: [Region; 3] = [Region::Content, Region::HeaderLeft, Region::HeaderRight];
}

/// Header slot selector used by the dispatcher and the engine contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Left,
    Right,
}

impl Slot {
    fn region(self) -> Region {
        match self {
            Slot::Left => Region::HeaderLeft,
            Slot::Right => Region::HeaderRight,
        }
    }
}

/// One entry in the content stream. `Break` renders as a line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Break,
}

#[derive(Debug, Default)]
struct SlotState {
    rect: Rect,
    value: String,
    hash: Option<Hash>,
}

impl SlotState {
    /// Last write wins; rewriting the identical value stays quiet.
    fn replace(&mut self, value: &str) -> bool {
        let new_hash = blake3::hash(value.as_bytes());
        if self.hash.map(|h| h != new_hash).unwrap_or(true) {
            self.value = value.to_string();
            self.hash = Some(new_hash);
            return true;
        }
        false
    }
}

/// Snapshot handed to the renderer for one dirty region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub region: Region,
    pub rect: Rect,
    pub text: String,
}

/// State of the three render surfaces.
///
/// The content stream only ever grows, so any append dirties it. The header
/// slots hash their value instead — a rewrite of the same text does not
/// trigger a repaint.
#[derive(Debug, Default)]
pub struct RegionSet {
    content_rect: Rect,
    nodes: Vec<Node>,
    left: SlotState,
    right: SlotState,
    dirty: HashSet<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt freshly solved rects, dirtying every region whose rect moved.
    pub fn sync_layout(&mut self, plan: &ScreenPlan) {
        if self.content_rect != plan.content {
            self.content_rect = plan.content;
            self.dirty.insert(Region::Content);
        }
        if self.left.rect != plan.header_left {
            self.left.rect = plan.header_left;
            self.dirty.insert(Region::HeaderLeft);
        }
        if self.right.rect != plan.header_right {
            self.right.rect = plan.header_right;
            self.dirty.insert(Region::HeaderRight);
        }
    }

    /// Append a text node to the content stream. Empty text is legal and
    /// renders as nothing.
    pub fn append_text(&mut self, text: &str) {
        self.nodes.push(Node::Text(text.to_string()));
        self.dirty.insert(Region::Content);
    }

    /// Append one line-break node to the content stream.
    pub fn append_break(&mut self) {
        self.nodes.push(Node::Break);
        self.dirty.insert(Region::Content);
    }

    /// Append a main-stream update. Only the first newline becomes a break
    /// node; the remainder of the text is kept verbatim, embedded newlines
    /// and all.
    pub fn append_markup(&mut self, content: &str) {
        match content.split_once('\n') {
            Some((head, tail)) => {
                self.nodes.push(Node::Text(head.to_string()));
                self.nodes.push(Node::Break);
                self.nodes.push(Node::Text(tail.to_string()));
            }
            None => self.nodes.push(Node::Text(content.to_string())),
        }
        self.dirty.insert(Region::Content);
    }

    /// Overwrite a header slot. The previous value is not retained.
    pub fn replace_slot(&mut self, slot: Slot, value: &str) {
        let state = match slot {
            Slot::Left => &mut self.left,
            Slot::Right => &mut self.right,
        };
        if state.replace(value) {
            self.dirty.insert(slot.region());
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn slot_value(&self, slot: Slot) -> &str {
        match slot {
            Slot::Left => &self.left.value,
            Slot::Right => &self.right.value,
        }
    }

    /// Flatten the content stream to its rendered text, breaks as newlines.
    pub fn content_text(&self) -> String {
        let mut text = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(chunk) => text.push_str(chunk),
                Node::Break => text.push('\n'),
            }
        }
        text
    }

    pub fn rect_of(&self, region: Region) -> Rect {
        match region {
            Region::Content => self.content_rect,
            Region::HeaderLeft => self.left.rect,
            Region::HeaderRight => self.right.rect,
        }
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Force a repaint of every region on the next frame.
    pub fn invalidate(&mut self) {
        self.dirty.extend(Region::ALL);
    }

    /// Drain the dirty set in paint order.
    pub fn take_dirty(&mut self) -> Vec<RegionSnapshot> {
        let mut snapshots = Vec::new();
        for region in Region::ALL {
            if self.dirty.remove(&region) {
                let text = match region {
                    Region::Content => self.content_text(),
                    Region::HeaderLeft => self.left.value.clone(),
                    Region::HeaderRight => self.right.value.clone(),
                };
                snapshots.push(RegionSnapshot {
                    region,
                    rect: self.rect_of(region),
                    text,
                });
            }
        }
        snapshots
    }
}
