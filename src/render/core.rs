use std::io::Write;

use crate::cursor;
use crate::error::Result;
use crate::geometry::Rect;
use crate::reconcile::Correction;
use crate::region::{Region, RegionSnapshot};
use crate::width::display_width;

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// 0-based cell the cursor is parked on after each flush, keeping the
    /// caret on the input line while engine updates repaint other regions.
    pub restore_cursor: Option<(u16, u16)>,
}

/// ANSI escape code renderer writing directly to a terminal handle.
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Paint dirty regions inside `container`, applying `correction`.
    pub fn render(
        &mut self,
        writer: &mut impl Write,
        container: Rect,
        dirty: &[RegionSnapshot],
        correction: Correction,
    ) -> Result<()> {
        for snapshot in dirty {
            match snapshot.region {
                Region::Content => render_content(writer, snapshot, correction)?,
                Region::HeaderLeft | Region::HeaderRight => {
                    render_header(writer, snapshot, container, correction)?
                }
            }
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "{}", cursor::move_to(row + 1, col + 1))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Paint the input line and park the cursor at `caret` (0-based cell).
    pub fn render_input(
        &mut self,
        writer: &mut impl Write,
        rect: Rect,
        text: &str,
        caret: Option<(u16, u16)>,
    ) -> Result<()> {
        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }

        let mut line = text.split('\n').next().unwrap_or_default().to_string();
        pad_line(&mut line, rect.width);
        write!(writer, "{}{}", cursor::move_to(rect.y + 1, rect.x + 1), line)?;

        self.settings.restore_cursor = caret;
        if let Some((row, col)) = caret {
            write!(writer, "{}", cursor::move_to(row + 1, col + 1))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn render_content(
    writer: &mut impl Write,
    snapshot: &RegionSnapshot,
    correction: Correction,
) -> Result<()> {
    let rect = snapshot.rect;
    if rect.width == 0 || rect.height == 0 {
        return Ok(());
    }

    // Negative top padding scrolls the stream: the hidden leading lines sit
    // above the container so the tail stays visible.
    let lines = wrap_to_width(&snapshot.text, rect.width);
    let mut visible: Vec<String> = lines
        .into_iter()
        .skip(correction.hidden_lines() as usize)
        .take(rect.height as usize)
        .collect();

    while visible.len() < rect.height as usize {
        visible.push(String::new());
    }

    for (offset, line) in visible.iter_mut().enumerate() {
        pad_line(line, rect.width);
        write!(
            writer,
            "{}{}",
            cursor::move_to(rect.y + offset as u16 + 1, rect.x + 1),
            line
        )?;
    }

    Ok(())
}

fn render_header(
    writer: &mut impl Write,
    snapshot: &RegionSnapshot,
    container: Rect,
    correction: Correction,
) -> Result<()> {
    let rect = snapshot.rect;
    if rect.width == 0 || rect.height == 0 || container.height == 0 {
        return Ok(());
    }

    // The offset tracks scrolled content and can exceed the container; the
    // header is still drawn somewhere visible, so clamp to the last row.
    let shifted = i64::from(rect.y) + i64::from(correction.header_offset);
    let last_row = i64::from(container.bottom().saturating_sub(1));
    let row = shifted.clamp(i64::from(container.y), last_row) as u16;

    let mut line = snapshot
        .text
        .split('\n')
        .next()
        .unwrap_or_default()
        .to_string();
    pad_line(&mut line, rect.width);
    write!(writer, "{}{}", cursor::move_to(row + 1, rect.x + 1), line)?;
    Ok(())
}

/// Greedy display-width wrapping. Splits on newlines first, then fills each
/// row up to `width` columns, swallowing the space a row breaks on.
pub(crate) fn wrap_to_width(content: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for raw in content.split('\n') {
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for ch in raw.chars() {
            if current.is_empty() && ch == ' ' {
                continue;
            }
            let ch_width = display_width(&ch.to_string());
            if !current.is_empty() && display_width(&current) + ch_width > width as usize {
                lines.push(std::mem::take(&mut current));
                if ch == ' ' {
                    continue;
                }
            }
            current.push(ch);
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn pad_line(line: &mut String, width: u16) {
    while (display_width(line) as u16) > width {
        line.pop();
    }
    while (display_width(line) as u16) < width {
        line.push(' ');
    }
}
