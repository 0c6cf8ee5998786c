use crate::error::{Result, UiError};
use crate::geometry::{Rect, Size};

/// Rows occupied by the header overlay at the top of the container.
pub const HEADER_ROWS: u16 = 1;
/// Rows reserved for the input line at the bottom of the screen.
pub const INPUT_ROWS: u16 = 1;
/// Narrower than this and the header halves stop being readable.
pub const MIN_WIDTH: u16 = 20;
/// Header overlay, two content rows, input line.
pub const MIN_HEIGHT: u16 = 4;

/// Solved rects for the fixed screen plan.
///
/// The header does not reserve rows of its own — it overlays the top of the
/// container, which is why content growth can collide with it and why the
/// reconcile pass exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPlan {
    /// The display area shared by content and header.
    pub container: Rect,
    pub content: Rect,
    pub header_left: Rect,
    pub header_right: Rect,
    pub input: Rect,
}

/// Solve the plan for a terminal size.
pub fn solve(size: Size) -> Result<ScreenPlan> {
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        return Err(UiError::SizeTooSmall {
            width: size.width,
            height: size.height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }

    let container = Rect::new(0, 0, size.width, size.height - INPUT_ROWS);
    let half = size.width / 2;
    Ok(ScreenPlan {
        container,
        content: container,
        header_left: Rect::new(0, 0, half, HEADER_ROWS),
        header_right: Rect::new(half, 0, size.width - half, HEADER_ROWS),
        input: Rect::new(0, size.height - INPUT_ROWS, size.width, INPUT_ROWS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_halves_cover_the_full_width() {
        let plan = solve(Size::new(81, 24)).unwrap();
        assert_eq!(plan.header_left.width, 40);
        assert_eq!(plan.header_right.x, 40);
        assert_eq!(plan.header_right.right(), 81);
        assert_eq!(plan.header_left.y, 0);
    }

    #[test]
    fn content_fills_the_container_and_input_sits_below() {
        let plan = solve(Size::new(80, 24)).unwrap();
        assert_eq!(plan.content, plan.container);
        assert_eq!(plan.container.height, 23);
        assert_eq!(plan.input.y, 23);
        assert_eq!(plan.input.height, 1);
    }

    #[test]
    fn tiny_terminal_is_rejected() {
        let err = solve(Size::new(10, 3)).unwrap_err();
        assert!(matches!(err, UiError::SizeTooSmall { .. }));
    }
}
