/// Freshly measured rendered heights, in cells.
///
/// Always derived, never cached: the content stream is unbounded and grows
/// with every submission, so each pass re-measures from what is actually
/// rendered. Signed so the arithmetic below stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    pub content_height: i32,
    pub header_height: i32,
    pub container_height: i32,
}

impl Measure {
    pub fn new(content_height: i32, header_height: i32, container_height: i32) -> Self {
        Self {
            content_height,
            header_height,
            container_height,
        }
    }

    /// Combined height the container must accommodate.
    pub fn used_height(&self) -> i32 {
        self.content_height + self.header_height
    }
}

/// Corrective offsets applied by the renderer once content overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Correction {
    /// Top padding for the content stream. Negative: pulls the stream up so
    /// its tail stays visible inside the container.
    pub content_padding: i32,
    /// Downward offset for the header, moving it with the scrolled content
    /// instead of leaving it pinned at the original position.
    pub header_offset: i32,
}

impl Correction {
    /// Leading content lines hidden above the container top.
    pub fn hidden_lines(&self) -> u16 {
        (-self.content_padding).max(0) as u16
    }
}

/// Run one reconciliation pass over freshly measured geometry.
///
/// Returns `None` when everything fits. The caller leaves any previously
/// applied correction in place on `None` — corrections are forward-only and
/// are not reset when content shrinks.
pub fn reconcile(measure: Measure) -> Option<Correction> {
    let overflow = measure.used_height() - measure.container_height;
    if overflow <= 0 {
        return None;
    }

    Some(Correction {
        content_padding: -overflow,
        header_offset: overflow + (measure.header_height - 2),
    })
}
