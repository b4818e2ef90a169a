use std::collections::HashSet;

/// How close (in rows) a panel's top edge must come to the bottom of the
/// viewport before it reveals. The terminal stand-in for the classic
/// 100-pixel fade-in threshold.
pub const REVEAL_MARGIN_ROWS: u16 = 4;

/// Tracks which dashboard panels have entered the viewport. Once a panel
/// reveals it stays revealed for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct RevealTracker {
    revealed: HashSet<usize>,
}

impl RevealTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-examines `panel` against the current scroll position. `panel_top`
    /// is the panel's first row in document coordinates.
    pub fn observe(&mut self, panel: usize, panel_top: u16, scroll: u16, viewport_rows: u16) {
        if self.revealed.contains(&panel) {
            return;
        }
        let visible_edge = scroll as i32 + viewport_rows as i32 - REVEAL_MARGIN_ROWS as i32;
        if (panel_top as i32) < visible_edge {
            self.revealed.insert(panel);
        }
    }

    pub fn is_revealed(&self, panel: usize) -> bool {
        self.revealed.contains(&panel)
    }
}
