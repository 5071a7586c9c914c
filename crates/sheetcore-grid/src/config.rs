#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sheetcore_common::{MAX_COLS, MAX_ROWS};

/// Configuration for a worksheet
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Row extent of a new sheet.
    pub initial_rows: u32,
    pub initial_cols: u32,
    /// Upper bound for the row extent; never above `MAX_ROWS`.
    pub max_rows: u32,
    pub max_cols: u32,
    pub default_row_height: u32,
    pub default_col_width: u32,
    /// Undo entries kept before the oldest is dropped.
    pub undo_limit: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            initial_rows: 200,
            initial_cols: 100,
            max_rows: MAX_ROWS,
            max_cols: MAX_COLS,
            default_row_height: 20,
            default_col_width: 70,
            undo_limit: 100,
        }
    }
}

impl GridConfig {
    pub fn with_initial_size(mut self, rows: u32, cols: u32) -> Self {
        self.initial_rows = rows;
        self.initial_cols = cols;
        self
    }

    pub fn with_max_size(mut self, rows: u32, cols: u32) -> Self {
        self.max_rows = rows.min(MAX_ROWS);
        self.max_cols = cols.min(MAX_COLS);
        self
    }

    pub fn with_default_sizes(mut self, row_height: u32, col_width: u32) -> Self {
        self.default_row_height = row_height;
        self.default_col_width = col_width;
        self
    }

    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit;
        self
    }

    /// Clamp every field into the addressable grid.
    pub(crate) fn normalized(mut self) -> Self {
        self.max_rows = self.max_rows.clamp(1, MAX_ROWS);
        self.max_cols = self.max_cols.clamp(1, MAX_COLS);
        self.initial_rows = self.initial_rows.clamp(1, self.max_rows);
        self.initial_cols = self.initial_cols.clamp(1, self.max_cols);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_clamp_to_grid() {
        let cfg = GridConfig::default()
            .with_max_size(u32::MAX, 10)
            .with_initial_size(0, 50)
            .normalized();
        assert_eq!(cfg.max_rows, MAX_ROWS);
        assert_eq!(cfg.max_cols, 10);
        assert_eq!(cfg.initial_rows, 1);
        assert_eq!(cfg.initial_cols, 10);
    }
}
