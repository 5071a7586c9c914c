use std::collections::BTreeMap;

use sheetcore_common::Axis;

use crate::shift::ShiftOperation;
use crate::style::StyleLayer;

/// Per-line sizes and default styles along one axis.
///
/// Sizes are intrinsic: hiding a line through an outline does not touch them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineHeaders {
    axis: Axis,
    default_size: u32,
    sizes: BTreeMap<u32, u32>,
    styles: BTreeMap<u32, StyleLayer>,
}

/// Header state of a window of lines, captured before a shift discards it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderWindow {
    sizes: Vec<(u32, u32)>,
    styles: Vec<(u32, StyleLayer)>,
}

impl LineHeaders {
    pub fn new(axis: Axis, default_size: u32) -> Self {
        Self {
            axis,
            default_size,
            sizes: BTreeMap::new(),
            styles: BTreeMap::new(),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn default_size(&self) -> u32 {
        self.default_size
    }

    pub fn size(&self, line: u32) -> u32 {
        self.sizes.get(&line).copied().unwrap_or(self.default_size)
    }

    /// Explicit size of `line`, if it has one.
    pub fn size_override(&self, line: u32) -> Option<u32> {
        self.sizes.get(&line).copied()
    }

    /// Set or clear an explicit size, returning the previous override.
    pub fn set_size(&mut self, line: u32, size: Option<u32>) -> Option<u32> {
        match size {
            Some(size) => self.sizes.insert(line, size),
            None => self.sizes.remove(&line),
        }
    }

    pub fn style(&self, line: u32) -> Option<&StyleLayer> {
        self.styles.get(&line)
    }

    /// Whether any line's default style locks its cells.
    pub fn locks_any_line(&self) -> bool {
        self.styles.values().any(|style| style.locked == Some(true))
    }

    /// Set or clear a line's default style, returning the previous one.
    pub fn set_style(&mut self, line: u32, style: Option<StyleLayer>) -> Option<StyleLayer> {
        match style {
            Some(style) if !style.is_empty() => self.styles.insert(line, style),
            _ => self.styles.remove(&line),
        }
    }

    /// Summed intrinsic size of lines `[start, end)`.
    pub fn span_size(&self, start: u32, end: u32) -> u64 {
        if start >= end {
            return 0;
        }
        let base = (end - start) as u64 * self.default_size as u64;
        self.sizes
            .range(start..end)
            .fold(base, |acc, (_, size)| {
                acc - self.default_size as u64 + *size as u64
            })
    }

    pub fn capture_window(&self, start: u32, count: u32) -> HeaderWindow {
        let end = start.saturating_add(count);
        HeaderWindow {
            sizes: self
                .sizes
                .range(start..end)
                .map(|(line, size)| (*line, *size))
                .collect(),
            styles: self
                .styles
                .range(start..end)
                .map(|(line, style)| (*line, style.clone()))
                .collect(),
        }
    }

    /// Overrides that `op` discards: the deleted window, or the lines an
    /// insert pushes past the last addressable line.
    pub fn capture_shift(&self, op: &ShiftOperation) -> HeaderWindow {
        match *op {
            ShiftOperation::Delete { start, count, .. } => self.capture_window(start, count),
            ShiftOperation::Insert { before, count, .. } => {
                let limit = self.axis.limit();
                let from = before.max(limit.saturating_sub(count));
                self.capture_window(from, limit.saturating_sub(from))
            }
        }
    }

    pub fn restore_window(&mut self, window: &HeaderWindow) {
        for (line, size) in &window.sizes {
            self.sizes.insert(*line, *size);
        }
        for (line, style) in &window.styles {
            self.styles.insert(*line, style.clone());
        }
    }

    /// Renumber overrides; lines inside a deleted window are dropped and
    /// inserted lines start at the defaults.
    pub fn apply_shift(&mut self, op: &ShiftOperation) {
        debug_assert_eq!(op.axis(), self.axis);
        self.sizes = std::mem::take(&mut self.sizes)
            .into_iter()
            .filter_map(|(line, size)| op.adjust_line(line).map(|l| (l, size)))
            .collect();
        self.styles = std::mem::take(&mut self.styles)
            .into_iter()
            .filter_map(|(line, style)| op.adjust_line(line).map(|l| (l, style)))
            .collect();
    }
}
