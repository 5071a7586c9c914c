//! A1-style text addressing for positions and ranges.
//!
//! Accepted forms: `B3`, `$B$3`, `B3:C5`, whole columns `A:C`, whole rows `3:5`.
//! Anchor markers (`$`) are accepted and discarded; the core has no notion of
//! relative references.

use std::str::FromStr;

use thiserror::Error;

use crate::coord::{CellPosition, MAX_COLS, MAX_ROWS, letters_to_column_index};
use crate::range::RangePosition;

/// Errors raised while parsing A1 text.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("'{0}' is not a valid A1 cell reference")]
    InvalidCell(String),
    #[error("'{0}' is not a valid A1 range reference")]
    InvalidRange(String),
    #[error("row and column indices in '{0}' must be 1-based (>= 1)")]
    ZeroIndex(String),
    #[error("'{0}' lies outside the addressable grid")]
    OutOfGrid(String),
}

impl CellPosition {
    /// Parse an A1-style cell reference such as `B3` or `$AA$10`.
    pub fn from_a1(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let cleaned: String = trimmed.chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AddressError::InvalidCell(trimmed.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::InvalidCell(trimmed.to_string()));
        }
        let col = letters_to_column_index(letters)
            .ok_or_else(|| AddressError::InvalidCell(trimmed.to_string()))?;
        let row1 = parse_row_number(digits, trimmed)?;
        if col >= MAX_COLS {
            return Err(AddressError::OutOfGrid(trimmed.to_string()));
        }
        Ok(CellPosition::new(row1 - 1, col))
    }
}

impl RangePosition {
    /// Parse an A1-style range (`B3:C5`, `A:C`, `3:5`) or a single cell (`B3`).
    pub fn from_a1(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let Some((left, right)) = trimmed.split_once(':') else {
            return CellPosition::from_a1(trimmed).map(RangePosition::cell);
        };
        let left = left.trim().trim_start_matches('$');
        let right = right.trim().trim_start_matches('$');
        let invalid = || AddressError::InvalidRange(trimmed.to_string());

        if !left.is_empty() && left.bytes().all(|b| b.is_ascii_digit()) {
            // whole rows
            if !right.bytes().all(|b| b.is_ascii_digit()) || right.is_empty() {
                return Err(invalid());
            }
            let a = parse_row_number(left, trimmed)? - 1;
            let b = parse_row_number(right, trimmed)? - 1;
            let (start, end) = (a.min(b), a.max(b));
            return RangePosition::entire_rows(start, end - start + 1).map_err(|_| invalid());
        }

        if !left.is_empty() && left.bytes().all(|b| b.is_ascii_alphabetic()) {
            // whole columns
            if right.is_empty() || !right.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(invalid());
            }
            let a = letters_to_column_index(left).ok_or_else(invalid)?;
            let b = letters_to_column_index(right).ok_or_else(invalid)?;
            if a >= MAX_COLS || b >= MAX_COLS {
                return Err(AddressError::OutOfGrid(trimmed.to_string()));
            }
            let (start, end) = (a.min(b), a.max(b));
            return RangePosition::entire_columns(start, end - start + 1).map_err(|_| invalid());
        }

        let start = CellPosition::from_a1(left)?;
        let end = CellPosition::from_a1(right)?;
        Ok(RangePosition::from_corners(start, end))
    }
}

impl FromStr for CellPosition {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellPosition::from_a1(s)
    }
}

impl FromStr for RangePosition {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangePosition::from_a1(s)
    }
}

fn parse_row_number(digits: &str, original: &str) -> Result<u32, AddressError> {
    let row1: u64 = digits
        .parse()
        .map_err(|_| AddressError::InvalidCell(original.to_string()))?;
    if row1 == 0 {
        return Err(AddressError::ZeroIndex(original.to_string()));
    }
    if row1 > MAX_ROWS as u64 {
        return Err(AddressError::OutOfGrid(original.to_string()));
    }
    Ok(row1 as u32)
}
