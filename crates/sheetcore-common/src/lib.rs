pub mod address;
pub mod coord;
pub mod error;
pub mod range;
pub mod value;

pub use address::AddressError;
pub use coord::{Axis, CellPosition, MAX_COLS, MAX_ROWS};
pub use error::GridError;
pub use range::{Extent, RangePosition};
pub use value::CellValue;
