#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::style::StyleLayer;

/// Payload stored at one grid position: an opaque value plus its own style layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell<V> {
    pub value: V,
    pub style: StyleLayer,
}

impl<V> Cell<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            style: StyleLayer::default(),
        }
    }

    pub fn styled(value: V, style: StyleLayer) -> Self {
        Self { value, style }
    }
}

impl<V> From<V> for Cell<V> {
    fn from(value: V) -> Self {
        Cell::new(value)
    }
}
