//! Layered cell styles.
//!
//! A `StyleLayer` only carries the properties it overrides; an absent field
//! means "inherit". The effective style of a cell is the overlay of the sheet
//! default, the row default, the column default and the cell's own layer, the
//! most specific present field winning.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

bitflags::bitflags! {
    /// Which properties a layer overrides.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        const FILL = 1 << 0;
        const FONT_COLOR = 1 << 1;
        const BOLD = 1 << 2;
        const ITALIC = 1 << 3;
        const UNDERLINE = 1 << 4;
        const H_ALIGN = 1 << 5;
        const V_ALIGN = 1 << 6;
        const NUMBER_FORMAT = 1 << 7;
        const LOCKED = 1 << 8;
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleLayer {
    /// Background colour, 0xRRGGBB.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fill: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub font_color: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub bold: Option<bool>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub italic: Option<bool>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub underline: Option<bool>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub h_align: Option<HorizontalAlignment>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub v_align: Option<VerticalAlignment>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub number_format: Option<String>,
    /// Protection flag consulted by the default lock predicate.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub locked: Option<bool>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.flags().is_empty()
    }

    pub fn flags(&self) -> StyleFlags {
        let mut flags = StyleFlags::empty();
        flags.set(StyleFlags::FILL, self.fill.is_some());
        flags.set(StyleFlags::FONT_COLOR, self.font_color.is_some());
        flags.set(StyleFlags::BOLD, self.bold.is_some());
        flags.set(StyleFlags::ITALIC, self.italic.is_some());
        flags.set(StyleFlags::UNDERLINE, self.underline.is_some());
        flags.set(StyleFlags::H_ALIGN, self.h_align.is_some());
        flags.set(StyleFlags::V_ALIGN, self.v_align.is_some());
        flags.set(StyleFlags::NUMBER_FORMAT, self.number_format.is_some());
        flags.set(StyleFlags::LOCKED, self.locked.is_some());
        flags
    }

    /// `self` with every field present in `upper` replaced by `upper`'s value.
    pub fn overlay(&self, upper: &StyleLayer) -> StyleLayer {
        StyleLayer {
            fill: upper.fill.or(self.fill),
            font_color: upper.font_color.or(self.font_color),
            bold: upper.bold.or(self.bold),
            italic: upper.italic.or(self.italic),
            underline: upper.underline.or(self.underline),
            h_align: upper.h_align.or(self.h_align),
            v_align: upper.v_align.or(self.v_align),
            number_format: upper
                .number_format
                .clone()
                .or_else(|| self.number_format.clone()),
            locked: upper.locked.or(self.locked),
        }
    }

    /// Overlay layers from least to most specific.
    pub fn resolve<'a, I>(layers: I) -> StyleLayer
    where
        I: IntoIterator<Item = Option<&'a StyleLayer>>,
    {
        layers
            .into_iter()
            .flatten()
            .fold(StyleLayer::default(), |acc, layer| acc.overlay(layer))
    }

    pub fn with_fill(mut self, rgb: u32) -> Self {
        self.fill = Some(rgb);
        self
    }

    pub fn with_font_color(mut self, rgb: u32) -> Self {
        self.font_color = Some(rgb);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn with_h_align(mut self, align: HorizontalAlignment) -> Self {
        self.h_align = Some(align);
        self
    }

    pub fn with_number_format<S: Into<String>>(mut self, format: S) -> Self {
        self.number_format = Some(format.into());
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }
}
