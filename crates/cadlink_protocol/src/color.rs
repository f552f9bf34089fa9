//! Colors and line weights.

use cadlink_codec::{Field, Tagged};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a color value is resolved by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ColorMethod {
    /// Inherit from the layer.
    ByLayer,
    /// Inherit from the containing block.
    ByBlock,
    /// Explicit RGB.
    ByColor,
    /// Index into the 256-entry palette.
    ByAci,
    /// Pen number.
    ByPen,
    /// Foreground color.
    Foreground,
    /// Color used when the layer is off.
    LayerOff,
    /// Color used when the layer is frozen.
    LayerFrozen,
    /// No color.
    None,
}

impl ColorMethod {
    /// Converts to the numeric wire code.
    pub fn to_code(self) -> u8 {
        match self {
            ColorMethod::ByLayer => 0xC0,
            ColorMethod::ByBlock => 0xC1,
            ColorMethod::ByColor => 0xC2,
            ColorMethod::ByAci => 0xC3,
            ColorMethod::ByPen => 0xC4,
            ColorMethod::Foreground => 0xC5,
            ColorMethod::LayerOff => 0xC6,
            ColorMethod::LayerFrozen => 0xC7,
            ColorMethod::None => 0xC8,
        }
    }

    /// Converts from a numeric wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0xC0 => Some(ColorMethod::ByLayer),
            0xC1 => Some(ColorMethod::ByBlock),
            0xC2 => Some(ColorMethod::ByColor),
            0xC3 => Some(ColorMethod::ByAci),
            0xC4 => Some(ColorMethod::ByPen),
            0xC5 => Some(ColorMethod::Foreground),
            0xC6 => Some(ColorMethod::LayerOff),
            0xC7 => Some(ColorMethod::LayerFrozen),
            0xC8 => Some(ColorMethod::None),
            _ => None,
        }
    }
}

impl From<ColorMethod> for u8 {
    fn from(method: ColorMethod) -> Self {
        method.to_code()
    }
}

impl TryFrom<u8> for ColorMethod {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ColorMethod::from_code(code).ok_or(InvalidCode::new("color method", i64::from(code)))
    }
}

/// A numeric wire code that maps to no enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCode {
    kind: &'static str,
    code: i64,
}

impl InvalidCode {
    pub(crate) fn new(kind: &'static str, code: i64) -> Self {
        Self { kind, code }
    }
}

impl fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} code {}", self.kind, self.code)
    }
}

impl std::error::Error for InvalidCode {}

/// A drawing color.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Color {
    /// How the color is resolved.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub color_method: Field<ColorMethod>,
    /// Red channel.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub red: Field<u8>,
    /// Green channel.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub green: Field<u8>,
    /// Blue channel.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub blue: Field<u8>,
    /// Palette index.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub color_index: Field<i16>,
}

impl Color {
    /// An explicit RGB color.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            color_method: Field::Value(ColorMethod::ByColor),
            red: Field::Value(red),
            green: Field::Value(green),
            blue: Field::Value(blue),
            color_index: Field::Absent,
        }
    }

    /// A palette color.
    pub fn aci(index: i16) -> Self {
        Self {
            color_method: Field::Value(ColorMethod::ByAci),
            color_index: Field::Value(index),
            ..Self::default()
        }
    }

    /// The "inherit from layer" color.
    pub fn by_layer() -> Self {
        Self {
            color_method: Field::Value(ColorMethod::ByLayer),
            ..Self::default()
        }
    }
}

impl Tagged for Color {
    const TAG: &'static str = "cadlink.color.Color";
}

/// Line weight in hundredths of a millimetre, or an inheritance marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum LineWeight {
    /// The host default weight.
    ByLineWeightDefault,
    /// Inherit from the containing block.
    ByBlock,
    /// Inherit from the layer.
    ByLayer,
    /// An explicit weight.
    Weight(u8),
}

/// Explicit weights accepted by the host.
const WEIGHTS: [u8; 24] = [
    0, 5, 9, 13, 15, 18, 20, 25, 30, 35, 40, 50, 53, 60, 70, 80, 90, 100, 106, 120, 140, 158,
    200, 211,
];

impl LineWeight {
    /// Converts to the numeric wire code.
    pub fn to_code(self) -> i16 {
        match self {
            LineWeight::ByLineWeightDefault => -3,
            LineWeight::ByBlock => -2,
            LineWeight::ByLayer => -1,
            LineWeight::Weight(w) => i16::from(w),
        }
    }

    /// Converts from a numeric wire code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            -3 => Some(LineWeight::ByLineWeightDefault),
            -2 => Some(LineWeight::ByBlock),
            -1 => Some(LineWeight::ByLayer),
            _ => u8::try_from(code)
                .ok()
                .filter(|w| WEIGHTS.contains(w))
                .map(LineWeight::Weight),
        }
    }
}

impl From<LineWeight> for i16 {
    fn from(weight: LineWeight) -> Self {
        weight.to_code()
    }
}

impl TryFrom<i16> for LineWeight {
    type Error = InvalidCode;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        LineWeight::from_code(code).ok_or(InvalidCode::new("line weight", i64::from(code)))
    }
}
