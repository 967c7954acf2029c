use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Boxed error returned by external collaborators (physics, renderers, loop callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unique identifier for a node in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and inspector output.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// 24-bit RGB color, stored as `0xRRGGBB`.
///
/// Deserializes from either an integer (`0x336699`) or a `"#336699"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "u32")]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);

    pub fn r(&self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub fn g(&self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub fn b(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Linear-ish float channels in `0.0..=1.0` with alpha 1.
    pub fn to_rgba_f32(&self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            1.0,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

/// Errors from parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color `{0}` is not in #rrggbb or 0xrrggbb form")]
    Malformed(String),
    #[error("color value {0:#x} does not fit in 24 bits")]
    OutOfRange(u32),
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .ok_or_else(|| ColorParseError::Malformed(s.to_string()))?;
        if digits.len() != 6 {
            return Err(ColorParseError::Malformed(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color)
            .map_err(|_| ColorParseError::Malformed(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Int(u32),
    Text(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = ColorParseError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Int(v) if v > 0x00ff_ffff => Err(ColorParseError::OutOfRange(v)),
            ColorRepr::Int(v) => Ok(Color(v)),
            ColorRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Color> for u32 {
    fn from(c: Color) -> u32 {
        c.0
    }
}

/// Output surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale a logical size per axis and round to the nearest whole pixel.
    pub fn scaled(width: f64, height: f64, scale_w: f64, scale_h: f64) -> Self {
        Self {
            width: round_pixels(width * scale_w),
            height: round_pixels(height * scale_h),
        }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn round_pixels(v: f64) -> u32 {
    if v.is_nan() || v <= 0.0 {
        0
    } else {
        v.round().min(u32::MAX as f64) as u32
    }
}
