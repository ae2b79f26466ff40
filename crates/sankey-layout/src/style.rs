use serde::{Deserialize, Serialize};

/// 8-bit RGBA color, passed through from nodes to the links leaving them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// How the renderer should stroke links
///
/// Links are never filled. The stroke color is the source node's color, see
/// [`LinkGeometry::color`](crate::LinkGeometry::color).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkStyle {
    pub opacity: f64,
    pub cap: LineCap,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            cap: LineCap::Butt,
        }
    }
}
