//! Tile colours
//!
//! Every stage uses one bright base colour and a subtly shifted variant for
//! the target tile.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Target highlight after the countdown expires
    pub const HIGHLIGHT: Rgb = Rgb::new(0x00, 0xFF, 0x00);
    /// Every other tile after the countdown expires
    pub const DIM: Rgb = Rgb::new(0x88, 0x88, 0x88);

    /// Random colour with every channel in `[BRIGHT_CHANNEL_MIN, 255]`
    pub fn random_bright<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            r: rng.random_range(BRIGHT_CHANNEL_MIN..=u8::MAX),
            g: rng.random_range(BRIGHT_CHANNEL_MIN..=u8::MAX),
            b: rng.random_range(BRIGHT_CHANNEL_MIN..=u8::MAX),
        }
    }

    fn map(self, f: impl Fn(u8) -> u8) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    /// CSS-style `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How the target colour is derived from the base colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorShift {
    /// Scale every channel by `factor` (truncating)
    Darken { factor: f32 },
    /// Move every channel `delta` toward the middle of the range (saturating;
    /// a channel near 128 may cross it)
    Contrast { delta: u8 },
}

impl Default for ColorShift {
    fn default() -> Self {
        ColorShift::Darken {
            factor: DARKEN_FACTOR,
        }
    }
}

impl ColorShift {
    pub fn apply(self, base: Rgb) -> Rgb {
        match self {
            ColorShift::Darken { factor } => base.map(|c| (c as f32 * factor) as u8),
            ColorShift::Contrast { delta } => base.map(|c| {
                if c >= 128 {
                    c.saturating_sub(delta)
                } else {
                    c.saturating_add(delta)
                }
            }),
        }
    }

    /// Clamp parameters so the shift always changes a bright colour
    pub fn sanitized(self) -> Self {
        match self {
            ColorShift::Darken { factor } if !(factor > 0.0 && factor < 1.0) => {
                ColorShift::default()
            }
            ColorShift::Contrast { delta: 0 } => ColorShift::Contrast {
                delta: CONTRAST_DELTA,
            },
            other => other,
        }
    }
}
