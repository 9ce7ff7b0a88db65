//! Find Color - spot the odd-colored tile
//!
//! Core modules:
//! - `sim`: Deterministic game core (grid generation, countdown, stage flow)
//! - `ranking`: Shared ranking document and its stores
//! - `settings`: Tunable game parameters
//! - `platform`: Browser/native platform abstraction
//! - `error`: Error types shared across modules

pub mod error;
pub mod platform;
pub mod ranking;
pub mod settings;
pub mod sim;

pub use error::{LayoutError, SettingsError, StoreError};
pub use ranking::{Identity, RankingDocument, RankingEntry, RankingStore};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Grid size (tiles per side) at stage 1
    pub const INITIAL_GRID_SIZE: u32 = 4;
    /// Smallest grid the layout may shrink to
    pub const MIN_GRID_SIZE: u32 = 2;
    /// Largest grid ever drawn, whatever the settings or stage ask for
    pub const MAX_GRID_SIZE: u32 = 128;

    /// Seconds the player has to find the target tile
    pub const TIME_LIMIT_SECS: u32 = 15;
    /// Countdown tick interval
    pub const TICK_MS: u64 = 1000;
    /// Delay between the reveal and the retry/exit prompt
    pub const REVEAL_DELAY_MS: u64 = 3000;

    /// Spacing between tiles (pixels)
    pub const TILE_SPACING: u32 = 8;
    /// Default drawing area when the host does not report one
    pub const DEFAULT_CANVAS_SIDE: u32 = 1080;

    /// Upper bound on target re-draws before the layout counts as degenerate
    pub const MAX_TARGET_DRAWS: u32 = 64;

    /// Base colour channels are drawn from this range (bright colours only)
    pub const BRIGHT_CHANNEL_MIN: u8 = 100;
    /// Default multiplicative darkening for the target tile (20% darker)
    pub const DARKEN_FACTOR: f32 = 0.8;
    /// Default per-channel delta for the additive contrast variant
    pub const CONTRAST_DELTA: u8 = 40;

    /// Inline message shown for a wrong tap
    pub const TRY_AGAIN_MESSAGE: &str = "Try again!";
}
