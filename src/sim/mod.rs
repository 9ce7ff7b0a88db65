//! Deterministic game core
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only
//! - Virtual clock only (hosts report time, nothing reads a wall clock)
//! - No rendering, storage or platform dependencies

pub mod color;
pub mod grid;
pub mod session;
pub mod stage;
pub mod timer;

pub use color::{ColorShift, Rgb};
pub use grid::{
    Canvas, Cell, Grid, TileRect, generate_fitting_grid, generate_grid, max_fitting_grid_size,
    tile_rect, tile_size,
};
pub use session::{Decision, GameEvent, GamePhase, GameSession, Navigation, Snapshot, TapOutcome};
pub use stage::{StageState, grid_size_for_stage};
pub use timer::{Countdown, CountdownStep, Scheduler, Timer, TimerKind};
