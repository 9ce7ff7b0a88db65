//! Stage progression
//!
//! The grid grows by one tile per side for every cleared stage.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Grid size for a stage: `initial + (stage - 1)`
pub fn grid_size_for_stage(initial_grid_size: u32, stage: u32) -> u32 {
    initial_grid_size
        .max(MIN_GRID_SIZE)
        .saturating_add(stage.max(1) - 1)
}

/// Current stage and the grid size it asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    /// 1-based stage number
    pub stage: u32,
    /// Requested tiles per side (the drawn grid may be smaller if the canvas
    /// cannot fit it)
    pub grid_size: u32,
    initial_grid_size: u32,
}

impl Default for StageState {
    fn default() -> Self {
        Self::new(INITIAL_GRID_SIZE)
    }
}

impl StageState {
    pub fn new(initial_grid_size: u32) -> Self {
        let initial_grid_size = initial_grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        Self {
            stage: 1,
            grid_size: initial_grid_size,
            initial_grid_size,
        }
    }

    pub fn initial_grid_size(&self) -> u32 {
        self.initial_grid_size
    }

    /// Move to the next stage after a correct tap
    pub fn advance_stage(&mut self) {
        self.stage = self.stage.saturating_add(1);
        self.grid_size = grid_size_for_stage(self.initial_grid_size, self.stage);
    }

    /// Back to stage 1 for a retry
    pub fn reset_to_initial(&mut self) {
        self.stage = 1;
        self.grid_size = self.initial_grid_size;
    }
}
