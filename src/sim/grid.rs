//! Grid generation
//!
//! Lays out a square grid of equally sized tiles on the canvas reported by the
//! host and picks the one tile that gets the shifted colour.

use glam::UVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::{ColorShift, Rgb};
use crate::consts::*;
use crate::error::LayoutError;

/// Drawing area reported by the host (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::square(DEFAULT_CANVAS_SIDE)
    }
}

impl Canvas {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// True when `rect` lies entirely inside `[0, width] x [0, height]`
    pub fn contains(&self, rect: &TileRect) -> bool {
        rect.max.cmple(self.size()).all()
    }
}

/// Pixel bounds of one tile, `min` inclusive, `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub min: UVec2,
    pub max: UVec2,
}

/// Side length of a square tile so that `grid_size` tiles plus
/// `grid_size + 1` gaps fit the shorter canvas side
pub fn tile_size(grid_size: u32, canvas: Canvas, spacing: u32) -> Result<u32, LayoutError> {
    let degenerate = LayoutError::Degenerate {
        grid_size,
        width: canvas.width,
        height: canvas.height,
    };
    if grid_size == 0 {
        return Err(degenerate);
    }

    let gaps = i64::from(spacing) * (i64::from(grid_size) + 1);
    let size = (i64::from(canvas.min_side()) - gaps).div_euclid(i64::from(grid_size));
    if size <= 0 {
        return Err(degenerate);
    }
    u32::try_from(size).map_err(|_| degenerate)
}

/// Most tiles per side that still leave every tile at least one pixel
pub fn max_fitting_grid_size(canvas: Canvas, spacing: u32) -> u32 {
    canvas.min_side().saturating_sub(spacing) / spacing.saturating_add(1)
}

/// Bounds of the tile at `index` (row-major), inset by half a gap
pub fn tile_rect(index: u32, grid_size: u32, tile_size: u32, spacing: u32) -> TileRect {
    let cell = UVec2::new(index % grid_size, index / grid_size);
    let min = cell * (tile_size + spacing) + UVec2::splat(spacing / 2);
    TileRect {
        min,
        max: min + UVec2::splat(tile_size),
    }
}

/// Draw a target index uniformly, re-drawing while its tile would overflow
/// the canvas. Gives up after `MAX_TARGET_DRAWS` draws.
pub fn pick_target<R: Rng + ?Sized>(
    rng: &mut R,
    grid_size: u32,
    tile_size: u32,
    spacing: u32,
    canvas: Canvas,
) -> Result<u32, LayoutError> {
    let cell_count = grid_size * grid_size;
    for draw in 0..MAX_TARGET_DRAWS {
        let index = rng.random_range(0..cell_count);
        if canvas.contains(&tile_rect(index, grid_size, tile_size, spacing)) {
            return Ok(index);
        }
        log::debug!("Target {} overflows canvas (draw {}), re-drawing", index, draw + 1);
    }
    Err(LayoutError::NoFittingTarget {
        draws: MAX_TARGET_DRAWS,
    })
}

/// A single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub color: Rgb,
    pub is_target: bool,
}

/// One stage's worth of tiles. Replaced wholesale on every stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    size: u32,
    tile_size: u32,
    spacing: u32,
    target: u32,
    base_color: Rgb,
    target_color: Rgb,
    cells: Vec<Cell>,
}

impl Grid {
    /// Tiles per side
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cell_count(&self) -> u32 {
        self.size * self.size
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    pub fn target_index(&self) -> u32 {
        self.target
    }

    pub fn base_color(&self) -> Rgb {
        self.base_color
    }

    pub fn target_color(&self) -> Rgb {
        self.target_color
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: u32) -> Option<&Cell> {
        self.cells.get(index as usize)
    }

    pub fn tile_rect(&self, index: u32) -> TileRect {
        tile_rect(index, self.size, self.tile_size, self.spacing)
    }

    /// Colour a renderer should draw; after the reveal the target is
    /// highlighted and everything else dimmed
    pub fn display_color(&self, index: u32, revealed: bool) -> Option<Rgb> {
        let cell = self.cell(index)?;
        Some(match (revealed, cell.is_target) {
            (false, _) => cell.color,
            (true, true) => Rgb::HIGHLIGHT,
            (true, false) => Rgb::DIM,
        })
    }

    pub fn display_colors(&self, revealed: bool) -> Vec<Rgb> {
        (0..self.cell_count())
            .filter_map(|i| self.display_color(i, revealed))
            .collect()
    }
}

/// Generate a grid of exactly `grid_size` tiles per side
pub fn generate_grid<R: Rng + ?Sized>(
    rng: &mut R,
    grid_size: u32,
    canvas: Canvas,
    spacing: u32,
    shift: ColorShift,
) -> Result<Grid, LayoutError> {
    let tile_size = tile_size(grid_size, canvas, spacing)?;
    let target = pick_target(rng, grid_size, tile_size, spacing, canvas)?;

    let base_color = Rgb::random_bright(rng);
    let target_color = shift.apply(base_color);

    let cells = (0..grid_size * grid_size)
        .map(|i| Cell {
            color: if i == target { target_color } else { base_color },
            is_target: i == target,
        })
        .collect();

    Ok(Grid {
        size: grid_size,
        tile_size,
        spacing,
        target,
        base_color,
        target_color,
        cells,
    })
}

/// Generate the largest grid up to `grid_size` that the canvas can draw.
/// Starts from the largest size that fits (capped at `MAX_GRID_SIZE`) and
/// only steps down from there if no target can be placed.
pub fn generate_fitting_grid<R: Rng + ?Sized>(
    rng: &mut R,
    grid_size: u32,
    canvas: Canvas,
    spacing: u32,
    shift: ColorShift,
) -> Result<Grid, LayoutError> {
    let requested = grid_size.max(MIN_GRID_SIZE);
    let mut size = requested
        .min(max_fitting_grid_size(canvas, spacing))
        .min(MAX_GRID_SIZE)
        .max(MIN_GRID_SIZE);
    if size < requested {
        log::warn!(
            "Grid of {} does not fit {}x{}, drawing {}",
            requested,
            canvas.width,
            canvas.height,
            size
        );
    }
    loop {
        match generate_grid(rng, size, canvas, spacing, shift) {
            Ok(grid) => return Ok(grid),
            Err(e) if size > MIN_GRID_SIZE => {
                log::warn!("{}, shrinking grid to {}", e, size - 1);
                size -= 1;
            }
            Err(e) => return Err(e),
        }
    }
}
