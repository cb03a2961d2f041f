//! Outer boundary tracing.
//!
//! Boundaries follow the cell edges ("cracks") of the grid rather than cell
//! centres, so a traced ring encloses exactly the cells of its region and its
//! shoelace area equals the cell count (scaled back to pixels). Holes left by
//! wall islands inside a region are not traced; the outer ring covers them.

use tracing::error;

use super::labeling::{Region, RegionMap};
use super::rasterization::GridResolution;
use crate::error::{Result, RoomError};
use crate::types::RoomPolygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East,
    South,
    West,
    North,
}

impl Heading {
    fn step(self) -> (i64, i64) {
        match self {
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::North => (0, -1),
        }
    }

    /// Clockwise on screen (y grows downward)
    fn turn_right(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::North => Self::East,
        }
    }

    fn turn_left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
        }
    }

    /// Cells ahead of corner `(px, py)` as `(left, right)` when facing this way
    fn cells_ahead(self, px: i64, py: i64) -> ((i64, i64), (i64, i64)) {
        match self {
            Self::East => ((px, py - 1), (px, py)),
            Self::South => ((px, py), (px - 1, py)),
            Self::West => ((px - 1, py), (px - 1, py - 1)),
            Self::North => ((px - 1, py - 1), (px, py - 1)),
        }
    }
}

/// Trace the outer boundary of a region as a ring of grid corners.
///
/// Walks the cracks with the region on the right-hand side, starting at the
/// top-left corner of the region's seed cell heading east, and emits a corner
/// at every change of heading. Region cells that touch only diagonally are
/// treated as disconnected, matching 4-connected labeling.
///
/// Where a region touches itself only at a corner (a diagonal pinch around a
/// wall cell) that corner is emitted twice, once per side. The ring is then
/// weakly simple rather than simple: edges never cross, but it revisits a
/// vertex. Its shoelace area is still the exact cell area.
pub fn trace_region(map: &RegionMap, region: &Region) -> Result<Vec<(u32, u32)>> {
    let (sx, sy) = region.seed;
    let start = (i64::from(sx), i64::from(sy));
    let id = region.id;

    // Each boundary crack is walked once, and a region of n cells has at most 4n
    let max_steps = 4 * region.cell_count + 4;

    let mut corners = vec![(sx, sy)];
    let mut position = start;
    let mut heading = Heading::East;

    for _ in 0..max_steps {
        let (dx, dy) = heading.step();
        position = (position.0 + dx, position.1 + dy);
        if position == start {
            return finish(region, corners);
        }

        let (left, right) = heading.cells_ahead(position.0, position.1);
        let next = if !map.is_in_region(right.0, right.1, id) {
            heading.turn_right()
        } else if map.is_in_region(left.0, left.1, id) {
            heading.turn_left()
        } else {
            heading
        };

        if next != heading {
            // Corners never leave the grid's corner lattice
            corners.push((position.0 as u32, position.1 as u32));
            heading = next;
        }
    }

    error!(
        region = id,
        cells = region.cell_count,
        extent = ?region.extent,
        steps = max_steps,
        "Boundary trace did not close"
    );
    Err(RoomError::Geometry {
        region: id,
        message: format!("boundary trace did not close within {max_steps} steps"),
    })
}

fn finish(region: &Region, corners: Vec<(u32, u32)>) -> Result<Vec<(u32, u32)>> {
    if corners.len() < 4 {
        error!(
            region = region.id,
            cells = region.cell_count,
            extent = ?region.extent,
            corners = corners.len(),
            "Degenerate boundary"
        );
        return Err(RoomError::Geometry {
            region: region.id,
            message: format!("boundary has only {} corners", corners.len()),
        });
    }
    Ok(corners)
}

/// Trace a region and map its corners back to pixel coordinates
pub fn extract_polygon(map: &RegionMap, region: &Region, resolution: &GridResolution) -> Result<RoomPolygon> {
    let corners = trace_region(map, region)?;
    let vertices = corners
        .into_iter()
        .map(|(x, y)| resolution.to_pixel(x, y))
        .collect();
    Ok(RoomPolygon::new(region.id, vertices))
}

/// Trace every interior region, in region id order
pub fn extract_polygons(map: &RegionMap, resolution: &GridResolution) -> Result<Vec<RoomPolygon>> {
    map.interior_regions()
        .map(|region| extract_polygon(map, region, resolution))
        .collect()
}
