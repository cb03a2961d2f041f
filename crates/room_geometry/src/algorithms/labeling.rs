use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use super::rasterization::{CellRect, OccupancyGrid};

/// Sentinel label for wall cells
pub const NO_REGION: u32 = u32::MAX;

/// A maximal 4-connected component of free cells
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Row-major first-encounter order, starting at 0
    pub id: usize,
    /// Number of cells in the component
    pub cell_count: usize,
    /// Cell extent of the component
    pub extent: CellRect,
    /// First cell in row-major order; its top-left corner lies on the outer boundary
    pub seed: (u32, u32),
    /// Reaches the canvas border outside the wall envelope
    pub exterior: bool,
    /// Shared boundary length in pixels, keyed by wall index
    pub wall_contacts: BTreeMap<usize, f64>,
}

impl Region {
    /// Total boundary length shared with attributed walls
    pub fn contact_length(&self) -> f64 {
        self.wall_contacts.values().sum()
    }
}

/// Per-cell region labels plus the regions themselves
#[derive(Debug, Clone)]
pub struct RegionMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    pub regions: Vec<Region>,
}

impl RegionMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Label at a cell, [`NO_REGION`] for walls
    pub fn label(&self, x: u32, y: u32) -> u32 {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    /// Whether a (possibly out of bounds) cell belongs to `region`
    pub fn is_in_region(&self, x: i64, y: i64, region: usize) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.label(x as u32, y as u32) as usize == region
    }

    /// Regions that are room candidates
    pub fn interior_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|region| !region.exterior)
    }
}

/// Label free cells into 4-connected regions.
///
/// Regions are numbered in the order their first cell is met scanning rows
/// top to bottom, left to right. A region is exterior when it touches the
/// canvas border at a cell outside the bounding envelope of all walls; with
/// no walls on the grid the single region spanning the canvas is interior.
pub fn label_regions(grid: &OccupancyGrid) -> RegionMap {
    let (width, height) = (grid.width(), grid.height());
    let resolution = grid.resolution();
    // Edge lengths in pixels: horizontal edges span one cell in x, vertical ones in y
    let horizontal_edge = 1.0 / resolution.scale_x;
    let vertical_edge = 1.0 / resolution.scale_y;
    let envelope = grid.wall_envelope();

    let mut labels = vec![NO_REGION; width as usize * height as usize];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let start = y as usize * width as usize + x as usize;
            if labels[start] != NO_REGION || grid.is_wall(x, y) {
                continue;
            }

            let id = regions.len();
            let mut region = Region {
                id,
                cell_count: 0,
                extent: CellRect {
                    x_min: x,
                    y_min: y,
                    x_max: x + 1,
                    y_max: y + 1,
                },
                seed: (x, y),
                exterior: false,
                wall_contacts: BTreeMap::new(),
            };

            labels[start] = id as u32;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                region.cell_count += 1;
                region.extent.x_min = region.extent.x_min.min(cx);
                region.extent.y_min = region.extent.y_min.min(cy);
                region.extent.x_max = region.extent.x_max.max(cx + 1);
                region.extent.y_max = region.extent.y_max.max(cy + 1);

                let on_border = cx == 0 || cy == 0 || cx + 1 == width || cy + 1 == height;
                if on_border && envelope.is_some_and(|env| !env.contains(cx, cy)) {
                    region.exterior = true;
                }

                let neighbors = [
                    (cx.checked_sub(1), Some(cy), vertical_edge),
                    ((cx + 1 < width).then_some(cx + 1), Some(cy), vertical_edge),
                    (Some(cx), cy.checked_sub(1), horizontal_edge),
                    (Some(cx), (cy + 1 < height).then_some(cy + 1), horizontal_edge),
                ];

                for (nx, ny, edge_length) in neighbors {
                    let (Some(nx), Some(ny)) = (nx, ny) else {
                        continue;
                    };
                    if grid.is_wall(nx, ny) {
                        if let Some(owner) = grid.owner(nx, ny) {
                            *region.wall_contacts.entry(owner).or_insert(0.0) += edge_length;
                        }
                        continue;
                    }
                    let index = ny as usize * width as usize + nx as usize;
                    if labels[index] == NO_REGION {
                        labels[index] = id as u32;
                        queue.push_back((nx, ny));
                    }
                }
            }

            regions.push(region);
        }
    }

    debug!(
        regions = regions.len(),
        exterior = regions.iter().filter(|r| r.exterior).count(),
        "Labeled free space"
    );

    RegionMap {
        width,
        height,
        labels,
        regions,
    }
}
