use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use tracing::{debug, warn};

use crate::types::{Canvas, WallBox};

pub const WALL: u8 = 255;
pub const FREE: u8 = 0;

/// Half-open rectangle of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl CellRect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    fn union(self, other: CellRect) -> CellRect {
        CellRect {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// Grid dimensions and the pixel-to-cell scale for a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridResolution {
    pub width: u32,
    pub height: u32,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl GridResolution {
    /// Full resolution when the canvas fits the budget, otherwise a uniform
    /// downscale chosen so `width * height <= max_cells`.
    pub fn for_canvas(canvas: Canvas, max_cells: u64) -> Self {
        let pixels = u64::from(canvas.width) * u64::from(canvas.height);
        if pixels <= max_cells {
            return Self {
                width: canvas.width,
                height: canvas.height,
                scale_x: 1.0,
                scale_y: 1.0,
            };
        }

        let scale = (max_cells as f64 / pixels as f64).sqrt();
        // A side clamped up to one cell leaves the whole budget to the other
        let max_side = u32::try_from(max_cells.max(1)).unwrap_or(u32::MAX);
        let width = ((f64::from(canvas.width) * scale).floor() as u32).clamp(1, max_side);
        let height = ((f64::from(canvas.height) * scale).floor() as u32)
            .clamp(1, u32::try_from(max_cells / u64::from(width)).unwrap_or(u32::MAX).max(1));

        Self {
            width,
            height,
            scale_x: f64::from(width) / f64::from(canvas.width),
            scale_y: f64::from(height) / f64::from(canvas.height),
        }
    }

    pub fn is_downsampled(&self) -> bool {
        self.scale_x < 1.0 || self.scale_y < 1.0
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Map a cell-corner coordinate back to pixel space
    pub fn to_pixel(&self, x: u32, y: u32) -> [f64; 2] {
        [f64::from(x) / self.scale_x, f64::from(y) / self.scale_y]
    }
}

/// Binary wall/free raster over the canvas.
///
/// Cells hold [`WALL`] or [`FREE`]. Alongside the raster the grid keeps, for
/// every wall cell, the index of the most confident wall covering it so that
/// region confidence can be attributed later.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cells: GrayImage,
    owners: Vec<Option<usize>>,
    resolution: GridResolution,
    canvas: Canvas,
    envelope: Option<CellRect>,
    walls_ignored: usize,
}

impl OccupancyGrid {
    pub fn width(&self) -> u32 {
        self.cells.width()
    }

    pub fn height(&self) -> u32 {
        self.cells.height()
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    pub fn is_wall(&self, x: u32, y: u32) -> bool {
        self.cells.get_pixel(x, y)[0] == WALL
    }

    /// Index (into the validated wall list) of the wall owning a cell
    pub fn owner(&self, x: u32, y: u32) -> Option<usize> {
        self.owners[self.index(x, y)]
    }

    /// Bounding rectangle of all wall cells, `None` when no wall landed on the grid
    pub fn wall_envelope(&self) -> Option<CellRect> {
        self.envelope
    }

    pub fn has_walls(&self) -> bool {
        self.envelope.is_some()
    }

    /// Walls that fell entirely outside the canvas
    pub fn walls_ignored(&self) -> usize {
        self.walls_ignored
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.cells
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.cells.width() as usize + x as usize
    }
}

/// Project wall rectangles onto an occupancy grid.
///
/// Every wall is filled, not outlined. Overlapping walls union into the same
/// cells; a cell shared by several walls is owned by the most confident one.
pub fn rasterize(walls: &[WallBox], canvas: Canvas, max_cells: u64, gap_closing_radius: u8) -> OccupancyGrid {
    let resolution = GridResolution::for_canvas(canvas, max_cells);
    let mut cells = GrayImage::from_pixel(resolution.width, resolution.height, Luma([FREE]));
    let mut owners: Vec<Option<usize>> = vec![None; resolution.cell_count() as usize];
    let mut envelope: Option<CellRect> = None;
    let mut walls_ignored = 0;

    debug!(
        grid_width = resolution.width,
        grid_height = resolution.height,
        scale_x = resolution.scale_x,
        scale_y = resolution.scale_y,
        "Rasterizing {} walls",
        walls.len()
    );

    for (index, wall) in walls.iter().enumerate() {
        let Some(rect) = wall_cells(wall, &resolution) else {
            warn!(wall_id = %wall.id, "Wall lies outside the canvas, ignoring");
            walls_ignored += 1;
            continue;
        };

        for y in rect.y_min..rect.y_max {
            for x in rect.x_min..rect.x_max {
                cells.put_pixel(x, y, Luma([WALL]));
                let owner = &mut owners[y as usize * resolution.width as usize + x as usize];
                let replace = match *owner {
                    Some(current) => walls[current].confidence < wall.confidence,
                    None => true,
                };
                if replace {
                    *owner = Some(index);
                }
            }
        }

        envelope = Some(envelope.map_or(rect, |env| env.union(rect)));
    }

    if gap_closing_radius > 0 && envelope.is_some() {
        // Closing fills wall gaps narrower than twice the radius; the new
        // cells have no owner and do not contribute to confidence.
        let closed = imageproc::morphology::close(&cells, Norm::LInf, gap_closing_radius);
        let added = closed
            .pixels()
            .zip(cells.pixels())
            .filter(|(after, before)| after[0] == WALL && before[0] == FREE)
            .count();
        debug!(radius = gap_closing_radius, added, "Closed gaps in wall mask");
        cells = closed;
    }

    OccupancyGrid {
        cells,
        owners,
        resolution,
        canvas,
        envelope,
        walls_ignored,
    }
}

/// Cells covered by a wall, clipped to the grid
fn wall_cells(wall: &WallBox, resolution: &GridResolution) -> Option<CellRect> {
    let clip = |value: f64, scale: f64, limit: u32, round: fn(f64) -> f64| -> u32 {
        round(value * scale).clamp(0.0, f64::from(limit)) as u32
    };

    let rect = CellRect {
        x_min: clip(wall.rect.x_min, resolution.scale_x, resolution.width, f64::floor),
        y_min: clip(wall.rect.y_min, resolution.scale_y, resolution.height, f64::floor),
        x_max: clip(wall.rect.x_max, resolution.scale_x, resolution.width, f64::ceil),
        y_max: clip(wall.rect.y_max, resolution.scale_y, resolution.height, f64::ceil),
    };

    (rect.x_min < rect.x_max && rect.y_min < rect.y_max).then_some(rect)
}
