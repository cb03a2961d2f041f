pub mod builder;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info};

use crate::{
    algorithms::{
        assign_ids, build_room, extract_polygons, filter_by_min_area, label_regions, rasterize,
        region_confidence, simplify_polygon, validate_input,
    },
    api::WallInput,
    config::DetectionConfig,
    error::{Result, RoomError},
    traits::{CancellationSignal, PolygonSimplifier},
    types::{Canvas, Room, WallBox},
};

/// Stages of a conversion, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Validate,
    Rasterize,
    Label,
    Trace,
    Simplify,
    Build,
    Filter,
}

/// Diagnostics gathered while converting one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub walls_processed: usize,
    /// Walls entirely outside the canvas
    pub walls_ignored: usize,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Cells per pixel along x (1.0 unless downsampled)
    pub scale: f64,
    pub regions_found: usize,
    pub exterior_regions: usize,
    /// Rooms dropped by the minimum area filter
    pub rooms_filtered: usize,
}

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub canvas: Canvas,
    pub rooms: Vec<Room>,
    pub stats: PipelineStats,
}

/// Wall-to-room conversion pipeline.
///
/// Runs Validate, Rasterize, Label, Trace, Simplify, Build and Filter once per
/// call, in that order. The pipeline holds no per-request state, so one
/// instance can serve concurrent calls from several threads.
pub struct Pipeline {
    config: DetectionConfig,
    simplifier: Box<dyn PolygonSimplifier>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(config: DetectionConfig, simplifier: Box<dyn PolygonSimplifier>) -> Self {
        Self { config, simplifier }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Convert untrusted detector output into rooms
    pub fn detect(
        &self,
        walls: &[WallInput],
        image_dimensions: [i64; 2],
        cancel: &dyn CancellationSignal,
    ) -> Result<DetectionOutcome> {
        self.config.validate()?;
        let (walls, canvas) = validate_input(walls, image_dimensions)?;
        self.run(&walls, canvas, cancel)
    }

    /// Convert walls that have already been validated
    pub fn detect_validated(
        &self,
        walls: &[WallBox],
        canvas: Canvas,
        cancel: &dyn CancellationSignal,
    ) -> Result<DetectionOutcome> {
        self.config.validate()?;
        self.run(walls, canvas, cancel)
    }

    fn run(&self, walls: &[WallBox], canvas: Canvas, cancel: &dyn CancellationSignal) -> Result<DetectionOutcome> {
        let config = &self.config;
        checkpoint(cancel, Stage::Rasterize)?;

        // Step 1: Project walls onto the occupancy grid
        let grid = rasterize(walls, canvas, config.max_grid_cells, config.gap_closing_radius);
        let resolution = grid.resolution();

        // Step 2: Label free space
        let map = label_regions(&grid);
        checkpoint(cancel, Stage::Trace)?;

        // Step 3: Trace interior regions
        let polygons = extract_polygons(&map, &resolution)?;
        checkpoint(cancel, Stage::Simplify)?;

        // Step 4: Simplify
        let polygons: Vec<_> = polygons
            .into_iter()
            .map(|polygon| simplify_polygon(polygon, self.simplifier.as_ref(), config.max_area_drift))
            .collect();
        checkpoint(cancel, Stage::Build)?;

        // Step 5: Measure and number rooms
        let mut rooms = polygons
            .into_iter()
            .map(|polygon| {
                let region = &map.regions[polygon.region_id];
                let confidence = region_confidence(region, walls, grid.has_walls());
                build_room(polygon, confidence, config.right_angle_tolerance_deg)
            })
            .collect::<Result<Vec<_>>>()?;
        assign_ids(&mut rooms);

        // Step 6: Drop rooms below the minimum area
        let rooms_filtered = filter_by_min_area(&mut rooms, config.min_room_area);

        let stats = PipelineStats {
            walls_processed: walls.len(),
            walls_ignored: grid.walls_ignored(),
            grid_width: grid.width(),
            grid_height: grid.height(),
            scale: resolution.scale_x,
            regions_found: map.regions.len(),
            exterior_regions: map.regions.iter().filter(|r| r.exterior).count(),
            rooms_filtered,
        };

        info!(
            rooms = rooms.len(),
            regions = stats.regions_found,
            filtered = rooms_filtered,
            "Converted walls to rooms"
        );
        debug!(?stats, "Pipeline statistics");

        Ok(DetectionOutcome { canvas, rooms, stats })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} simplifier, min room area {}, grid budget {} cells",
            self.simplifier.name(),
            self.config.min_room_area,
            self.config.max_grid_cells
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn checkpoint(cancel: &dyn CancellationSignal, next: Stage) -> Result<()> {
    if cancel.is_cancelled() {
        info!(stage = %next, "Detection cancelled");
        return Err(RoomError::Cancelled { stage: next });
    }
    Ok(())
}
