use crate::{
    algorithms::simplifier_for,
    config::{DetectionConfig, SimplificationMethod},
    pipeline::Pipeline,
    traits::PolygonSimplifier,
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    config: DetectionConfig,
    simplifier: Option<Box<dyn PolygonSimplifier>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DetectionConfig::default(),
            simplifier: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn min_room_area(mut self, min_room_area: f64) -> Self {
        self.config.min_room_area = min_room_area;
        self
    }

    /// Cell budget above which the canvas is downsampled
    pub fn max_grid_cells(mut self, max_grid_cells: u64) -> Self {
        self.config.max_grid_cells = max_grid_cells;
        self
    }

    /// Bridge wall gaps up to twice `radius` cells wide
    pub fn with_gap_closing(mut self, radius: u8) -> Self {
        self.config.gap_closing_radius = radius;
        self
    }

    /// Use Douglas-Peucker simplification instead of collinear removal
    pub fn with_douglas_peucker(mut self, epsilon_factor: f64) -> Self {
        self.config.simplification = SimplificationMethod::DouglasPeucker { epsilon_factor };
        self
    }

    /// Set a custom simplifier (overrides the configured method)
    pub fn set_simplifier<S>(mut self, simplifier: S) -> Self
    where
        S: PolygonSimplifier + 'static,
    {
        self.simplifier = Some(Box::new(simplifier));
        self
    }

    /// Build the pipeline, deriving the simplifier from the configuration if none was set
    pub fn build(self) -> Pipeline {
        let simplifier = self
            .simplifier
            .unwrap_or_else(|| simplifier_for(&self.config));
        Pipeline::new(self.config, simplifier)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
