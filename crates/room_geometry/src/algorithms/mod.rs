pub mod validation;
pub mod rasterization;
pub mod labeling;
pub mod extraction;
pub mod simplification;
pub mod measurement;
pub mod filtering;

pub use validation::*;
pub use rasterization::{rasterize, CellRect, GridResolution, OccupancyGrid};
pub use labeling::{label_regions, Region, RegionMap};
pub use extraction::{extract_polygon, extract_polygons, trace_region};
pub use simplification::*;
pub use measurement::*;
pub use filtering::*;
