//! # Room Geometry
//!
//! Converts wall detections (axis-aligned rectangles from an upstream
//! detector) into room polygons with areas, centroids, shape labels and
//! confidences.
//!
//! ## Core Features
//!
//! - **Occupancy-grid conversion**: walls are rasterized, free space is
//!   labeled into regions and each enclosed region is traced into a polygon
//! - **Pipeline System**: stages run in a fixed order with cancellation
//!   checkpoints between them
//! - **Pluggable simplification**: collinear removal or Douglas-Peucker via
//!   the [`PolygonSimplifier`] trait
//! - **GeoJSON Support**: export/import of room layouts
//! - **Visualization**: optional PNG overlay of the detected rooms
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use room_geometry::{Pipeline, WallInput, NeverCancel};
//!
//! let walls = vec![
//!     WallInput { id: "wall_001".into(), bounding_box: [48.0, 0.0, 52.0, 100.0], confidence: 0.85 },
//!     WallInput { id: "wall_002".into(), bounding_box: [0.0, 0.0, 100.0, 4.0], confidence: 0.80 },
//! ];
//!
//! let pipeline = Pipeline::builder().min_room_area(500.0).build();
//! let outcome = pipeline.detect(&walls, [100, 100], &NeverCancel)?;
//! for room in &outcome.rooms {
//!     println!("{} {:.0}px² {}", room.id, room.area_pixels, room.shape_type);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Serving Requests
//!
//! ```rust,no_run
//! use room_geometry::{process_request, DetectionConfig, Deadline, RoomDetectionRequest};
//! use std::time::Duration;
//!
//! let request: RoomDetectionRequest = serde_json::from_str(r#"{
//!     "walls": [{ "id": "w", "bounding_box": [48, 0, 52, 100], "confidence": 0.9 }],
//!     "image_dimensions": [100, 100]
//! }"#)?;
//! let response = process_request(&request, &DetectionConfig::default(), &Deadline::after(Duration::from_secs(5)))?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod cancellation;
pub mod algorithms;
pub mod pipeline;
pub mod api;
pub mod render;
pub mod io;

// Re-exports for convenience
pub use error::{FieldError, Result, RoomError};
pub use types::{BoundingBox, Canvas, Room, RoomPolygon, ShapeType, Vertex, WallBox};
pub use config::{DetectionConfig, SimplificationMethod};
pub use traits::*;
pub use cancellation::{CancellationFlag, Deadline, NeverCancel};
pub use pipeline::{DetectionOutcome, Pipeline, PipelineStats, Stage, builder::PipelineBuilder};
pub use api::{
    ErrorBody, ErrorResponse, ResponseMetadata, RoomDetectionRequest, RoomDetectionResponse, WallInput,
    process_request, validate_request,
};
pub use render::RoomRenderer;
pub use io::RoomLayout;

/// Serve a request with the default configuration and no cancellation
pub fn detect_rooms(request: &RoomDetectionRequest) -> Result<RoomDetectionResponse> {
    process_request(request, &DetectionConfig::default(), &NeverCancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(id: &str, bounding_box: [f64; 4], confidence: f64) -> WallInput {
        WallInput {
            id: id.to_string(),
            bounding_box,
            confidence,
        }
    }

    fn request(walls: Vec<WallInput>, image_dimensions: [i64; 2], min_room_area: f64) -> RoomDetectionRequest {
        RoomDetectionRequest {
            walls,
            image_dimensions,
            min_room_area,
            return_visualization: false,
        }
    }

    fn grid_walls() -> Vec<WallInput> {
        vec![
            wall("v1", [33.0, 0.0, 37.0, 100.0], 0.9),
            wall("v2", [66.0, 0.0, 70.0, 100.0], 0.8),
            wall("h1", [0.0, 33.0, 100.0, 37.0], 0.7),
            wall("h2", [0.0, 66.0, 100.0, 70.0], 0.6),
        ]
    }

    /// Frame of 8px walls around a 609x515 floor plan split into three rooms
    fn floor_plan_walls() -> Vec<WallInput> {
        vec![
            wall("top", [0.0, 0.0, 609.0, 8.0], 0.95),
            wall("bottom", [0.0, 507.0, 609.0, 515.0], 0.93),
            wall("left", [0.0, 0.0, 8.0, 515.0], 0.91),
            wall("right", [601.0, 0.0, 609.0, 515.0], 0.90),
            wall("divider", [300.0, 0.0, 308.0, 515.0], 0.88),
            wall("hall", [0.0, 250.0, 300.0, 258.0], 0.85),
        ]
    }

    #[test]
    fn test_no_walls_yields_whole_canvas() {
        let response = detect_rooms(&request(vec![], [100, 100], 2000.0)).expect("Should process");
        assert_eq!(response.total_rooms, 1);

        let room = &response.rooms[0];
        assert_eq!(room.id, "room_001");
        assert_eq!(room.area_pixels, 10_000.0);
        assert_eq!(room.confidence, 1.0);
        assert_eq!(room.shape_type, ShapeType::Rectangle);
        assert!((room.centroid[0] - 50.0).abs() < 1e-9);
        assert!((room.centroid[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_divider_splits_canvas_in_two() {
        let walls = vec![
            wall("wall_001", [48.0, 0.0, 52.0, 100.0], 0.85),
            wall("wall_002", [0.0, 0.0, 100.0, 4.0], 0.80),
        ];
        let response = detect_rooms(&request(walls, [100, 100], 2000.0)).expect("Should process");
        assert_eq!(response.total_rooms, 2);
        for room in &response.rooms {
            assert_eq!(room.area_pixels, 4608.0);
            assert_eq!(room.shape_type, ShapeType::Rectangle);
        }
        // Equal areas: numbered left to right
        assert!(response.rooms[0].centroid[0] < response.rooms[1].centroid[0]);
    }

    #[test]
    fn test_full_span_grid_yields_nine_rooms() {
        let response = detect_rooms(&request(grid_walls(), [100, 100], 100.0)).expect("Should process");
        assert_eq!(response.total_rooms, 9);
        assert_eq!(response.rooms[0].area_pixels, 33.0 * 33.0);
        assert_eq!(response.rooms[8].area_pixels, 29.0 * 29.0);
        let ids: Vec<_> = response.rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids[0], "room_001");
        assert_eq!(ids[8], "room_009");
    }

    #[test]
    fn test_inverted_wall_is_rejected() {
        let walls = vec![wall("bad", [50.0, 0.0, 50.0, 100.0], 0.9)];
        let err = detect_rooms(&request(walls, [100, 100], 2000.0)).expect_err("Should reject");
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.field_errors()[0].field, "walls[0].bounding_box");
    }

    #[test]
    fn test_small_room_is_filtered() {
        let walls = vec![
            wall("top", [0.0, 0.0, 100.0, 2.0], 0.9),
            wall("bottom", [0.0, 98.0, 100.0, 100.0], 0.9),
            wall("left", [0.0, 0.0, 2.0, 100.0], 0.9),
            wall("right", [98.0, 0.0, 100.0, 100.0], 0.9),
            // Closet enclosing a 10x15 pocket
            wall("closet_left", [8.0, 8.0, 10.0, 27.0], 0.7),
            wall("closet_right", [20.0, 8.0, 22.0, 27.0], 0.7),
            wall("closet_top", [8.0, 8.0, 22.0, 10.0], 0.7),
            wall("closet_bottom", [8.0, 25.0, 22.0, 27.0], 0.7),
        ];

        let unfiltered = detect_rooms(&request(walls.clone(), [100, 100], 0.0)).expect("Should process");
        assert_eq!(unfiltered.total_rooms, 2);
        assert_eq!(unfiltered.rooms[1].area_pixels, 150.0);

        let filtered = detect_rooms(&request(walls, [100, 100], 2000.0)).expect("Should process");
        assert_eq!(filtered.total_rooms, 1);
        assert!(filtered.rooms.iter().all(|r| r.area_pixels >= 2000.0));
    }

    #[test]
    fn test_floor_plan_finishes_quickly() {
        let response = detect_rooms(&request(floor_plan_walls(), [609, 515], 2000.0)).expect("Should process");
        assert_eq!(response.total_rooms, 3);
        assert!(response.processing_time_ms < 1000.0);
        assert_eq!(response.metadata.image_dimensions, [609, 515]);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let request = request(floor_plan_walls(), [609, 515], 2000.0);
        let first = detect_rooms(&request).expect("Should process");
        let second = detect_rooms(&request).expect("Should process");
        assert_eq!(first.rooms, second.rooms);
    }

    #[test]
    fn test_wall_order_does_not_matter() {
        let forward = detect_rooms(&request(grid_walls(), [100, 100], 100.0)).expect("Should process");
        let mut reversed_walls = grid_walls();
        reversed_walls.reverse();
        let reversed = detect_rooms(&request(reversed_walls, [100, 100], 100.0)).expect("Should process");

        assert_eq!(forward.total_rooms, reversed.total_rooms);
        for (a, b) in forward.rooms.iter().zip(&reversed.rooms) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.polygon_vertices, b.polygon_vertices);
            assert_eq!(a.area_pixels, b.area_pixels);
            assert!((a.confidence - b.confidence).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rooms_stay_within_canvas() {
        for (walls, dims, min_area) in [
            (grid_walls(), [100, 100], 100.0),
            (floor_plan_walls(), [609, 515], 2000.0),
        ] {
            let response = detect_rooms(&request(walls, dims, min_area)).expect("Should process");
            let (width, height) = (dims[0] as f64, dims[1] as f64);

            let total: f64 = response.rooms.iter().map(|r| r.area_pixels).sum();
            assert!(total <= width * height);

            for room in &response.rooms {
                assert!(room.num_vertices >= 3);
                assert_eq!(room.num_vertices, room.polygon_vertices.len());
                assert!((0.0..=1.0).contains(&room.confidence));
                for &[x, y] in &room.polygon_vertices {
                    assert!((0.0..=width).contains(&x) && (0.0..=height).contains(&y));
                }
            }
        }
    }

    #[test]
    fn test_reported_area_matches_vertices() {
        let response = detect_rooms(&request(floor_plan_walls(), [609, 515], 2000.0)).expect("Should process");
        for room in &response.rooms {
            let shoelace = RoomPolygon::new(0, room.polygon_vertices.clone()).area();
            assert!((shoelace - room.area_pixels).abs() <= room.area_pixels * 0.005);
        }
    }

    #[test]
    fn test_downsampled_canvas_keeps_pixel_space() {
        // 400x400 at a 10k cell budget is traced on a 100x100 grid
        let config = DetectionConfig {
            max_grid_cells: 10_000,
            ..DetectionConfig::default()
        };
        let walls = vec![
            wall("top", [0.0, 0.0, 400.0, 8.0], 0.9),
            wall("bottom", [0.0, 392.0, 400.0, 400.0], 0.9),
            wall("left", [0.0, 0.0, 8.0, 400.0], 0.9),
            wall("right", [392.0, 0.0, 400.0, 400.0], 0.9),
            wall("divider", [196.0, 0.0, 204.0, 400.0], 0.9),
        ];
        let response =
            process_request(&request(walls, [400, 400], 2000.0), &config, &NeverCancel).expect("Should process");

        assert_eq!(response.total_rooms, 2);
        assert_eq!(response.metadata.image_dimensions, [400, 400]);

        let left = &response.rooms[0];
        assert_eq!(
            left.polygon_vertices,
            vec![[8.0, 8.0], [196.0, 8.0], [196.0, 392.0], [8.0, 392.0]]
        );
        assert_eq!(left.area_pixels, 188.0 * 384.0);

        let right = &response.rooms[1];
        assert_eq!(right.bounding_box.x_min, 204.0);
        assert_eq!(right.bounding_box.x_max, 392.0);
        assert_eq!(right.area_pixels, 188.0 * 384.0);
    }
}
