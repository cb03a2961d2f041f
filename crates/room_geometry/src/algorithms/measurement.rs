use std::cmp::Ordering;

use geo::{Area, Centroid};
use tracing::debug;

use super::labeling::Region;
use super::simplification::classify_shape;
use crate::{
    config::WHOLE_CANVAS_CONFIDENCE,
    error::{Result, RoomError},
    types::{BoundingBox, Room, RoomPolygon, WallBox},
};

/// Confidence of a region from the walls bounding it.
///
/// Length-weighted mean of the confidences of walls sharing boundary with the
/// region. A region with no attributable wall contact (only possible when no
/// wall reached the grid, or every contact came from gap closing) falls back
/// to the mean wall confidence, or [`WHOLE_CANVAS_CONFIDENCE`] when
/// `grid_has_walls` is false. Walls that all fell outside the canvas are no
/// evidence about it.
pub fn region_confidence(region: &Region, walls: &[WallBox], grid_has_walls: bool) -> f64 {
    let total = region.contact_length();
    if total > 0.0 {
        let weighted: f64 = region
            .wall_contacts
            .iter()
            .map(|(&wall, &length)| walls[wall].confidence * length)
            .sum();
        return (weighted / total).clamp(0.0, 1.0);
    }

    if !grid_has_walls || walls.is_empty() {
        WHOLE_CANVAS_CONFIDENCE
    } else {
        walls.iter().map(|w| w.confidence).sum::<f64>() / walls.len() as f64
    }
}

/// Compute the geometric attributes of a room.
///
/// The id is left empty; [`assign_ids`] numbers rooms once all are built.
pub fn build_room(polygon: RoomPolygon, confidence: f64, right_angle_tolerance_deg: f64) -> Result<Room> {
    let geo_polygon = polygon.to_geo_polygon();
    let area = geo_polygon.unsigned_area();

    let degenerate = |message: &str| RoomError::Geometry {
        region: polygon.region_id,
        message: message.to_string(),
    };

    if area <= 0.0 {
        return Err(degenerate("polygon has zero area"));
    }
    let centroid = geo_polygon
        .centroid()
        .ok_or_else(|| degenerate("polygon has no centroid"))?;
    let bounding_box =
        BoundingBox::from_vertices(&polygon.vertices).ok_or_else(|| degenerate("polygon has no vertices"))?;

    let shape_type = classify_shape(&polygon.vertices, right_angle_tolerance_deg);
    let num_vertices = polygon.vertices.len();

    Ok(Room {
        id: String::new(),
        polygon_vertices: polygon.vertices,
        bounding_box,
        area_pixels: area,
        centroid: [centroid.x(), centroid.y()],
        confidence: confidence.clamp(0.0, 1.0),
        shape_type,
        num_vertices,
    })
}

/// Sort rooms by descending area and number them `room_001`, `room_002`, ...
///
/// Ties are broken by centroid (top to bottom, then left to right) so the
/// numbering never depends on the order walls were supplied in.
pub fn assign_ids(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| {
        b.area_pixels
            .partial_cmp(&a.area_pixels)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.centroid[1].partial_cmp(&b.centroid[1]).unwrap_or(Ordering::Equal))
            .then_with(|| a.centroid[0].partial_cmp(&b.centroid[0]).unwrap_or(Ordering::Equal))
    });

    for (index, room) in rooms.iter_mut().enumerate() {
        room.id = format!("room_{:03}", index + 1);
    }

    debug!(rooms = rooms.len(), "Assigned room ids");
}
