use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// A vertex in source image pixel space
pub type Vertex = [f64; 2];

/// Canvas the walls were detected on, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Exact extent of a vertex list, `None` when the list is empty
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        let (&[x, y], rest) = vertices.split_first()?;
        let mut bbox = Self {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        };
        for &[x, y] in rest {
            bbox.x_min = bbox.x_min.min(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_max = bbox.y_max.max(y);
        }
        Some(bbox)
    }
}

/// A validated wall detection.
///
/// Produced from untrusted detector output by
/// [`validate_walls`](crate::algorithms::validate_walls); coordinates are
/// finite, non-negative and strictly ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct WallBox {
    pub id: String,
    pub rect: BoundingBox,
    pub confidence: f64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShapeType {
    /// Four vertices, every corner within tolerance of 90 degrees
    Rectangle,
    Polygon,
}

/// Closed polygon traced from a region, vertices in pixel space.
///
/// The closing edge is implicit: the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPolygon {
    /// Label of the region this polygon was traced from
    pub region_id: usize,
    pub vertices: Vec<Vertex>,
}

impl RoomPolygon {
    pub fn new(region_id: usize, vertices: Vec<Vertex>) -> Self {
        Self { region_id, vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        to_geo_polygon(&self.vertices)
    }

    /// Unsigned shoelace area
    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }
}

/// Build a geo polygon from an open vertex ring
pub fn to_geo_polygon(vertices: &[Vertex]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = vertices.iter().map(|&[x, y]| Coord { x, y }).collect();
    // LineString is closed by Polygon::new
    Polygon::new(LineString::new(coords), vec![])
}

/// A detected room, the sole durable output of a conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Room {
    /// `room_NNN`, numbered by descending area
    pub id: String,
    pub polygon_vertices: Vec<Vertex>,
    pub bounding_box: BoundingBox,
    pub area_pixels: f64,
    /// Area-weighted polygon centroid
    pub centroid: Vertex,
    pub confidence: f64,
    pub shape_type: ShapeType,
    pub num_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_vertices() {
        let bbox = BoundingBox::from_vertices(&[[3.0, 4.0], [10.0, 1.0], [7.0, 9.0]])
            .expect("Should have an extent");
        assert_eq!(bbox.x_min, 3.0);
        assert_eq!(bbox.y_min, 1.0);
        assert_eq!(bbox.x_max, 10.0);
        assert_eq!(bbox.y_max, 9.0);
        assert!(BoundingBox::from_vertices(&[]).is_none());
    }

    #[test]
    fn test_polygon_area_is_orientation_independent() {
        let clockwise = RoomPolygon::new(0, vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]]);
        let counter = RoomPolygon::new(0, vec![[0.0, 0.0], [0.0, 5.0], [10.0, 5.0], [10.0, 0.0]]);
        assert_eq!(clockwise.area(), 50.0);
        assert_eq!(counter.area(), 50.0);
    }

    #[test]
    fn test_shape_type_serializes_snake_case() {
        let json = serde_json::to_string(&ShapeType::Rectangle).expect("Should serialize");
        assert_eq!(json, "\"rectangle\"");
        assert_eq!(ShapeType::Polygon.to_string(), "polygon");
    }
}
