use std::path::Path;

use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use serde_json::Number;

use crate::{
    error::{Result, RoomError},
    pipeline::DetectionOutcome,
    types::{BoundingBox, Canvas, Room, ShapeType, Vertex},
};

/// Rooms together with the canvas they were detected on
#[derive(Debug, Clone, PartialEq)]
pub struct RoomLayout {
    pub canvas: Canvas,
    pub rooms: Vec<Room>,
}

impl From<DetectionOutcome> for RoomLayout {
    fn from(outcome: DetectionOutcome) -> Self {
        Self {
            canvas: outcome.canvas,
            rooms: outcome.rooms,
        }
    }
}

impl RoomLayout {
    pub fn new(canvas: Canvas, rooms: Vec<Room>) -> Self {
        Self { canvas, rooms }
    }

    /// Export as a FeatureCollection, one Polygon feature per room
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self.rooms.iter().map(room_feature).collect::<Result<Vec<_>>>()?;

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("image_width".to_string(), self.canvas.width.into());
        foreign_members.insert("image_height".to_string(), self.canvas.height.into());
        foreign_members.insert("room_count".to_string(), self.rooms.len().into());

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    /// Load a layout from a GeoJSON file
    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_string(&geojson_str)
    }

    /// Load a layout from a GeoJSON string previously written by [`Self::to_geojson_string`]
    pub fn from_geojson_string(geojson_str: &str) -> Result<Self> {
        let collection: FeatureCollection = geojson_str.parse()?;

        let foreign_members = collection
            .foreign_members
            .as_ref()
            .ok_or_else(|| malformed("missing canvas metadata"))?;
        let dimension = |key: &str| {
            foreign_members
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| malformed(format!("missing or invalid {key}")))
        };
        let canvas = Canvas::new(dimension("image_width")?, dimension("image_height")?);

        let rooms = collection
            .features
            .iter()
            .map(feature_room)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { canvas, rooms })
    }
}

fn room_feature(room: &Room) -> Result<Feature> {
    // GeoJSON rings repeat the first position at the end
    let mut ring: Vec<Vec<f64>> = room.polygon_vertices.iter().map(|&[x, y]| vec![x, y]).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), room.id.clone().into());
    properties.insert("area".to_string(), number(room.area_pixels)?.into());
    properties.insert("confidence".to_string(), number(room.confidence)?.into());
    properties.insert("shape_type".to_string(), room.shape_type.to_string().into());
    properties.insert("num_vertices".to_string(), room.num_vertices.into());
    properties.insert(
        "centroid".to_string(),
        serde_json::Value::Array(vec![
            number(room.centroid[0])?.into(),
            number(room.centroid[1])?.into(),
        ]),
    );

    Ok(Feature {
        bbox: Some(vec![
            room.bounding_box.x_min,
            room.bounding_box.y_min,
            room.bounding_box.x_max,
            room.bounding_box.y_max,
        ]),
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: Some(Id::String(room.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    })
}

fn feature_room(feature: &Feature) -> Result<Room> {
    let ring = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => rings.first().ok_or_else(|| malformed("polygon without rings"))?,
        _ => return Err(malformed("feature is not a polygon")),
    };

    let mut vertices = ring
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok([*x, *y]),
            _ => Err(malformed("position with fewer than two coordinates")),
        })
        .collect::<Result<Vec<Vertex>>>()?;
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    let properties = feature
        .properties
        .as_ref()
        .ok_or_else(|| malformed("feature without properties"))?;
    let float = |key: &str| {
        properties
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| malformed(format!("missing or invalid {key}")))
    };

    let id = properties
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("missing room id"))?
        .to_string();
    let shape_type = properties
        .get("shape_type")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<ShapeType>().ok())
        .ok_or_else(|| malformed(format!("invalid shape_type for {id}")))?;
    let centroid = match properties.get("centroid").and_then(|v| v.as_array()).map(Vec::as_slice) {
        Some([x, y]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => [x, y],
            _ => return Err(malformed(format!("invalid centroid for {id}"))),
        },
        _ => return Err(malformed(format!("invalid centroid for {id}"))),
    };
    let bounding_box =
        BoundingBox::from_vertices(&vertices).ok_or_else(|| malformed(format!("empty polygon for {id}")))?;

    Ok(Room {
        num_vertices: vertices.len(),
        polygon_vertices: vertices,
        bounding_box,
        area_pixels: float("area")?,
        centroid,
        confidence: float("confidence")?,
        shape_type,
        id,
    })
}

fn number(value: f64) -> Result<Number> {
    Number::from_f64(value).ok_or_else(|| malformed(format!("non-finite value {value}")))
}

fn malformed(message: impl Into<String>) -> RoomError {
    RoomError::MalformedLayout(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RoomLayout {
        let room = Room {
            id: "room_001".to_string(),
            polygon_vertices: vec![[0.0, 4.0], [48.0, 4.0], [48.0, 100.0], [0.0, 100.0]],
            bounding_box: BoundingBox {
                x_min: 0.0,
                y_min: 4.0,
                x_max: 48.0,
                y_max: 100.0,
            },
            area_pixels: 4608.0,
            centroid: [24.0, 52.0],
            confidence: 0.83,
            shape_type: ShapeType::Rectangle,
            num_vertices: 4,
        };
        RoomLayout::new(Canvas::new(100, 100), vec![room])
    }

    #[test]
    fn test_geojson_export() {
        let collection = layout().to_geojson().expect("Should create GeoJSON");
        assert_eq!(collection.features.len(), 1);

        let foreign = collection.foreign_members.as_ref().expect("Should carry metadata");
        assert_eq!(foreign["image_width"], 100);
        assert_eq!(foreign["room_count"], 1);

        let feature = &collection.features[0];
        let properties = feature.properties.as_ref().expect("Should have properties");
        assert_eq!(properties["id"], "room_001");
        assert_eq!(properties["shape_type"], "rectangle");

        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Polygon(rings)) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("Expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_geojson_string_loads_back() {
        let original = layout();
        let text = original.to_geojson_string().expect("Should serialize");
        let loaded = RoomLayout::from_geojson_string(&text).expect("Should load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_metadata_is_rejected() {
        let text = r#"{"type": "FeatureCollection", "features": []}"#;
        let err = RoomLayout::from_geojson_string(text).expect_err("Should reject");
        assert!(matches!(err, RoomError::MalformedLayout(_)));
    }
}
