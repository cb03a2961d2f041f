use std::time::Instant;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    algorithms::validate_input,
    config::{DEFAULT_MIN_ROOM_AREA, DetectionConfig},
    error::{FieldError, Result, RoomError},
    pipeline::Pipeline,
    render::RoomRenderer,
    traits::CancellationSignal,
    types::{Canvas, Room, WallBox},
};

/// A wall as reported by the upstream detector (untrusted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WallInput {
    pub id: String,
    /// `[x_min, y_min, x_max, y_max]` in pixels
    pub bounding_box: [f64; 4],
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

fn default_min_room_area() -> f64 {
    DEFAULT_MIN_ROOM_AREA
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoomDetectionRequest {
    pub walls: Vec<WallInput>,
    /// `[width, height]` in pixels
    pub image_dimensions: [i64; 2],
    #[serde(default = "default_min_room_area")]
    pub min_room_area: f64,
    #[serde(default)]
    pub return_visualization: bool,
}

impl RoomDetectionRequest {
    /// Get the JSON schema for requests
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RoomDetectionRequest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseMetadata {
    pub image_dimensions: [u32; 2],
    pub walls_processed: usize,
    pub min_room_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoomDetectionResponse {
    pub success: bool,
    pub rooms: Vec<Room>,
    pub total_rooms: usize,
    pub processing_time_ms: f64,
    pub metadata: ResponseMetadata,
    /// Base64-encoded PNG overlay, present only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<String>,
}

impl RoomDetectionResponse {
    /// Get the JSON schema for responses
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RoomDetectionResponse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl From<&RoomError> for ErrorResponse {
    fn from(err: &RoomError) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
                details: err.field_errors().to_vec(),
            },
        }
    }
}

/// Validate every request field, reporting all offending fields at once
pub fn validate_request(request: &RoomDetectionRequest) -> Result<(Vec<WallBox>, Canvas)> {
    let mut errors = Vec::new();
    if !request.min_room_area.is_finite() || request.min_room_area < 0.0 {
        errors.push(FieldError::new(
            "min_room_area",
            format!("must be a non-negative number, got {}", request.min_room_area),
        ));
    }

    match validate_input(&request.walls, request.image_dimensions) {
        Ok(validated) if errors.is_empty() => Ok(validated),
        Ok(_) => Err(RoomError::InputValidation { errors }),
        Err(RoomError::InputValidation { errors: input_errors }) => {
            errors.extend(input_errors);
            Err(RoomError::InputValidation { errors })
        }
        Err(other) => Err(other),
    }
}

/// Serve one request.
///
/// `base` supplies every tunable except `min_room_area`, which comes from the
/// request. The visualization is rendered only when asked for and when at
/// least one room survived filtering.
pub fn process_request(
    request: &RoomDetectionRequest,
    base: &DetectionConfig,
    cancel: &dyn CancellationSignal,
) -> Result<RoomDetectionResponse> {
    let started = Instant::now();

    let (walls, canvas) = validate_request(request)?;
    let config = base.clone().with_min_room_area(request.min_room_area);
    let pipeline = Pipeline::builder().config(config).build();
    let outcome = pipeline.detect_validated(&walls, canvas, cancel)?;

    let visualization = if request.return_visualization && !outcome.rooms.is_empty() {
        Some(RoomRenderer::default().render_base64(&outcome.rooms, outcome.canvas)?)
    } else {
        None
    };

    let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        rooms = outcome.rooms.len(),
        walls = request.walls.len(),
        processing_time_ms,
        "Processed room detection request"
    );

    Ok(RoomDetectionResponse {
        success: true,
        total_rooms: outcome.rooms.len(),
        rooms: outcome.rooms,
        processing_time_ms,
        metadata: ResponseMetadata {
            image_dimensions: [outcome.canvas.width, outcome.canvas.height],
            walls_processed: request.walls.len(),
            min_room_area: request.min_room_area,
        },
        visualization,
    })
}
