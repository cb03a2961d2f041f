use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::Stage;

/// A single rejected input field, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    /// Path of the offending field, e.g. `walls[2].bounding_box`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Invalid input: {}", summarize(.errors))]
    InputValidation { errors: Vec<FieldError> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Geometry error in region {region}: {message}")]
    Geometry { region: usize, message: String },

    #[error("Detection cancelled before {stage}")]
    Cancelled { stage: Stage },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Malformed room layout: {0}")]
    MalformedLayout(String),
}

impl RoomError {
    /// Stable machine-readable code for error response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputValidation { .. } => "INVALID_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Geometry { .. } => "GEOMETRY_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Field-level details, empty for errors that are not about a request field
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::InputValidation { errors } => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RoomError>;
