use std::collections::HashSet;

use tracing::warn;

use crate::{
    api::WallInput,
    error::{FieldError, Result, RoomError},
    types::{BoundingBox, Canvas, WallBox},
};

/// Validate detector output and canvas size together.
///
/// All problems are collected so the caller sees every bad field at once;
/// any problem rejects the whole request.
pub fn validate_input(walls: &[WallInput], image_dimensions: [i64; 2]) -> Result<(Vec<WallBox>, Canvas)> {
    let mut errors = Vec::new();
    let canvas = check_canvas(image_dimensions, &mut errors);
    let validated = check_walls(walls, &mut errors);

    match canvas {
        Some(canvas) if errors.is_empty() => Ok((validated, canvas)),
        _ => Err(RoomError::InputValidation { errors }),
    }
}

/// Validate wall detections on their own
pub fn validate_walls(walls: &[WallInput]) -> Result<Vec<WallBox>> {
    let mut errors = Vec::new();
    let validated = check_walls(walls, &mut errors);
    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(RoomError::InputValidation { errors })
    }
}

/// Validate `[width, height]`
pub fn validate_canvas(image_dimensions: [i64; 2]) -> Result<Canvas> {
    let mut errors = Vec::new();
    check_canvas(image_dimensions, &mut errors).ok_or(RoomError::InputValidation { errors })
}

fn check_canvas(image_dimensions: [i64; 2], errors: &mut Vec<FieldError>) -> Option<Canvas> {
    let mut sides = [0u32; 2];
    for (index, (&value, name)) in image_dimensions.iter().zip(["width", "height"]).enumerate() {
        let field = format!("image_dimensions[{index}]");
        if value <= 0 {
            errors.push(FieldError::new(field, format!("{name} must be positive, got {value}")));
        } else if let Ok(side) = u32::try_from(value) {
            sides[index] = side;
        } else {
            errors.push(FieldError::new(field, format!("{name} {value} is too large")));
        }
    }
    (sides[0] > 0 && sides[1] > 0).then(|| Canvas::new(sides[0], sides[1]))
}

fn check_walls(walls: &[WallInput], errors: &mut Vec<FieldError>) -> Vec<WallBox> {
    let mut validated = Vec::with_capacity(walls.len());
    let mut seen_ids = HashSet::new();

    for (index, wall) in walls.iter().enumerate() {
        let before = errors.len();
        let [x_min, y_min, x_max, y_max] = wall.bounding_box;
        let field = format!("walls[{index}].bounding_box");

        for (value, name) in wall.bounding_box.iter().zip(["x_min", "y_min", "x_max", "y_max"]) {
            if !value.is_finite() {
                errors.push(FieldError::new(&field, format!("{name} is not finite")));
            } else if *value < 0.0 {
                errors.push(FieldError::new(&field, format!("{name} is negative ({value})")));
            }
        }
        // NaN compares false, so only report ordering once coordinates are finite
        if errors.len() == before {
            if x_min >= x_max {
                errors.push(FieldError::new(
                    &field,
                    format!("x_min ({x_min}) must be less than x_max ({x_max})"),
                ));
            }
            if y_min >= y_max {
                errors.push(FieldError::new(
                    &field,
                    format!("y_min ({y_min}) must be less than y_max ({y_max})"),
                ));
            }
        }

        if !(0.0..=1.0).contains(&wall.confidence) {
            errors.push(FieldError::new(
                format!("walls[{index}].confidence"),
                format!("must be within [0, 1], got {}", wall.confidence),
            ));
        }

        if errors.len() > before {
            continue;
        }

        if !seen_ids.insert(wall.id.as_str()) {
            warn!(wall_id = %wall.id, "Duplicate wall id in detector output");
        }

        validated.push(WallBox {
            id: wall.id.clone(),
            rect: BoundingBox {
                x_min,
                y_min,
                x_max,
                y_max,
            },
            confidence: wall.confidence,
        });
    }

    validated
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

    #[test]
    fn test_accepts_valid_input() {
        let walls = vec![wall("wall_001", [10.0, 0.0, 15.0, 100.0], 0.9)];
        let (validated, canvas) = validate_input(&walls, [100, 80]).expect("Should validate");
        assert_eq!(canvas, Canvas::new(100, 80));
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].rect.x_max, 15.0);
    }

    #[test]
    fn test_rejects_inverted_box() {
        let walls = vec![wall("wall_001", [50.0, 0.0, 50.0, 100.0], 0.9)];
        let err = validate_walls(&walls).expect_err("Zero-width wall should be rejected");
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "walls[0].bounding_box");
        assert!(errors[0].message.contains("x_min"));
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_rejects_non_finite_and_negative() {
        let walls = vec![
            wall("a", [f64::NAN, 0.0, 10.0, 10.0], 0.5),
            wall("b", [0.0, -1.0, 10.0, 10.0], 0.5),
            wall("c", [0.0, 0.0, f64::INFINITY, 10.0], 0.5),
        ];
        let err = validate_walls(&walls).expect_err("Should reject");
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["walls[0].bounding_box", "walls[1].bounding_box", "walls[2].bounding_box"]
        );
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let walls = vec![wall("a", [0.0, 0.0, 10.0, 10.0], 1.5)];
        let err = validate_walls(&walls).expect_err("Should reject");
        assert_eq!(err.field_errors()[0].field, "walls[0].confidence");
    }

    #[test]
    fn test_rejects_non_positive_canvas() {
        let err = validate_canvas([0, -5]).expect_err("Should reject");
        assert_eq!(err.field_errors().len(), 2);
        assert!(validate_canvas([i64::MAX, 10]).is_err());
    }

    #[test]
    fn test_collects_canvas_and_wall_errors_together() {
        let walls = vec![wall("a", [5.0, 5.0, 1.0, 10.0], 0.5)];
        let err = validate_input(&walls, [0, 100]).expect_err("Should reject");
        assert_eq!(err.field_errors().len(), 2);
    }
}
