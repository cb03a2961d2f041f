use geo_types::{Coord, LineString};
use tracing::{debug, warn};

use crate::{
    config::{DetectionConfig, SimplificationMethod},
    traits::PolygonSimplifier,
    types::{RoomPolygon, ShapeType, Vertex, to_geo_polygon},
};

/// Drops vertices whose turn angle is below a tolerance.
///
/// Zero-length edges are removed as well. Right-angle corners survive any
/// tolerance under 45 degrees.
#[derive(Debug, Clone)]
pub struct CollinearSimplifier {
    pub tolerance_deg: f64,
}

impl Default for CollinearSimplifier {
    fn default() -> Self {
        Self { tolerance_deg: 1.0 }
    }
}

impl PolygonSimplifier for CollinearSimplifier {
    fn simplify(&self, vertices: &[Vertex]) -> Vec<Vertex> {
        let tolerance = self.tolerance_deg.to_radians();
        let mut ring = vertices.to_vec();

        while ring.len() > 3 {
            let n = ring.len();
            let collinear = (0..n).find(|&i| {
                let prev = ring[(i + n - 1) % n];
                let next = ring[(i + 1) % n];
                turn_angle(prev, ring[i], next) <= tolerance
            });
            match collinear {
                Some(i) => {
                    ring.remove(i);
                }
                None => break,
            }
        }

        ring
    }

    fn name(&self) -> &'static str {
        "collinear"
    }
}

/// Douglas-Peucker using geo crate's implementation.
///
/// Epsilon is `epsilon_factor` times the ring perimeter.
#[derive(Debug, Clone)]
pub struct DouglasPeuckerSimplifier {
    pub epsilon_factor: f64,
}

impl Default for DouglasPeuckerSimplifier {
    fn default() -> Self {
        Self { epsilon_factor: 0.01 }
    }
}

impl PolygonSimplifier for DouglasPeuckerSimplifier {
    fn simplify(&self, vertices: &[Vertex]) -> Vec<Vertex> {
        use geo::Simplify;

        if vertices.len() <= 3 {
            return vertices.to_vec();
        }

        let epsilon = self.epsilon_factor * perimeter(vertices);
        let mut coords: Vec<Coord<f64>> = vertices.iter().map(|&[x, y]| Coord { x, y }).collect();
        coords.push(coords[0]);

        let simplified = LineString::new(coords).simplify(&epsilon);
        let mut ring: Vec<Vertex> = simplified.coords().map(|c| [c.x, c.y]).collect();
        // Drop the closing duplicate
        ring.pop();

        if ring.len() < 3 {
            return vertices.to_vec();
        }
        ring
    }

    fn name(&self) -> &'static str {
        "douglas_peucker"
    }
}

/// Pick the simplifier a configuration asks for
pub fn simplifier_for(config: &DetectionConfig) -> Box<dyn PolygonSimplifier> {
    match config.simplification {
        SimplificationMethod::Collinear => Box::new(CollinearSimplifier {
            tolerance_deg: config.collinear_tolerance_deg,
        }),
        SimplificationMethod::DouglasPeucker { epsilon_factor } => {
            Box::new(DouglasPeuckerSimplifier { epsilon_factor })
        }
    }
}

/// Simplify a traced polygon, keeping the traced ring when the enclosed area
/// would change by more than `max_area_drift` (relative).
pub fn simplify_polygon(polygon: RoomPolygon, simplifier: &dyn PolygonSimplifier, max_area_drift: f64) -> RoomPolygon {
    use geo::Area;

    let simplified = simplifier.simplify(&polygon.vertices);
    if simplified.len() < 3 {
        return polygon;
    }

    let before = polygon.area();
    let after = to_geo_polygon(&simplified).unsigned_area();
    let drift = if before > 0.0 { (after - before).abs() / before } else { 0.0 };

    if drift > max_area_drift {
        warn!(
            region = polygon.region_id,
            simplifier = simplifier.name(),
            drift,
            "Simplification changed area beyond tolerance, keeping traced polygon"
        );
        return polygon;
    }

    debug!(
        region = polygon.region_id,
        before = polygon.len(),
        after = simplified.len(),
        "Simplified polygon"
    );
    RoomPolygon::new(polygon.region_id, simplified)
}

/// Rectangle iff exactly four vertices with every interior angle within
/// `right_angle_tolerance_deg` of 90 degrees
pub fn classify_shape(vertices: &[Vertex], right_angle_tolerance_deg: f64) -> ShapeType {
    if vertices.len() != 4 {
        return ShapeType::Polygon;
    }

    let all_right = (0..4).all(|i| {
        let prev = vertices[(i + 3) % 4];
        let next = vertices[(i + 1) % 4];
        interior_angle_deg(prev, vertices[i], next)
            .is_some_and(|angle| (angle - 90.0).abs() <= right_angle_tolerance_deg)
    });

    if all_right {
        ShapeType::Rectangle
    } else {
        ShapeType::Polygon
    }
}

/// Absolute change of direction at `current`, in radians
fn turn_angle(prev: Vertex, current: Vertex, next: Vertex) -> f64 {
    let a = [current[0] - prev[0], current[1] - prev[1]];
    let b = [next[0] - current[0], next[1] - current[1]];
    let cross = a[0] * b[1] - a[1] * b[0];
    let dot = a[0] * b[0] + a[1] * b[1];
    cross.atan2(dot).abs()
}

/// Angle between the two edges meeting at `vertex`, `None` for zero-length edges
fn interior_angle_deg(prev: Vertex, vertex: Vertex, next: Vertex) -> Option<f64> {
    let a = [prev[0] - vertex[0], prev[1] - vertex[1]];
    let b = [next[0] - vertex[0], next[1] - vertex[1]];
    let norms = a[0].hypot(a[1]) * b[0].hypot(b[1]);
    if norms == 0.0 {
        return None;
    }
    let cos = ((a[0] * b[0] + a[1] * b[1]) / norms).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

fn perimeter(vertices: &[Vertex]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = vertices[i];
            let [x1, y1] = vertices[(i + 1) % n];
            (x1 - x0).hypot(y1 - y0)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle_with_midpoints() -> Vec<Vertex> {
        vec![
            [0.0, 0.0],
            [50.0, 0.0],
            [100.0, 0.0],
            [100.0, 40.0],
            [100.0, 80.0],
            [50.0, 80.0],
            [0.0, 80.0],
            [0.0, 40.0],
        ]
    }

    #[test]
    fn test_collinear_vertices_are_removed() {
        let simplified = CollinearSimplifier::default().simplify(&rectangle_with_midpoints());
        assert_eq!(
            simplified,
            vec![[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]]
        );
    }

    #[test]
    fn test_near_right_angles_are_preserved() {
        // A corner bent by ~1.15 degrees stays with a tight tolerance
        let ring = vec![[0.0, 0.0], [100.0, 0.0], [102.0, 100.0], [0.0, 100.0]];
        let simplified = CollinearSimplifier { tolerance_deg: 0.5 }.simplify(&ring);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_slight_bends_are_flattened() {
        let ring = vec![[0.0, 0.0], [50.0, 0.2], [100.0, 0.0], [100.0, 50.0], [0.0, 50.0]];
        let simplified = CollinearSimplifier { tolerance_deg: 1.0 }.simplify(&ring);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_douglas_peucker_keeps_area() {
        let polygon = RoomPolygon::new(0, rectangle_with_midpoints());
        let simplifier = DouglasPeuckerSimplifier::default();
        let simplified = simplify_polygon(polygon.clone(), &simplifier, 0.01);
        assert_eq!(simplified.len(), 4);
        assert!((simplified.area() - polygon.area()).abs() / polygon.area() < 0.01);
    }

    #[test]
    fn test_area_drift_rejects_simplification() {
        // A deep notch that a coarse Douglas-Peucker pass would erase
        let ring = vec![
            [0.0, 0.0],
            [100.0, 0.0],
            [100.0, 100.0],
            [52.0, 100.0],
            [52.0, 95.0],
            [48.0, 95.0],
            [48.0, 100.0],
            [0.0, 100.0],
        ];
        let polygon = RoomPolygon::new(3, ring);
        let coarse = DouglasPeuckerSimplifier { epsilon_factor: 0.05 };
        let result = simplify_polygon(polygon.clone(), &coarse, 0.001);
        assert_eq!(result, polygon);
    }

    #[test]
    fn test_classify_shape() {
        let rect = vec![[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]];
        assert_eq!(classify_shape(&rect, 2.0), ShapeType::Rectangle);

        let skewed = vec![[0.0, 0.0], [100.0, 0.0], [120.0, 80.0], [20.0, 80.0]];
        assert_eq!(classify_shape(&skewed, 2.0), ShapeType::Polygon);

        let l_shape = vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 5.0],
            [5.0, 5.0],
            [5.0, 10.0],
            [0.0, 10.0],
        ];
        assert_eq!(classify_shape(&l_shape, 2.0), ShapeType::Polygon);
    }

    #[test]
    fn test_simplifier_for_config() {
        let config = DetectionConfig::default();
        assert_eq!(simplifier_for(&config).name(), "collinear");

        let config = DetectionConfig {
            simplification: SimplificationMethod::DouglasPeucker { epsilon_factor: 0.02 },
            ..Default::default()
        };
        assert_eq!(simplifier_for(&config).name(), "douglas_peucker");
    }
}
