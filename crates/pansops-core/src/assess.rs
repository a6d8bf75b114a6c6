//! Obstacle assessment against computed surfaces.
//!
//! Containment is plan-view only. Where a surface carries Z values its height
//! at the obstacle comes from the triangle of an ear-clipped triangulation that
//! holds the obstacle, by barycentric interpolation.

use crate::spatial::{ring_contains_point, Point2};
use crate::surface::{ProtectionSurface, Shape, Vertex};
use geo::{Coord, LineString, Polygon, TriangulateEarcut};
use serde::{Deserialize, Serialize};

/// Barycentric weights below this are treated as outside the triangle.
const BARY_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub elevation_m: f64,
}

impl Obstacle {
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// An obstacle found inside a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleHit {
    pub obstacle_id: String,
    pub surface: String,
    /// Surface height under the obstacle; absent for 2D surfaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_height_m: Option<f64>,
    /// Positive when the obstacle pierces the surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penetration_m: Option<f64>,
}

impl ObstacleHit {
    pub fn penetrates(&self) -> bool {
        self.penetration_m.is_some_and(|p| p > 0.0)
    }
}

/// Every (obstacle, surface) pair where the obstacle lies inside the polygon.
/// Line surfaces are skipped.
pub fn assess_obstacles(surfaces: &[ProtectionSurface], obstacles: &[Obstacle]) -> Vec<ObstacleHit> {
    let mut hits = Vec::new();
    for surface in surfaces.iter().filter(|s| s.shape == Shape::Polygon) {
        let outline = surface.outline();
        let holes: Vec<Vec<Point2>> = surface
            .holes
            .iter()
            .map(|h| h.iter().map(Vertex::xy).collect())
            .collect();
        let triangles = if surface.is_3d() {
            triangulate(surface)
        } else {
            Vec::new()
        };

        for obstacle in obstacles {
            let p = obstacle.point();
            if !ring_contains_point(&outline, p) || holes.iter().any(|h| ring_contains_point(h, p)) {
                continue;
            }
            let surface_height_m = triangles.iter().find_map(|t| height_in_triangle(t, p));
            hits.push(ObstacleHit {
                obstacle_id: obstacle.id.clone(),
                surface: surface.name.clone(),
                surface_height_m,
                penetration_m: surface_height_m.map(|h| obstacle.elevation_m - h),
            });
        }
    }
    hits
}

type Triangle3 = [Vertex; 3];

fn to_line_string(ring: &[Vertex]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|v| Coord { x: v.x, y: v.y })
            .collect::<Vec<_>>(),
    )
}

/// Ear-clipped triangles with each corner's Z recovered from the source vertex.
fn triangulate(surface: &ProtectionSurface) -> Vec<Triangle3> {
    let polygon = Polygon::new(
        to_line_string(&surface.vertices),
        surface.holes.iter().map(|h| to_line_string(h)).collect(),
    );
    let lookup: Vec<&Vertex> = surface
        .vertices
        .iter()
        .chain(surface.holes.iter().flatten())
        .collect();
    let z_of = |c: Coord<f64>| {
        lookup
            .iter()
            .find(|v| v.x == c.x && v.y == c.y)
            .and_then(|v| v.z)
    };

    polygon
        .earcut_triangles()
        .into_iter()
        .filter_map(|t| {
            let corner = |c: Coord<f64>| {
                z_of(c).map(|z| Vertex {
                    x: c.x,
                    y: c.y,
                    z: Some(z),
                })
            };
            Some([corner(t.v1())?, corner(t.v2())?, corner(t.v3())?])
        })
        .collect()
}

fn height_in_triangle(t: &Triangle3, p: Point2) -> Option<f64> {
    let [a, b, c] = t;
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let l1 = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let l2 = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    let l3 = 1.0 - l1 - l2;
    if l1 < -BARY_EPS || l2 < -BARY_EPS || l3 < -BARY_EPS {
        return None;
    }
    Some(l1 * a.z? + l2 * b.z? + l3 * c.z?)
}

/// Obstacle height relative to a runway threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeObstacle {
    pub id: String,
    pub elevation_m: f64,
    pub height_above_threshold_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSplit {
    /// At or above the threshold elevation.
    pub higher: Vec<RelativeObstacle>,
    pub lower: Vec<RelativeObstacle>,
}

pub fn split_by_threshold(obstacles: &[Obstacle], threshold_elevation_m: f64) -> ThresholdSplit {
    let mut split = ThresholdSplit::default();
    for obstacle in obstacles {
        let relative = RelativeObstacle {
            id: obstacle.id.clone(),
            elevation_m: obstacle.elevation_m,
            height_above_threshold_m: obstacle.elevation_m - threshold_elevation_m,
        };
        if obstacle.elevation_m >= threshold_elevation_m {
            split.higher.push(relative);
        } else {
            split.lower.push(relative);
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Point3;

    fn obstacle(id: &str, x: f64, y: f64, elevation_m: f64) -> Obstacle {
        Obstacle {
            id: id.into(),
            x,
            y,
            elevation_m,
        }
    }

    /// 1000 m square rising 0 -> 100 m from south to north.
    fn ramp() -> ProtectionSurface {
        ProtectionSurface::polygon(
            "Ramp",
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1000.0, 100.0),
                Point3::new(1000.0, 1000.0, 100.0),
                Point3::new(1000.0, 0.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_height_is_interpolated_on_a_ramp() {
        let hits = assess_obstacles(
            &[ramp()],
            &[
                obstacle("mast", 250.0, 500.0, 60.0),
                obstacle("tree", 900.0, 200.0, 10.0),
                obstacle("outside", -5.0, 500.0, 500.0),
            ],
        );
        assert_eq!(hits.len(), 2);
        let mast = &hits[0];
        assert!((mast.surface_height_m.unwrap() - 50.0).abs() < 1e-9);
        assert!((mast.penetration_m.unwrap() - 10.0).abs() < 1e-9);
        assert!(mast.penetrates());
        let tree = &hits[1];
        assert!((tree.penetration_m.unwrap() + 10.0).abs() < 1e-9);
        assert!(!tree.penetrates());
    }

    #[test]
    fn test_concave_surface_height() {
        // L-shaped level surface at 30 m.
        let surface = ProtectionSurface::polygon(
            "L",
            [
                Point3::new(0.0, 0.0, 30.0),
                Point3::new(0.0, 200.0, 30.0),
                Point3::new(100.0, 200.0, 30.0),
                Point3::new(100.0, 100.0, 30.0),
                Point3::new(200.0, 100.0, 30.0),
                Point3::new(200.0, 0.0, 30.0),
            ],
        )
        .unwrap();
        let hits = assess_obstacles(
            &[surface],
            &[obstacle("in", 150.0, 50.0, 45.0), obstacle("notch", 150.0, 150.0, 45.0)],
        );
        assert_eq!(hits.len(), 1);
        assert!((hits[0].penetration_m.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_holes_and_flat_surfaces() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 100.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 0.0),
        ];
        let hole = vec![
            Vertex::from(Point2::new(40.0, 40.0)),
            Vertex::from(Point2::new(60.0, 40.0)),
            Vertex::from(Point2::new(60.0, 60.0)),
            Vertex::from(Point2::new(40.0, 60.0)),
        ];
        let surface = ProtectionSurface::polygon("Flat", square)
            .unwrap()
            .with_hole(hole)
            .unwrap();
        let hits = assess_obstacles(
            &[surface],
            &[obstacle("ring", 10.0, 10.0, 5.0), obstacle("hole", 50.0, 50.0, 5.0)],
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].obstacle_id, "ring");
        assert!(hits[0].surface_height_m.is_none());
        assert!(!hits[0].penetrates());
    }

    #[test]
    fn test_split_by_threshold() {
        let obstacles = [
            obstacle("a", 0.0, 0.0, 120.0),
            obstacle("b", 0.0, 0.0, 100.0),
            obstacle("c", 0.0, 0.0, 80.0),
        ];
        let split = split_by_threshold(&obstacles, 100.0);
        assert_eq!(split.higher.len(), 2);
        assert_eq!(split.lower.len(), 1);
        assert_eq!(split.higher[1].height_above_threshold_m, 0.0);
        assert_eq!(split.lower[0].height_above_threshold_m, -20.0);
    }
}
