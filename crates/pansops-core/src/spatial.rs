//! Planar spatial math: bearing/distance projection, route segments and ring tests.
//!
//! Inputs are already in a projected CRS (meters), so everything here is plain
//! plane trigonometry. Bearings are degrees clockwise from grid north.

use crate::error::{PansOpsError, Result};
use serde::{Deserialize, Serialize};

/// Meters per nautical mile.
pub const NM_TO_M: f64 = 1852.0;
/// Meters per foot.
pub const FT_TO_M: f64 = 0.3048;

/// Tolerance used when comparing projected coordinates.
const EPS_M: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn with_z(self, z: f64) -> Point3 {
        Point3 { x: self.x, y: self.y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Normalize a bearing into [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Point reached by travelling `distance_m` along `azimuth_deg` from `origin`.
///
/// A negative distance projects backward along the same bearing.
pub fn project(origin: Point2, distance_m: f64, azimuth_deg: f64) -> Point2 {
    let rad = normalize_bearing(azimuth_deg).to_radians();
    Point2::new(
        origin.x + distance_m * rad.sin(),
        origin.y + distance_m * rad.cos(),
    )
}

/// Bearing from `a` to `b` in degrees [0, 360).
///
/// Undefined when `a == b`; callers guard against coincident points.
pub fn azimuth(a: Point2, b: Point2) -> f64 {
    normalize_bearing((b.x - a.x).atan2(b.y - a.y).to_degrees())
}

/// Euclidean distance in meters.
pub fn distance(a: Point2, b: Point2) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

pub fn ft_to_m(ft: f64) -> f64 {
    ft * FT_TO_M
}

pub fn m_to_ft(m: f64) -> f64 {
    m / FT_TO_M
}

/// A straight route segment derived from the first and last vertex of a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Point2,
    pub end: Point2,
    /// Bearing start -> end in degrees.
    pub azimuth: f64,
    /// Length in meters.
    pub length: f64,
}

impl RouteSegment {
    pub fn new(start: Point2, end: Point2) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PansOpsError::InvalidInputGeometry(
                "route vertices must be finite".into(),
            ));
        }
        let length = distance(start, end);
        if length <= EPS_M {
            return Err(PansOpsError::InvalidInputGeometry(
                "route endpoints coincide (zero length, undefined azimuth)".into(),
            ));
        }
        Ok(Self {
            start,
            end,
            azimuth: azimuth(start, end),
            length,
        })
    }

    /// Build from a polyline. Intermediate vertices are ignored; `reversed`
    /// swaps which end is treated as the start.
    pub fn from_polyline(vertices: &[Point2], reversed: bool) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(PansOpsError::InvalidInputGeometry(format!(
                "route needs at least 2 vertices, got {}",
                vertices.len()
            )));
        }
        let first = vertices[0];
        let last = vertices[vertices.len() - 1];
        if reversed {
            Self::new(last, first)
        } else {
            Self::new(first, last)
        }
    }

    pub fn back_azimuth(&self) -> f64 {
        normalize_bearing(self.azimuth + 180.0)
    }

    pub fn length_nm(&self) -> f64 {
        self.length / NM_TO_M
    }
}

pub(crate) fn segments_intersect_2d(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
    fn orient(p: Point2, q: Point2, r: Point2) -> f64 {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        let min = a.min(b) - EPS_M;
        let max = a.max(b) + EPS_M;
        value >= min && value <= max
    }

    fn on_segment(p: Point2, q: Point2, r: Point2) -> bool {
        within(p.x, q.x, r.x) && within(p.y, q.y, r.y)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= EPS_M && on_segment(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= EPS_M && on_segment(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= EPS_M && on_segment(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= EPS_M && on_segment(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > EPS_M && o2 < -EPS_M) || (o1 < -EPS_M && o2 > EPS_M);
    let b_crosses = (o3 > EPS_M && o4 < -EPS_M) || (o3 < -EPS_M && o4 > EPS_M);
    a_crosses && b_crosses
}

/// Direction a closed ring is traversed in, with x east and y north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Drop the closing vertex if the ring repeats its first point.
pub(crate) fn open_ring(ring: &[Point2]) -> &[Point2] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && distance(*first, *last) <= EPS_M => {
            &ring[..ring.len() - 1]
        }
        _ => ring,
    }
}

/// Shoelace signed area; positive for counter-clockwise rings.
pub fn signed_area(ring: &[Point2]) -> f64 {
    let ring = open_ring(ring);
    let n = ring.len();
    let mut twice_area = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area / 2.0
}

/// Winding of a ring, or `None` when it encloses no area.
pub fn ring_winding(ring: &[Point2]) -> Option<Winding> {
    let area = signed_area(ring);
    if area.abs() <= EPS_M {
        None
    } else if area > 0.0 {
        Some(Winding::CounterClockwise)
    } else {
        Some(Winding::Clockwise)
    }
}

/// True when no two non-adjacent edges of the (implicitly closed) ring touch.
pub fn ring_is_simple(ring: &[Point2]) -> bool {
    let ring = open_ring(ring);
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a1 = ring[i];
        let a2 = ring[(i + 1) % n];
        if distance(a1, a2) <= EPS_M {
            return false;
        }
        for j in (i + 1)..n {
            // Skip the edge itself and its two neighbours.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = ring[j];
            let b2 = ring[(j + 1) % n];
            if segments_intersect_2d(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// Ray-casting containment test for a ring.
pub fn ring_contains_point(ring: &[Point2], point: Point2) -> bool {
    let ring = open_ring(ring);
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if ((yi > point.y) != (yj > point.y))
            && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}
