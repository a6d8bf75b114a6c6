//! ILS obstacle assessment surfaces (OAS) from plane coefficients.
//!
//! Each of the four surfaces W, X, Y and Z is a plane `h = A*x + B*y + C` in a
//! runway frame: x along the approach (positive away from the threshold,
//! against the landing direction), y lateral (positive left of the landing
//! direction), h height above threshold. Corner points come from intersecting
//! adjacent planes at a target height; the right side is the mirror image.

use crate::error::{PansOpsError, Result};
use crate::spatial::{project, Point2, Point3, RouteSegment};
use crate::surface::{CalculationResult, ProtectionSurface};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Height of the upper template corners above threshold, meters.
pub const OAS_TEMPLATE_HEIGHT_M: f64 = 300.0;

/// Determinants smaller than this mean the planes are parallel in (A, B).
const DETERMINANT_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Plane {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn height_at(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlaneName {
    W,
    X,
    Y,
    Z,
}

impl PlaneName {
    pub const ALL: [PlaneName; 4] = [PlaneName::W, PlaneName::X, PlaneName::Y, PlaneName::Z];

    pub fn letter(&self) -> char {
        match self {
            PlaneName::W => 'W',
            PlaneName::X => 'X',
            PlaneName::Y => 'Y',
            PlaneName::Z => 'Z',
        }
    }
}

/// The four OAS planes, validated complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OasCoefficients {
    pub w: Plane,
    pub x: Plane,
    pub y: Plane,
    pub z: Plane,
}

impl OasCoefficients {
    /// Build from a table keyed `"WA"`, `"WB"`, `"WC"`, ... `"ZC"`.
    ///
    /// All 12 entries are required; every missing key is named in the error.
    pub fn from_table(table: &BTreeMap<String, f64>) -> Result<Self> {
        let mut missing = Vec::new();
        let mut planes = [Plane::new(0.0, 0.0, 0.0); 4];

        for (plane, name) in planes.iter_mut().zip(PlaneName::ALL) {
            let mut coeffs = [0.0; 3];
            for (slot, letter) in coeffs.iter_mut().zip(['A', 'B', 'C']) {
                let key = format!("{}{}", name.letter(), letter);
                match table.get(&key) {
                    Some(v) if v.is_finite() => *slot = *v,
                    _ => missing.push(key),
                }
            }
            *plane = Plane::new(coeffs[0], coeffs[1], coeffs[2]);
        }

        if !missing.is_empty() {
            return Err(PansOpsError::MissingConfiguration(format!(
                "OAS coefficients {}",
                missing.join(", ")
            )));
        }

        let [w, x, y, z] = planes;
        Ok(Self { w, x, y, z })
    }

    pub fn plane(&self, name: PlaneName) -> &Plane {
        match name {
            PlaneName::W => &self.w,
            PlaneName::X => &self.x,
            PlaneName::Y => &self.y,
            PlaneName::Z => &self.z,
        }
    }
}

/// Solve `A1*x + B1*y = h - C1`, `A2*x + B2*y = h - C2`.
pub fn solve_plane_intersection(p1: &Plane, p2: &Plane, target_height: f64) -> Result<Point2> {
    let det = p1.a * p2.b - p2.a * p1.b;
    if det.abs() < DETERMINANT_EPS || !det.is_finite() {
        return Err(PansOpsError::DegenerateGeometry(format!(
            "planes ({}, {}, {}) and ({}, {}, {}) are parallel at h = {target_height}",
            p1.a, p1.b, p1.c, p2.a, p2.b, p2.c
        )));
    }
    let r1 = target_height - p1.c;
    let r2 = target_height - p2.c;
    Ok(Point2::new(
        (r1 * p2.b - r2 * p1.b) / det,
        (p1.a * r2 - p2.a * r1) / det,
    ))
}

fn solve_named(
    coefficients: &OasCoefficients,
    first: PlaneName,
    second: PlaneName,
    target_height: f64,
) -> Result<Point3> {
    solve_plane_intersection(
        coefficients.plane(first),
        coefficients.plane(second),
        target_height,
    )
    .map(|p| p.with_z(target_height))
    .map_err(|_| {
        PansOpsError::DegenerateGeometry(format!(
            "planes {first:?} and {second:?} do not intersect at h = {target_height} m"
        ))
    })
}

/// Reflect a runway-frame point across the approach centerline.
pub fn mirror(p: Point3) -> Point3 {
    Point3::new(p.x, -p.y, p.z)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    C,
    D,
    E,
}

/// Corner points in the runway frame: C = W/X, D = X/Y, E = Y/Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OasCorners {
    pub lower: [Point3; 3],
    pub upper: [Point3; 3],
    pub upper_height_m: f64,
}

impl OasCorners {
    pub fn solve(coefficients: &OasCoefficients, upper_height_m: f64) -> Result<Self> {
        let pairs = [
            (PlaneName::W, PlaneName::X),
            (PlaneName::X, PlaneName::Y),
            (PlaneName::Y, PlaneName::Z),
        ];
        let mut lower = [Point3::new(0.0, 0.0, 0.0); 3];
        let mut upper = lower;
        for (i, (a, b)) in pairs.into_iter().enumerate() {
            lower[i] = solve_named(coefficients, a, b, 0.0)?;
            upper[i] = solve_named(coefficients, a, b, upper_height_m)?;
        }
        Ok(Self {
            lower,
            upper,
            upper_height_m,
        })
    }

    pub fn get(&self, corner: CornerRef) -> Point3 {
        let idx = match corner.corner {
            Corner::C => 0,
            Corner::D => 1,
            Corner::E => 2,
        };
        let p = if corner.upper {
            self.upper[idx]
        } else {
            self.lower[idx]
        };
        if corner.mirrored {
            mirror(p)
        } else {
            p
        }
    }
}

/// Reference to one of the twelve named corner points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerRef {
    pub corner: Corner,
    pub upper: bool,
    pub mirrored: bool,
}

const fn lo(corner: Corner) -> CornerRef {
    CornerRef { corner, upper: false, mirrored: false }
}
const fn up(corner: Corner) -> CornerRef {
    CornerRef { corner, upper: true, mirrored: false }
}
const fn lo_m(corner: Corner) -> CornerRef {
    CornerRef { corner, upper: false, mirrored: true }
}
const fn up_m(corner: Corner) -> CornerRef {
    CornerRef { corner, upper: true, mirrored: true }
}

use Corner::{C, D, E};

/// Surface faces by corner name. Unmirrored points are left of the landing direction.
pub const OAS_FACES: &[(&str, &[CornerRef])] = &[
    ("Surface Y - Left", &[lo(D), lo(E), up(E), up(D)]),
    ("Surface Y - Right", &[lo_m(D), up_m(D), up_m(E), lo_m(E)]),
    ("Surface X - Left", &[up(C), up(D), lo(D), lo(C)]),
    ("Surface X - Right", &[up_m(C), up_m(D), lo_m(D), lo_m(C)]),
    ("Surface W", &[up(C), up_m(C), lo_m(C), lo(C)]),
    ("Surface Z", &[lo(E), lo_m(E), up_m(E), up(E)]),
    ("Ground", &[lo_m(C), lo(C), lo(D), lo(E), lo_m(E), lo_m(D)]),
];

/// Places runway-frame points on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunwayFrame {
    pub threshold: Point2,
    pub threshold_elevation_m: f64,
    /// Landing direction, degrees.
    pub landing_azimuth: f64,
}

impl RunwayFrame {
    pub fn to_map(&self, local: Point3) -> Point3 {
        let along = project(self.threshold, local.x, self.landing_azimuth + 180.0);
        project(along, local.y, self.landing_azimuth - 90.0)
            .with_z(self.threshold_elevation_m + local.z)
    }
}

/// Height above threshold for extended OAS: FAP altitude less the intermediate MOC.
pub fn extension_height(fap_elevation_m: f64, moc_intermediate_m: f64, thr_elevation_m: f64) -> f64 {
    fap_elevation_m - moc_intermediate_m - thr_elevation_m
}

fn default_moc_intermediate() -> f64 {
    150.0
}

/// ILS OAS request. The runway route runs from the threshold in the landing direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OasIlsParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub threshold_elevation_m: f64,
    /// Plane coefficient table keyed "WA" .. "ZC".
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
    /// FAP altitude in meters; when set the upper corners use the extension height.
    #[serde(default)]
    pub fap_elevation_m: Option<f64>,
    #[serde(default = "default_moc_intermediate")]
    pub moc_intermediate_m: f64,
}

pub fn calculate_oas_ils(params: &OasIlsParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let coefficients = OasCoefficients::from_table(&params.coefficients)?;

    let upper_height_m = match params.fap_elevation_m {
        Some(fap) => {
            let h = extension_height(fap, params.moc_intermediate_m, params.threshold_elevation_m);
            if !(h.is_finite() && h > 0.0) {
                return Err(PansOpsError::ParameterOutOfRange(format!(
                    "extension height {h:.2} m must be above the threshold"
                )));
            }
            h
        }
        None => OAS_TEMPLATE_HEIGHT_M,
    };

    let corners = OasCorners::solve(&coefficients, upper_height_m)?;
    let frame = RunwayFrame {
        threshold: runway.start,
        threshold_elevation_m: params.threshold_elevation_m,
        landing_azimuth: runway.azimuth,
    };

    let mut result = CalculationResult::new("oas_ils");
    for (name, refs) in OAS_FACES {
        let ring: Vec<Point3> = refs.iter().map(|r| frame.to_map(corners.get(*r))).collect();
        result.push(ProtectionSurface::polygon(*name, ring)?.with_meta("surface", "OAS"));
    }

    result.set("upper_height_m", upper_height_m);
    for (corner, (lower, upper)) in ["C", "D", "E"]
        .iter()
        .zip(corners.lower.iter().zip(corners.upper.iter()))
    {
        result.set(format!("{corner}_x_m"), lower.x);
        result.set(format!("{corner}_y_m"), lower.y);
        result.set(format!("{corner}'_x_m"), upper.x);
        result.set(format!("{corner}'_y_m"), upper.y);
    }
    Ok(result)
}
