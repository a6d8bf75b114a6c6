//! Elevation rules that lift corridor rings into 3D.
//!
//! Elevation is a function of the longitudinal station only. Lateral offset
//! never changes Z, except for the outer-edge MOC rule.

use crate::corridor::{Edge, RingVertex};
use crate::error::{require_non_negative, PansOpsError, Result};
use crate::spatial::Point3;
use serde::{Deserialize, Serialize};

/// Linear elevation along a segment: `base + position * gradient / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Elevation at the corridor anchor (position 0), meters.
    pub base_elevation_m: f64,
    /// Signed gradient in percent; positive climbs in the direction of travel.
    pub gradient_percent: f64,
}

impl ElevationProfile {
    pub fn level(elevation_m: f64) -> Self {
        Self {
            base_elevation_m: elevation_m,
            gradient_percent: 0.0,
        }
    }

    pub fn at(&self, position_m: f64) -> f64 {
        self.base_elevation_m + position_m * self.gradient_percent / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum ElevationRule {
    /// Every vertex at one elevation.
    Constant { elevation_m: f64 },
    /// Station elevation from a gradient profile.
    Gradient(ElevationProfile),
    /// Primary and centerline vertices follow `primary`; outer secondary
    /// vertices sit `moc_m` above it.
    OuterPlusMoc { primary: ElevationProfile, moc_m: f64 },
}

impl ElevationRule {
    pub fn validate(&self) -> Result<()> {
        let finite = match *self {
            ElevationRule::Constant { elevation_m } => elevation_m.is_finite(),
            ElevationRule::Gradient(p) => {
                p.base_elevation_m.is_finite() && p.gradient_percent.is_finite()
            }
            ElevationRule::OuterPlusMoc { primary, moc_m } => {
                require_non_negative("MOC", moc_m)?;
                primary.base_elevation_m.is_finite() && primary.gradient_percent.is_finite()
            }
        };
        if finite {
            Ok(())
        } else {
            Err(PansOpsError::ParameterOutOfRange(
                "elevation rule contains a non-finite value".into(),
            ))
        }
    }

    /// Elevation on the centerline at a station.
    pub fn elevation_at(&self, position_m: f64) -> f64 {
        match *self {
            ElevationRule::Constant { elevation_m } => elevation_m,
            ElevationRule::Gradient(profile) => profile.at(position_m),
            ElevationRule::OuterPlusMoc { primary, .. } => primary.at(position_m),
        }
    }

    pub fn elevation(&self, vertex: &RingVertex) -> f64 {
        let z = self.elevation_at(vertex.position_m);
        match *self {
            ElevationRule::OuterPlusMoc { moc_m, .. } if vertex.edge == Edge::Secondary => z + moc_m,
            _ => z,
        }
    }

    pub fn lift(&self, ring: &[RingVertex]) -> Vec<Point3> {
        ring.iter()
            .map(|v| v.point.with_z(self.elevation(v)))
            .collect()
    }
}
