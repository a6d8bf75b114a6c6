//! Corridor and splay geometry builder.
//!
//! A corridor is described by lateral half-widths sampled at longitudinal
//! stations along a route segment. Stations are projected once into
//! `{center, left, right}` records, and rings are assembled from those records
//! with one canonical winding: left boundary in the direction of travel, then
//! the right boundary back against it. With x east and y north every ring built
//! here is clockwise.

use crate::error::{PansOpsError, Result};
use crate::spatial::{normalize_bearing, project, Point2, NM_TO_M};
use serde::{Deserialize, Serialize};

/// Positions closer than this are treated as the same station.
const STATION_EPS_M: f64 = 1e-6;
/// Tolerance for the 2:1 secondary/primary width check, in NM.
const RATIO_EPS_NM: f64 = 1e-6;

/// One lateral sample of a width profile, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthSample {
    /// Signed distance from the corridor anchor along the azimuth.
    pub position_m: f64,
    pub half_width_left_m: f64,
    pub half_width_right_m: f64,
}

/// Ordered half-width samples along a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorWidthProfile {
    samples: Vec<WidthSample>,
}

impl CorridorWidthProfile {
    /// Samples must be in strictly increasing position with non-negative widths.
    pub fn new(samples: Vec<WidthSample>) -> Result<Self> {
        if samples.len() < 2 {
            return Err(PansOpsError::InvalidInputGeometry(format!(
                "width profile needs at least 2 stations, got {}",
                samples.len()
            )));
        }
        for pair in samples.windows(2) {
            if pair[1].position_m - pair[0].position_m <= STATION_EPS_M {
                return Err(PansOpsError::DegenerateGeometry(format!(
                    "stations must advance along the segment ({} m then {} m)",
                    pair[0].position_m, pair[1].position_m
                )));
            }
        }
        for s in &samples {
            let values = [s.position_m, s.half_width_left_m, s.half_width_right_m];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(PansOpsError::DegenerateGeometry(
                    "width profile contains a non-finite value".into(),
                ));
            }
            if s.half_width_left_m < 0.0 || s.half_width_right_m < 0.0 {
                return Err(PansOpsError::ParameterOutOfRange(format!(
                    "negative half-width at station {} m",
                    s.position_m
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Same half-width on both sides at every station.
    pub fn symmetric(stations: &[(f64, f64)]) -> Result<Self> {
        Self::new(
            stations
                .iter()
                .map(|&(position_m, half_width_m)| WidthSample {
                    position_m,
                    half_width_left_m: half_width_m,
                    half_width_right_m: half_width_m,
                })
                .collect(),
        )
    }

    pub fn samples(&self) -> &[WidthSample] {
        &self.samples
    }

    /// Linearly interpolated (left, right) half-widths, clamped to the end stations.
    pub fn interpolate(&self, position_m: f64) -> (f64, f64) {
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        if position_m <= first.position_m {
            return (first.half_width_left_m, first.half_width_right_m);
        }
        if position_m >= last.position_m {
            return (last.half_width_left_m, last.half_width_right_m);
        }
        for pair in self.samples.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if position_m <= b.position_m {
                let t = (position_m - a.position_m) / (b.position_m - a.position_m);
                return (
                    a.half_width_left_m + t * (b.half_width_left_m - a.half_width_left_m),
                    a.half_width_right_m + t * (b.half_width_right_m - a.half_width_right_m),
                );
            }
        }
        (last.half_width_left_m, last.half_width_right_m)
    }

    fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.position_m)
    }
}

/// Length needed to change half-width by `delta_width` at a splay angle.
pub fn splay_length(delta_width: f64, splay_deg: f64) -> Result<f64> {
    if !(splay_deg > 0.0 && splay_deg < 90.0) {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "splay angle must be within (0, 90) degrees (got {splay_deg})"
        )));
    }
    Ok(delta_width.abs() / splay_deg.to_radians().tan())
}

/// Primary and secondary half-widths at one station, nautical miles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationWidth {
    pub position_nm: f64,
    pub primary_nm: f64,
    pub secondary_nm: f64,
}

/// Per-procedure corridor description in NM, converted to meters once by
/// [`CorridorDescriptor::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorDescriptor {
    stations: Vec<StationWidth>,
}

impl CorridorDescriptor {
    pub fn starting_at(position_nm: f64, primary_nm: f64, secondary_nm: f64) -> Self {
        Self {
            stations: vec![StationWidth {
                position_nm,
                primary_nm,
                secondary_nm,
            }],
        }
    }

    /// Constant width up to `position_nm`. No-op if the corridor already reaches it.
    pub fn hold_to(mut self, position_nm: f64) -> Self {
        let last = self.last();
        if position_nm > last.position_nm {
            self.stations.push(StationWidth {
                position_nm,
                ..last
            });
        }
        self
    }

    /// Splay from the last station to new widths; the transition length comes
    /// from the secondary width change.
    pub fn splay(mut self, splay_deg: f64, primary_nm: f64, secondary_nm: f64) -> Result<Self> {
        let last = self.last();
        let length = splay_length(secondary_nm - last.secondary_nm, splay_deg)?;
        self.stations.push(StationWidth {
            position_nm: last.position_nm + length,
            primary_nm,
            secondary_nm,
        });
        Ok(self)
    }

    /// Hold the current width, then splay so the new widths are reached exactly at `end_nm`.
    pub fn splay_ending_at(
        self,
        end_nm: f64,
        splay_deg: f64,
        primary_nm: f64,
        secondary_nm: f64,
    ) -> Result<Self> {
        let last = self.last();
        let length = splay_length(secondary_nm - last.secondary_nm, splay_deg)?;
        let splay_start = end_nm - length;
        if splay_start < last.position_nm - STATION_EPS_M / NM_TO_M {
            return Err(PansOpsError::ParameterOutOfRange(format!(
                "segment too short for a {splay_deg} degree splay ({:.3} NM needed)",
                length
            )));
        }
        Ok(self.hold_to(splay_start).taper_to(end_nm, primary_nm, secondary_nm))
    }

    /// Linear widening or narrowing between the last station and `position_nm`.
    pub fn taper_to(mut self, position_nm: f64, primary_nm: f64, secondary_nm: f64) -> Self {
        self.stations.push(StationWidth {
            position_nm,
            primary_nm,
            secondary_nm,
        });
        self
    }

    pub fn stations(&self) -> &[StationWidth] {
        &self.stations
    }

    fn last(&self) -> StationWidth {
        self.stations[self.stations.len() - 1]
    }

    /// One warning per station where the secondary width is not twice the primary.
    pub fn ratio_warnings(&self) -> Vec<String> {
        self.stations
            .iter()
            .filter(|s| (s.secondary_nm - 2.0 * s.primary_nm).abs() > RATIO_EPS_NM)
            .map(|s| {
                format!(
                    "secondary half-width {:.3} NM is not twice the primary {:.3} NM at {:.3} NM",
                    s.secondary_nm, s.primary_nm, s.position_nm
                )
            })
            .collect()
    }

    /// Primary and secondary profiles in meters.
    pub fn width_profiles(&self) -> Result<(CorridorWidthProfile, CorridorWidthProfile)> {
        for s in &self.stations {
            if s.primary_nm <= 0.0 || s.secondary_nm < s.primary_nm {
                return Err(PansOpsError::ParameterOutOfRange(format!(
                    "need 0 < primary <= secondary at {:.3} NM (primary {}, secondary {})",
                    s.position_nm, s.primary_nm, s.secondary_nm
                )));
            }
        }
        let primary: Vec<(f64, f64)> = self
            .stations
            .iter()
            .map(|s| (s.position_nm * NM_TO_M, s.primary_nm * NM_TO_M))
            .collect();
        let secondary: Vec<(f64, f64)> = self
            .stations
            .iter()
            .map(|s| (s.position_nm * NM_TO_M, s.secondary_nm * NM_TO_M))
            .collect();
        Ok((
            CorridorWidthProfile::symmetric(&primary)?,
            CorridorWidthProfile::symmetric(&secondary)?,
        ))
    }

    pub fn build(&self, anchor: Point2, azimuth_deg: f64) -> Result<Corridor> {
        let (primary, secondary) = self.width_profiles()?;
        Corridor::build(anchor, azimuth_deg, &primary, Some(&secondary))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateralPair {
    pub left: Point2,
    pub right: Point2,
}

/// Projected points at one longitudinal station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub position_m: f64,
    pub center: Point2,
    pub primary: LateralPair,
    pub secondary: Option<LateralPair>,
}

/// Which boundary a ring vertex lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Centerline,
    Primary,
    Secondary,
}

/// A ring vertex tagged with its station, so elevation rules can work per station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingVertex {
    pub point: Point2,
    pub position_m: f64,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub anchor: Point2,
    pub azimuth: f64,
    pub stations: Vec<Station>,
}

impl Corridor {
    /// Project every station of the profiles from `anchor` along `azimuth_deg`.
    ///
    /// The secondary profile, when present, is sampled at the union of both
    /// profiles' stations so primary and secondary edges stay paired.
    pub fn build(
        anchor: Point2,
        azimuth_deg: f64,
        primary: &CorridorWidthProfile,
        secondary: Option<&CorridorWidthProfile>,
    ) -> Result<Self> {
        if !anchor.is_finite() || !azimuth_deg.is_finite() {
            return Err(PansOpsError::InvalidInputGeometry(
                "corridor anchor and azimuth must be finite".into(),
            ));
        }
        let azimuth = normalize_bearing(azimuth_deg);

        let mut positions: Vec<f64> = primary.positions().collect();
        if let Some(sec) = secondary {
            positions.extend(sec.positions());
            positions.sort_by(f64::total_cmp);
            positions.dedup_by(|a, b| (*a - *b).abs() <= STATION_EPS_M);
        }

        let stations = positions
            .into_iter()
            .map(|position_m| {
                let center = project(anchor, position_m, azimuth);
                let (pl, pr) = primary.interpolate(position_m);
                let primary = LateralPair {
                    left: project(center, pl, azimuth - 90.0),
                    right: project(center, pr, azimuth + 90.0),
                };
                let secondary = secondary.map(|profile| {
                    let (sl, sr) = profile.interpolate(position_m);
                    LateralPair {
                        left: project(center, sl, azimuth - 90.0),
                        right: project(center, sr, azimuth + 90.0),
                    }
                });
                Station {
                    position_m,
                    center,
                    primary,
                    secondary,
                }
            })
            .collect();

        Ok(Self {
            anchor,
            azimuth,
            stations,
        })
    }

    pub fn first(&self) -> &Station {
        &self.stations[0]
    }

    pub fn last(&self) -> &Station {
        &self.stations[self.stations.len() - 1]
    }

    pub fn has_secondary(&self) -> bool {
        self.stations.iter().all(|s| s.secondary.is_some())
    }

    /// Left primary edge forward, end center, right primary edge reversed, start center.
    pub fn primary_ring(&self) -> Vec<RingVertex> {
        let mut ring = Vec::with_capacity(2 * self.stations.len() + 2);
        for s in &self.stations {
            ring.push(vertex(s.primary.left, s, Edge::Primary));
        }
        let end = self.last();
        ring.push(vertex(end.center, end, Edge::Centerline));
        for s in self.stations.iter().rev() {
            ring.push(vertex(s.primary.right, s, Edge::Primary));
        }
        let start = self.first();
        ring.push(vertex(start.center, start, Edge::Centerline));
        ring
    }

    /// Primary boundary without the centerline vertices.
    pub fn boundary_ring(&self) -> Vec<RingVertex> {
        let mut ring: Vec<RingVertex> = self
            .stations
            .iter()
            .map(|s| vertex(s.primary.left, s, Edge::Primary))
            .collect();
        ring.extend(
            self.stations
                .iter()
                .rev()
                .map(|s| vertex(s.primary.right, s, Edge::Primary)),
        );
        ring
    }

    /// Outer left edge forward, then the primary left edge reversed.
    pub fn secondary_left_ring(&self) -> Result<Vec<RingVertex>> {
        let mut ring = Vec::with_capacity(2 * self.stations.len());
        for s in &self.stations {
            ring.push(vertex(self.secondary_of(s)?.left, s, Edge::Secondary));
        }
        for s in self.stations.iter().rev() {
            ring.push(vertex(s.primary.left, s, Edge::Primary));
        }
        Ok(ring)
    }

    /// Primary right edge forward, then the outer right edge reversed.
    pub fn secondary_right_ring(&self) -> Result<Vec<RingVertex>> {
        let mut ring = Vec::with_capacity(2 * self.stations.len());
        for s in &self.stations {
            ring.push(vertex(s.primary.right, s, Edge::Primary));
        }
        for s in self.stations.iter().rev() {
            ring.push(vertex(self.secondary_of(s)?.right, s, Edge::Secondary));
        }
        Ok(ring)
    }

    /// Lateral line across the corridor at a station, outer left to outer right.
    pub fn station_line(&self, station: &Station) -> Vec<RingVertex> {
        let mut line = Vec::with_capacity(5);
        if let Some(sec) = station.secondary {
            line.push(vertex(sec.left, station, Edge::Secondary));
        }
        line.push(vertex(station.primary.left, station, Edge::Primary));
        line.push(vertex(station.center, station, Edge::Centerline));
        line.push(vertex(station.primary.right, station, Edge::Primary));
        if let Some(sec) = station.secondary {
            line.push(vertex(sec.right, station, Edge::Secondary));
        }
        line
    }

    pub fn centerline(&self) -> Vec<RingVertex> {
        let start = self.first();
        let end = self.last();
        vec![
            vertex(start.center, start, Edge::Centerline),
            vertex(end.center, end, Edge::Centerline),
        ]
    }

    fn secondary_of(&self, station: &Station) -> Result<LateralPair> {
        station.secondary.ok_or_else(|| {
            PansOpsError::MissingConfiguration(format!(
                "no secondary width at station {} m",
                station.position_m
            ))
        })
    }
}

fn vertex(point: Point2, station: &Station, edge: Edge) -> RingVertex {
    RingVertex {
        point,
        position_m: station.position_m,
        edge,
    }
}

/// Strip station tags from a ring.
pub fn ring_points(ring: &[RingVertex]) -> Vec<Point2> {
    ring.iter().map(|v| v.point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{distance, ring_is_simple, ring_winding, Winding};

    fn rnav1() -> CorridorDescriptor {
        CorridorDescriptor::starting_at(0.0, 1.25, 2.5).hold_to(10.0)
    }

    #[test]
    fn test_constant_corridor_ring_sizes() {
        let corridor = rnav1().build(Point2::new(0.0, 0.0), 0.0).unwrap();
        assert_eq!(corridor.stations.len(), 2);
        assert_eq!(corridor.primary_ring().len(), 6);
        assert_eq!(corridor.secondary_left_ring().unwrap().len(), 4);
        assert_eq!(corridor.secondary_right_ring().unwrap().len(), 4);
        let boundary = ring_points(&corridor.boundary_ring());
        assert_eq!(boundary.len(), 4);
        assert_eq!(ring_winding(&boundary), Some(Winding::Clockwise));
    }

    #[test]
    fn test_left_is_west_when_heading_north() {
        let corridor = rnav1().build(Point2::new(0.0, 0.0), 0.0).unwrap();
        let start = corridor.first();
        assert!((start.primary.left.x + 1.25 * NM_TO_M).abs() < 1e-9);
        assert!((start.primary.right.x - 1.25 * NM_TO_M).abs() < 1e-9);
        let sec = start.secondary.unwrap();
        assert!((sec.left.x + 2.5 * NM_TO_M).abs() < 1e-9);
        assert!((corridor.last().center.y - 10.0 * NM_TO_M).abs() < 1e-6);
    }

    #[test]
    fn test_rings_are_simple_and_clockwise() {
        for az in [0.0, 37.5, 90.0, 181.0, 359.0] {
            let corridor = CorridorDescriptor::starting_at(0.0, 1.25, 2.5)
                .hold_to(3.0)
                .splay_ending_at(8.0, 30.0, 0.725, 1.45)
                .unwrap()
                .build(Point2::new(5000.0, -300.0), az)
                .unwrap();
            let rings = [
                ring_points(&corridor.primary_ring()),
                ring_points(&corridor.secondary_left_ring().unwrap()),
                ring_points(&corridor.secondary_right_ring().unwrap()),
            ];
            for ring in &rings {
                assert!(ring_is_simple(ring), "azimuth {az}");
                assert_eq!(ring_winding(ring), Some(Winding::Clockwise), "azimuth {az}");
            }
        }
    }

    #[test]
    fn test_splay_length_from_secondary_delta() {
        let d = CorridorDescriptor::starting_at(0.0, 0.725, 1.45)
            .splay(30.0, 0.475, 0.95)
            .unwrap();
        let expected = 0.5 / 30f64.to_radians().tan();
        assert!((d.stations()[1].position_nm - expected).abs() < 1e-12);
    }

    #[test]
    fn test_splay_ending_at_places_transition_before_end() {
        let d = CorridorDescriptor::starting_at(0.0, 1.25, 2.5)
            .splay_ending_at(10.0, 30.0, 0.725, 1.45)
            .unwrap();
        let s = d.stations();
        assert_eq!(s.len(), 3);
        assert!((s[1].position_nm - (10.0 - 1.05 / 30f64.to_radians().tan())).abs() < 1e-12);
        assert_eq!(s[2].position_nm, 10.0);
        assert_eq!(s[2].secondary_nm, 1.45);

        let too_short = CorridorDescriptor::starting_at(0.0, 1.25, 2.5)
            .splay_ending_at(1.0, 30.0, 0.725, 1.45);
        assert!(matches!(too_short, Err(PansOpsError::ParameterOutOfRange(_))));
    }

    #[test]
    fn test_profile_interpolation() {
        let profile = CorridorWidthProfile::symmetric(&[(0.0, 100.0), (1000.0, 300.0)]).unwrap();
        assert_eq!(profile.interpolate(-5.0), (100.0, 100.0));
        assert_eq!(profile.interpolate(500.0), (200.0, 200.0));
        assert_eq!(profile.interpolate(2000.0), (300.0, 300.0));
    }

    #[test]
    fn test_profile_rejects_reversed_stations() {
        let err = CorridorWidthProfile::symmetric(&[(100.0, 1.0), (100.0, 2.0)]);
        assert!(matches!(err, Err(PansOpsError::DegenerateGeometry(_))));
        let err = CorridorWidthProfile::symmetric(&[(0.0, -1.0), (100.0, 2.0)]);
        assert!(matches!(err, Err(PansOpsError::ParameterOutOfRange(_))));
    }

    #[test]
    fn test_primary_only_corridor() {
        let primary = CorridorWidthProfile::symmetric(&[(0.0, 150.0), (3000.0, 950.0)]).unwrap();
        let corridor = Corridor::build(Point2::new(0.0, 0.0), 90.0, &primary, None).unwrap();
        assert!(!corridor.has_secondary());
        assert!(corridor.secondary_left_ring().is_err());
        let end = corridor.last();
        assert!((distance(end.primary.left, end.center) - 950.0).abs() < 1e-9);
        // Heading east, left is north.
        assert!(end.primary.left.y > end.center.y);
    }

    #[test]
    fn test_ratio_warnings() {
        assert!(rnav1().ratio_warnings().is_empty());
        let odd = CorridorDescriptor::starting_at(0.0, 1.0, 2.5).hold_to(5.0);
        assert_eq!(odd.ratio_warnings().len(), 2);
    }

    #[test]
    fn test_secondary_narrower_than_primary_is_rejected() {
        let bad = CorridorDescriptor::starting_at(0.0, 2.0, 1.0).hold_to(5.0);
        assert!(matches!(
            bad.build(Point2::new(0.0, 0.0), 0.0),
            Err(PansOpsError::ParameterOutOfRange(_))
        ));
    }
}
