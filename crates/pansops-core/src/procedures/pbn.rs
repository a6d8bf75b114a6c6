//! PBN corridors: RNAV arrival, LNAV approach segments, RNAV SID/missed and
//! GNSS waypoint tolerance.

use super::emit_corridor;
use crate::corridor::{Corridor, CorridorDescriptor, CorridorWidthProfile};
use crate::elevation::ElevationRule;
use crate::error::{require_positive, Result};
use crate::spatial::{Point2, RouteSegment, NM_TO_M};
use crate::surface::{CalculationResult, ProtectionSurface};
use serde::{Deserialize, Serialize};

/// RNAV 1 and RNAV 2 share the same area widths below 30 NM; the value is
/// carried through as a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavSpec {
    #[default]
    Rnav1,
    Rnav2,
}

impl NavSpec {
    pub fn label(self) -> &'static str {
        match self {
            NavSpec::Rnav1 => "RNAV 1",
            NavSpec::Rnav2 => "RNAV 2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnavArrivalParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    #[serde(default)]
    pub nav_spec: NavSpec,
    #[serde(default)]
    pub elevation: Option<ElevationRule>,
}

pub fn calculate_rnav_arrival(params: &RnavArrivalParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let descriptor = CorridorDescriptor::starting_at(0.0, 1.25, 2.5).hold_to(route.length_nm());

    let mut result = CalculationResult::new("rnav_arrival");
    emit_corridor(&mut result, &descriptor, &route, params.elevation.as_ref())?;
    for surface in result.surfaces.iter_mut() {
        surface
            .metadata
            .insert("nav_spec".into(), params.nav_spec.label().into());
    }
    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LnavSegment {
    /// IAF to IF.
    Initial,
    /// IF to FAF; narrows to final-approach width at the FAF.
    Intermediate,
    /// FAF to MAPt.
    Final,
    /// From the MAPt, starting one ATT early.
    Missed,
}

/// Along-track tolerance at the MAPt, NM.
const MAPT_ATT_NM: f64 = 0.24;
/// Minimum modelled length of the straight missed approach, NM.
const MISSED_MIN_LENGTH_NM: f64 = 5.0;

impl LnavSegment {
    pub fn descriptor(self, length_nm: f64) -> Result<CorridorDescriptor> {
        match self {
            LnavSegment::Initial => {
                Ok(CorridorDescriptor::starting_at(0.0, 1.25, 2.5).hold_to(length_nm))
            }
            LnavSegment::Intermediate => CorridorDescriptor::starting_at(0.0, 1.25, 2.5)
                .splay_ending_at(length_nm, 30.0, 0.725, 1.45),
            LnavSegment::Final => Ok(CorridorDescriptor::starting_at(0.0, 0.725, 1.45)
                .splay(30.0, 0.475, 0.95)?
                .hold_to(length_nm)),
            LnavSegment::Missed => Ok(CorridorDescriptor::starting_at(-MAPT_ATT_NM, 0.475, 0.95)
                .splay(15.0, 1.0, 2.0)?
                .hold_to(length_nm.max(MISSED_MIN_LENGTH_NM))),
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LnavSegment::Initial => "initial",
            LnavSegment::Intermediate => "intermediate",
            LnavSegment::Final => "final",
            LnavSegment::Missed => "missed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LnavApproachParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub segment: LnavSegment,
    #[serde(default)]
    pub elevation: Option<ElevationRule>,
}

pub fn calculate_lnav_approach(params: &LnavApproachParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let length_nm = route.length_nm();
    let descriptor = params.segment.descriptor(length_nm)?;

    let mut result = CalculationResult::new("lnav_approach");
    let corridor = emit_corridor(&mut result, &descriptor, &route, params.elevation.as_ref())?;
    let modelled_nm = corridor.last().position_m / NM_TO_M;
    if params.segment == LnavSegment::Final && modelled_nm > length_nm + 1e-9 {
        result.warn(format!(
            "final segment of {length_nm:.3} NM is shorter than its 30 degree taper ({modelled_nm:.3} NM)"
        ));
    }
    for surface in result.surfaces.iter_mut() {
        surface
            .metadata
            .insert("segment".into(), params.segment.tag().into());
    }
    result.set("modelled_length_nm", modelled_nm);
    Ok(result)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureKind {
    #[default]
    Sid,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnavDepartureParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    #[serde(default)]
    pub nav_spec: NavSpec,
    #[serde(default)]
    pub kind: DepartureKind,
    #[serde(default)]
    pub elevation: Option<ElevationRule>,
}

/// Beyond this distance from the aerodrome the 1/2 NM widths no longer apply.
const RNAV_DEPARTURE_LIMIT_NM: f64 = 15.0;

pub fn calculate_rnav_departure(params: &RnavDepartureParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let length_nm = route.length_nm();
    let descriptor = CorridorDescriptor::starting_at(0.0, 1.0, 2.0).hold_to(length_nm);

    let mut result = CalculationResult::new("rnav_departure");
    if length_nm > RNAV_DEPARTURE_LIMIT_NM {
        result.warn(format!(
            "segment is {length_nm:.2} NM long; 1/2 NM widths apply within {RNAV_DEPARTURE_LIMIT_NM} NM"
        ));
    }
    emit_corridor(&mut result, &descriptor, &route, params.elevation.as_ref())?;
    let kind = match params.kind {
        DepartureKind::Sid => "SID",
        DepartureKind::Missed => "missed",
    };
    for surface in result.surfaces.iter_mut() {
        surface
            .metadata
            .insert("nav_spec".into(), params.nav_spec.label().into());
        surface.metadata.insert("kind".into(), kind.into());
    }
    Ok(result)
}

fn default_xtt() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GnssWaypointParams {
    /// Inbound track; the waypoint is the route end.
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    /// Cross-track tolerance, NM.
    #[serde(default = "default_xtt")]
    pub xtt_nm: f64,
}

/// ATT as a fraction of XTT for GNSS.
const ATT_PER_XTT: f64 = 0.8;

pub fn calculate_gnss_waypoint(params: &GnssWaypointParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let xtt_nm = require_positive("XTT", params.xtt_nm)?;
    let att_nm = ATT_PER_XTT * xtt_nm;
    let (xtt_m, att_m) = (xtt_nm * NM_TO_M, att_nm * NM_TO_M);

    let profile = CorridorWidthProfile::symmetric(&[(-att_m, xtt_m), (att_m, xtt_m)])?;
    let area = Corridor::build(route.end, route.azimuth, &profile, None)?;

    let mut result = CalculationResult::new("gnss_waypoint");
    result.push_checked(
        ProtectionSurface::from_ring("Waypoint Tolerance Area", &area.boundary_ring(), None)?
            .with_meta("xtt_nm", xtt_nm)
            .with_meta("att_nm", att_nm),
    )?;
    result.push(ProtectionSurface::line_from_ring(
        "Nominal Track",
        &area.centerline(),
        None,
    )?);
    result.set("xtt_nm", xtt_nm);
    result.set("att_nm", att_nm);
    result.set("xtt_m", xtt_m);
    result.set("att_m", att_m);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::ElevationProfile;
    use crate::spatial::{distance, ring_winding, Winding};

    fn route(len_nm: f64, az_deg: f64) -> Vec<Point2> {
        let start = Point2::new(10_000.0, 20_000.0);
        vec![start, crate::spatial::project(start, len_nm * NM_TO_M, az_deg)]
    }

    #[test]
    fn test_rnav_arrival_ring_sizes() {
        let params = RnavArrivalParams {
            route: route(12.0, 63.0),
            reversed: false,
            nav_spec: NavSpec::Rnav1,
            elevation: None,
        };
        let result = calculate_rnav_arrival(&params).unwrap();
        assert_eq!(result.surfaces.len(), 4);
        assert_eq!(result.surface("Primary Area").unwrap().vertex_count(), 6);
        assert_eq!(result.surface("Secondary Area Left").unwrap().vertex_count(), 4);
        assert_eq!(result.surface("Secondary Area Right").unwrap().vertex_count(), 4);
        assert!(result.warnings.is_empty());
        assert_eq!(result.winding(), Some(Winding::Clockwise));
        assert!(!result.surfaces[0].is_3d());
    }

    #[test]
    fn test_lnav_intermediate_narrows_at_faf() {
        let params = LnavApproachParams {
            route: route(10.0, 200.0),
            reversed: false,
            segment: LnavSegment::Intermediate,
            elevation: None,
        };
        let result = calculate_lnav_approach(&params).unwrap();
        let primary = result.surface("Primary Area").unwrap();
        // Three stations: 6 + 2 vertices.
        assert_eq!(primary.vertex_count(), 8);
        let outline = primary.outline();
        let end_left = outline[2];
        let end_center = outline[3];
        assert!((distance(end_left, end_center) - 0.725 * NM_TO_M).abs() < 1e-6);
    }

    #[test]
    fn test_lnav_intermediate_too_short_fails() {
        let params = LnavApproachParams {
            route: route(1.0, 0.0),
            reversed: false,
            segment: LnavSegment::Intermediate,
            elevation: None,
        };
        assert!(calculate_lnav_approach(&params).is_err());
    }

    #[test]
    fn test_lnav_missed_extends_to_five_nm() {
        let params = LnavApproachParams {
            route: route(2.0, 90.0),
            reversed: false,
            segment: LnavSegment::Missed,
            elevation: None,
        };
        let result = calculate_lnav_approach(&params).unwrap();
        assert!((result.result("modelled_length_nm").unwrap() - 5.0).abs() < 1e-9);
        let outline = result.surface("Primary Area").unwrap().outline();
        // Start center sits one ATT before the MAPt.
        let start_center = *outline.last().unwrap();
        assert!((start_center.x - (10_000.0 - 0.24 * NM_TO_M)).abs() < 1e-6);
    }

    #[test]
    fn test_climbing_missed_rings_rise_along_track() {
        let params = LnavApproachParams {
            route: route(8.0, 315.0),
            reversed: false,
            segment: LnavSegment::Missed,
            elevation: Some(ElevationRule::Gradient(ElevationProfile {
                base_elevation_m: 300.0,
                gradient_percent: 2.5,
            })),
        };
        let result = calculate_lnav_approach(&params).unwrap();
        let primary = result.surface("Primary Area").unwrap();
        assert!(primary.is_3d());
        let left: Vec<f64> = primary.vertices[..3].iter().filter_map(|v| v.z).collect();
        assert!(left.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rnav_departure_warns_beyond_limit() {
        let params = RnavDepartureParams {
            route: route(20.0, 10.0),
            reversed: false,
            nav_spec: NavSpec::Rnav2,
            kind: DepartureKind::Missed,
            elevation: None,
        };
        let result = calculate_rnav_departure(&params).unwrap();
        assert_eq!(result.warnings.len(), 1);
        let primary = result.surface("Primary Area").unwrap();
        assert_eq!(primary.metadata["nav_spec"], "RNAV 2");
        assert_eq!(primary.metadata["kind"], "missed");
    }

    #[test]
    fn test_gnss_waypoint_rectangle() {
        let params = GnssWaypointParams {
            route: vec![Point2::new(0.0, 0.0), Point2::new(0.0, 10_000.0)],
            reversed: false,
            xtt_nm: 1.0,
        };
        let result = calculate_gnss_waypoint(&params).unwrap();
        let area = result.surface("Waypoint Tolerance Area").unwrap();
        assert_eq!(area.vertex_count(), 4);
        let outline = area.outline();
        assert_eq!(ring_winding(&outline), Some(Winding::Clockwise));
        let ys: Vec<f64> = outline.iter().map(|p| p.y).collect();
        assert!((ys[1] - ys[0] - 1.6 * NM_TO_M).abs() < 1e-6);
        assert!((outline[2].x - outline[1].x - 2.0 * NM_TO_M).abs() < 1e-6);
        assert!((result.result("att_nm").unwrap() - 0.8).abs() < 1e-12);
    }
}
