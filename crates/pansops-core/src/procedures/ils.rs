//! Runway-anchored surfaces: ILS basic surfaces and visual segment surfaces.
//!
//! The runway route starts at the threshold and points in the landing
//! direction; the approach side is the reciprocal bearing.

use crate::error::{require_positive, PansOpsError, Result};
use crate::spatial::{project, Point2, Point3, RouteSegment};
use crate::surface::{CalculationResult, ProtectionSurface};
use serde::{Deserialize, Serialize};

/// Ground surface semi-width, meters.
const GROUND_SEMI_WIDTH_M: f64 = 150.0;
/// Ground surface extends this far beyond the threshold on the approach side.
const GROUND_AHEAD_M: f64 = 60.0;
const GROUND_LENGTH_M: f64 = 960.0;
const APPROACH_1_LENGTH_M: f64 = 3000.0;
const APPROACH_2_LENGTH_M: f64 = 9600.0;
const APPROACH_DIVERGENCE: f64 = 0.15;
const MISSED_START_M: f64 = 900.0;
const MISSED_SPLAY_LENGTH_M: f64 = 1800.0;
const MISSED_END_M: f64 = 12000.0;
const MISSED_GRADIENT: f64 = 0.025;
const MISSED_DIVERGENCE: f64 = 0.25;
const TRANSITION_GRADIENT: f64 = 0.143;
const TRANSITION_TOP_M: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicIlsParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub threshold_elevation_m: f64,
}

pub fn calculate_basic_ils(params: &BasicIlsParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let thr = runway.start;
    let thr_elev = params.threshold_elevation_m;
    let az = runway.back_azimuth();
    let back_az = runway.azimuth;

    let gs_center = project(thr, GROUND_AHEAD_M, az);
    let gs_a = project(gs_center, GROUND_SEMI_WIDTH_M, az - 90.0);
    let gs_b = project(gs_a, GROUND_LENGTH_M, back_az);
    let gs_d = project(gs_center, GROUND_SEMI_WIDTH_M, az + 90.0);
    let gs_c = project(gs_d, GROUND_LENGTH_M, back_az);

    let as1_width = APPROACH_1_LENGTH_M * APPROACH_DIVERGENCE + GROUND_SEMI_WIDTH_M;
    let as1_center = project(gs_center, APPROACH_1_LENGTH_M, az);
    let as1_a = project(as1_center, as1_width, az - 90.0);
    let as1_d = project(as1_center, as1_width, az + 90.0);

    let as2_width =
        (APPROACH_1_LENGTH_M + APPROACH_2_LENGTH_M) * APPROACH_DIVERGENCE + GROUND_SEMI_WIDTH_M;
    let as2_center = project(as1_center, APPROACH_2_LENGTH_M, az);
    let as2_a = project(as2_center, as2_width, az - 90.0);
    let as2_d = project(as2_center, as2_width, az + 90.0);

    // Missed approach widens at the transition gradient until 45 m of climb,
    // then at 25 %.
    let missed_mid_width = GROUND_SEMI_WIDTH_M + 45.0 / TRANSITION_GRADIENT;
    let missed_end_width =
        missed_mid_width + (MISSED_END_M - MISSED_SPLAY_LENGTH_M) * MISSED_DIVERGENCE;
    let missed_center = project(thr, MISSED_START_M, back_az);
    let missed_a = project(missed_center, GROUND_SEMI_WIDTH_M, az - 90.0);
    let missed_f = project(missed_center, GROUND_SEMI_WIDTH_M, az + 90.0);
    let missed_mid = project(missed_center, MISSED_SPLAY_LENGTH_M, back_az);
    let missed_b = project(missed_mid, missed_mid_width, az - 90.0);
    let missed_e = project(missed_mid, missed_mid_width, az + 90.0);
    let missed_far = project(missed_center, MISSED_END_M, back_az);
    let missed_c = project(missed_far, missed_end_width, az - 90.0);
    let missed_d = project(missed_far, missed_end_width, az + 90.0);

    let t1 = (TRANSITION_TOP_M - 60.0) / TRANSITION_GRADIENT;
    let t2 = TRANSITION_TOP_M / TRANSITION_GRADIENT;
    let t3 = (TRANSITION_TOP_M - 45.0) / TRANSITION_GRADIENT;
    let e1_left = project(as1_d, t1, az + 90.0);
    let e1_right = project(as1_a, t1, az - 90.0);
    let e2_left = project(gs_d, t2, az + 90.0);
    let e2_right = project(gs_a, t2, az - 90.0);
    let e3_left = project(missed_e, t3, az + 90.0);
    let e3_right = project(missed_b, t3, az - 90.0);

    let z0 = thr_elev;
    let z60 = thr_elev + 60.0;
    let z300 = thr_elev + TRANSITION_TOP_M;
    let z_mid = thr_elev + MISSED_SPLAY_LENGTH_M * MISSED_GRADIENT;
    let z_far = thr_elev + MISSED_END_M * MISSED_GRADIENT;

    let faces: [(&str, Vec<Point3>); 12] = [
        (
            "ground surface",
            vec![gs_a.with_z(z0), gs_b.with_z(z0), gs_c.with_z(z0), gs_d.with_z(z0)],
        ),
        (
            "approach surface first section",
            vec![as1_a.with_z(z60), gs_a.with_z(z0), gs_d.with_z(z0), as1_d.with_z(z60)],
        ),
        (
            "approach surface second section",
            vec![as2_a.with_z(z300), as1_a.with_z(z60), as1_d.with_z(z60), as2_d.with_z(z300)],
        ),
        (
            "missed approach surface",
            vec![
                missed_a.with_z(z0),
                missed_b.with_z(z_mid),
                missed_c.with_z(z_far),
                missed_d.with_z(z_far),
                missed_e.with_z(z_mid),
                missed_f.with_z(z0),
            ],
        ),
        (
            "transition surface - left 1",
            vec![as2_d.with_z(z300), as1_d.with_z(z60), e1_left.with_z(z300)],
        ),
        (
            "transition surface - left 2",
            vec![as1_d.with_z(z60), e1_left.with_z(z300), e2_left.with_z(z300), gs_d.with_z(z0)],
        ),
        (
            "transition surface - left 3",
            vec![
                e2_left.with_z(z300),
                gs_d.with_z(z0),
                gs_c.with_z(z0),
                missed_e.with_z(z_mid),
                e3_left.with_z(z300),
            ],
        ),
        (
            "transition surface - left 4",
            vec![missed_e.with_z(z_mid), missed_d.with_z(z_far), e3_left.with_z(z300)],
        ),
        (
            "transition surface - right 1",
            vec![as2_a.with_z(z300), as1_a.with_z(z60), e1_right.with_z(z300)],
        ),
        (
            "transition surface - right 2",
            vec![as1_a.with_z(z60), e1_right.with_z(z300), e2_right.with_z(z300), gs_a.with_z(z0)],
        ),
        (
            "transition surface - right 3",
            vec![
                e2_right.with_z(z300),
                e3_right.with_z(z300),
                missed_b.with_z(z_mid),
                gs_b.with_z(z0),
                gs_a.with_z(z0),
            ],
        ),
        (
            "transition surface - right 4",
            vec![missed_b.with_z(z_mid), missed_c.with_z(z_far), e3_right.with_z(z300)],
        ),
    ];

    let mut result = CalculationResult::new("basic_ils");
    for (name, ring) in faces {
        result.push(ProtectionSurface::polygon(name, ring)?.with_meta("surface", "ILS"));
    }
    result.set("transition_distance_1_m", t1);
    result.set("transition_distance_2_m", t2);
    result.set("transition_distance_3_m", t3);
    result.set("missed_end_half_width_m", missed_end_width);
    Ok(result)
}

fn default_rdh() -> f64 {
    15.0
}

fn default_vpa() -> f64 {
    3.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VssStraightParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub threshold_elevation_m: f64,
    pub runway_width_m: f64,
    pub strip_width_m: f64,
    /// Obstacle clearance height, meters.
    pub och_m: f64,
    #[serde(default = "default_rdh")]
    pub rdh_m: f64,
    #[serde(default = "default_vpa")]
    pub vpa_deg: f64,
}

fn check_vertical_path(och_m: f64, rdh_m: f64, vpa_deg: f64) -> Result<()> {
    require_positive("OCH", och_m)?;
    if rdh_m < 0.0 || rdh_m >= och_m {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "RDH {rdh_m} m must be within [0, OCH {och_m} m)"
        )));
    }
    if !(vpa_deg > 0.0 && vpa_deg < 90.0) {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "VPA must be within (0, 90) degrees (got {vpa_deg})"
        )));
    }
    Ok(())
}

pub fn calculate_vss_straight(params: &VssStraightParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    check_vertical_path(params.och_m, params.rdh_m, params.vpa_deg)?;
    require_positive("runway width", params.runway_width_m)?;
    require_positive("strip width", params.strip_width_m)?;

    let thr = runway.start;
    let thr_elev = params.threshold_elevation_m;
    let top = thr_elev + params.och_m;
    let az = runway.back_azimuth();

    let vss_length = 1.12 * (params.och_m - params.rdh_m) / params.vpa_deg.to_radians().tan();
    let vss_inner = params.runway_width_m;
    let vss_outer = vss_inner + 2.0 * vss_length * APPROACH_DIVERGENCE;
    let ocs_inner = params.strip_width_m;
    let ocs_outer = ocs_inner + 2.0 * vss_length * APPROACH_DIVERGENCE;

    let end = project(thr, vss_length, az);
    let vss_ls = project(thr, vss_inner / 2.0, az - 90.0);
    let vss_rs = project(thr, vss_inner / 2.0, az + 90.0);
    let vss_le = project(end, vss_outer / 2.0, az - 90.0);
    let vss_re = project(end, vss_outer / 2.0, az + 90.0);
    let ocs_ls = project(thr, ocs_inner / 2.0, az - 90.0);
    let ocs_rs = project(thr, ocs_inner / 2.0, az + 90.0);
    let ocs_le = project(end, ocs_outer / 2.0, az - 90.0);
    let ocs_re = project(end, ocs_outer / 2.0, az + 90.0);

    let mut result = CalculationResult::new("vss_straight");
    result.push(
        ProtectionSurface::polygon(
            "VSS",
            [
                vss_ls.with_z(thr_elev),
                vss_le.with_z(top),
                vss_re.with_z(top),
                vss_rs.with_z(thr_elev),
            ],
        )?
        .with_meta("surface", "VSS"),
    );
    result.push(
        ProtectionSurface::polygon(
            "OCS",
            [
                ocs_ls.with_z(thr_elev),
                ocs_le.with_z(top),
                vss_le.with_z(top),
                vss_ls.with_z(thr_elev),
                vss_rs.with_z(thr_elev),
                vss_re.with_z(top),
                ocs_re.with_z(top),
                ocs_rs.with_z(thr_elev),
            ],
        )?
        .with_meta("surface", "OCS"),
    );
    result.set("vss_length_m", vss_length);
    result.set("vss_outer_width_m", vss_outer);
    result.set("ocs_outer_width_m", ocs_outer);
    Ok(result)
}

/// VSS origin beyond the threshold, meters.
const VSS_LOC_START_M: f64 = 60.0;
const VSS_LOC_SEMI_WIDTH_M: f64 = 60.0;
/// VSS slope lies this far below the VPA, degrees.
const VSS_SLOPE_OFFSET_DEG: f64 = 1.12;
/// OCS slope lies this far below the VPA, degrees.
const OCS_SLOPE_OFFSET_DEG: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VssLocParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub threshold_elevation_m: f64,
    pub runway_width_m: f64,
    pub och_m: f64,
    #[serde(default = "default_rdh")]
    pub rdh_m: f64,
    #[serde(default = "default_vpa")]
    pub vpa_deg: f64,
}

pub fn calculate_vss_loc(params: &VssLocParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    check_vertical_path(params.och_m, params.rdh_m, params.vpa_deg)?;
    require_positive("runway width", params.runway_width_m)?;
    if params.vpa_deg <= VSS_SLOPE_OFFSET_DEG {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "VPA {} must exceed {VSS_SLOPE_OFFSET_DEG} degrees",
            params.vpa_deg
        )));
    }

    let thr = runway.start;
    let thr_elev = params.threshold_elevation_m;
    let az = runway.back_azimuth();

    let vss_tan = (params.vpa_deg - VSS_SLOPE_OFFSET_DEG).to_radians().tan();
    let d_vss = params.och_m / vss_tan;
    let vss_top = thr_elev + d_vss * vss_tan;

    let vss_s = project(thr, VSS_LOC_START_M, az);
    let vss_e = project(vss_s, d_vss, az);
    let vss_a = project(vss_s, VSS_LOC_SEMI_WIDTH_M, az - 90.0);
    let vss_b = project(vss_e, VSS_LOC_SEMI_WIDTH_M, az - 90.0);
    let vss_c = project(vss_e, VSS_LOC_SEMI_WIDTH_M, az + 90.0);
    let vss_d = project(vss_s, VSS_LOC_SEMI_WIDTH_M, az + 90.0);

    let ocs_length = (params.och_m - params.rdh_m) / params.vpa_deg.to_radians().tan();
    let ocs_top = thr_elev
        + ocs_length * (params.vpa_deg - OCS_SLOPE_OFFSET_DEG).to_radians().tan();
    let ocs_start_width = 30.0 + params.runway_width_m / 2.0;
    let ocs_e = project(thr, ocs_length, az);
    let ocs_a = project(thr, ocs_start_width, az - 90.0);
    let ocs_b = project(ocs_e, VSS_LOC_SEMI_WIDTH_M, az - 90.0);
    let ocs_c = project(ocs_e, VSS_LOC_SEMI_WIDTH_M, az + 90.0);
    let ocs_d = project(thr, ocs_start_width, az + 90.0);

    let mut result = CalculationResult::new("vss_loc");
    result.push(
        ProtectionSurface::polygon(
            "VSS",
            [
                vss_a.with_z(thr_elev),
                vss_b.with_z(vss_top),
                vss_c.with_z(vss_top),
                vss_d.with_z(thr_elev),
            ],
        )?
        .with_meta("surface", "VSS"),
    );
    result.push(
        ProtectionSurface::polygon(
            "OCS",
            [
                ocs_a.with_z(thr_elev),
                vss_a.with_z(thr_elev),
                ocs_b.with_z(ocs_top),
                ocs_c.with_z(ocs_top),
                vss_d.with_z(thr_elev),
                ocs_d.with_z(thr_elev),
            ],
        )?
        .with_meta("surface", "OCS"),
    );
    result.set("vss_length_m", d_vss);
    result.set("ocs_length_m", ocs_length);
    Ok(result)
}
