//! Departure areas: SID turn initiation and omnidirectional SID.
//!
//! Obstacle identification surfaces start 5 m above the DER and climb at the
//! procedure design gradient less the 0.8 % margin.

use crate::corridor::{Corridor, CorridorWidthProfile};
use crate::elevation::{ElevationProfile, ElevationRule};
use crate::error::{require_positive, PansOpsError, Result};
use crate::physics::{
    isa_deviation, pilot_reaction_distance, wind_effect_90, TurnParameters, WindModel,
};
use crate::spatial::{ft_to_m, m_to_ft, project, Point2, RouteSegment, NM_TO_M};
use crate::spiral::set_turn_results;
use crate::surface::{CalculationResult, ProtectionSurface, Vertex};
use geo::orient::{Direction, Orient};
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// OIS origin above the DER, meters.
const DER_HEIGHT_M: f64 = 5.0;
/// PDG minus this is the OIS gradient, percent.
const OCS_MARGIN_PERCENT: f64 = 0.8;
const INITIAL_SEMI_WIDTH_M: f64 = 150.0;
const INITIAL_SPLAY_DEG: f64 = 15.0;

fn departure_surface(der_elevation_m: f64, pdg_percent: f64) -> Result<ElevationRule> {
    require_positive("PDG", pdg_percent)?;
    if pdg_percent <= OCS_MARGIN_PERCENT {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "PDG {pdg_percent} % leaves no climb above the {OCS_MARGIN_PERCENT} % margin"
        )));
    }
    Ok(ElevationRule::Gradient(ElevationProfile {
        base_elevation_m: der_elevation_m + DER_HEIGHT_M,
        gradient_percent: pdg_percent - OCS_MARGIN_PERCENT,
    }))
}

fn splay_width(distance_m: f64, splay_deg: f64) -> f64 {
    distance_m * splay_deg.to_radians().tan()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidInitialClimbParams {
    /// Runway in the departure direction; the DER is the route end.
    pub route: Vec<Point2>,
    pub reversed: bool,
    pub aerodrome_elevation_m: f64,
    pub der_elevation_m: f64,
    pub pdg_percent: f64,
    /// Aerodrome reference temperature, deg C.
    pub reference_temp_c: f64,
    pub ias_kt: f64,
    /// Turn altitude, feet.
    pub altitude_ft: f64,
    pub bank_deg: f64,
    pub wind_kt: f64,
    pub pilot_time_s: f64,
}

impl Default for SidInitialClimbParams {
    fn default() -> Self {
        Self {
            route: Vec::new(),
            reversed: false,
            aerodrome_elevation_m: 0.0,
            der_elevation_m: 0.0,
            pdg_percent: 3.3,
            reference_temp_c: 15.0,
            ias_kt: 205.0,
            altitude_ft: 5000.0,
            bank_deg: 15.0,
            wind_kt: 30.0,
            pilot_time_s: 11.0,
        }
    }
}

/// Turn initiation area from the DER to TNA/H, plus the pilot reaction (c)
/// area beyond it.
pub fn calculate_sid_initial_climb(params: &SidInitialClimbParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let rule = departure_surface(params.der_elevation_m, params.pdg_percent)?;

    let isa_dev = isa_deviation(m_to_ft(params.aerodrome_elevation_m), params.reference_temp_c);
    let perf = TurnParameters {
        ias_kt: params.ias_kt,
        altitude_ft: params.altitude_ft,
        isa_deviation_c: isa_dev,
        bank_deg: params.bank_deg,
        wind: WindModel::Fixed(params.wind_kt),
    }
    .resolve()?;

    let tna_m = (ft_to_m(params.altitude_ft) - params.der_elevation_m - DER_HEIGHT_M)
        / (params.pdg_percent / 100.0);
    if tna_m <= 0.0 {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "turn altitude {} ft is not above the DER surface",
            params.altitude_ft
        )));
    }
    let reaction_nm = pilot_reaction_distance(params.pilot_time_s, perf.tas_kt, perf.wind_kt);
    let reaction_m = reaction_nm * NM_TO_M;
    let c_end_m = tna_m + reaction_m;

    let width = |d: f64| INITIAL_SEMI_WIDTH_M + splay_width(d, INITIAL_SPLAY_DEG);
    let tia = Corridor::build(
        runway.end,
        runway.azimuth,
        &CorridorWidthProfile::symmetric(&[(0.0, INITIAL_SEMI_WIDTH_M), (tna_m, width(tna_m))])?,
        None,
    )?;
    let c_area = Corridor::build(
        runway.end,
        runway.azimuth,
        &CorridorWidthProfile::symmetric(&[(tna_m, width(tna_m)), (c_end_m, width(c_end_m))])?,
        None,
    )?;

    let mut result = CalculationResult::new("sid_initial_climb");
    result.push_checked(ProtectionSurface::from_ring(
        "Turn Initiation Area",
        &tia.primary_ring(),
        Some(&rule),
    )?)?;
    result.push_checked(ProtectionSurface::from_ring(
        "c Area",
        &c_area.boundary_ring(),
        Some(&rule),
    )?)?;
    result.push(ProtectionSurface::line_from_ring(
        "TNA/H Reached",
        &tia.station_line(tia.last()),
        Some(&rule),
    )?);
    result.push(ProtectionSurface::line_from_ring(
        "SS Line",
        &c_area.station_line(c_area.last()),
        Some(&rule),
    )?);

    set_turn_results(&mut result, &perf);
    result.set("isa_deviation_c", isa_dev);
    result.set("tna_distance_m", tna_m);
    result.set("tna_distance_nm", tna_m / NM_TO_M);
    result.set("pilot_reaction_nm", reaction_nm);
    result.set("e90_nm", wind_effect_90(perf.rate_of_turn_deg_s, perf.wind_kt));
    Ok(result)
}

/// Top of area 1 above the DER, meters.
const AREA_1_HEIGHT_M: f64 = 120.0;
const AREA_2_SPLAY_DEG: f64 = 30.0;
/// Start of the take-off run used as the area 3 center, meters from THR.
const TAKEOFF_POINT_M: f64 = 600.0;
const AREA_3_SEGMENTS: usize = 360;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmniSidParams {
    /// Threshold to DER.
    pub route: Vec<Point2>,
    pub reversed: bool,
    pub der_elevation_m: f64,
    pub pdg_percent: f64,
    pub tna_ft: f64,
    pub msa_ft: f64,
    pub cwy_distance_m: f64,
    pub allow_turns_before_der: bool,
}

impl Default for OmniSidParams {
    fn default() -> Self {
        Self {
            route: Vec::new(),
            reversed: false,
            der_elevation_m: 0.0,
            pdg_percent: 3.3,
            tna_ft: 2000.0,
            msa_ft: 6300.0,
            cwy_distance_m: 0.0,
            allow_turns_before_der: false,
        }
    }
}

pub fn calculate_omni_sid(params: &OmniSidParams) -> Result<CalculationResult> {
    let runway = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let rule = departure_surface(params.der_elevation_m, params.pdg_percent)?;
    if params.cwy_distance_m < 0.0 {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "clearway distance must not be negative (got {} m)",
            params.cwy_distance_m
        )));
    }
    let gradient = params.pdg_percent / 100.0;
    let tna_m = ft_to_m(params.tna_ft);
    let msa_m = ft_to_m(params.msa_ft);

    let d1 = (AREA_1_HEIGHT_M - DER_HEIGHT_M) / gradient;
    let d2 = (tna_m - AREA_1_HEIGHT_M - params.der_elevation_m) / gradient;
    if d2 <= 0.0 {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "TNA {} ft must be above {AREA_1_HEIGHT_M} m over the DER",
            params.tna_ft
        )));
    }
    if msa_m <= tna_m {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "MSA {} ft must be above TNA {} ft",
            params.msa_ft, params.tna_ft
        )));
    }
    let d3 = (msa_m - tna_m) / gradient + d1 + d2;
    let w1 = INITIAL_SEMI_WIDTH_M + splay_width(d1, INITIAL_SPLAY_DEG);
    let w2 = w1 + splay_width(d2, AREA_2_SPLAY_DEG);

    let origin = project(runway.end, params.cwy_distance_m, runway.azimuth);
    let takeoff = project(runway.start, TAKEOFF_POINT_M, runway.azimuth);
    let az = runway.azimuth;

    let area_1 = Corridor::build(
        origin,
        az,
        &CorridorWidthProfile::symmetric(&[(0.0, INITIAL_SEMI_WIDTH_M), (d1, w1)])?,
        None,
    )?;
    let area_2 = Corridor::build(
        origin,
        az,
        &CorridorWidthProfile::symmetric(&[(d1, w1), (d1 + d2, w2)])?,
        None,
    )?;

    let mut result = CalculationResult::new("omni_sid");
    for (name, area) in [("Area 1", &area_1), ("Area 2", &area_2)] {
        result.push_checked(ProtectionSurface::from_ring(
            name,
            &area.primary_ring(),
            Some(&rule),
        )?)?;
    }

    // Everything areas 1, 2 and the optional before-DER area cover, as one
    // outline, so area 3 is cut once.
    let mut cutout = vec![(0.0, INITIAL_SEMI_WIDTH_M), (d1, w1), (d1 + d2, w2)];
    if params.allow_turns_before_der {
        // Signed position of the take-off point relative to the area origin.
        let before_m = (runway.length - TAKEOFF_POINT_M) + params.cwy_distance_m;
        if before_m <= 0.0 {
            return Err(PansOpsError::ParameterOutOfRange(format!(
                "runway of {:.0} m leaves no area before the DER",
                runway.length
            )));
        }
        let before = Corridor::build(
            origin,
            az,
            &CorridorWidthProfile::symmetric(&[
                (-before_m, INITIAL_SEMI_WIDTH_M),
                (0.0, INITIAL_SEMI_WIDTH_M),
            ])?,
            None,
        )?;
        let level = ElevationRule::Constant {
            elevation_m: params.der_elevation_m + DER_HEIGHT_M,
        };
        result.push_checked(ProtectionSurface::from_ring(
            "Before DER",
            &before.primary_ring(),
            Some(&level),
        )?)?;
        cutout.insert(0, (-before_m, INITIAL_SEMI_WIDTH_M));
    }
    let cutout = Corridor::build(origin, az, &CorridorWidthProfile::symmetric(&cutout)?, None)?;

    let circle = circle_polygon(takeoff, d3, AREA_3_SEGMENTS);
    let hole = to_geo(&cutout.boundary_ring().iter().map(|v| v.point).collect::<Vec<_>>());
    let area_3 = circle.difference(&hole).orient(Direction::Reversed);
    push_area_3(&mut result, &area_3, msa_m)?;

    result.set("distance_area_1_m", d1);
    result.set("distance_area_2_m", d2);
    result.set("distance_area_3_m", d3);
    result.set("width_area_1_m", w1);
    result.set("width_area_2_m", w2);
    result.set("elevation_area_1_m", rule.elevation_at(d1));
    result.set("elevation_area_2_m", rule.elevation_at(d1 + d2));
    result.set("elevation_area_3_m", msa_m);
    Ok(result)
}

fn to_geo(ring: &[Point2]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(coords), vec![])
}

fn circle_polygon(center: Point2, radius_m: f64, segments: usize) -> Polygon<f64> {
    let step = 360.0 / segments as f64;
    let ring: Vec<Point2> = (0..segments)
        .map(|i| project(center, radius_m, i as f64 * step))
        .collect();
    to_geo(&ring)
}

fn level_ring(ring: &LineString<f64>, z: f64) -> Vec<Vertex> {
    ring.coords()
        .map(|c| Vertex {
            x: c.x,
            y: c.y,
            z: Some(z),
        })
        .collect()
}

fn push_area_3(result: &mut CalculationResult, area: &MultiPolygon<f64>, z: f64) -> Result<()> {
    if area.0.is_empty() {
        return Err(PansOpsError::DegenerateGeometry(
            "area 3 is fully covered by areas 1 and 2".into(),
        ));
    }
    for (i, polygon) in area.0.iter().enumerate() {
        let name = if i == 0 {
            "Area 3".to_string()
        } else {
            format!("Area 3 ({})", i + 1)
        };
        let mut surface = ProtectionSurface::polygon(name, level_ring(polygon.exterior(), z))?;
        for interior in polygon.interiors() {
            surface = surface.with_hole(level_ring(interior, z))?;
        }
        result.push(surface);
    }
    Ok(())
}
