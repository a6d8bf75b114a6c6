//! Conventional (ground-navaid) approach areas.

use super::emit_corridor;
use crate::corridor::CorridorDescriptor;
use crate::elevation::{ElevationProfile, ElevationRule};
use crate::error::{require_non_negative, Result};
use crate::spatial::{ft_to_m, Point2, RouteSegment};
use crate::surface::CalculationResult;
use serde::{Deserialize, Serialize};

fn default_initial_moc() -> f64 {
    300.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvInitialParams {
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    /// Minimum altitude of the segment, feet.
    pub procedure_altitude_ft: f64,
    #[serde(default = "default_initial_moc")]
    pub moc_m: f64,
}

/// Straight initial approach: 2.5/5 NM either side. The primary floor sits one
/// MOC below the procedure altitude and rises to it at the outer edge.
pub fn calculate_conv_initial(params: &ConvInitialParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let moc_m = require_non_negative("MOC", params.moc_m)?;
    let altitude_m = ft_to_m(params.procedure_altitude_ft);
    let rule = ElevationRule::OuterPlusMoc {
        primary: ElevationProfile::level(altitude_m - moc_m),
        moc_m,
    };
    let descriptor = CorridorDescriptor::starting_at(0.0, 2.5, 5.0).hold_to(route.length_nm());

    let mut result = CalculationResult::new("conv_initial");
    emit_corridor(&mut result, &descriptor, &route, Some(&rule))?;
    result.set("procedure_altitude_m", altitude_m);
    result.set("primary_floor_m", altitude_m - moc_m);
    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facility {
    Vor,
    Ndb,
}

impl Facility {
    /// (splay angle in degrees, maximum template length in NM, secondary half-width at the facility in NM)
    fn template(self) -> (f64, f64, f64) {
        match self {
            Facility::Vor => (7.8, 20.0, 1.0),
            Facility::Ndb => (10.3, 15.0, 1.25),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Facility::Vor => "VOR",
            Facility::Ndb => "NDB",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvFinalParams {
    /// Facility to FAF direction; the facility is the route start.
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub facility: Facility,
    #[serde(default)]
    pub elevation: Option<ElevationRule>,
}

/// Final approach area splaying from the facility. The template is cut at
/// the facility's maximum length; the primary area is half the secondary.
pub fn calculate_conv_final(params: &ConvFinalParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let (splay_deg, max_nm, start_secondary_nm) = params.facility.template();

    let mut result = CalculationResult::new("conv_final");
    let length_nm = route.length_nm();
    let template_nm = length_nm.min(max_nm);
    if length_nm > max_nm {
        result.warn(format!(
            "{} template is limited to {max_nm} NM; {length_nm:.2} NM segment truncated",
            params.facility.label()
        ));
    }
    let end_secondary_nm = template_nm * splay_deg.to_radians().tan() + start_secondary_nm;
    let descriptor = CorridorDescriptor::starting_at(0.0, start_secondary_nm / 2.0, start_secondary_nm)
        .taper_to(template_nm, end_secondary_nm / 2.0, end_secondary_nm);

    emit_corridor(&mut result, &descriptor, &route, params.elevation.as_ref())?;
    for surface in result.surfaces.iter_mut() {
        surface
            .metadata
            .insert("facility".into(), params.facility.label().into());
    }
    result.set("template_length_nm", template_nm);
    result.set("end_secondary_half_width_nm", end_secondary_nm);
    Ok(result)
}
