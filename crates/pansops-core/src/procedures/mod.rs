//! Procedure builders and the tagged request that selects one.

pub mod conventional;
pub mod departure;
pub mod ils;
pub mod pbn;

use crate::corridor::{Corridor, CorridorDescriptor};
use crate::elevation::ElevationRule;
use crate::error::Result;
use crate::oas::{calculate_oas_ils, OasIlsParams};
use crate::physics::{isa_deviation, isa_temperature};
use crate::spatial::{m_to_ft, RouteSegment};
use crate::spiral::{calculate_holding, calculate_wind_spiral, HoldingParams, WindSpiralParams};
use crate::surface::{CalculationResult, ProtectionSurface};
use serde::{Deserialize, Serialize};

pub use conventional::{
    calculate_conv_final, calculate_conv_initial, ConvFinalParams, ConvInitialParams, Facility,
};
pub use departure::{
    calculate_omni_sid, calculate_sid_initial_climb, OmniSidParams, SidInitialClimbParams,
};
pub use ils::{
    calculate_basic_ils, calculate_vss_loc, calculate_vss_straight, BasicIlsParams, VssLocParams,
    VssStraightParams,
};
pub use pbn::{
    calculate_gnss_waypoint, calculate_lnav_approach, calculate_rnav_arrival,
    calculate_rnav_departure, DepartureKind, GnssWaypointParams, LnavApproachParams, LnavSegment,
    NavSpec, RnavArrivalParams, RnavDepartureParams,
};

/// One calculation, selected by the `procedure` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "procedure", rename_all = "snake_case")]
pub enum CalculationRequest {
    BasicIls(BasicIlsParams),
    OasIls(OasIlsParams),
    VssStraight(VssStraightParams),
    VssLoc(VssLocParams),
    RnavArrival(RnavArrivalParams),
    LnavApproach(LnavApproachParams),
    RnavDeparture(RnavDepartureParams),
    ConvInitial(ConvInitialParams),
    ConvFinal(ConvFinalParams),
    SidInitialClimb(SidInitialClimbParams),
    OmniSid(OmniSidParams),
    GnssWaypoint(GnssWaypointParams),
    Holding(HoldingParams),
    WindSpiral(WindSpiralParams),
    Isa(IsaParams),
}

impl CalculationRequest {
    /// Tag as it appears on the wire.
    pub fn procedure(&self) -> &'static str {
        match self {
            CalculationRequest::BasicIls(_) => "basic_ils",
            CalculationRequest::OasIls(_) => "oas_ils",
            CalculationRequest::VssStraight(_) => "vss_straight",
            CalculationRequest::VssLoc(_) => "vss_loc",
            CalculationRequest::RnavArrival(_) => "rnav_arrival",
            CalculationRequest::LnavApproach(_) => "lnav_approach",
            CalculationRequest::RnavDeparture(_) => "rnav_departure",
            CalculationRequest::ConvInitial(_) => "conv_initial",
            CalculationRequest::ConvFinal(_) => "conv_final",
            CalculationRequest::SidInitialClimb(_) => "sid_initial_climb",
            CalculationRequest::OmniSid(_) => "omni_sid",
            CalculationRequest::GnssWaypoint(_) => "gnss_waypoint",
            CalculationRequest::Holding(_) => "holding",
            CalculationRequest::WindSpiral(_) => "wind_spiral",
            CalculationRequest::Isa(_) => "isa",
        }
    }

    /// Runs the selected builder. Either every surface is produced or the call fails.
    pub fn calculate(&self) -> Result<CalculationResult> {
        match self {
            CalculationRequest::BasicIls(p) => calculate_basic_ils(p),
            CalculationRequest::OasIls(p) => calculate_oas_ils(p),
            CalculationRequest::VssStraight(p) => calculate_vss_straight(p),
            CalculationRequest::VssLoc(p) => calculate_vss_loc(p),
            CalculationRequest::RnavArrival(p) => calculate_rnav_arrival(p),
            CalculationRequest::LnavApproach(p) => calculate_lnav_approach(p),
            CalculationRequest::RnavDeparture(p) => calculate_rnav_departure(p),
            CalculationRequest::ConvInitial(p) => calculate_conv_initial(p),
            CalculationRequest::ConvFinal(p) => calculate_conv_final(p),
            CalculationRequest::SidInitialClimb(p) => calculate_sid_initial_climb(p),
            CalculationRequest::OmniSid(p) => calculate_omni_sid(p),
            CalculationRequest::GnssWaypoint(p) => calculate_gnss_waypoint(p),
            CalculationRequest::Holding(p) => calculate_holding(p),
            CalculationRequest::WindSpiral(p) => calculate_wind_spiral(p),
            CalculationRequest::Isa(p) => Ok(calculate_isa(p)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationUnit {
    #[default]
    Ft,
    M,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsaParams {
    pub elevation: f64,
    #[serde(default)]
    pub unit: ElevationUnit,
    pub reference_temp_c: f64,
}

pub fn calculate_isa(params: &IsaParams) -> CalculationResult {
    let elevation_ft = match params.unit {
        ElevationUnit::Ft => params.elevation,
        ElevationUnit::M => m_to_ft(params.elevation),
    };
    let mut result = CalculationResult::new("isa");
    result.set("elevation_ft", elevation_ft);
    result.set("isa_temperature_c", isa_temperature(elevation_ft));
    result.set(
        "isa_deviation_c",
        isa_deviation(elevation_ft, params.reference_temp_c),
    );
    result
}

/// Primary and both secondary areas of a corridor, checked for simplicity and
/// shared winding, plus the 2:1 width warnings.
pub(crate) fn emit_corridor(
    result: &mut CalculationResult,
    descriptor: &CorridorDescriptor,
    route: &RouteSegment,
    elevation: Option<&ElevationRule>,
) -> Result<Corridor> {
    if let Some(rule) = elevation {
        rule.validate()?;
    }
    let corridor = descriptor.build(route.start, route.azimuth)?;
    for warning in descriptor.ratio_warnings() {
        result.warn(warning);
    }

    result.push_checked(
        ProtectionSurface::from_ring("Primary Area", &corridor.primary_ring(), elevation)?
            .with_meta("area", "primary"),
    )?;
    result.push_checked(
        ProtectionSurface::from_ring(
            "Secondary Area Left",
            &corridor.secondary_left_ring()?,
            elevation,
        )?
        .with_meta("area", "secondary"),
    )?;
    result.push_checked(
        ProtectionSurface::from_ring(
            "Secondary Area Right",
            &corridor.secondary_right_ring()?,
            elevation,
        )?
        .with_meta("area", "secondary"),
    )?;
    result.push(ProtectionSurface::line_from_ring(
        "Nominal Track",
        &corridor.centerline(),
        elevation,
    )?);

    result.set("length_nm", route.length_nm());
    result.set("azimuth_deg", route.azimuth);
    Ok(corridor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_is_tagged_by_procedure() {
        let request: CalculationRequest = serde_json::from_value(json!({
            "procedure": "rnav_arrival",
            "route": [{"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 18520.0}],
        }))
        .unwrap();
        assert_eq!(request.procedure(), "rnav_arrival");
        let result = request.calculate().unwrap();
        assert_eq!(result.procedure, "rnav_arrival");
        assert!((result.result("length_nm").unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(result.surfaces.len(), 4);
    }

    #[test]
    fn test_lnav_request_with_gradient() {
        let request: CalculationRequest = serde_json::from_value(json!({
            "procedure": "lnav_approach",
            "segment": "final",
            "route": [{"x": 0.0, "y": 0.0}, {"x": 9260.0, "y": 0.0}],
            "elevation": {"rule": "gradient", "base_elevation_m": 500.0, "gradient_percent": -5.2},
        }))
        .unwrap();
        let result = request.calculate().unwrap();
        assert!(result.surface("Primary Area").unwrap().is_3d());
    }

    #[test]
    fn test_isa_in_meters() {
        let request: CalculationRequest = serde_json::from_value(json!({
            "procedure": "isa",
            "elevation": 1000.0,
            "unit": "m",
            "reference_temp_c": 20.0,
        }))
        .unwrap();
        let result = request.calculate().unwrap();
        let ft = 1000.0 / 0.3048;
        assert!((result.result("elevation_ft").unwrap() - ft).abs() < 1e-9);
        assert!((result.result("isa_temperature_c").unwrap() - (15.0 - 0.00198 * ft)).abs() < 1e-9);
        assert!(
            (result.result("isa_deviation_c").unwrap() - (20.0 - 15.0 + 0.00198 * ft)).abs() < 1e-9
        );
    }

    #[test]
    fn test_zero_length_route_fails_before_any_surface() {
        let request: CalculationRequest = serde_json::from_value(json!({
            "procedure": "rnav_departure",
            "route": [{"x": 5.0, "y": 5.0}, {"x": 5.0, "y": 5.0}],
        }))
        .unwrap();
        assert!(matches!(
            request.calculate(),
            Err(crate::PansOpsError::InvalidInputGeometry(_))
        ));
    }

    #[test]
    fn test_unknown_procedure_is_rejected() {
        let parsed: std::result::Result<CalculationRequest, _> =
            serde_json::from_value(json!({"procedure": "circling"}));
        assert!(parsed.is_err());
    }
}
