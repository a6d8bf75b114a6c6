//! Turning geometry in wind: wind spirals and holding racetracks.
//!
//! Both builders walk the turn in fixed angular increments around the turn
//! center. At each increment the nominal circle point is pushed outward by the
//! drift accumulated so far, rotated by the wind correction angle.

use crate::error::{require_positive, PansOpsError, Result};
use crate::physics::{
    drift_angle_deg, turn_drift, wind_effect_45, TurnParameters, TurnPerformance, WindModel,
};
use crate::spatial::{normalize_bearing, project, Point2, RouteSegment, NM_TO_M};
use crate::surface::{CalculationResult, ProtectionSurface};
use serde::{Deserialize, Serialize};

/// Angular step between spiral points, degrees.
pub const SPIRAL_INCREMENT_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    #[default]
    Right,
    Left,
}

impl TurnDirection {
    /// +1 for clockwise (right) turns, -1 for left.
    pub fn sign(&self) -> f64 {
        match self {
            TurnDirection::Right => 1.0,
            TurnDirection::Left => -1.0,
        }
    }
}

/// A turn entered at `start` while flying `track`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnGeometry {
    pub start: Point2,
    pub track: f64,
    pub direction: TurnDirection,
    pub radius_m: f64,
}

impl TurnGeometry {
    pub fn center(&self) -> Point2 {
        project(self.start, self.radius_m, self.track + 90.0 * self.direction.sign())
    }

    /// Bearing from the turn center back to the start point.
    pub fn start_radial(&self) -> f64 {
        normalize_bearing(self.track - 90.0 * self.direction.sign())
    }

    /// Points after each increment up to `total_deg`, excluding the start.
    ///
    /// `drift` is `(rate_of_turn_deg_s, wind_kt, drift_angle_deg)`; `None` gives the
    /// nominal still-air arc.
    pub fn points(&self, total_deg: f64, drift: Option<(f64, f64, f64)>) -> Vec<Point2> {
        let center = self.center();
        let sign = self.direction.sign();
        let steps = (total_deg / SPIRAL_INCREMENT_DEG).round() as usize;
        (1..=steps)
            .map(|i| {
                let turned = i as f64 * SPIRAL_INCREMENT_DEG;
                let radial = self.start_radial() + sign * turned;
                let on_circle = project(center, self.radius_m, radial);
                match drift {
                    Some((rate, wind_kt, drift_deg)) => {
                        let e_m = turn_drift(turned, rate, wind_kt) * NM_TO_M;
                        project(on_circle, e_m, radial - sign * drift_deg)
                    }
                    None => on_circle,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSpiralParams {
    /// Track into the turn; the turn starts at the route end.
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub turn: TurnParameters,
    #[serde(default)]
    pub direction: TurnDirection,
    /// Degrees of turn covered, a multiple of 30.
    #[serde(default = "default_spiral_extent")]
    pub extent_deg: f64,
}

fn default_spiral_extent() -> f64 {
    360.0
}

impl Default for WindSpiralParams {
    fn default() -> Self {
        Self {
            route: Vec::new(),
            reversed: false,
            turn: TurnParameters {
                ias_kt: 205.0,
                altitude_ft: 800.0,
                isa_deviation_c: 0.0,
                bank_deg: 15.0,
                wind: WindModel::Fixed(30.0),
            },
            direction: TurnDirection::Right,
            extent_deg: 360.0,
        }
    }
}

/// A computed spiral: start point followed by one point per increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSpiral {
    pub performance: TurnPerformance,
    pub drift_angle_deg: f64,
    pub center: Point2,
    pub points: Vec<Point2>,
}

pub fn build_wind_spiral(
    start: Point2,
    track: f64,
    perf: &TurnPerformance,
    direction: TurnDirection,
    extent_deg: f64,
) -> Result<WindSpiral> {
    let steps = extent_deg / SPIRAL_INCREMENT_DEG;
    if !(extent_deg >= SPIRAL_INCREMENT_DEG && extent_deg <= 360.0)
        || (steps - steps.round()).abs() > 1e-9
    {
        return Err(PansOpsError::ParameterOutOfRange(format!(
            "spiral extent must be a multiple of 30 within [30, 360] degrees (got {extent_deg})"
        )));
    }
    let drift_deg = drift_angle_deg(perf.wind_kt, perf.tas_kt)?;
    let geometry = TurnGeometry {
        start,
        track,
        direction,
        radius_m: perf.radius_of_turn_nm * NM_TO_M,
    };
    let mut points = vec![start];
    points.extend(geometry.points(
        extent_deg,
        Some((perf.rate_of_turn_deg_s, perf.wind_kt, drift_deg)),
    ));
    Ok(WindSpiral {
        performance: *perf,
        drift_angle_deg: drift_deg,
        center: geometry.center(),
        points,
    })
}

pub fn calculate_wind_spiral(params: &WindSpiralParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    let perf = params.turn.resolve()?;
    let spiral = build_wind_spiral(
        route.end,
        route.azimuth,
        &perf,
        params.direction,
        params.extent_deg,
    )?;

    let mut result = CalculationResult::new("wind_spiral");
    // A single increment gives only the start and one point, too few for an area.
    if spiral.points.len() >= 3 {
        let area = ProtectionSurface::polygon("Wind Spiral", spiral.points.clone())?
            .with_meta("turn", format!("{:?}", params.direction));
        if params.extent_deg >= 360.0 {
            result.push_checked(area)?;
        } else {
            result.push(area);
        }
    }
    result.push(ProtectionSurface::line("Wind Spiral Track", spiral.points.clone())?);

    set_turn_results(&mut result, &perf);
    result.set("drift_angle_deg", spiral.drift_angle_deg);
    result.set(
        "total_drift_nm",
        turn_drift(params.extent_deg, perf.rate_of_turn_deg_s, perf.wind_kt),
    );
    Ok(result)
}

pub(crate) fn set_turn_results(result: &mut CalculationResult, perf: &TurnPerformance) {
    result.set("ias_kt", perf.ias_kt);
    result.set("tas_kt", perf.tas_kt);
    result.set("rate_of_turn_deg_s", perf.rate_of_turn_deg_s);
    result.set("radius_of_turn_nm", perf.radius_of_turn_nm);
    result.set("wind_kt", perf.wind_kt);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingParams {
    /// Inbound track; the holding fix is the route end.
    pub route: Vec<Point2>,
    #[serde(default)]
    pub reversed: bool,
    pub turn: TurnParameters,
    #[serde(default)]
    pub direction: TurnDirection,
    pub leg_time_min: f64,
    /// Navaid elevation used for the height term of the template, feet.
    #[serde(default)]
    pub navaid_elevation_ft: f64,
}

impl Default for HoldingParams {
    fn default() -> Self {
        Self {
            route: Vec::new(),
            reversed: false,
            turn: TurnParameters {
                ias_kt: 195.0,
                altitude_ft: 10000.0,
                isa_deviation_c: 0.0,
                bank_deg: 25.0,
                wind: WindModel::IcaoStandard,
            },
            direction: TurnDirection::Right,
            leg_time_min: 1.0,
            navaid_elevation_ft: 0.0,
        }
    }
}

/// Basic holding area template distances (NM unless noted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingTemplate {
    /// TAS in NM per second.
    pub v: f64,
    /// Height above the navaid in thousands of feet.
    pub h: f64,
    pub w_kt: f64,
    /// Wind in NM per second.
    pub wp: f64,
    pub e45: f64,
    /// Outbound time, seconds.
    pub t: f64,
    pub leg_nm: f64,
    pub l: [f64; 22],
}

impl HoldingTemplate {
    /// Uses the wind already resolved into `perf`.
    pub fn compute(
        perf: &TurnPerformance,
        altitude_ft: f64,
        navaid_elevation_ft: f64,
        leg_time_min: f64,
    ) -> Self {
        let v = perf.tas_kt / 3600.0;
        let h = (altitude_ft - navaid_elevation_ft) / 1000.0;
        let w_kt = perf.wind_kt;
        let wp = w_kt / 3600.0;
        let rate = perf.rate_of_turn_deg_s;
        let r = perf.radius_of_turn_nm;
        let e45 = wind_effect_45(rate, w_kt);
        let t = leg_time_min * 60.0;
        let leg_nm = v * t;

        let l12 = 5.0 * v;
        let l13 = 11.0 * v;
        let l14 = (t - 5.0) * v;
        let l15 = (t + 21.0) * v;
        let l16 = 5.0 * wp;
        let l17 = 11.0 * wp;
        let l18 = l17 + e45;
        let l19 = l17 + 2.0 * e45;
        let l20 = l17 + 3.0 * e45;
        let l21 = l17 + 4.0 * e45;
        let l22 = l16 + 4.0 * e45;
        let l23 = l16 + 5.0 * e45;
        let l24 = l16 + 6.0 * e45;
        let l25 = (t + 6.0) * wp + 4.0 * e45;
        let l26 = l25 + 14.0 * wp;
        let l27 = l26 + e45;
        let l28 = l26 + 2.0 * e45;
        let l29 = l26 + 3.0 * e45;
        let l30 = l25 + 4.0 * e45;
        let l31 = l26 + 4.0 * e45;
        let l32 = 2.0 * r + (t + 15.0) * v + (t + 26.0 + 195.0 / rate) * wp;
        let l33 = 11.0 * v * 20f64.to_radians().cos()
            + r * (1.0 + 20f64.to_radians().sin())
            + (t + 15.0) * v * 5f64.to_radians().tan()
            + (t + 26.0 + 125.0 / rate) * wp;

        Self {
            v,
            h,
            w_kt,
            wp,
            e45,
            t,
            leg_nm,
            l: [
                l12, l13, l14, l15, l16, l17, l18, l19, l20, l21, l22, l23, l24, l25, l26, l27,
                l28, l29, l30, l31, l32, l33,
            ],
        }
    }
}

/// Nominal racetrack: fix, first 180 degree turn, outbound leg, second turn, inbound leg.
pub fn build_racetrack(
    fix: Point2,
    inbound_track: f64,
    radius_m: f64,
    leg_m: f64,
    direction: TurnDirection,
) -> Vec<Point2> {
    let outbound_track = normalize_bearing(inbound_track + 180.0);
    let first = TurnGeometry {
        start: fix,
        track: inbound_track,
        direction,
        radius_m,
    };
    let mut ring = vec![fix];
    ring.extend(first.points(180.0, None));

    let outbound_end = project(ring[ring.len() - 1], leg_m, outbound_track);
    let second = TurnGeometry {
        start: outbound_end,
        track: outbound_track,
        direction,
        radius_m,
    };
    ring.push(outbound_end);
    ring.extend(second.points(180.0, None));
    // The last arc point is the inbound leg start; the ring closes back on the fix.
    ring
}

pub fn calculate_holding(params: &HoldingParams) -> Result<CalculationResult> {
    let route = RouteSegment::from_polyline(&params.route, params.reversed)?;
    require_positive("leg time", params.leg_time_min)?;
    let perf = params.turn.resolve()?;

    let template = HoldingTemplate::compute(
        &perf,
        params.turn.altitude_ft,
        params.navaid_elevation_ft,
        params.leg_time_min,
    );
    let radius_m = perf.radius_of_turn_nm * NM_TO_M;
    let racetrack = build_racetrack(
        route.end,
        route.azimuth,
        radius_m,
        template.leg_nm * NM_TO_M,
        params.direction,
    );

    let mut result = CalculationResult::new("holding");
    result.push_checked(
        ProtectionSurface::polygon("Holding Racetrack", racetrack)?
            .with_meta("turn", format!("{:?}", params.direction)),
    )?;
    let inbound_start = project(route.end, template.leg_nm * NM_TO_M, route.back_azimuth());
    result.push(ProtectionSurface::line("Inbound Leg", [inbound_start, route.end])?);

    set_turn_results(&mut result, &perf);
    result.set("leg_nm", template.leg_nm);
    result.set("v_nm_s", template.v);
    result.set("h_kft", template.h);
    result.set("wp_nm_s", template.wp);
    result.set("e45_nm", template.e45);
    result.set("t_s", template.t);
    for (i, value) in template.l.iter().enumerate() {
        result.set(format!("L{}_nm", i + 12), *value);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::true_airspeed;
    use crate::spatial::{distance, ring_is_simple, ring_winding, Winding};

    fn north_route() -> Vec<Point2> {
        vec![Point2::new(0.0, -5000.0), Point2::new(0.0, 0.0)]
    }

    #[test]
    fn test_turn_center_side() {
        let right = TurnGeometry {
            start: Point2::new(0.0, 0.0),
            track: 0.0,
            direction: TurnDirection::Right,
            radius_m: 1000.0,
        };
        assert!((right.center().x - 1000.0).abs() < 1e-9);
        let left = TurnGeometry {
            direction: TurnDirection::Left,
            ..right
        };
        assert!((left.center().x + 1000.0).abs() < 1e-9);

        // Still-air half turn ends abeam the start at twice the radius.
        let pts = right.points(180.0, None);
        assert_eq!(pts.len(), 6);
        let end = pts[5];
        assert!((end.x - 2000.0).abs() < 1e-6);
        assert!(end.y.abs() < 1e-6);
    }

    #[test]
    fn test_wind_spiral_full_turn_closure() {
        let params = WindSpiralParams {
            route: north_route(),
            ..WindSpiralParams::default()
        };
        let perf = params.turn.resolve().unwrap();
        let spiral = build_wind_spiral(
            Point2::new(0.0, 0.0),
            0.0,
            &perf,
            TurnDirection::Right,
            360.0,
        )
        .unwrap();
        assert_eq!(spiral.points.len(), 13);

        let r = perf.radius_of_turn_nm;
        let e = turn_drift(360.0, perf.rate_of_turn_deg_s, perf.wind_kt);
        let drift = spiral.drift_angle_deg.to_radians();
        let expected = (r * r + e * e + 2.0 * r * e * drift.cos()).sqrt() * NM_TO_M;
        let last = spiral.points[12];
        assert!((distance(spiral.center, last) - expected).abs() < 1e-6);

        // Radial distance grows monotonically, so there is no jump at wraparound.
        let radii: Vec<f64> = spiral
            .points
            .iter()
            .map(|p| distance(spiral.center, *p))
            .collect();
        assert!(radii.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_wind_spiral_is_simple() {
        for direction in [TurnDirection::Right, TurnDirection::Left] {
            let params = WindSpiralParams {
                route: north_route(),
                direction,
                ..WindSpiralParams::default()
            };
            let result = calculate_wind_spiral(&params).unwrap();
            let area = result.surface("Wind Spiral").unwrap();
            assert_eq!(area.vertex_count(), 13);
            assert!(ring_is_simple(&area.outline()));
            let expected = match direction {
                TurnDirection::Right => Winding::Clockwise,
                TurnDirection::Left => Winding::CounterClockwise,
            };
            assert_eq!(ring_winding(&area.outline()), Some(expected));
        }
    }

    fn partial_spiral(extent_deg: f64) -> Result<CalculationResult> {
        calculate_wind_spiral(&WindSpiralParams {
            route: north_route(),
            extent_deg,
            ..WindSpiralParams::default()
        })
    }

    #[test]
    fn test_single_increment_spiral_is_track_only() {
        let result = partial_spiral(30.0).unwrap();
        assert!(result.surface("Wind Spiral").is_none());
        let track = result.surface("Wind Spiral Track").unwrap();
        assert_eq!(track.vertex_count(), 2);
        let rate = result.result("rate_of_turn_deg_s").unwrap();
        let wind = result.result("wind_kt").unwrap();
        assert!(
            (result.result("total_drift_nm").unwrap() - turn_drift(30.0, rate, wind)).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_quarter_turn_spiral() {
        let result = partial_spiral(90.0).unwrap();
        let area = result.surface("Wind Spiral").unwrap();
        // start + three increments
        assert_eq!(area.vertex_count(), 4);
        assert!(ring_is_simple(&area.outline()));
        assert_eq!(result.surface("Wind Spiral Track").unwrap().vertex_count(), 4);

        // The last point sits 90 degrees round from the start, pushed out by the drift.
        let perf = WindSpiralParams::default().turn.resolve().unwrap();
        let spiral =
            build_wind_spiral(Point2::new(0.0, 0.0), 0.0, &perf, TurnDirection::Right, 90.0)
                .unwrap();
        let e = turn_drift(90.0, perf.rate_of_turn_deg_s, perf.wind_kt);
        let drift = spiral.drift_angle_deg.to_radians();
        let r = perf.radius_of_turn_nm;
        let expected = (r * r + e * e + 2.0 * r * e * drift.cos()).sqrt() * NM_TO_M;
        assert!((distance(spiral.center, spiral.points[3]) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_spiral_extent_must_be_whole_increments() {
        for extent in [45.0, 0.0, 390.0, f64::NAN] {
            assert!(
                matches!(partial_spiral(extent), Err(PansOpsError::ParameterOutOfRange(_))),
                "extent {extent}"
            );
        }
    }

    #[test]
    fn test_wind_spiral_rejects_wind_above_tas() {
        let mut perf = true_airspeed(100.0, 0.0, 0.0, 15.0).unwrap();
        perf.wind_kt = 150.0;
        assert!(matches!(
            build_wind_spiral(Point2::new(0.0, 0.0), 0.0, &perf, TurnDirection::Right, 360.0),
            Err(PansOpsError::InvalidTurnParameters(_))
        ));
    }

    #[test]
    fn test_holding_leg_length() {
        let params = HoldingParams {
            route: north_route(),
            ..HoldingParams::default()
        };
        let result = calculate_holding(&params).unwrap();
        let tas = result.result("tas_kt").unwrap();
        assert_eq!(
            result.result("leg_nm").unwrap(),
            (tas / 3600.0) * (params.leg_time_min * 60.0)
        );
        // ICAO standard wind at 10000 ft.
        assert!((result.result("wind_kt").unwrap() - 67.0).abs() < 1e-9);
        assert!(result.result("L33_nm").is_some());
    }

    #[test]
    fn test_holding_template_uses_fixed_wind() {
        let mut params = HoldingParams {
            route: north_route(),
            ..HoldingParams::default()
        };
        params.turn.wind = WindModel::Fixed(30.0);
        let result = calculate_holding(&params).unwrap();
        assert_eq!(result.result("wind_kt").unwrap(), 30.0);
        assert!((result.result("wp_nm_s").unwrap() - 30.0 / 3600.0).abs() < 1e-12);
        let rate = result.result("rate_of_turn_deg_s").unwrap();
        let e45 = wind_effect_45(rate, 30.0);
        assert!((result.result("e45_nm").unwrap() - e45).abs() < 1e-12);
    }

    #[test]
    fn test_racetrack_shape() {
        let params = HoldingParams {
            route: north_route(),
            ..HoldingParams::default()
        };
        let result = calculate_holding(&params).unwrap();
        let track = result.surface("Holding Racetrack").unwrap();
        // fix + 6 arc points + outbound end + 6 arc points
        assert_eq!(track.vertex_count(), 14);
        let ring = track.outline();
        assert!(ring_is_simple(&ring));
        assert_eq!(ring_winding(&ring), Some(Winding::Clockwise));

        let leg_m = result.result("leg_nm").unwrap() * NM_TO_M;
        let r_m = result.result("radius_of_turn_nm").unwrap() * NM_TO_M;
        // Inbound leg start lies one leg length behind the fix.
        let inbound_start = ring[13];
        assert!(inbound_start.x.abs() < 1e-6);
        assert!((inbound_start.y + leg_m).abs() < 1e-6);
        // Abeam point lies two radii to the right of the fix.
        assert!((ring[6].x - 2.0 * r_m).abs() < 1e-6);
    }

    #[test]
    fn test_left_holding_winds_counter_clockwise() {
        let params = HoldingParams {
            route: north_route(),
            direction: TurnDirection::Left,
            ..HoldingParams::default()
        };
        let result = calculate_holding(&params).unwrap();
        let ring = result.surface("Holding Racetrack").unwrap().outline();
        assert_eq!(ring_winding(&ring), Some(Winding::CounterClockwise));
        assert!(ring.iter().all(|p| p.x <= 1e-6));
    }
}
