//! Aviation physics: ISA temperature, true airspeed and turn performance.

use crate::error::{PansOpsError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Standard rate of turn cap in degrees per second.
pub const MAX_RATE_OF_TURN: f64 = 3.0;

/// ISA temperature lapse in degrees C per foot.
const ISA_LAPSE_PER_FT: f64 = 0.00198;

/// ISA temperature (deg C) at an elevation in feet.
pub fn isa_temperature(elevation_ft: f64) -> f64 {
    15.0 - ISA_LAPSE_PER_FT * elevation_ft
}

/// Deviation of a reference temperature from ISA at an elevation in feet.
pub fn isa_deviation(elevation_ft: f64, reference_temp_c: f64) -> f64 {
    reference_temp_c - isa_temperature(elevation_ft)
}

/// IAS to TAS conversion factor for an altitude and ISA deviation.
pub fn tas_factor(altitude_ft: f64, isa_dev_c: f64) -> f64 {
    let t = 288.0 - ISA_LAPSE_PER_FT * altitude_ft;
    171233.0 * (t + isa_dev_c).sqrt() / t.powf(2.628)
}

/// How the wind speed used for protection is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model", content = "kt")]
pub enum WindModel {
    /// A caller supplied omnidirectional wind in knots.
    Fixed(f64),
    /// ICAO standard wind `2h + 47` kt, h in thousands of feet.
    IcaoStandard,
}

impl Default for WindModel {
    fn default() -> Self {
        WindModel::Fixed(30.0)
    }
}

impl WindModel {
    pub fn speed_kt(&self, altitude_ft: f64) -> f64 {
        match *self {
            WindModel::Fixed(kt) => kt,
            WindModel::IcaoStandard => 2.0 * altitude_ft / 1000.0 + 47.0,
        }
    }
}

/// Turn performance bundle. `rate_of_turn_deg_s` is always capped at standard rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnPerformance {
    pub ias_kt: f64,
    pub tas_kt: f64,
    pub rate_of_turn_deg_s: f64,
    pub radius_of_turn_nm: f64,
    pub wind_kt: f64,
}

/// TAS, rate and radius of turn for an IAS, altitude, ISA deviation and bank angle.
///
/// Wind is left at zero; use [`TurnParameters::resolve`] to attach a wind model.
pub fn true_airspeed(
    ias_kt: f64,
    altitude_ft: f64,
    isa_dev_c: f64,
    bank_deg: f64,
) -> Result<TurnPerformance> {
    if !(ias_kt.is_finite() && ias_kt > 0.0) {
        return Err(PansOpsError::InvalidTurnParameters(format!(
            "IAS must be positive (got {ias_kt} kt)"
        )));
    }
    if !(bank_deg > 0.0 && bank_deg < 90.0) {
        return Err(PansOpsError::InvalidTurnParameters(format!(
            "bank angle must be within (0, 90) degrees (got {bank_deg})"
        )));
    }

    let tas_kt = tas_factor(altitude_ft, isa_dev_c) * ias_kt;
    if !(tas_kt.is_finite() && tas_kt > 0.0) {
        return Err(PansOpsError::InvalidTurnParameters(format!(
            "TAS resolves to {tas_kt} kt at {altitude_ft} ft, ISA{isa_dev_c:+}"
        )));
    }

    let rate_of_turn_deg_s =
        (3431.0 * bank_deg.to_radians().tan() / (PI * tas_kt)).min(MAX_RATE_OF_TURN);
    let radius_of_turn_nm = tas_kt / (20.0 * PI * rate_of_turn_deg_s);

    Ok(TurnPerformance {
        ias_kt,
        tas_kt,
        rate_of_turn_deg_s,
        radius_of_turn_nm,
        wind_kt: 0.0,
    })
}

/// Inputs for a turn, including the wind model used for drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnParameters {
    pub ias_kt: f64,
    pub altitude_ft: f64,
    #[serde(default)]
    pub isa_deviation_c: f64,
    pub bank_deg: f64,
    #[serde(default)]
    pub wind: WindModel,
}

impl TurnParameters {
    pub fn resolve(&self) -> Result<TurnPerformance> {
        let mut perf = true_airspeed(
            self.ias_kt,
            self.altitude_ft,
            self.isa_deviation_c,
            self.bank_deg,
        )?;
        let wind_kt = self.wind.speed_kt(self.altitude_ft);
        if !(wind_kt.is_finite() && wind_kt >= 0.0) {
            return Err(PansOpsError::ParameterOutOfRange(format!(
                "wind speed must not be negative (got {wind_kt} kt)"
            )));
        }
        perf.wind_kt = wind_kt;
        Ok(perf)
    }
}

/// Distance flown during the pilot reaction time, in NM.
pub fn pilot_reaction_distance(reaction_time_s: f64, tas_kt: f64, wind_kt: f64) -> f64 {
    (reaction_time_s / 3600.0) * (tas_kt + wind_kt)
}

/// Wind effect over a 90 degree turn (E90), in NM.
pub fn wind_effect_90(rate_of_turn_deg_s: f64, wind_kt: f64) -> f64 {
    (90.0 / rate_of_turn_deg_s) * (wind_kt / 3600.0)
}

/// Wind effect over a 45 degree turn (E45), in NM.
pub fn wind_effect_45(rate_of_turn_deg_s: f64, wind_kt: f64) -> f64 {
    45.0 * (wind_kt / 3600.0) / rate_of_turn_deg_s
}

/// Sideways drift accumulated after turning through `turned_deg`, in NM.
pub fn turn_drift(turned_deg: f64, rate_of_turn_deg_s: f64, wind_kt: f64) -> f64 {
    (turned_deg / rate_of_turn_deg_s) * (wind_kt / 3600.0)
}

/// Wind correction (crab) angle in degrees.
pub fn drift_angle_deg(wind_kt: f64, tas_kt: f64) -> Result<f64> {
    if wind_kt >= tas_kt {
        return Err(PansOpsError::InvalidTurnParameters(format!(
            "wind {wind_kt} kt is not below TAS {tas_kt} kt"
        )));
    }
    Ok((wind_kt / tas_kt).asin().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_isa_temperature() {
        assert!((isa_temperature(0.0) - 15.0).abs() < 1e-12);
        assert!((isa_temperature(10000.0) - (-4.8)).abs() < 1e-9);
    }

    #[test]
    fn test_isa_consistency_property() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let elev = rng.random_range(-1500.0..45000.0);
            assert!(isa_deviation(elev, isa_temperature(elev)).abs() < 1e-12);
        }
        assert!((isa_deviation(0.0, 25.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_tas_at_known_point() {
        // 205 kt IAS at 800 ft ISA: k ~ 1.0118
        let perf = true_airspeed(205.0, 800.0, 0.0, 15.0).unwrap();
        assert!((perf.tas_kt / 205.0 - 1.0118).abs() < 1e-4);
        assert!((tas_factor(0.0, 0.0) - 1.0).abs() < 1e-5);
        let expected_rate = 3431.0 * 15f64.to_radians().tan() / (PI * perf.tas_kt);
        assert!((perf.rate_of_turn_deg_s - expected_rate).abs() < 1e-12);
        assert!(
            (perf.radius_of_turn_nm - perf.tas_kt / (20.0 * PI * perf.rate_of_turn_deg_s)).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_rate_cap_applies_at_low_speed() {
        let perf = true_airspeed(60.0, 0.0, 0.0, 45.0).unwrap();
        assert_eq!(perf.rate_of_turn_deg_s, MAX_RATE_OF_TURN);
        assert!((perf.radius_of_turn_nm - perf.tas_kt / (60.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_turn_rate_cap_property() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5000 {
            let ias = rng.random_range(60.0..=400.0);
            let alt = rng.random_range(0.0..=15000.0);
            let bank = rng.random_range(0.01..=45.0);
            let perf = true_airspeed(ias, alt, 0.0, bank).unwrap();
            assert!(perf.rate_of_turn_deg_s <= MAX_RATE_OF_TURN + 1e-9);
            assert!(perf.radius_of_turn_nm > 0.0);
        }
    }

    #[test]
    fn test_invalid_turn_parameters() {
        for (ias, bank) in [(0.0, 15.0), (-10.0, 15.0), (200.0, 0.0), (200.0, 90.0)] {
            assert!(matches!(
                true_airspeed(ias, 1000.0, 0.0, bank),
                Err(PansOpsError::InvalidTurnParameters(_))
            ));
        }
    }

    #[test]
    fn test_wind_models() {
        assert_eq!(WindModel::Fixed(30.0).speed_kt(5000.0), 30.0);
        assert!((WindModel::IcaoStandard.speed_kt(10000.0) - 67.0).abs() < 1e-12);

        let params = TurnParameters {
            ias_kt: 195.0,
            altitude_ft: 10000.0,
            isa_deviation_c: 15.0,
            bank_deg: 25.0,
            wind: WindModel::IcaoStandard,
        };
        assert!((params.resolve().unwrap().wind_kt - 67.0).abs() < 1e-12);
    }

    #[test]
    fn test_reaction_and_wind_effects() {
        assert!((pilot_reaction_distance(3600.0, 200.0, 30.0) - 230.0).abs() < 1e-9);
        assert!((wind_effect_90(3.0, 36.0) - 0.3).abs() < 1e-12);
        assert!((wind_effect_45(3.0, 36.0) - 0.15).abs() < 1e-12);
        assert!((turn_drift(90.0, 3.0, 36.0) - wind_effect_90(3.0, 36.0)).abs() < 1e-12);
        assert!((drift_angle_deg(100.0, 200.0).unwrap() - 30.0).abs() < 1e-9);
        assert!(drift_angle_deg(200.0, 200.0).is_err());
    }
}
