//! Error kinds raised by the surface engine.
//!
//! Every construction step fails fast: a calculation either returns its full
//! surface set or one of these errors, never a partial result.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PansOpsError {
    /// Route has fewer than two vertices, zero length or coincident endpoints.
    #[error("invalid input geometry: {0}")]
    InvalidInputGeometry(String),
    /// A required parameter or OAS plane coefficient is absent.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),
    /// A construction step would produce NaN/Inf or a self-intersecting ring.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    /// IAS/TAS resolves to a non-positive value or the bank angle is outside (0, 90).
    #[error("invalid turn parameters: {0}")]
    InvalidTurnParameters(String),
    #[error("parameter out of range: {0}")]
    ParameterOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, PansOpsError>;

/// Fail with `ParameterOutOfRange` unless `value` is finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PansOpsError::ParameterOutOfRange(format!(
            "{name} must be positive (got {value})"
        )))
    }
}

/// Fail with `ParameterOutOfRange` unless `value` is finite and not negative.
pub(crate) fn require_non_negative(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PansOpsError::ParameterOutOfRange(format!(
            "{name} must not be negative (got {value})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_kind() {
        let err = PansOpsError::MissingConfiguration("WA, XC".into());
        assert_eq!(err.to_string(), "missing configuration: WA, XC");
    }

    #[test]
    fn test_range_helpers() {
        assert!(require_positive("moc", 150.0).is_ok());
        assert!(matches!(
            require_positive("moc", 0.0),
            Err(PansOpsError::ParameterOutOfRange(_))
        ));
        assert!(require_non_negative("cwy", 0.0).is_ok());
        assert!(require_non_negative("cwy", f64::NAN).is_err());
    }
}
