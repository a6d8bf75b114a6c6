//! Request file handling: a calculation request plus optional obstacles.

use crate::oas_table::load_oas_constants;
use anyhow::{Context, Result};
use pansops_core::{
    assess_obstacles, CalculationRequest, CalculationResult, Obstacle, ObstacleHit,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// A parsed request file.
///
/// The file is a single JSON object: the `procedure` tag and its parameters,
/// plus an optional `obstacles` array assessed against the produced surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub request: CalculationRequest,
    pub obstacles: Vec<Obstacle>,
}

impl Input {
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(text).context("request is not valid JSON")?;
        let obstacles = match value.as_object_mut().and_then(|o| o.remove("obstacles")) {
            Some(raw) => serde_json::from_value(raw).context("invalid obstacles")?,
            None => Vec::new(),
        };
        let request = serde_json::from_value(value).context("invalid calculation request")?;
        Ok(Self { request, obstacles })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub result: CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacles: Option<Vec<ObstacleHit>>,
}

/// Runs one request. An OAS request without coefficients takes them from `oas_table`.
pub fn run(mut input: Input, oas_table: Option<&Path>) -> Result<Output> {
    if let CalculationRequest::OasIls(params) = &mut input.request {
        if params.coefficients.is_empty() {
            if let Some(path) = oas_table {
                params.coefficients = load_oas_constants(path)?;
                debug!(
                    "Loaded {} OAS constants from {}",
                    params.coefficients.len(),
                    path.display()
                );
            }
        }
    }

    let procedure = input.request.procedure();
    info!("Calculating {}", procedure);
    let result = input
        .request
        .calculate()
        .with_context(|| format!("{procedure} calculation failed"))?;

    for surface in &result.surfaces {
        debug!(
            "{}: {:?} with {} vertices",
            surface.name,
            surface.shape,
            surface.vertex_count()
        );
    }
    for warning in &result.warnings {
        warn!("{}: {}", procedure, warning);
    }
    info!(
        "{} produced {} surfaces, {} warnings",
        procedure,
        result.surfaces.len(),
        result.warnings.len()
    );

    let obstacles = if input.obstacles.is_empty() {
        None
    } else {
        let hits = assess_obstacles(&result.surfaces, &input.obstacles);
        let penetrating = hits.iter().filter(|h| h.penetrates()).count();
        if penetrating > 0 {
            warn!("{} obstacle hits penetrate a surface", penetrating);
        }
        info!(
            "{} obstacles assessed, {} inside a surface",
            input.obstacles.len(),
            hits.len()
        );
        Some(hits)
    };

    Ok(Output { result, obstacles })
}
