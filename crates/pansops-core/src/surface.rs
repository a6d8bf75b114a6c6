//! Surface assembly: named, closed vertex rings plus a scalar result bundle.

use crate::corridor::{ring_points, RingVertex};
use crate::elevation::ElevationRule;
use crate::error::{PansOpsError, Result};
use crate::spatial::{ring_is_simple, ring_winding, Point2, Point3, Winding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Vertex {
    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }

    fn same_as(&self, other: &Vertex) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl From<Point2> for Vertex {
    fn from(p: Point2) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: None,
        }
    }
}

impl From<Point3> for Vertex {
    fn from(p: Point3) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: Some(p.z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Polygon,
    LineString,
}

/// A named protection area or construction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSurface {
    pub name: String,
    pub shape: Shape,
    /// Polygon rings are stored closed (last vertex repeats the first).
    pub vertices: Vec<Vertex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Vertex>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ProtectionSurface {
    /// Closed polygon from a ring; appends the first vertex if needed.
    pub fn polygon<V: Into<Vertex>>(
        name: impl Into<String>,
        ring: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let name = name.into();
        let vertices = close_ring(&name, ring.into_iter().map(Into::into).collect())?;
        Ok(Self {
            name,
            shape: Shape::Polygon,
            vertices,
            holes: Vec::new(),
            metadata: BTreeMap::new(),
        })
    }

    pub fn line<V: Into<Vertex>>(
        name: impl Into<String>,
        points: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let name = name.into();
        let vertices: Vec<Vertex> = points.into_iter().map(Into::into).collect();
        if vertices.len() < 2 {
            return Err(PansOpsError::DegenerateGeometry(format!(
                "{name}: a line needs at least 2 vertices"
            )));
        }
        check_finite(&name, &vertices)?;
        Ok(Self {
            name,
            shape: Shape::LineString,
            vertices,
            holes: Vec::new(),
            metadata: BTreeMap::new(),
        })
    }

    /// Polygon from a corridor ring, lifted by an elevation rule when one is given.
    pub fn from_ring(
        name: impl Into<String>,
        ring: &[RingVertex],
        elevation: Option<&ElevationRule>,
    ) -> Result<Self> {
        match elevation {
            Some(rule) => Self::polygon(name, rule.lift(ring)),
            None => Self::polygon(name, ring_points(ring)),
        }
    }

    pub fn line_from_ring(
        name: impl Into<String>,
        ring: &[RingVertex],
        elevation: Option<&ElevationRule>,
    ) -> Result<Self> {
        match elevation {
            Some(rule) => Self::line(name, rule.lift(ring)),
            None => Self::line(name, ring_points(ring)),
        }
    }

    pub fn with_hole(mut self, hole: Vec<Vertex>) -> Result<Self> {
        let closed = close_ring(&self.name, hole)?;
        self.holes.push(closed);
        Ok(self)
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    /// Number of distinct vertices (the closing duplicate is not counted).
    pub fn vertex_count(&self) -> usize {
        match self.shape {
            Shape::Polygon => self.vertices.len().saturating_sub(1),
            Shape::LineString => self.vertices.len(),
        }
    }

    pub fn is_3d(&self) -> bool {
        self.vertices.iter().all(|v| v.z.is_some())
    }

    /// Open 2D ring (or the line itself).
    pub fn outline(&self) -> Vec<Point2> {
        self.vertices[..self.vertex_count()]
            .iter()
            .map(Vertex::xy)
            .collect()
    }
}

fn check_finite(name: &str, vertices: &[Vertex]) -> Result<()> {
    if vertices.iter().all(Vertex::is_finite) {
        Ok(())
    } else {
        Err(PansOpsError::DegenerateGeometry(format!(
            "{name}: non-finite vertex"
        )))
    }
}

fn close_ring(name: &str, mut vertices: Vec<Vertex>) -> Result<Vec<Vertex>> {
    check_finite(name, &vertices)?;
    let closed = match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) => vertices.len() > 1 && first.same_as(last),
        _ => false,
    };
    let distinct = if closed {
        vertices.len() - 1
    } else {
        vertices.len()
    };
    if distinct < 3 {
        return Err(PansOpsError::DegenerateGeometry(format!(
            "{name}: a polygon needs at least 3 vertices, got {distinct}"
        )));
    }
    if !closed {
        vertices.push(vertices[0]);
    }
    Ok(vertices)
}

/// Everything one calculation produces. Built in one pass, then handed off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub procedure: String,
    pub surfaces: Vec<ProtectionSurface>,
    pub results: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip)]
    winding: Option<Winding>,
}

impl CalculationResult {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            surfaces: Vec::new(),
            results: BTreeMap::new(),
            warnings: Vec::new(),
            winding: None,
        }
    }

    pub fn push(&mut self, surface: ProtectionSurface) {
        self.surfaces.push(surface);
    }

    /// Push a constructed area after checking it is simple and winds the same
    /// way as every other checked area in this calculation.
    pub fn push_checked(&mut self, surface: ProtectionSurface) -> Result<()> {
        let outline = surface.outline();
        if !ring_is_simple(&outline) {
            return Err(PansOpsError::DegenerateGeometry(format!(
                "{} is self-intersecting",
                surface.name
            )));
        }
        let winding = ring_winding(&outline).ok_or_else(|| {
            PansOpsError::DegenerateGeometry(format!("{} encloses no area", surface.name))
        })?;
        match self.winding {
            Some(expected) if expected != winding => {
                return Err(PansOpsError::DegenerateGeometry(format!(
                    "{} winds {:?}, other areas wind {:?}",
                    surface.name, winding, expected
                )));
            }
            _ => self.winding = Some(winding),
        }
        self.surfaces.push(surface);
        Ok(())
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.results.insert(key.into(), value);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn surface(&self, name: &str) -> Option<&ProtectionSurface> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    pub fn result(&self, key: &str) -> Option<f64> {
        self.results.get(key).copied()
    }

    /// Shared winding of the checked areas, if any were pushed.
    pub fn winding(&self) -> Option<Winding> {
        self.winding
    }
}
