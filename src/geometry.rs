use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::QuadError;

// --- Data Structures ---

/// A tetrahedron as four corner positions.
/// Vertex order only matters for face/edge rendering downstream; volume and
/// integration take the absolute value and are order-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tetrahedron {
    pub vertices: [[f64; 3]; 4],
}

impl Tetrahedron {
    pub fn new(vertices: [[f64; 3]; 4]) -> Self {
        Self { vertices }
    }

    /// Builds a tetrahedron from four "x,y,z" form inputs.
    /// Errors carry the 1-based index of the offending vertex field.
    pub fn from_inputs(inputs: &[String; 4]) -> Result<Self, QuadError> {
        let mut vertices = [[0.0; 3]; 4];
        for (i, text) in inputs.iter().enumerate() {
            vertices[i] = parse_vertex(i + 1, text)?;
        }
        Ok(Self { vertices })
    }

    /// Volume = 1/6 * |(p1-p0) . ((p2-p0) x (p3-p0))|
    /// Degenerate (flat) tetrahedra yield 0.0, not an error.
    pub fn volume(&self) -> f64 {
        let p0 = Vector3::from(self.vertices[0]);
        let p1 = Vector3::from(self.vertices[1]);
        let p2 = Vector3::from(self.vertices[2]);
        let p3 = Vector3::from(self.vertices[3]);

        let v1 = p1 - p0;
        let v2 = p2 - p0;
        let v3 = p3 - p0;

        (v1.dot(&v2.cross(&v3))).abs() / 6.0
    }

    /// Maps barycentric parameters to a physical point:
    /// P = (1-a-b-c)*V1 + a*V2 + b*V3 + c*V4
    pub fn point_at(&self, a: f64, b: f64, c: f64) -> [f64; 3] {
        let p0 = Vector3::from(self.vertices[0]);
        let p1 = Vector3::from(self.vertices[1]);
        let p2 = Vector3::from(self.vertices[2]);
        let p3 = Vector3::from(self.vertices[3]);

        let p = (1.0 - a - b - c) * p0 + a * p1 + b * p2 + c * p3;
        [p.x, p.y, p.z]
    }

    /// Arithmetic mean of the four corners. The frontend aims its orbit
    /// controls here after a redraw.
    pub fn centroid(&self) -> [f64; 3] {
        let mut center = [0.0; 3];
        for v in &self.vertices {
            for k in 0..3 {
                center[k] += v[k] / 4.0;
            }
        }
        center
    }
}

// --- Coordinate Parsing ---

/// Parses a "x,y,z" coordinate string into three floats.
/// `index` is the 1-based vertex number reported in error messages.
pub fn parse_vertex(index: usize, text: &str) -> Result<[f64; 3], QuadError> {
    let parts: Vec<&str> = text.split(',').collect();

    if parts.len() != 3 {
        return Err(QuadError::CoordinateParse {
            index,
            reason: format!("expected \"x,y,z\", got {} component(s)", parts.len()),
        });
    }

    let mut coords = [0.0; 3];
    for (k, part) in parts.iter().enumerate() {
        coords[k] = part.trim().parse().map_err(|_| QuadError::CoordinateParse {
            index,
            reason: format!("component {:?} is not a number", part.trim()),
        })?;
    }

    Ok(coords)
}
