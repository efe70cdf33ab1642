use serde::{Deserialize, Serialize};

use crate::geometry::Tetrahedron;
use crate::quad::rules::QuadNode;

/// Face list used for rendering. Winding is kept stable so the frontend can
/// shade consistently.
const FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [1, 2, 3], [0, 2, 3]];

/// Display radius bounds for quadrature-node markers.
const MIN_MARKER_RADIUS: f64 = 0.01;
const MAX_MARKER_RADIUS: f64 = 0.05;

/// Color choices forwarded to the renderer. Values are CSS-style color
/// strings, either named ("red") or rgba("rgba(0,0,255,0.2)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneOptions {
    pub node_color: String,
    pub edge_color: String,
    pub fill_color: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            node_color: "red".to_string(),
            edge_color: "black".to_string(),
            fill_color: "rgba(0,0,255,0.2)".to_string(),
        }
    }
}

/// A quadrature node resolved to a physical position, sized by its weight.
#[derive(Debug, Clone, Serialize)]
pub struct NodeMarker {
    pub position: [f64; 3],
    pub radius: f64,
}

/// Everything the 3D frontend needs to redraw: triangles and edge segments
/// of the tetrahedron, one marker per quadrature node, the camera target,
/// and the color options passed through unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct SceneData {
    pub faces: Vec<[[f64; 3]; 3]>,
    pub edges: Vec<[[f64; 3]; 2]>,
    pub markers: Vec<NodeMarker>,
    pub center: [f64; 3],
    pub options: SceneOptions,
}

/// Assembles the renderable description of a tetrahedron and its quadrature
/// nodes. Pure data out; the viewer owns everything else.
pub fn build_scene(tet: &Tetrahedron, nodes: &[QuadNode], options: SceneOptions) -> SceneData {
    let mut faces = Vec::with_capacity(FACES.len());
    let mut edges = Vec::with_capacity(FACES.len() * 3);

    for face in FACES {
        let corners = face.map(|i| tet.vertices[i]);
        faces.push(corners);

        // Each face contributes its three boundary segments.
        edges.push([corners[0], corners[1]]);
        edges.push([corners[1], corners[2]]);
        edges.push([corners[2], corners[0]]);
    }

    let markers = nodes
        .iter()
        .map(|node| {
            let [a, b, c] = node.xi;
            NodeMarker {
                position: tet.point_at(a, b, c),
                radius: (node.weight * 10.0).clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS),
            }
        })
        .collect();

    SceneData {
        faces,
        edges,
        markers,
        center: tet.centroid(),
        options,
    }
}
