pub mod geometry;
pub mod quad;
pub mod scene;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Tetrahedron;
use crate::quad::expr;
use crate::quad::integrate::integrate;
use crate::quad::rules::{self, QuadNode};
use crate::scene::{SceneData, SceneOptions, build_scene};

/// Errors surfaced by the quadrature core. Evaluation faults inside a
/// compiled expression are not listed here: they surface as NaN values, never
/// as errors.
#[derive(Debug, Error)]
pub enum QuadError {
    #[error("invalid function expression: {0}")]
    ExpressionSyntax(String),

    #[error("invalid quadrature rule data: {0}")]
    RuleParse(String),

    #[error("unknown quadrature rule {0:?}")]
    UnknownRule(String),

    #[error("vertex {index} is invalid: {reason}")]
    CoordinateParse { index: usize, reason: String },
}

// --- Request / Response Payloads ---

/// Rule selector value that switches to user-supplied rule text.
pub const CUSTOM_RULE: &str = "custom";

#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
    /// Catalog name, or "custom" to use `custom_data`.
    pub rule_name: String,
    pub custom_data: Option<String>,
    /// Four "x,y,z" vertex fields, in order.
    pub vertices: [String; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawRequest {
    pub rule_name: String,
    pub custom_data: Option<String>,
    pub vertices: [String; 4],
    #[serde(default)]
    pub options: SceneOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculateResponse {
    pub value: f64,
    /// The value at the fixed display precision (8 decimal places).
    pub display: String,
    /// Non-fatal validation findings, shown alongside the result.
    pub warnings: Vec<String>,
    pub scene: SceneData,
}

// --- Action Boundary ---

/// Runs one calculation: compile the expression, resolve the rule, parse the
/// vertices, integrate, and describe the scene for the frontend redraw.
/// Every failure is reduced to a single user-visible message.
pub fn calculate(request: &CalculateRequest) -> Result<CalculateResponse, String> {
    let expression = request.expression.trim();
    if expression.is_empty() {
        return Err("please enter a function expression".to_string());
    }

    let compiled = expr::compile(expression).map_err(|e| e.to_string())?;

    let (nodes, warning) = resolve_rule(&request.rule_name, request.custom_data.as_deref())
        .map_err(|e| e.to_string())?;

    let tet = Tetrahedron::from_inputs(&request.vertices).map_err(|e| e.to_string())?;

    let value = integrate(&compiled, &nodes, &tet);
    println!(
        "Integrated {:?} over {} node(s): {:.8}",
        expression,
        nodes.len(),
        value
    );

    // Calculation redraws with default styling; explicit colors come from
    // the draw action.
    let scene = build_scene(&tet, &nodes, SceneOptions::default());

    Ok(CalculateResponse {
        value,
        display: format!("{:.8}", value),
        warnings: warning.into_iter().collect(),
        scene,
    })
}

/// Rebuilds the scene without integrating. Rule validation errors are still
/// fatal here; the weight-sum warning is not, and is not reported.
pub fn draw(request: &DrawRequest) -> Result<SceneData, String> {
    let tet = Tetrahedron::from_inputs(&request.vertices).map_err(|e| e.to_string())?;

    let (nodes, _warning) = resolve_rule(&request.rule_name, request.custom_data.as_deref())
        .map_err(|e| e.to_string())?;

    Ok(build_scene(&tet, &nodes, request.options.clone()))
}

/// Resolves the rule selector to a node list, with the validator's warning
/// for the custom path. Built-in rules are trusted as-is.
fn resolve_rule(
    rule_name: &str,
    custom_data: Option<&str>,
) -> Result<(Vec<QuadNode>, Option<String>), QuadError> {
    if rule_name == CUSTOM_RULE {
        let nodes = rules::parse_custom(custom_data.unwrap_or_default())?;
        let warning = rules::validate_rule(&nodes)?;
        Ok((nodes, warning))
    } else {
        let rule = rules::get_rule(rule_name)?;
        Ok((rule.nodes, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_vertices() -> [String; 4] {
        ["0,0,0", "1,0,0", "0,1,0", "0,0,1"].map(String::from)
    }

    fn basic_request(expression: &str, rule_name: &str) -> CalculateRequest {
        CalculateRequest {
            expression: expression.to_string(),
            rule_name: rule_name.to_string(),
            custom_data: None,
            vertices: reference_vertices(),
        }
    }

    #[test]
    fn calculate_constant_over_reference_tet() {
        let response = calculate(&basic_request("1", "1-point")).unwrap();

        assert_relative_eq!(response.value, 1.0 / 6.0, epsilon = 1e-12);
        assert_eq!(response.display, "0.16666667");
        assert!(response.warnings.is_empty());
        assert_eq!(response.scene.faces.len(), 4);
        assert_eq!(response.scene.edges.len(), 12);
        assert_eq!(response.scene.markers.len(), 1);
    }

    #[test]
    fn calculate_rejects_empty_expression() {
        let error = calculate(&basic_request("   ", "1-point")).unwrap_err();
        assert!(error.contains("function expression"));
    }

    #[test]
    fn calculate_rejects_unknown_rule() {
        let error = calculate(&basic_request("1", "99-point")).unwrap_err();
        assert!(error.contains("unknown quadrature rule"));
    }

    #[test]
    fn calculate_reports_failing_vertex_index() {
        let mut request = basic_request("1", "1-point");
        request.vertices[2] = "a,2,3".to_string();
        let error = calculate(&request).unwrap_err();
        assert!(error.contains("vertex 3"), "got: {}", error);

        request.vertices[2] = "1,2".to_string();
        let error = calculate(&request).unwrap_err();
        assert!(error.contains("vertex 3"), "got: {}", error);
    }

    #[test]
    fn calculate_custom_rule_warns_on_weight_sum() {
        let mut request = basic_request("1", CUSTOM_RULE);
        request.custom_data = Some("[[0.25, 0.25, 0.25, 0.5]]".to_string());

        let response = calculate(&request).unwrap();
        // 0.5 * volume * 6 for the constant function.
        assert_relative_eq!(response.value, 0.5, epsilon = 1e-12);
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("weights sum"));
    }

    #[test]
    fn calculate_rejects_missing_custom_data() {
        let request = basic_request("1", CUSTOM_RULE);
        assert!(calculate(&request).is_err());
    }

    #[test]
    fn draw_applies_requested_options() {
        let request = DrawRequest {
            rule_name: "1-point".to_string(),
            custom_data: None,
            vertices: reference_vertices(),
            options: SceneOptions {
                node_color: "green".to_string(),
                edge_color: "white".to_string(),
                fill_color: "rgba(255,0,0,0.5)".to_string(),
            },
        };

        let scene = draw(&request).unwrap();
        assert_eq!(scene.options.node_color, "green");
        // Weight 1/6 saturates the marker-size clamp.
        assert_relative_eq!(scene.markers[0].radius, 0.05);
        assert_relative_eq!(scene.center[0], 0.25);
    }

    #[test]
    fn draw_rejects_wrong_arity_custom_rule() {
        let request = DrawRequest {
            rule_name: CUSTOM_RULE.to_string(),
            custom_data: Some("[[0.1, 0.1, 0.1]]".to_string()),
            vertices: reference_vertices(),
            options: SceneOptions::default(),
        };
        let error = draw(&request).unwrap_err();
        assert!(error.contains("exactly 4"), "got: {}", error);
    }

    #[test]
    fn scene_payload_serializes_for_the_frontend() {
        let response = calculate(&basic_request("x+y+z", "4-point")).unwrap();
        let json = serde_json::to_value(&response.scene).unwrap();

        assert_eq!(json["faces"].as_array().unwrap().len(), 4);
        assert_eq!(json["markers"].as_array().unwrap().len(), 4);
        assert_eq!(json["options"]["fill_color"], "rgba(0,0,255,0.2)");
    }
}
