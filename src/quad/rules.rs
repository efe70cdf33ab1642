use serde::{Deserialize, Serialize};

use crate::QuadError;

/// Volume of the reference tetrahedron; a rule that integrates constants
/// exactly has weights summing to this.
pub const REFERENCE_VOLUME: f64 = 1.0 / 6.0;

/// Absolute slack allowed on the weight sum before the validator warns.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

/// A quadrature node (a, b, c, weight).
/// (a, b, c) parameterize the point P = (1-a-b-c)*V1 + a*V2 + b*V3 + c*V4;
/// weights are scaled to the reference volume (1/6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadNode {
    pub xi: [f64; 3],
    pub weight: f64,
}

impl QuadNode {
    pub fn new(a: f64, b: f64, c: f64, weight: f64) -> Self {
        Self { xi: [a, b, c], weight }
    }
}

/// A named entry of the built-in rule catalog.
#[derive(Debug, Clone, Serialize)]
pub struct QuadratureRule {
    pub name: &'static str,
    pub description: &'static str,
    pub nodes: Vec<QuadNode>,
}

/// Catalog order, as presented in the rule selector.
pub fn rule_names() -> Vec<&'static str> {
    vec!["1-point", "4-point", "5-point"]
}

/// Returns a built-in rule by catalog name.
pub fn get_rule(name: &str) -> Result<QuadratureRule, QuadError> {
    match name {
        "1-point" => Ok(QuadratureRule {
            name: "1-point",
            description: "Centroid rule, order 1 (exact for linear functions)",
            nodes: vec![QuadNode::new(0.25, 0.25, 0.25, 1.0 / 6.0)],
        }),
        "4-point" => {
            // Order 2 (integrates quadratics exactly)
            // Alpha = (5 + 3\sqrt{5}) / 20, Beta = (5 - \sqrt{5}) / 20
            // Weights = 1/4 * Vol = 1/24
            let a = 0.5854101966249685;
            let b = 0.1381966011250105;
            let w = 1.0 / 24.0;
            Ok(QuadratureRule {
                name: "4-point",
                description: "Symmetric 4-point rule, order 2 (exact for quadratics)",
                nodes: vec![
                    QuadNode::new(b, b, b, w),
                    QuadNode::new(a, b, b, w),
                    QuadNode::new(b, a, b, w),
                    QuadNode::new(b, b, a, w),
                ],
            })
        }
        "5-point" => {
            // Order 3 (integrates cubics exactly)
            // Node 1: centroid, weight -4/5 * Vol = -2/15
            // Nodes 2-5: (1/2, 1/6, 1/6, 1/6) permutations, weight 9/20 * Vol = 3/40
            let w1 = -2.0 / 15.0;
            let w2 = 3.0 / 40.0;
            let p = 0.5;
            let q = 1.0 / 6.0;
            Ok(QuadratureRule {
                name: "5-point",
                description: "Centroid + 4-point rule, order 3 (exact for cubics)",
                nodes: vec![
                    QuadNode::new(0.25, 0.25, 0.25, w1),
                    QuadNode::new(q, q, q, w2),
                    QuadNode::new(p, q, q, w2),
                    QuadNode::new(q, p, q, w2),
                    QuadNode::new(q, q, p, w2),
                ],
            })
        }
        _ => Err(QuadError::UnknownRule(name.to_string())),
    }
}

/// Parses user-supplied rule text: a nested array of [a, b, c, weight] rows.
/// Single quotes and irregular whitespace are tolerated; anything that is not
/// an array of 4-element numeric rows is rejected. The text is never executed.
pub fn parse_custom(text: &str) -> Result<Vec<QuadNode>, QuadError> {
    let normalized = text.replace('\'', "\"");

    let value: serde_json::Value = serde_json::from_str(normalized.trim())
        .map_err(|e| QuadError::RuleParse(e.to_string()))?;

    let rows = value
        .as_array()
        .ok_or_else(|| QuadError::RuleParse("expected an array of nodes".to_string()))?;

    let mut nodes = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let entries = row.as_array().ok_or_else(|| {
            QuadError::RuleParse(format!("node {} is not an array", i + 1))
        })?;

        if entries.len() != 4 {
            return Err(QuadError::RuleParse(format!(
                "node {} must have exactly 4 entries (a, b, c, weight), got {}",
                i + 1,
                entries.len()
            )));
        }

        let mut values = [0.0; 4];
        for (k, entry) in entries.iter().enumerate() {
            values[k] = entry.as_f64().ok_or_else(|| {
                QuadError::RuleParse(format!("node {} entry {} is not a number", i + 1, k + 1))
            })?;
        }

        nodes.push(QuadNode::new(values[0], values[1], values[2], values[3]));
    }

    Ok(nodes)
}

/// Checks a node list. Non-finite entries are a hard error; a weight sum away
/// from the reference volume is only a warning, since such a rule cannot
/// integrate constants exactly but may still be worth an exploratory run.
pub fn validate_rule(nodes: &[QuadNode]) -> Result<Option<String>, QuadError> {
    for (i, node) in nodes.iter().enumerate() {
        let finite = node.xi.iter().all(|v| v.is_finite()) && node.weight.is_finite();
        if !finite {
            return Err(QuadError::RuleParse(format!(
                "node {} has a non-finite entry",
                i + 1
            )));
        }
    }

    let weight_sum: f64 = nodes.iter().map(|n| n.weight).sum();
    if (weight_sum - REFERENCE_VOLUME).abs() > WEIGHT_SUM_TOLERANCE {
        return Ok(Some(format!(
            "weights sum to {:.6}, expected {:.6}; the rule will not integrate constants exactly",
            weight_sum, REFERENCE_VOLUME
        )));
    }

    Ok(None)
}
