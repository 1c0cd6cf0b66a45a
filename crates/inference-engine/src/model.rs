//! JSON Model Artifacts
//!
//! Linear models and gradient-boosted tree ensembles exported to JSON by the
//! offline training job.

use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Serialized regression model, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    /// Parse and check an artifact against the expected input dimension
    pub fn from_json(raw: &str, dimension: usize) -> Result<Self, InferenceError> {
        let artifact: Self = serde_json::from_str(raw)
            .map_err(|e| InferenceError::ModelLoadError(format!("Invalid model artifact: {}", e)))?;
        artifact.check(dimension)?;
        Ok(artifact)
    }

    /// Check structural consistency against the input dimension
    pub fn check(&self, dimension: usize) -> Result<(), InferenceError> {
        match self {
            ModelArtifact::Linear(model) => model.check(dimension),
            ModelArtifact::TreeEnsemble(model) => model.check(dimension),
        }
    }

    /// Evaluate on one (already scaled) feature row
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        match self {
            ModelArtifact::Linear(model) => model.evaluate(features),
            ModelArtifact::TreeEnsemble(model) => model.evaluate(features),
        }
    }

    /// Short backend name
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

/// `intercept + Σ coefficients[i] * x[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn check(&self, dimension: usize) -> Result<(), InferenceError> {
        if self.coefficients.len() != dimension {
            return Err(InferenceError::ModelLoadError(format!(
                "Linear model has {} coefficients, expected {}",
                self.coefficients.len(),
                dimension
            )));
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (coef, x)| acc + coef * x)
    }
}

/// Sum of regression trees on top of a base score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    fn check(&self, dimension: usize) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::ModelLoadError(
                "Tree ensemble has no trees".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(dimension)
                .map_err(|msg| InferenceError::ModelLoadError(format!("Tree {}: {}", i, msg)))?;
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.evaluate(features))
    }
}

/// One regression tree as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] < threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { leaf: f64 },
}

impl Tree {
    /// Children must come after their parent, which also rules out cycles
    fn check(&self, dimension: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= dimension {
                    return Err(format!("node {} splits on unknown feature {}", idx, feature));
                }
                for child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { leaf } => return leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] < threshold { left } else { right };
                }
            }
        }
    }
}
