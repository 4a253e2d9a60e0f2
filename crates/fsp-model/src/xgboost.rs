// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Evaluator for gradient boosted trees saved with XGBoost's
//! `save_model("model.json")`.
//!
//! Only the pieces needed for inference are read: the tree arrays, the
//! base score, the objective and the optional feature names. Everything
//! else in the document is ignored.

use crate::{Classifier, ModelError};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveParam,
}

#[derive(Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Deserialize)]
struct GbTreeModel {
    trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    #[serde(default)]
    default_left: Vec<Flag>,
}

/// Older releases write `default_left` as booleans, newer ones as 0/1.
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
    #[serde(default)]
    num_class: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveParam {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Sigmoid applied to the margin.
    Logistic,
    /// Margin returned as-is; the class boundary sits at 0.
    LogitRaw,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(index: usize, raw: RawTree, num_features: usize) -> Result<Self, ModelError> {
        let n = raw.left_children.len();
        let malformed = |reason: String| ModelError::MalformedTree {
            tree: index,
            reason,
        };

        if n == 0 {
            return Err(malformed("tree has no nodes".to_string()));
        }
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
        {
            return Err(malformed("node arrays differ in length".to_string()));
        }
        if !raw.default_left.is_empty() && raw.default_left.len() != n {
            return Err(malformed("default_left length differs".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = raw.left_children[i];
            let right = raw.right_children[i];

            if left == -1 {
                nodes.push(Node::Leaf(raw.split_conditions[i]));
                continue;
            }

            // Children always come after their parent, which also rules out cycles.
            let child = |c: i64| -> Result<usize, ModelError> {
                if c <= i as i64 || c >= n as i64 {
                    return Err(malformed(format!("node {} has invalid child {}", i, c)));
                }
                Ok(c as usize)
            };
            let feature = raw.split_indices[i];
            if feature < 0 || feature as usize >= num_features {
                return Err(malformed(format!(
                    "node {} splits on feature {} (model has {})",
                    i, feature, num_features
                )));
            }

            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: raw.split_conditions[i],
                left: child(left)?,
                right: child(right)?,
                default_left: raw.default_left.get(i).map(|f| f.is_set()).unwrap_or(true),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = features[feature];
                    idx = if x.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if x < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A binary tree ensemble loaded from an XGBoost JSON model.
#[derive(Debug, Clone)]
pub struct XgbModel {
    trees: Vec<Tree>,
    base_margin: f32,
    objective: Objective,
    num_features: usize,
    feature_names: Vec<String>,
}

impl XgbModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = File::open(path.as_ref())?;
        log::debug!("[Model] Loading XGBoost model from: {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_reader(reader)?;
        Self::from_model_file(file)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(json)?;
        Self::from_model_file(file)
    }

    fn from_model_file(file: ModelFile) -> Result<Self, ModelError> {
        let learner = file.learner;

        let objective = match learner.objective.name.as_str() {
            "binary:logistic" | "reg:logistic" => Objective::Logistic,
            "binary:logitraw" => Objective::LogitRaw,
            other => {
                return Err(ModelError::Unsupported(format!("objective '{}'", other)));
            }
        };

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster '{}'",
                learner.gradient_booster.name
            )));
        }

        let params = learner.learner_model_param;
        if let Some(num_class) = params.num_class.as_deref() {
            let classes: u32 = num_class.trim().parse().unwrap_or(0);
            if classes > 1 {
                return Err(ModelError::Unsupported(format!(
                    "multi-class model ({} classes)",
                    classes
                )));
            }
        }

        let base_score = parse_scalar(&params.base_score).ok_or_else(|| {
            ModelError::Unsupported(format!("base_score '{}'", params.base_score))
        })?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(ModelError::Unsupported(format!(
                "base_score {} outside (0, 1)",
                base_score
            )));
        }
        let base_margin = (base_score / (1.0 - base_score)).ln();

        let raw_trees = learner
            .gradient_booster
            .model
            .map(|m| m.trees)
            .unwrap_or_default();

        let num_features = match params.num_feature.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s
                .parse::<usize>()
                .map_err(|_| ModelError::Unsupported(format!("num_feature '{}'", s)))?,
            _ if !learner.feature_names.is_empty() => learner.feature_names.len(),
            _ => raw_trees
                .iter()
                .flat_map(|t| t.split_indices.iter().copied())
                .max()
                .map(|m| m.max(0) as usize + 1)
                .unwrap_or(0),
        };

        if !learner.feature_names.is_empty() && learner.feature_names.len() != num_features {
            return Err(ModelError::FeatureCount {
                expected: num_features,
                actual: learner.feature_names.len(),
            });
        }

        let trees = raw_trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(i, raw, num_features))
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "[Model] Loaded {} trees over {} features ({:?})",
            trees.len(),
            num_features,
            objective
        );

        Ok(Self {
            trees,
            base_margin,
            objective,
            num_features,
            feature_names: learner.feature_names,
        })
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Raw ensemble output before the objective's transform.
    pub fn margin(&self, features: &[f32]) -> Result<f32, ModelError> {
        if features.len() != self.num_features {
            return Err(ModelError::FeatureCount {
                expected: self.num_features,
                actual: features.len(),
            });
        }
        Ok(self.base_margin
            + self
                .trees
                .iter()
                .map(|t| t.leaf_value(features))
                .sum::<f32>())
    }
}

impl Classifier for XgbModel {
    fn name(&self) -> &str {
        "xgboost"
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f32, ModelError> {
        // Both objectives share the logistic link; logitraw only differs in
        // what XGBoost itself returns from predict().
        Ok(sigmoid(self.margin(features)?))
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// XGBoost 3 writes vector-valued base scores such as `"[5E-1]"`.
fn parse_scalar(s: &str) -> Option<f32> {
    s.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump_model(objective: &str, default_left: &str) -> String {
        format!(
            r#"{{
  "learner": {{
    "attributes": {{}},
    "feature_names": ["year", "flight_number"],
    "gradient_booster": {{
      "model": {{
        "gbtree_model_param": {{"num_parallel_tree": "1", "num_trees": "1"}},
        "tree_info": [0],
        "trees": [{{
          "id": 0,
          "left_children": [1, -1, -1],
          "right_children": [2, -1, -1],
          "split_indices": [1, 0, 0],
          "split_conditions": [1000.0, -0.4, 0.6],
          "default_left": {},
          "base_weights": [0.0, -0.4, 0.6]
        }}]
      }},
      "name": "gbtree"
    }},
    "learner_model_param": {{"base_score": "5E-1", "num_class": "0", "num_feature": "2"}},
    "objective": {{"name": "{}"}}
  }},
  "version": [2, 0, 3]
}}"#,
            default_left, objective
        )
    }

    #[test]
    fn test_stump_margins() {
        let model = XgbModel::from_json_str(&stump_model("binary:logistic", "[0, 0, 0]")).unwrap();
        assert_eq!(model.num_trees(), 1);
        assert_eq!(model.num_features(), 2);

        // base_score 0.5 -> base margin 0
        let low = model.margin(&[2024.0, 123.0]).unwrap();
        assert!((low - -0.4).abs() < 1e-6);
        let high = model.margin(&[2024.0, 4321.0]).unwrap();
        assert!((high - 0.6).abs() < 1e-6);

        // Split is strict: equal goes right
        let edge = model.margin(&[2024.0, 1000.0]).unwrap();
        assert!((edge - 0.6).abs() < 1e-6);

        let p = model.predict_proba(&[2024.0, 123.0]).unwrap();
        assert!((p - 0.401_312_34).abs() < 1e-5);
    }

    #[test]
    fn test_missing_values_follow_default_direction() {
        let right = XgbModel::from_json_str(&stump_model("binary:logistic", "[0, 0, 0]")).unwrap();
        let m = right.margin(&[2024.0, f32::NAN]).unwrap();
        assert!((m - 0.6).abs() < 1e-6);

        let left =
            XgbModel::from_json_str(&stump_model("binary:logistic", "[true, false, false]"))
                .unwrap();
        let m = left.margin(&[2024.0, f32::NAN]).unwrap();
        assert!((m - -0.4).abs() < 1e-6);
    }

    #[test]
    fn test_feature_names_exposed() {
        let model = XgbModel::from_json_str(&stump_model("binary:logitraw", "[0, 0, 0]")).unwrap();
        assert_eq!(model.objective(), Objective::LogitRaw);
        assert_eq!(
            model.feature_names().unwrap(),
            &["year".to_string(), "flight_number".to_string()]
        );
    }

    #[test]
    fn test_wrong_input_length() {
        let model = XgbModel::from_json_str(&stump_model("binary:logistic", "[0, 0, 0]")).unwrap();
        match model.margin(&[1.0]) {
            Err(ModelError::FeatureCount { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected FeatureCount, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let err = XgbModel::from_json_str(&stump_model("multi:softprob", "[0, 0, 0]"));
        assert!(matches!(err, Err(ModelError::Unsupported(_))));
    }

    #[test]
    fn test_rejects_backward_child() {
        let json = stump_model("binary:logistic", "[0, 0, 0]")
            .replace("\"left_children\": [1, -1, -1]", "\"left_children\": [0, -1, -1]");
        let err = XgbModel::from_json_str(&json);
        assert!(matches!(err, Err(ModelError::MalformedTree { tree: 0, .. })));
    }

    #[test]
    fn test_parse_scalar_variants() {
        assert_eq!(parse_scalar("5E-1"), Some(0.5));
        assert_eq!(parse_scalar("[2.5E-1]"), Some(0.25));
        assert_eq!(parse_scalar("abc"), None);
    }
}
