//! Gradient-Boosted Tree Regressor
//!
//! Evaluates a `gbtree` booster saved in XGBoost's JSON model format. Only the
//! parts of the document needed for prediction and gain importance are read;
//! everything else is ignored.

use feature_engine::{read_json, ArtifactError, ScaledVector, FEATURE_DIMENSION, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const ARTIFACT: &str = "model";

#[derive(Debug, Deserialize)]
struct ModelDocument {
    learner: LearnerDoc,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct LearnerDoc {
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: BoosterDoc,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveDoc,
}

#[derive(Debug, Deserialize)]
struct BoosterDoc {
    name: String,
    #[serde(default)]
    model: Option<GbTreeDoc>,
}

#[derive(Debug, Deserialize)]
struct GbTreeDoc {
    #[serde(default)]
    gbtree_model_param: GbTreeModelParam,
    trees: Vec<TreeDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct GbTreeModelParam {
    #[serde(default)]
    num_parallel_tree: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveDoc {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TreeDoc {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    #[serde(default)]
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
    #[serde(default)]
    loss_changes: Vec<f32>,
}

/// Older writers store flags as booleans, newer ones as 0/1
#[derive(Debug, Clone, Copy, Deserialize)]
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

/// Link between the summed margin and the reported price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    Identity,
    Log,
}

impl Link {
    fn for_objective(name: &str) -> Option<Self> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:pseudohubererror" | "reg:absoluteerror"
            | "reg:squaredlogerror" => Some(Link::Identity),
            "reg:gamma" | "reg:tweedie" | "count:poisson" => Some(Link::Log),
            _ => None,
        }
    }
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
    Leaf {
        value: f32,
    },
}

/// One regression tree
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_doc(doc: &TreeDoc, tree_idx: usize) -> Result<Self, ArtifactError> {
        let n = doc.left_children.len();
        let invalid = |reason: String| ArtifactError::invalid(ARTIFACT, format!("tree {tree_idx}: {reason}"));

        if n == 0 {
            return Err(invalid("no nodes".into()));
        }
        if doc.right_children.len() != n
            || doc.split_indices.len() != n
            || doc.split_conditions.len() != n
            || (!doc.default_left.is_empty() && doc.default_left.len() != n)
        {
            return Err(invalid("node arrays have different lengths".into()));
        }
        if doc.split_type.iter().any(|&t| t != 0) {
            return Err(invalid("categorical splits are not supported".into()));
        }

        let mut nodes = Vec::with_capacity(n);
        for nid in 0..n {
            let (left, right) = (doc.left_children[nid], doc.right_children[nid]);

            if left == -1 {
                nodes.push(Node::Leaf {
                    value: doc.split_conditions[nid],
                });
                continue;
            }

            // Children always follow their parent, which also rules out cycles
            let child = |id: i32| -> Result<usize, ArtifactError> {
                usize::try_from(id)
                    .ok()
                    .filter(|&c| c > nid && c < n)
                    .ok_or_else(|| invalid(format!("node {nid} has invalid child {id}")))
            };
            let feature = usize::try_from(doc.split_indices[nid])
                .ok()
                .filter(|&f| f < FEATURE_DIMENSION)
                .ok_or_else(|| {
                    invalid(format!(
                        "node {nid} splits on feature {} of {FEATURE_DIMENSION}",
                        doc.split_indices[nid]
                    ))
                })?;

            nodes.push(Node::Split {
                feature,
                threshold: doc.split_conditions[nid],
                left: child(left)?,
                right: child(right)?,
                default_left: doc.default_left.get(nid).map_or(false, |f| f.is_set()),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f32; FEATURE_DIMENSION]) -> f32 {
        let mut nid = 0;
        loop {
            match self.nodes[nid] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = features[feature];
                    nid = if x.is_nan() {
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

/// Summary of a loaded model for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub objective: String,
    pub link: Link,
    pub base_score: f32,
    pub trees: usize,
    pub format_version: Vec<u32>,
}

/// Frozen tree-ensemble price regressor
#[derive(Debug, Clone)]
pub struct RegressionModel {
    trees: Vec<Tree>,
    base_margin: f32,
    link: Link,
    summary: ModelSummary,
    importances: [f64; FEATURE_DIMENSION],
}

impl RegressionModel {
    /// Load a model saved in XGBoost's JSON format
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let doc: ModelDocument = read_json(ARTIFACT, path)?;
        let model = Self::from_document(doc)?;

        info!(
            path = %path.display(),
            objective = %model.summary.objective,
            trees = model.trees.len(),
            "Model loaded"
        );
        Ok(model)
    }

    /// Parse a model from JSON text
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let doc: ModelDocument = serde_json::from_str(json)
            .map_err(|e| ArtifactError::invalid(ARTIFACT, e.to_string()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: ModelDocument) -> Result<Self, ArtifactError> {
        let learner = doc.learner;
        let param = &learner.learner_model_param;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("booster {:?} is not supported", learner.gradient_booster.name),
            ));
        }
        if parse_count(param.num_class.as_deref(), "num_class")? > 1
            || parse_count(param.num_target.as_deref(), "num_target")? > 1
        {
            return Err(ArtifactError::invalid(ARTIFACT, "model has more than one output"));
        }
        let num_feature = parse_count(param.num_feature.as_deref(), "num_feature")?;
        if num_feature != FEATURE_DIMENSION as u64 {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("model expects {num_feature} features, pipeline provides {FEATURE_DIMENSION}"),
            ));
        }
        if !learner.feature_names.is_empty()
            && !learner.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES)
        {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("feature names {:?} do not match {FEATURE_NAMES:?}", learner.feature_names),
            ));
        }

        let objective = learner.objective.name.clone();
        let link = Link::for_objective(&objective).ok_or_else(|| {
            ArtifactError::invalid(ARTIFACT, format!("objective {objective:?} is not supported"))
        })?;

        let base_score = parse_base_score(&param.base_score)?;
        let base_margin = match link {
            Link::Identity => base_score,
            Link::Log if base_score > 0.0 => base_score.ln(),
            Link::Log => {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("base_score {base_score} must be positive for {objective}"),
                ))
            }
        };

        let booster = learner
            .gradient_booster
            .model
            .ok_or_else(|| ArtifactError::invalid(ARTIFACT, "booster has no trees"))?;
        let parallel = match booster.gbtree_model_param.num_parallel_tree.as_deref() {
            Some(s) => parse_count(Some(s), "num_parallel_tree")?.max(1),
            None => 1,
        };

        let all_trees = booster
            .trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| Tree::from_doc(tree, idx))
            .collect::<Result<Vec<_>, _>>()?;
        let importances = gain_importances(&booster.trees);

        // Early-stopped models predict with the trees up to the best round only
        let mut trees = all_trees;
        if let Some(best) = learner.attributes.get("best_iteration") {
            let best: u64 = best.trim().parse().map_err(|_| {
                ArtifactError::invalid(ARTIFACT, format!("best_iteration {best:?} is not a number"))
            })?;
            let keep = (best + 1).saturating_mul(parallel);
            let keep = usize::try_from(keep).unwrap_or(usize::MAX);
            debug!(best_iteration = best, keep, "Truncating to best iteration");
            trees.truncate(keep);
        }

        Ok(Self {
            summary: ModelSummary {
                objective,
                link,
                base_score,
                trees: trees.len(),
                format_version: doc.version,
            },
            trees,
            base_margin,
            link,
            importances,
        })
    }

    /// Predict a price for a scaled feature vector
    pub fn predict(&self, input: &ScaledVector) -> f32 {
        let mut features = [0.0f32; FEATURE_DIMENSION];
        for (f, v) in features.iter_mut().zip(input.values()) {
            *f = *v as f32;
        }

        let margin = self
            .trees
            .iter()
            .fold(self.base_margin, |acc, tree| acc + tree.leaf_value(&features));

        match self.link {
            Link::Identity => margin,
            Link::Log => margin.exp(),
        }
    }

    /// Normalised average split gain per feature, in fitted column order
    pub fn feature_importances(&self) -> &[f64; FEATURE_DIMENSION] {
        &self.importances
    }

    pub fn summary(&self) -> &ModelSummary {
        &self.summary
    }
}

/// Average loss reduction of each feature's splits, normalised to sum to 1
fn gain_importances(trees: &[TreeDoc]) -> [f64; FEATURE_DIMENSION] {
    let mut total = [0.0f64; FEATURE_DIMENSION];
    let mut count = [0u64; FEATURE_DIMENSION];

    for tree in trees {
        for (nid, &left) in tree.left_children.iter().enumerate() {
            if left == -1 {
                continue;
            }
            let Some(feature) = tree
                .split_indices
                .get(nid)
                .and_then(|&f| usize::try_from(f).ok())
                .filter(|&f| f < FEATURE_DIMENSION)
            else {
                continue;
            };
            total[feature] += tree.loss_changes.get(nid).copied().unwrap_or(0.0) as f64;
            count[feature] += 1;
        }
    }

    let mut average = [0.0f64; FEATURE_DIMENSION];
    for idx in 0..FEATURE_DIMENSION {
        if count[idx] > 0 {
            average[idx] = total[idx] / count[idx] as f64;
        }
    }

    let sum: f64 = average.iter().sum();
    if sum > 0.0 {
        for v in &mut average {
            *v /= sum;
        }
    }
    average
}

/// `base_score` is written as `"5E-1"` or, by newer writers, `"[5E-1]"`
fn parse_base_score(raw: &str) -> Result<f32, ArtifactError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or_default().trim();

    first
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ArtifactError::invalid(ARTIFACT, format!("base_score {raw:?} is not a number")))
}

fn parse_count(raw: Option<&str>, what: &str) -> Result<u64, ArtifactError> {
    match raw {
        None => Ok(0),
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| ArtifactError::invalid(ARTIFACT, format!("{what} {s:?} is not a count"))),
    }
}
