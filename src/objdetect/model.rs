use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::Size;
use crate::error::{Error, Result};
use crate::objdetect::haar::{HaarFeature, HaarRect};
use crate::objdetect::lbp::LBPFeature;

/// A decoded node in the model's node tree: strings, numbers, sequences and
/// maps. The crate never reads a concrete file format — callers build this
/// tree however their storage format dictates and hand it to [`load_cascade`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelNode {
    Str(String),
    Int(i64),
    Float(f64),
    Seq(Vec<ModelNode>),
    Map(BTreeMap<String, ModelNode>),
}

impl ModelNode {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelNode::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ModelNode::Int(v) => Some(*v),
            ModelNode::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ModelNode::Int(v) => Some(*v as f64),
            ModelNode::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[ModelNode]> {
        match self {
            ModelNode::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ModelNode> {
        match self {
            ModelNode::Map(map) => map.get(key),
            _ => None,
        }
    }
}

fn field<'a>(node: &'a ModelNode, key: &str) -> Result<&'a ModelNode> {
    node.get(key)
        .ok_or_else(|| Error::MalformedModel(format!("missing field `{key}`")))
}

fn field_str<'a>(node: &'a ModelNode, key: &str) -> Result<&'a str> {
    field(node, key)?
        .as_str()
        .ok_or_else(|| Error::MalformedModel(format!("field `{key}` is not a string")))
}

fn field_i64(node: &ModelNode, key: &str) -> Result<i64> {
    field(node, key)?
        .as_i64()
        .ok_or_else(|| Error::MalformedModel(format!("field `{key}` is not an integer")))
}

fn field_f64(node: &ModelNode, key: &str) -> Result<f64> {
    field(node, key)?
        .as_f64()
        .ok_or_else(|| Error::MalformedModel(format!("field `{key}` is not a number")))
}

fn field_seq<'a>(node: &'a ModelNode, key: &str) -> Result<&'a [ModelNode]> {
    field(node, key)?
        .as_seq()
        .ok_or_else(|| Error::MalformedModel(format!("field `{key}` is not a sequence")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Haar,
    LBP,
}

/// `{ feature_idx, left, right, threshold }`. `left`/`right` use the sign
/// trick: positive advances to another internal node in the same tree,
/// `<= 0` indexes a leaf as `leaf_ofs + (-child)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DTreeNode {
    pub feature_idx: u32,
    pub left: i32,
    pub right: i32,
    pub threshold: f32,
}

/// A weak classifier: a small tree over `node_count` nodes in `nodes`,
/// starting at `first_node`, with `node_count + 1` leaves in `leaves`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DTree {
    pub first_node: u32,
    pub node_count: u32,
}

/// A boosted stage: a run of weak trees plus the reject threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub first_tree: u32,
    pub tree_count: u32,
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Features {
    Haar(Vec<HaarFeatureModel>),
    LBP(Vec<LBPFeatureModel>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaarRectModel {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaarFeatureModel {
    pub tilted: bool,
    pub rects: Vec<HaarRectModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LBPFeatureModel {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The full in-memory cascade: immutable once loaded. Flat arrays hold
/// stages, trees, nodes and leaves in stage->tree->node order;
/// `subsets` holds the per-node categorical bitmasks for LBP cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub feature_type: FeatureType,
    pub orig_win_size: Size,
    pub ncategories: u32,
    pub stages: Vec<Stage>,
    pub trees: Vec<DTree>,
    pub nodes: Vec<DTreeNode>,
    pub leaves: Vec<f32>,
    pub subsets: Vec<u32>,
    pub features: Features,
}

impl Cascade {
    #[must_use]
    pub fn subset_words(&self) -> usize {
        ((self.ncategories as usize) + 31) / 32
    }

    #[must_use]
    pub fn haar_features(&self) -> Option<&[HaarFeatureModel]> {
        match &self.features {
            Features::Haar(f) => Some(f),
            Features::LBP(_) => None,
        }
    }

    #[must_use]
    pub fn lbp_features(&self) -> Option<&[LBPFeatureModel]> {
        match &self.features {
            Features::LBP(f) => Some(f),
            Features::Haar(_) => None,
        }
    }
}

impl From<&HaarFeatureModel> for HaarFeature {
    fn from(m: &HaarFeatureModel) -> Self {
        HaarFeature::new(
            m.tilted,
            m.rects
                .iter()
                .map(|r| HaarRect::new(crate::core::types::Rect::new(r.x, r.y, r.width, r.height), r.weight))
                .collect(),
        )
    }
}

impl From<&LBPFeatureModel> for LBPFeature {
    fn from(m: &LBPFeatureModel) -> Self {
        LBPFeature::new(crate::core::types::Rect::new(m.x, m.y, m.width, m.height))
    }
}

/// Traverse a decoded node tree into a [`Cascade`]. Any missing or
/// type-mismatched field fails the load with [`Error::MalformedModel`]; no
/// partial state is returned.
pub fn load_cascade(root: &ModelNode) -> Result<Cascade> {
    let stage_type = field_str(root, "stageType")?;
    if stage_type != "BOOST" {
        return Err(Error::MalformedModel(format!("unsupported stageType `{stage_type}`")));
    }

    let feature_type_str = field_str(root, "featureType")?;
    let feature_type = match feature_type_str {
        "HAAR" => FeatureType::Haar,
        "LBP" => FeatureType::LBP,
        other => return Err(Error::MalformedModel(format!("unsupported featureType `{other}`"))),
    };

    let width = field_i64(root, "width")?;
    let height = field_i64(root, "height")?;
    if width <= 0 || height <= 0 {
        return Err(Error::MalformedModel("width/height must be positive".to_string()));
    }
    let orig_win_size = Size::new(width as i32, height as i32);

    let ncategories = field(root, "featureParams")
        .ok()
        .and_then(|fp| fp.get("maxCatCount"))
        .and_then(ModelNode::as_i64)
        .unwrap_or(0);
    if ncategories < 0 {
        return Err(Error::MalformedModel("maxCatCount must not be negative".to_string()));
    }
    let ncategories = ncategories as u32;
    let subset_words = ((ncategories as usize) + 31) / 32;
    let node_step = 3 + if ncategories > 0 { subset_words } else { 1 };

    let mut stages = Vec::new();
    let mut trees = Vec::new();
    let mut nodes = Vec::new();
    let mut leaves = Vec::new();
    let mut subsets = Vec::new();

    for stage_node in field_seq(root, "stages")? {
        let threshold = field_f64(stage_node, "stageThreshold")? as f32;
        let weak_classifiers = field_seq(stage_node, "weakClassifiers")?;

        let first_tree = trees.len() as u32;
        for tree_node in weak_classifiers {
            let internal = field_seq(tree_node, "internalNodes")?;
            if internal.len() % node_step != 0 {
                return Err(Error::MalformedModel(
                    "internalNodes length is not a multiple of node_step".to_string(),
                ));
            }
            let node_count = internal.len() / node_step;
            if node_count == 0 {
                return Err(Error::MalformedModel("weak tree with 0 nodes".to_string()));
            }

            let leaf_values = field_seq(tree_node, "leafValues")?;
            if leaf_values.len() != node_count + 1 {
                return Err(Error::MalformedModel("leaf count must equal node_count + 1".to_string()));
            }

            let first_node = nodes.len() as u32;
            for chunk in internal.chunks(node_step) {
                let left = chunk[0]
                    .as_i64()
                    .ok_or_else(|| Error::MalformedModel("internal node `left` is not numeric".to_string()))?
                    as i32;
                let right = chunk[1]
                    .as_i64()
                    .ok_or_else(|| Error::MalformedModel("internal node `right` is not numeric".to_string()))?
                    as i32;
                let feature_idx = chunk[2]
                    .as_i64()
                    .ok_or_else(|| Error::MalformedModel("internal node `feature_idx` is not numeric".to_string()))?
                    as u32;

                let threshold = if ncategories > 0 {
                    for word in &chunk[3..3 + subset_words] {
                        let bits = word
                            .as_i64()
                            .ok_or_else(|| Error::MalformedModel("subset word is not numeric".to_string()))?;
                        subsets.push(bits as u32);
                    }
                    0.0
                } else {
                    chunk[3]
                        .as_f64()
                        .ok_or_else(|| Error::MalformedModel("node threshold is not numeric".to_string()))?
                        as f32
                };

                nodes.push(DTreeNode {
                    feature_idx,
                    left,
                    right,
                    threshold,
                });
            }

            for leaf in leaf_values {
                leaves.push(
                    leaf.as_f64()
                        .ok_or_else(|| Error::MalformedModel("leaf value is not numeric".to_string()))?
                        as f32,
                );
            }

            trees.push(DTree {
                first_node,
                node_count: node_count as u32,
            });
        }

        stages.push(Stage {
            first_tree,
            tree_count: (trees.len() as u32) - first_tree,
            threshold,
        });
    }

    let features = match feature_type {
        FeatureType::Haar => Features::Haar(load_haar_features(root)?),
        FeatureType::LBP => Features::LBP(load_lbp_features(root)?),
    };

    Ok(Cascade {
        feature_type,
        orig_win_size,
        ncategories,
        stages,
        trees,
        nodes,
        leaves,
        subsets,
        features,
    })
}

fn load_haar_features(root: &ModelNode) -> Result<Vec<HaarFeatureModel>> {
    field_seq(root, "features")?
        .iter()
        .map(|feature_node| {
            let rects_seq = field_seq(feature_node, "rects")?;
            if rects_seq.is_empty() || rects_seq.len() > 3 {
                return Err(Error::MalformedModel("HAAR feature must have 1-3 rects".to_string()));
            }
            let rects = rects_seq
                .iter()
                .map(|r| {
                    let fields = r
                        .as_seq()
                        .ok_or_else(|| Error::MalformedModel("rect entry is not a sequence".to_string()))?;
                    if fields.len() != 5 {
                        return Err(Error::MalformedModel("rect entry must be [x y w h weight]".to_string()));
                    }
                    Ok(HaarRectModel {
                        x: fields[0].as_i64().ok_or_else(numeric_err)? as i32,
                        y: fields[1].as_i64().ok_or_else(numeric_err)? as i32,
                        width: fields[2].as_i64().ok_or_else(numeric_err)? as i32,
                        height: fields[3].as_i64().ok_or_else(numeric_err)? as i32,
                        weight: fields[4].as_f64().ok_or_else(numeric_err)? as f32,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let tilted = field_i64(feature_node, "tilted").unwrap_or(0) != 0;
            Ok(HaarFeatureModel { tilted, rects })
        })
        .collect()
}

fn load_lbp_features(root: &ModelNode) -> Result<Vec<LBPFeatureModel>> {
    field_seq(root, "features")?
        .iter()
        .map(|feature_node| {
            let rect = field_seq(feature_node, "rect")?;
            if rect.len() != 4 {
                return Err(Error::MalformedModel("LBP rect must be [x y w h]".to_string()));
            }
            Ok(LBPFeatureModel {
                x: rect[0].as_i64().ok_or_else(numeric_err)? as i32,
                y: rect[1].as_i64().ok_or_else(numeric_err)? as i32,
                width: rect[2].as_i64().ok_or_else(numeric_err)? as i32,
                height: rect[3].as_i64().ok_or_else(numeric_err)? as i32,
            })
        })
        .collect()
}

fn numeric_err() -> Error {
    Error::MalformedModel("expected a number".to_string())
}
