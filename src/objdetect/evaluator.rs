use crate::core::types::Point;
use crate::core::Mat;
use crate::error::Result;
use crate::objdetect::haar::HaarEvaluator;
use crate::objdetect::lbp::LBPEvaluator;
use crate::objdetect::model::{Cascade, DTreeNode, Features};

/// Tagged dispatch over the two feature kinds: the hot inner loop in
/// [`run_at`] never goes through a trait object, it matches once per call
/// and then runs a concrete loop.
#[derive(Debug, Clone)]
pub enum FeatureEvaluator {
    Haar(HaarEvaluator),
    LBP(LBPEvaluator),
}

impl FeatureEvaluator {
    pub fn new(cascade: &Cascade) -> Self {
        match &cascade.features {
            Features::Haar(features) => {
                let runtime: Vec<_> = features.iter().map(std::convert::Into::into).collect();
                FeatureEvaluator::Haar(HaarEvaluator::new(&runtime, cascade.orig_win_size))
            }
            Features::LBP(features) => {
                let runtime: Vec<_> = features.iter().map(std::convert::Into::into).collect();
                FeatureEvaluator::LBP(LBPEvaluator::new(&runtime, cascade.orig_win_size))
            }
        }
    }

    /// `Ok(false)` means the image is smaller than the cascade's training
    /// window and the pyramid should end, not an error.
    pub fn set_image(&mut self, image: &Mat) -> Result<bool> {
        match self {
            FeatureEvaluator::Haar(e) => e.set_image(image),
            FeatureEvaluator::LBP(e) => e.set_image(image),
        }
    }

    fn set_window(&mut self, pt: Point) -> Option<isize> {
        match self {
            FeatureEvaluator::Haar(e) => e.set_window(pt),
            FeatureEvaluator::LBP(e) => e.set_window(pt),
        }
    }
}

/// Walk every stage of `cascade` at window `pt` against `evaluator`.
/// Returns `-1` if the window itself is rejected by `set_window`,
/// `-stage_index` on the first failing stage, `+1` if every stage passes.
pub fn run_at(cascade: &Cascade, evaluator: &mut FeatureEvaluator, pt: Point) -> i32 {
    let Some(w) = evaluator.set_window(pt) else {
        return -1;
    };

    let subset_words = cascade.subset_words();
    let mut node_ofs = 0usize;
    let mut leaf_ofs = 0usize;

    for (stage_index, stage) in cascade.stages.iter().enumerate() {
        let mut stage_sum = 0.0f32;

        for tree in &cascade.trees[stage.first_tree as usize..(stage.first_tree + stage.tree_count) as usize] {
            let mut node_idx = node_ofs;
            let leaf = loop {
                let node = &cascade.nodes[node_idx];
                let go_left = match evaluator {
                    FeatureEvaluator::Haar(haar) => {
                        haar.evaluate(node.feature_idx as usize, w) < node.threshold
                    }
                    FeatureEvaluator::LBP(lbp) => {
                        let category = lbp.evaluate(node.feature_idx as usize, w);
                        categorical_go_left(cascade, node_idx, category, subset_words)
                    }
                };

                let child = if go_left { node.left } else { node.right };
                if child > 0 {
                    node_idx = node_ofs + child as usize;
                } else {
                    break leaf_ofs + (-child) as usize;
                }
            };

            stage_sum += cascade.leaves[leaf];
            node_ofs += tree.node_count as usize;
            leaf_ofs += tree.node_count as usize + 1;
        }

        if stage_sum < stage.threshold {
            return -(stage_index as i32);
        }
    }

    1
}

fn categorical_go_left(cascade: &Cascade, node_idx: usize, category: u8, subset_words: usize) -> bool {
    let base = node_idx * subset_words;
    let word = cascade.subsets[base + (category as usize >> 5)];
    (word & (1 << (category & 31))) != 0
}
