use std::collections::HashSet;

use vitals_core_types::NodeId;

use crate::judges::{self, Classification};
use crate::model::NodeSnapshot;

/// Recursive meaningfulness scorer for batches of inserted nodes.
///
/// Images whose payload had not finished loading at notification time are
/// deferred: the node id is registered here and scored later, when the feed
/// reports the load completion. A registration fires at most once.
pub struct SubtreeScorer {
    viewport_height: f64,
    pending_images: HashSet<NodeId>,
}

impl SubtreeScorer {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            pending_images: HashSet::new(),
        }
    }

    /// Score a batch of inserted nodes. Non-negative; zero-score batches
    /// are expected and dropped by the caller.
    pub fn score_nodes(&mut self, nodes: &[NodeSnapshot]) -> u32 {
        let mut score = 0;
        for node in nodes {
            if node.is_image() {
                if node.image_complete {
                    score += self.score_element(node);
                } else {
                    self.pending_images.insert(node.id);
                }
                continue;
            }
            match judges::classify(node) {
                Classification::MeaningfulText => score += 1,
                Classification::ElementCandidate => score += self.score_element(node),
                Classification::Ignorable => {}
            }
        }
        score
    }

    /// One-shot continuation for a deferred image. Returns the node's score
    /// when the node was registered, `None` otherwise; the registration is
    /// consumed either way it fires.
    pub fn complete_image(&mut self, node: &NodeSnapshot) -> Option<u32> {
        if self.pending_images.remove(&node.id) {
            Some(self.score_element(node))
        } else {
            None
        }
    }

    pub fn pending_images(&self) -> usize {
        self.pending_images.len()
    }

    /// Drop all outstanding image registrations. Called at session end so
    /// no listener outlives the result.
    pub fn release_pending(&mut self) {
        self.pending_images.clear();
    }

    /// Score one element candidate: must intersect the initial viewport,
    /// have a non-zero rendered box, and carry text or a background image.
    /// The document body is never scored directly, only its descendants.
    fn score_element(&mut self, node: &NodeSnapshot) -> u32 {
        if node.is_body {
            return self.score_nodes(&node.children);
        }
        let geom = match node.geometry {
            Some(geom) => geom,
            // Unmeasurable node: isolated dead end, scores zero.
            None => return 0,
        };
        if geom.top >= self.viewport_height || geom.width <= 0.0 || geom.height <= 0.0 {
            return 0;
        }
        if node.is_image() {
            return match node.image_src.as_deref() {
                Some(src) if !src.is_empty() => 1,
                _ => 0,
            };
        }
        if node.trimmed_text().is_some() || judges::has_background_image(node) {
            1 + self.score_nodes(&node.children)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> SubtreeScorer {
        SubtreeScorer::new(900.0)
    }

    fn visible_div(id: u64, text: &str) -> NodeSnapshot {
        NodeSnapshot::element(NodeId(id), "div")
            .with_text(text)
            .with_geometry(0.0, 100.0, 40.0)
    }

    #[test]
    fn text_nodes_score_one() {
        let mut s = scorer();
        let nodes = vec![NodeSnapshot::text(NodeId(1), "hi")];
        assert_eq!(s.score_nodes(&nodes), 1);
    }

    #[test]
    fn element_scores_with_children() {
        let mut s = scorer();
        let node = visible_div(1, "parent").with_children(vec![
            NodeSnapshot::text(NodeId(2), "child"),
            visible_div(3, "nested"),
        ]);
        // 1 (parent) + 1 (text child) + 1 (nested element)
        assert_eq!(s.score_nodes(&[node]), 3);
    }

    #[test]
    fn offscreen_and_zero_size_elements_score_zero() {
        let mut s = scorer();
        let below_fold = NodeSnapshot::element(NodeId(1), "div")
            .with_text("x")
            .with_geometry(900.0, 100.0, 40.0);
        let zero_width = NodeSnapshot::element(NodeId(2), "div")
            .with_text("x")
            .with_geometry(0.0, 0.0, 40.0);
        let unmeasured = NodeSnapshot::element(NodeId(3), "div").with_text("x");
        assert_eq!(s.score_nodes(&[below_fold, zero_width, unmeasured]), 0);
    }

    #[test]
    fn empty_element_without_background_scores_zero() {
        let mut s = scorer();
        let node = NodeSnapshot::element(NodeId(1), "div").with_geometry(0.0, 100.0, 40.0);
        assert_eq!(s.score_nodes(&[node]), 0);
    }

    #[test]
    fn background_image_counts_as_content() {
        let mut s = scorer();
        let node = NodeSnapshot::element(NodeId(1), "div")
            .with_geometry(0.0, 100.0, 40.0)
            .with_style("background-image", "url(/hero.png)");
        assert_eq!(s.score_nodes(&[node]), 1);
    }

    #[test]
    fn body_is_only_scored_through_descendants() {
        let mut s = scorer();
        let body = NodeSnapshot::element(NodeId(1), "body")
            .with_geometry(0.0, 1200.0, 3000.0)
            .body()
            .with_children(vec![visible_div(2, "content")]);
        assert_eq!(s.score_nodes(&[body]), 1);
    }

    #[test]
    fn incomplete_image_defers_and_fires_once() {
        let mut s = scorer();
        let img = NodeSnapshot::element(NodeId(7), "img").with_src("/a.png");
        assert_eq!(s.score_nodes(&[img.clone()]), 0);
        assert_eq!(s.pending_images(), 1);

        let loaded = img.with_geometry(0.0, 50.0, 50.0);
        assert_eq!(s.complete_image(&loaded), Some(1));
        // Registration is consumed; a second completion is a no-op.
        assert_eq!(s.complete_image(&loaded), None);
        assert_eq!(s.pending_images(), 0);
    }

    #[test]
    fn completed_image_scores_synchronously() {
        let mut s = scorer();
        let mut img = NodeSnapshot::element(NodeId(7), "img")
            .with_src("/a.png")
            .with_geometry(0.0, 50.0, 50.0);
        img.image_complete = true;
        assert_eq!(s.score_nodes(&[img]), 1);
        assert_eq!(s.pending_images(), 0);
    }

    #[test]
    fn image_without_source_scores_zero() {
        let mut s = scorer();
        let mut img = NodeSnapshot::element(NodeId(7), "img").with_geometry(0.0, 50.0, 50.0);
        img.image_complete = true;
        assert_eq!(s.score_nodes(&[img]), 0);
    }

    #[test]
    fn metadata_children_do_not_count() {
        let mut s = scorer();
        let node = visible_div(1, "text").with_children(vec![
            NodeSnapshot::element(NodeId(2), "script"),
            NodeSnapshot::element(NodeId(3), "style"),
        ]);
        assert_eq!(s.score_nodes(&[node]), 1);
    }
}
