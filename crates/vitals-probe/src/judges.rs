use serde_json::Value;

use crate::model::{NodeKind, NodeSnapshot};

/// Outcome of classifying a single inserted node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Text node with non-empty trimmed content.
    MeaningfulText,
    /// Element that may count once geometry and content filters pass.
    ElementCandidate,
    /// Contributes nothing: empty text, or non-rendering metadata.
    Ignorable,
}

const IGNORABLE_TAGS: [&str; 5] = ["HEAD", "META", "LINK", "STYLE", "SCRIPT"];

/// Classify one node. Pure; malformed snapshots land in `Ignorable`.
pub fn classify(node: &NodeSnapshot) -> Classification {
    match node.kind {
        NodeKind::Text => {
            if node.trimmed_text().is_some() {
                Classification::MeaningfulText
            } else {
                Classification::Ignorable
            }
        }
        NodeKind::Element => match node.tag_name.as_deref() {
            Some(tag) if !is_metadata_tag(tag) => Classification::ElementCandidate,
            _ => Classification::Ignorable,
        },
    }
}

fn is_metadata_tag(tag: &str) -> bool {
    IGNORABLE_TAGS
        .iter()
        .any(|candidate| tag.eq_ignore_ascii_case(candidate))
}

/// Whether the sampled computed style carries a non-default background
/// image. Missing or malformed style entries count as "none".
pub fn has_background_image(node: &NodeSnapshot) -> bool {
    match node.computed_style.get("background-image") {
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("none")
        }
        _ => false,
    }
}
