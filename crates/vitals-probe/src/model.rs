use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use vitals_core_types::{Millis, NodeId};

/// Kind of node delivered by a mutation feed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Text,
    Element,
}

/// Rendered box of a node relative to the viewport, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeGeometry {
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Value object describing one inserted node, captured by the mutation
/// feed at notification time. The probe never talks to the host document;
/// everything it needs to score a node travels in this snapshot.
#[derive(Clone, Debug)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Uppercase tag name; `None` for text nodes.
    pub tag_name: Option<String>,
    /// Text content, untrimmed.
    pub text: Option<String>,
    /// `None` when the feed could not measure the node.
    pub geometry: Option<NodeGeometry>,
    /// Computed-style subset the feed sampled (`background-image`, ...).
    pub computed_style: JsonMap<String, Value>,
    /// Image source, `IMG` elements only.
    pub image_src: Option<String>,
    /// Whether an image payload had already finished loading when the
    /// snapshot was taken.
    pub image_complete: bool,
    /// Marks the document body; the body is never scored directly.
    pub is_body: bool,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn text(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            kind: NodeKind::Text,
            tag_name: None,
            text: Some(text.into()),
            geometry: None,
            computed_style: JsonMap::new(),
            image_src: None,
            image_complete: false,
            is_body: false,
            children: Vec::new(),
        }
    }

    pub fn element(id: NodeId, tag_name: impl Into<String>) -> Self {
        Self {
            id,
            kind: NodeKind::Element,
            tag_name: Some(tag_name.into().to_ascii_uppercase()),
            text: None,
            geometry: None,
            computed_style: JsonMap::new(),
            image_src: None,
            image_complete: false,
            is_body: false,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_geometry(mut self, top: f64, width: f64, height: f64) -> Self {
        self.geometry = Some(NodeGeometry { top, width, height });
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.computed_style
            .insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.image_src = Some(src.into());
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }

    pub fn body(mut self) -> Self {
        self.is_body = true;
        self
    }

    pub fn is_image(&self) -> bool {
        self.tag_name.as_deref() == Some("IMG")
    }

    /// Trimmed text content, or `None` when empty after trimming.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Event stream produced by a mutation feed for a watched subtree.
#[derive(Clone, Debug)]
pub enum MutationEvent {
    /// One structural-change notification: the batch of nodes added since
    /// the previous notification, in document order. `root_ready` is the
    /// feed's statement of whether the watched root was fully initialized
    /// at notification time; batches stamped `false` are not scored.
    ChildListChanged {
        added: Vec<NodeSnapshot>,
        root_ready: bool,
    },
    /// Deferred image completion: the payload of an earlier `IMG` insert
    /// finished loading, re-measured by the feed.
    ImageLoaded { node: NodeSnapshot },
}

impl MutationEvent {
    /// Batch of added nodes under an initialized root.
    pub fn added(nodes: Vec<NodeSnapshot>) -> Self {
        Self::ChildListChanged {
            added: nodes,
            root_ready: true,
        }
    }
}

/// Index of a score point inside a session's history arena. Points are
/// never deallocated during a session, so an id stays valid even after the
/// retention boundary moved past it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PointId(pub usize);

/// One render-score record: a mutation batch that contributed a positive
/// meaningfulness delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScorePoint {
    /// Elapsed ms since the session start reference.
    pub t: Millis,
    /// Score delta contributed by this batch alone.
    pub s: u32,
    /// Cumulative window score as of the latest FMP decision that selected
    /// this point; only ever overwritten by a value no smaller.
    pub m: u32,
}

/// Final measurement triple, all fields elapsed ms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedReport {
    pub fcp: Millis,
    pub fmp: Millis,
    pub tti: Millis,
}

/// Navigation milestones read from the host's timing facility. All fields
/// are durations in ms; an unavailable provider yields the all-zero value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTiming {
    /// Navigation start to load event end.
    pub load_page: Millis,
    /// Response end to DOM complete.
    pub dom_ready: Millis,
    pub redirect: Millis,
    pub lookup_domain: Millis,
    /// Navigation start to first response byte.
    pub ttfb: Millis,
    pub request: Millis,
    pub load_event: Millis,
    pub appcache: Millis,
    pub unload_event: Millis,
    pub connect: Millis,
    /// First paint as reported by the host, 0 when unavailable.
    pub first_paint: Millis,
}

/// Whole-document result: render-quality triple merged with navigation
/// milestones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    #[serde(flatten)]
    pub speed: SpeedReport,
    #[serde(flatten)]
    pub timing: NavigationTiming,
}
