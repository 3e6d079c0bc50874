use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::widget::Widget;

/// Identifier of a tracked media element.
///
/// Stored on the element as `data-vscid`; the controller itself lives in the
/// registry, never on the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaId(u64);

impl MediaId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        MediaId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok().map(MediaId)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Speeds remembered per resolved source URL, shared by every tracked
/// element on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedMemory {
    by_source: HashMap<String, f64>,
    last_speed: f64,
}

impl SpeedMemory {
    pub fn new(last_speed: f64) -> Self {
        Self {
            by_source: HashMap::new(),
            last_speed,
        }
    }

    /// The most recent speed observed on any element.
    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    pub fn get(&self, source: &str) -> Option<f64> {
        self.by_source.get(source).copied()
    }

    /// Speed an element playing `source` should start at.
    ///
    /// Without `remember_across_sources`, a source keeps whatever was
    /// recorded for it and unseen sources start at 1.0. With it, every
    /// source takes the last global speed. Flipping the switch mid-session
    /// does not rewrite speeds already recorded.
    pub fn resolve(&mut self, source: &str, remember_across_sources: bool) -> f64 {
        if remember_across_sources {
            self.by_source.insert(source.to_owned(), self.last_speed);
            self.last_speed
        } else {
            *self.by_source.entry(source.to_owned()).or_insert(1.0)
        }
    }

    /// Records a speed the element actually reached.
    pub fn record(&mut self, source: &str, speed: f64) {
        self.by_source.insert(source.to_owned(), speed);
        self.last_speed = speed;
    }
}

/// One media element under control, with its widget.
#[derive(Debug, Clone)]
pub struct TrackedMedia<N> {
    pub(crate) id: MediaId,
    pub(crate) node: N,
    pub(crate) speed: f64,
    pub(crate) mark: Option<f64>,
    pub(crate) widget: Widget,
}

impl<N: Copy> TrackedMedia<N> {
    pub(crate) fn new(id: MediaId, node: N, speed: f64, widget: Widget) -> Self {
        Self {
            id,
            node,
            speed,
            mark: None,
            widget,
        }
    }

    /// Get the identifier stored on the element.
    pub fn id(&self) -> MediaId {
        self.id
    }

    /// Get the host node of the element.
    pub fn node(&self) -> N {
        self.node
    }

    /// Get the last speed applied to this element or reported by it through
    /// `ratechange`.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Get the user-set mark, in seconds.
    pub fn mark(&self) -> Option<f64> {
        self.mark
    }

    /// Get the widget drawn over the element.
    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}
