//! Discovery and bookkeeping of the media elements on a page.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;
use std::time::Duration;

use smallvec::SmallVec;

use crate::clock::Timer;
use crate::media::{MediaId, TrackedMedia};
use crate::page::{Page, Tag};

/// Longest a mutation batch waits for an idle slot before it is processed
/// anyway.
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// One DOM mutation record, as delivered by the host's observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<N> {
    ChildList {
        target: N,
        added: SmallVec<[N; 4]>,
        removed: SmallVec<[N; 4]>,
    },
    /// `aria-hidden` changed on `target`; `value` is the new attribute value.
    AriaHidden { target: N, value: Option<String> },
}

impl<N> Mutation<N> {
    pub fn added(target: N, nodes: impl IntoIterator<Item = N>) -> Self {
        Mutation::ChildList {
            target,
            added: nodes.into_iter().collect(),
            removed: SmallVec::new(),
        }
    }

    pub fn removed(target: N, nodes: impl IntoIterator<Item = N>) -> Self {
        Mutation::ChildList {
            target,
            added: SmallVec::new(),
            removed: nodes.into_iter().collect(),
        }
    }
}

/// What a mutation means for the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOp<N> {
    Attach(N),
    Detach(N),
    /// A player that rendered hidden was revealed; rebuild its controller.
    Reveal(N),
    /// Body of a same-origin frame that was inserted; set it up and scan it.
    ScanFrame(N),
}

pub fn is_media(tag: Tag, include_audio: bool) -> bool {
    match tag {
        Tag::Video => true,
        Tag::Audio => include_audio,
        Tag::IFrame | Tag::Other => false,
    }
}

/// Every element under `root` in document order. Open shadow roots are
/// walked after the light-DOM descendants of their host.
pub fn walk<P: Page>(page: &P, root: P::Node) -> Vec<P::Node> {
    let mut out = Vec::new();
    walk_into(page, root, &mut out);
    out
}

fn walk_into<P: Page>(page: &P, parent: P::Node, out: &mut Vec<P::Node>) {
    for child in page.children(parent) {
        out.push(child);
        walk_into(page, child, out);
        if let Some(shadow) = page.shadow_root(child) {
            walk_into(page, shadow, out);
        }
    }
}

/// The qualifying media elements under `root`, in document order.
pub fn collect_media<P: Page>(page: &P, root: P::Node, include_audio: bool) -> Vec<P::Node> {
    walk(page, root)
        .into_iter()
        .filter(|node| is_media(page.tag(*node), include_audio))
        .collect()
}

/// Translates one mutation record into registry operations.
pub fn plan<P: Page>(page: &P, mutation: &Mutation<P::Node>, include_audio: bool) -> Vec<ScanOp<P::Node>> {
    let mut ops = Vec::new();
    match mutation {
        Mutation::ChildList { added, removed, .. } => {
            for node in added {
                check_subtree(page, *node, true, include_audio, &mut ops);
            }
            for node in removed {
                check_subtree(page, *node, false, include_audio, &mut ops);
            }
        }
        Mutation::AriaHidden { value, .. } => {
            if value.as_deref() == Some("false") {
                let first_video = page
                    .body()
                    .and_then(|body| collect_media(page, body, false).into_iter().next());
                if let Some(video) = first_video {
                    ops.push(ScanOp::Reveal(video));
                }
            }
        }
    }
    ops
}

fn check_subtree<P: Page>(
    page: &P,
    node: P::Node,
    added: bool,
    include_audio: bool,
    ops: &mut Vec<ScanOp<P::Node>>,
) {
    // A removal racing with re-insertion: the node was only moved.
    if !added && page.is_connected(node) {
        return;
    }
    if is_media(page.tag(node), include_audio) {
        ops.push(if added {
            ScanOp::Attach(node)
        } else {
            ScanOp::Detach(node)
        });
        return;
    }
    for child in page.children(node) {
        check_subtree(page, child, added, include_audio, ops);
    }
    if let Some(shadow) = page.shadow_root(node) {
        for child in page.children(shadow) {
            check_subtree(page, child, added, include_audio, ops);
        }
    }
    if page.tag(node) == Tag::IFrame {
        match page.frame_body(node) {
            Ok(Some(body)) if added => ops.push(ScanOp::ScanFrame(body)),
            Ok(Some(body)) => {
                for child in page.children(body) {
                    check_subtree(page, child, false, include_audio, ops);
                }
            }
            Ok(None) => {}
            Err(err) => log::trace!("not following frame {node:?}: {err}"),
        }
    }
}

/// The tracked media of one page, keyed by identifier, plus the queue of
/// mutation batches waiting for an idle slot.
#[derive(Debug)]
pub struct MediaRegistry<N> {
    entries: BTreeMap<MediaId, TrackedMedia<N>>,
    by_node: HashMap<N, MediaId>,
    pending: VecDeque<Vec<Mutation<N>>>,
    idle_deadline: Timer,
}

impl<N> Default for MediaRegistry<N> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_node: HashMap::new(),
            pending: VecDeque::new(),
            idle_deadline: Timer::default(),
        }
    }
}

impl<N: Copy + Eq + Hash> MediaRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, node: N) -> Option<MediaId> {
        self.by_node.get(&node).copied()
    }

    pub fn get(&self, id: MediaId) -> Option<&TrackedMedia<N>> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: MediaId) -> Option<&mut TrackedMedia<N>> {
        self.entries.get_mut(&id)
    }

    /// Tracked entries in attach order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedMedia<N>> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedMedia<N>> {
        self.entries.values_mut()
    }

    pub fn ids(&self) -> Vec<MediaId> {
        self.entries.keys().copied().collect()
    }

    /// The earliest attached entry still tracked.
    pub fn first(&self) -> Option<&TrackedMedia<N>> {
        self.entries.values().next()
    }

    pub(crate) fn insert(&mut self, entry: TrackedMedia<N>) {
        self.by_node.insert(entry.node, entry.id);
        self.entries.insert(entry.id, entry);
    }

    pub(crate) fn remove(&mut self, id: MediaId) -> Option<TrackedMedia<N>> {
        let entry = self.entries.remove(&id)?;
        self.by_node.remove(&entry.node);
        Some(entry)
    }

    /// Queues a batch for idle processing.
    pub fn enqueue(&mut self, batch: Vec<Mutation<N>>, now: Duration) {
        if batch.is_empty() {
            return;
        }
        if !self.idle_deadline.is_pending() {
            self.idle_deadline.arm(now, IDLE_TIMEOUT);
        }
        self.pending.push_back(batch);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains queued mutations in delivery order when `idle` is set or the
    /// idle timeout expired.
    pub fn take_pending(&mut self, now: Duration, idle: bool) -> Vec<Mutation<N>> {
        if self.pending.is_empty() || !(idle || self.idle_deadline.fire(now)) {
            return Vec::new();
        }
        self.idle_deadline.cancel();
        self.pending.drain(..).flatten().collect()
    }
}
