//! An in-memory document implementing [`Page`], used by tests and the demo.

use std::collections::{BTreeSet, HashMap};

use crate::Error;
use crate::page::{DisplayHealth, Page, Tag};
use crate::widget::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Playback properties of a media node.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub rate: f64,
    pub time: f64,
    pub paused: bool,
    pub muted: bool,
    pub ready_state: u8,
    pub src: String,
    pub offset: (f64, f64),
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            rate: 1.0,
            time: 0.0,
            paused: true,
            muted: false,
            ready_state: 4,
            src: String::new(),
            offset: (0.0, 0.0),
        }
    }
}

/// State of the floating speed display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub attached: bool,
    pub restyled: bool,
    pub mounts: usize,
    pub text: String,
    pub visible: bool,
}

#[derive(Debug, Clone)]
struct Frame {
    body: Option<NodeId>,
    cross_origin: bool,
}

#[derive(Debug, Clone)]
struct Node {
    tag: Tag,
    // For shadow roots this is the host, for frame bodies the frame element.
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: BTreeSet<String>,
    data: HashMap<String, String>,
    shadow: Option<NodeId>,
    frame: Option<Frame>,
    media: Option<MediaState>,
    stylesheets: usize,
}

impl Node {
    fn new(tag: Tag, parent: Option<NodeId>) -> Self {
        let media = matches!(tag, Tag::Video | Tag::Audio).then(MediaState::default);
        Self {
            tag,
            parent,
            children: Vec::new(),
            classes: BTreeSet::new(),
            data: HashMap::new(),
            shadow: None,
            frame: None,
            media,
            stylesheets: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Clickable {
    visible: bool,
    clicks: usize,
}

#[derive(Debug, Clone)]
pub struct MemoryPage {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    widgets: HashMap<NodeId, Widget>,
    display: DisplayState,
    toasts: Vec<String>,
    clickables: HashMap<String, Clickable>,
    clipboard: Option<String>,
    clipboard_denied: bool,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// A document with an empty body.
    pub fn new() -> Self {
        let root = Node::new(Tag::Other, None);
        let mut page = Self {
            nodes: vec![root],
            root: NodeId(0),
            body: NodeId(0),
            widgets: HashMap::new(),
            display: DisplayState::default(),
            toasts: Vec::new(),
            clickables: HashMap::new(),
            clipboard: None,
            clipboard_denied: false,
        };
        page.body = page.append(page.root, Tag::Other);
        page
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn create(&mut self, tag: Tag, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, parent));
        id
    }

    /// Appends a new element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, tag: Tag) -> NodeId {
        let id = self.create(tag, Some(parent));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Appends a `video` element playing `src`.
    pub fn append_video(&mut self, parent: NodeId, src: &str) -> NodeId {
        let id = self.append(parent, Tag::Video);
        self.media_mut(id).src = src.to_owned();
        id
    }

    pub fn append_audio(&mut self, parent: NodeId, src: &str) -> NodeId {
        let id = self.append(parent, Tag::Audio);
        self.media_mut(id).src = src.to_owned();
        id
    }

    /// Attaches an open shadow root to `host` and returns it.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        let root = self.create(Tag::Other, Some(host));
        self.node_mut(host).shadow = Some(root);
        root
    }

    /// Appends an iframe. Same-origin frames come with a body.
    pub fn append_frame(&mut self, parent: NodeId, cross_origin: bool) -> (NodeId, Option<NodeId>) {
        let frame = self.append(parent, Tag::IFrame);
        let body = (!cross_origin).then(|| self.create(Tag::Other, Some(frame)));
        self.node_mut(frame).frame = Some(Frame { body, cross_origin });
        (frame, body)
    }

    /// Detaches `node` from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|child| *child != node);
        }
        self.node_mut(node).parent = None;
    }

    /// Re-inserts a detached node as the last child of `parent`.
    pub fn insert(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        self.node_mut(node).parent = Some(parent);
        self.node_mut(parent).children.push(node);
    }

    /// Playback state of a media node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a media element.
    pub fn media(&self, node: NodeId) -> &MediaState {
        self.node(node).media.as_ref().expect("not a media element")
    }

    pub fn media_mut(&mut self, node: NodeId) -> &mut MediaState {
        self.node_mut(node).media.as_mut().expect("not a media element")
    }

    pub fn stylesheets(&self, body: NodeId) -> usize {
        self.node(body).stylesheets
    }

    pub fn widget(&self, media: NodeId) -> Option<&Widget> {
        self.widgets.get(&media)
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Simulates a site removing the floating display.
    pub fn detach_display(&mut self) {
        self.display.attached = false;
    }

    /// Simulates a site overriding the display's positioning.
    pub fn restyle_display(&mut self) {
        self.display.restyled = true;
    }

    pub fn toasts(&self) -> &[String] {
        &self.toasts
    }

    /// Registers a clickable element reachable through `selector`.
    pub fn add_clickable(&mut self, selector: &str, visible: bool) {
        self.clickables
            .insert(selector.to_owned(), Clickable { visible, clicks: 0 });
    }

    pub fn clicks(&self, selector: &str) -> usize {
        self.clickables.get(selector).map_or(0, |c| c.clicks)
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    pub fn deny_clipboard(&mut self) {
        self.clipboard_denied = true;
    }
}

impl Page for MemoryPage {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).shadow
    }

    fn tag(&self, node: NodeId) -> Tag {
        self.node(node).tag
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn frame_body(&self, frame: NodeId) -> Result<Option<NodeId>, Error> {
        match &self.node(frame).frame {
            Some(Frame {
                cross_origin: true, ..
            }) => Err(Error::CrossOrigin),
            Some(Frame { body, .. }) => Ok(*body),
            None => Ok(None),
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.contains(class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.insert(class.to_owned());
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.remove(class);
    }

    fn data(&self, node: NodeId, key: &str) -> Option<String> {
        self.node(node).data.get(key).cloned()
    }

    fn set_data(&mut self, node: NodeId, key: &str, value: &str) {
        self.node_mut(node)
            .data
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove_data(&mut self, node: NodeId, key: &str) {
        self.node_mut(node).data.remove(key);
    }

    fn inject_stylesheet(&mut self, body: NodeId) {
        self.node_mut(body).stylesheets += 1;
    }

    fn playback_rate(&self, media: NodeId) -> f64 {
        self.media(media).rate
    }

    fn set_playback_rate(&mut self, media: NodeId, rate: f64) {
        self.media_mut(media).rate = rate;
    }

    fn current_time(&self, media: NodeId) -> f64 {
        self.media(media).time
    }

    fn set_current_time(&mut self, media: NodeId, seconds: f64) {
        self.media_mut(media).time = seconds.max(0.0);
    }

    fn is_paused(&self, media: NodeId) -> bool {
        self.media(media).paused
    }

    fn play(&mut self, media: NodeId) {
        self.media_mut(media).paused = false;
    }

    fn pause(&mut self, media: NodeId) {
        self.media_mut(media).paused = true;
    }

    fn is_muted(&self, media: NodeId) -> bool {
        self.media(media).muted
    }

    fn set_muted(&mut self, media: NodeId, muted: bool) {
        self.media_mut(media).muted = muted;
    }

    fn ready_state(&self, media: NodeId) -> u8 {
        self.media(media).ready_state
    }

    fn current_src(&self, media: NodeId) -> String {
        self.media(media).src.clone()
    }

    fn offset(&self, media: NodeId) -> (f64, f64) {
        self.media(media).offset
    }

    fn render_widget(&mut self, media: NodeId, widget: &Widget) {
        self.widgets.insert(media, widget.clone());
    }

    fn remove_widget(&mut self, media: NodeId, _widget: &Widget) {
        self.widgets.remove(&media);
    }

    fn speed_display_health(&self) -> DisplayHealth {
        if !self.display.attached {
            DisplayHealth::Detached
        } else if self.display.restyled {
            DisplayHealth::Restyled
        } else {
            DisplayHealth::Healthy
        }
    }

    fn mount_speed_display(&mut self) {
        self.display.attached = true;
        self.display.restyled = false;
        self.display.mounts += 1;
    }

    fn render_speed_display(&mut self, text: &str, visible: bool) {
        self.display.text = text.to_owned();
        self.display.visible = visible;
    }

    fn show_toast(&mut self, text: &str) {
        self.toasts.push(text.to_owned());
    }

    fn click(&mut self, selector: &str, visible_only: bool) -> bool {
        for part in selector.split(',').map(str::trim) {
            if let Some(target) = self.clickables.get_mut(part) {
                if visible_only && !target.visible {
                    continue;
                }
                target.clicks += 1;
                return true;
            }
        }
        false
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), Error> {
        if self.clipboard_denied {
            return Err(Error::Clipboard);
        }
        self.clipboard = Some(text.to_owned());
        Ok(())
    }
}
