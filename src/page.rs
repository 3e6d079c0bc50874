use std::fmt::Debug;
use std::hash::Hash;

use crate::Error;
use crate::widget::Widget;

/// Class marking a body (main document or iframe) as already set up.
pub const INITIALIZED_CLASS: &str = "vsc-initialized";
/// Sites can opt individual elements out of control with this class.
pub const CANCELLED_CLASS: &str = "vsc-cancelled";
/// Set on a media element while its widget is being dragged.
pub const DRAGGING_CLASS: &str = "vcs-dragging";
/// `data-*` key carrying the tracked-media identifier on an element.
pub const ID_DATA_KEY: &str = "vscid";

/// Element classification needed by the media scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Video,
    Audio,
    IFrame,
    Other,
}

/// Result of the floating speed display's self-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHealth {
    Healthy,
    /// Removed from the document by the site.
    Detached,
    /// Still attached but its positioning or stacking was overridden.
    Restyled,
}

/// The host document, as seen by the controller.
///
/// Implemented by the embedding glue over the real DOM and by
/// [`MemoryPage`](crate::MemoryPage) for tests. Methods taking a node accept
/// any node the host handed out earlier, including nodes that have since
/// been removed from the document.
pub trait Page {
    type Node: Copy + Eq + Hash + Debug;

    // Tree walking.

    /// The main document body, once it exists.
    fn body(&self) -> Option<Self::Node>;
    /// Element children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    /// The node's open shadow root, walked like an element.
    fn shadow_root(&self, node: Self::Node) -> Option<Self::Node>;
    fn tag(&self, node: Self::Node) -> Tag;
    /// Whether the node is reachable from the live document, through shadow
    /// hosts and frame elements included.
    fn is_connected(&self, node: Self::Node) -> bool;
    /// Body of a same-origin iframe. Foreign frames return
    /// [`Error::CrossOrigin`]; frames without a body yet return `Ok(None)`.
    fn frame_body(&self, frame: Self::Node) -> Result<Option<Self::Node>, Error>;

    // Attributes.

    fn has_class(&self, node: Self::Node, class: &str) -> bool;
    fn add_class(&mut self, node: Self::Node, class: &str);
    fn remove_class(&mut self, node: Self::Node, class: &str);
    fn data(&self, node: Self::Node, key: &str) -> Option<String>;
    fn set_data(&mut self, node: Self::Node, key: &str, value: &str);
    fn remove_data(&mut self, node: Self::Node, key: &str);
    /// Adds the widget stylesheet to the document owning `body`.
    fn inject_stylesheet(&mut self, body: Self::Node);

    // Media elements.

    fn playback_rate(&self, media: Self::Node) -> f64;
    fn set_playback_rate(&mut self, media: Self::Node, rate: f64);
    fn current_time(&self, media: Self::Node) -> f64;
    fn set_current_time(&mut self, media: Self::Node, seconds: f64);
    fn is_paused(&self, media: Self::Node) -> bool;
    fn play(&mut self, media: Self::Node);
    fn pause(&mut self, media: Self::Node);
    fn is_muted(&self, media: Self::Node) -> bool;
    fn set_muted(&mut self, media: Self::Node, muted: bool);
    /// `HTMLMediaElement.readyState`; 1 and above means metadata is loaded.
    fn ready_state(&self, media: Self::Node) -> u8;
    /// Resolved source URL, empty when the element has none.
    fn current_src(&self, media: Self::Node) -> String;
    /// Layout offset `(left, top)` relative to the offset parent.
    fn offset(&self, media: Self::Node) -> (f64, f64);

    // Overlays.

    /// Draws or updates the widget anchored to `media`.
    fn render_widget(&mut self, media: Self::Node, widget: &Widget);
    /// Removes the widget anchored to `media`.
    fn remove_widget(&mut self, media: Self::Node, widget: &Widget);
    fn speed_display_health(&self) -> DisplayHealth;
    /// (Re)creates the floating speed display and attaches it to the body.
    fn mount_speed_display(&mut self);
    fn render_speed_display(&mut self, text: &str, visible: bool);
    /// Shows a short-lived informational message.
    fn show_toast(&mut self, text: &str);

    // Page integration.

    /// Clicks the first element matching `selector`; with `visible_only`,
    /// hidden matches are ignored. Returns whether anything was clicked.
    fn click(&mut self, selector: &str, visible_only: bool) -> bool;
    fn write_clipboard(&mut self, text: &str) -> Result<(), Error>;
}
