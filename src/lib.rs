//! # Video Speed Controller
//!
//! Per-site playback-speed control for HTML5 media, driven by a browser
//! content-script host.
//!
//! ## Features
//!
//! - Discovery of `video` (and optionally `audio`) elements in the live DOM,
//!   including open shadow roots and same-origin iframes
//! - One authoritative current speed, reconciled with native `ratechange`
//!   notifications
//! - Legacy modifier shortcuts plus a configurable key table mapped onto a
//!   fixed action set (speed, seek, mute, mark/jump, display toggle)
//! - A draggable floating widget per element, scoped to that element
//! - Per-domain speed persistence through an external key-value store
//! - Toolbar badge reporting and heuristics for a few learning platforms
//!
//! The DOM is only reached through the [`Page`] trait. [`MemoryPage`] is an
//! in-memory implementation used by tests and the scripted demo.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use video_speed_controller::{Error, KeyEvent, Launch, MemoryPage, MemoryStore, PageController, Reporter, TabId};
//!
//! struct NoBadge;
//!
//! impl Reporter for NoBadge {
//!     fn report(&self, _speed: f64, _tab: Option<TabId>) -> Result<(), Error> {
//!         Ok(())
//!     }
//! }
//!
//! let mut page = MemoryPage::new();
//! let video = page.append_video(page.body_id(), "lecture.mp4");
//!
//! let launch = PageController::launch(
//!     page,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(NoBadge),
//!     "https://example.com/watch",
//!     Duration::ZERO,
//! )?;
//! let Launch::Started(mut controller) = launch else {
//!     unreachable!("example.com is not excluded");
//! };
//!
//! controller.handle_key(&KeyEvent::new("KeyD", 68));
//! assert_eq!(controller.page().media(video).rate, 1.25);
//! # Ok::<(), Error>(())
//! ```

mod badge;
mod blacklist;
mod clock;
mod controller;
mod dispatcher;
mod display;
mod error;
mod events;
mod media;
mod memory_page;
mod message;
mod page;
mod platform;
mod registry;
mod settings;
mod store;
mod widget;

pub use badge::{BADGE_COLOR, Badge, BadgeReporter, BadgeSurface, Reporter, TabId, badge_text};
pub use blacklist::{Pattern, is_blacklisted};
pub use clock::{Interval, PageClock, Timer};
pub use controller::{
    BADGE_DELAY, Launch, PLATFORM_SETTLE_DELAY, PageController, PageState, SKIP_INTRO_DELAY, SkipReason,
};
pub use dispatcher::{BUTTON_STEP, KeyEvent, KeyOutcome, faster_speed, match_binding, match_shortcut, slower_speed};
pub use display::{DISPLAY_DURATION, HEAL_PERIOD, SpeedDisplay};
pub use error::Error;
pub use media::{MediaId, SpeedMemory, TrackedMedia};
pub use memory_page::{DisplayState, MediaState, MemoryPage, NodeId};
pub use message::{ACTIONS, Command, Response};
pub use page::{CANCELLED_CLASS, DRAGGING_CLASS, DisplayHealth, ID_DATA_KEY, INITIALIZED_CLASS, Page, Tag};
pub use platform::{Feature, LectureSelectors, Platform, PlatformConfig, format_timestamp};
pub use registry::{IDLE_TIMEOUT, MediaRegistry, Mutation, ScanOp};
pub use settings::{
    Action, DEFAULT_MAX_SPEED, KeyBinding, MANUAL_SPEED_LIMITS, MAX_SPEED_LIMITS, MIN_SPEED, Settings,
    ShortcutBinding, Shortcuts, default_key_bindings, round_speed, speed_key, validate_manual_speed,
    validate_max_speed,
};
pub use store::{MemoryStore, SettingsStore, StoreMap};
pub use widget::{DEFAULT_BLINK, FLASH_DURATION, Widget, WidgetButton};

// Re-export commonly used types
pub use url::Url;
