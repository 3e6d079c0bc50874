use std::time::Duration;

use crate::clock::Timer;
use crate::media::MediaId;
use crate::settings::Action;

/// How long a widget stays forced visible after it was used.
pub const FLASH_DURATION: Duration = Duration::from_millis(2000);
pub const DEFAULT_BLINK: Duration = Duration::from_millis(1000);

/// Buttons on a widget, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetButton {
    Rewind,
    Slower,
    Faster,
    Forward,
    Hide,
}

impl WidgetButton {
    pub const ALL: [WidgetButton; 5] = [
        WidgetButton::Rewind,
        WidgetButton::Slower,
        WidgetButton::Faster,
        WidgetButton::Forward,
        WidgetButton::Hide,
    ];

    pub fn action(self) -> Action {
        match self {
            WidgetButton::Rewind => Action::Rewind,
            WidgetButton::Slower => Action::Slower,
            WidgetButton::Faster => Action::Faster,
            WidgetButton::Forward => Action::Forward,
            WidgetButton::Hide => Action::Display,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WidgetButton::Rewind => "«",
            WidgetButton::Slower => "-",
            WidgetButton::Faster => "+",
            WidgetButton::Forward => "»",
            WidgetButton::Hide => "x",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer: (f64, f64),
    origin: (f64, f64),
}

/// The floating overlay drawn over one tracked media element.
///
/// Pure state: the host draws it through [`Page::render_widget`](crate::Page::render_widget).
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    id: MediaId,
    left: f64,
    top: f64,
    speed_text: String,
    opacity: f64,
    hidden: bool,
    manual: bool,
    no_source: bool,
    flashing: bool,
    drag: Option<Drag>,
    flash_timer: Timer,
    blink_timer: Timer,
}

impl Widget {
    pub fn new(id: MediaId, offset: (f64, f64), speed: f64, opacity: f64, start_hidden: bool) -> Self {
        Self {
            id,
            left: offset.0.max(0.0),
            top: offset.1.max(0.0),
            speed_text: format_speed(speed),
            opacity,
            hidden: start_hidden,
            manual: false,
            no_source: false,
            flashing: false,
            drag: None,
            flash_timer: Timer::default(),
            blink_timer: Timer::default(),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn position(&self) -> (f64, f64) {
        (self.left, self.top)
    }

    pub fn speed_text(&self) -> &str {
        &self.speed_text
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// The user toggled this widget; automatic show/hide leaves it alone.
    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn has_no_source(&self) -> bool {
        self.no_source
    }

    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Whether the host should draw the widget at all.
    pub fn is_visible(&self) -> bool {
        !self.hidden || self.flashing
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed_text = format_speed(speed);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }

    pub fn set_no_source(&mut self, no_source: bool) {
        self.no_source = no_source;
    }

    /// The `display` action.
    pub fn toggle(&mut self) {
        self.manual = true;
        self.hidden = !self.hidden;
    }

    /// Applies the global "start hidden" switch to an existing widget.
    pub fn apply_start_hidden(&mut self, start_hidden: bool) {
        self.hidden = start_hidden;
        self.manual = !start_hidden;
    }

    /// Forces the widget visible for [`FLASH_DURATION`].
    pub fn flash(&mut self, now: Duration) {
        self.flashing = true;
        self.flash_timer.arm(now, FLASH_DURATION);
    }

    /// Briefly unhides a hidden widget. Visible widgets without a pending
    /// blink are left as they are.
    pub fn blink(&mut self, now: Duration, duration: Duration) {
        if !self.hidden && !self.blink_timer.is_pending() {
            return;
        }
        self.hidden = false;
        self.blink_timer.arm(now, duration);
    }

    /// Runs expired timers. Returns whether anything visible changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let mut changed = false;
        if self.flash_timer.fire(now) {
            self.flashing = false;
            changed = true;
        }
        if self.blink_timer.fire(now) {
            self.hidden = true;
            changed = true;
        }
        changed
    }

    pub fn begin_drag(&mut self, pointer: (f64, f64)) {
        self.drag = Some(Drag {
            pointer,
            origin: (self.left, self.top),
        });
    }

    /// Moves the widget with the pointer. Ignored outside a drag session.
    pub fn drag_to(&mut self, pointer: (f64, f64)) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.left = drag.origin.0 + (pointer.0 - drag.pointer.0);
        self.top = drag.origin.1 + (pointer.1 - drag.pointer.1);
        true
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

fn format_speed(speed: f64) -> String {
    format!("{speed:.2}")
}
