use crate::Error;

/// Background colour of a non-empty badge.
pub const BADGE_COLOR: &str = "#6366F1";

/// Identity of the browser tab a badge belongs to.
pub type TabId = u32;

/// Short badge text for `speed`: empty at 1.0, whole numbers without
/// decimals, everything else rounded half-up to one decimal.
pub fn badge_text(speed: f64) -> String {
    if speed == 1.0 || speed == 0.0 || !speed.is_finite() {
        return String::new();
    }
    if speed.fract() == 0.0 {
        format!("{speed}")
    } else {
        format!("{}", (speed * 10.0).round() / 10.0)
    }
}

/// What the toolbar badge should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub color: Option<&'static str>,
}

impl Badge {
    pub fn for_speed(speed: f64) -> Self {
        let text = badge_text(speed);
        let color = (!text.is_empty()).then_some(BADGE_COLOR);
        Self { text, color }
    }
}

/// Outward reporting of the current speed.
///
/// Content-side reports pass `tab: None` and the receiving side resolves the
/// sender's tab.
pub trait Reporter: Send + Sync {
    fn report(&self, speed: f64, tab: Option<TabId>) -> Result<(), Error>;
}

/// The extension toolbar, as seen by [`BadgeReporter`].
pub trait BadgeSurface: Send + Sync {
    fn set_badge(&self, tab: Option<TabId>, badge: &Badge) -> Result<(), Error>;
}

/// Formats reported speeds and pushes them to a [`BadgeSurface`].
#[derive(Debug)]
pub struct BadgeReporter<S> {
    surface: S,
}

impl<S: BadgeSurface> BadgeReporter<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: BadgeSurface> Reporter for BadgeReporter<S> {
    fn report(&self, speed: f64, tab: Option<TabId>) -> Result<(), Error> {
        let badge = Badge::for_speed(speed);
        log::debug!("badge for tab {tab:?}: {:?}", badge.text);
        self.surface.set_badge(tab, &badge)
    }
}
