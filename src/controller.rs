use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use url::Url;

use crate::Error;
use crate::badge::Reporter;
use crate::blacklist;
use crate::clock::{PageClock, Timer};
use crate::display::SpeedDisplay;
use crate::media::{MediaId, SpeedMemory, TrackedMedia};
use crate::page::{DRAGGING_CLASS, ID_DATA_KEY, INITIALIZED_CLASS, Page, Tag};
use crate::platform::{Feature, Platform, PlatformConfig};
use crate::registry::{self, MediaRegistry, Mutation, ScanOp};
use crate::settings::{DEFAULT_MAX_SPEED, Settings};
use crate::store::SettingsStore;
use crate::widget::Widget;

/// Delay before the first badge report after startup.
pub const BADGE_DELAY: Duration = Duration::from_millis(1000);
/// Delay before a learning platform's default speed is applied.
pub const PLATFORM_SETTLE_DELAY: Duration = Duration::from_millis(2000);
/// Delay between spotting DOM changes and clicking a skip-intro control.
pub const SKIP_INTRO_DELAY: Duration = Duration::from_millis(1000);

/// Playback state owned by the page controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// Authoritative speed, reconciled from the last rate change.
    pub current_speed: f64,
    pub is_enabled: bool,
    /// Hostname of the page at load time.
    pub domain: String,
    pub max_speed: f64,
}

/// Why [`PageController::launch`] declined to take control of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blacklisted,
    Disabled,
    AlreadyInitialized,
    NoBody,
}

/// Outcome of [`PageController::launch`].
#[derive(Debug)]
pub enum Launch<P: Page> {
    Started(PageController<P>),
    Skipped(SkipReason),
}

impl<P: Page> Launch<P> {
    pub fn started(self) -> Option<PageController<P>> {
        match self {
            Launch::Started(controller) => Some(controller),
            Launch::Skipped(_) => None,
        }
    }
}

/// Coordinates media discovery, per-element controllers, shortcut dispatch
/// and persistence for one page.
///
/// Everything runs on the host's event loop: the host forwards DOM
/// mutations, media notifications, input and clock ticks as method calls.
pub struct PageController<P: Page> {
    pub(crate) instance: u64,
    pub(crate) page: P,
    pub(crate) store: Arc<dyn SettingsStore>,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) url: Url,
    pub(crate) settings: Settings,
    pub(crate) state: PageState,
    pub(crate) registry: MediaRegistry<P::Node>,
    pub(crate) speeds: SpeedMemory,
    pub(crate) display: SpeedDisplay,
    pub(crate) clock: PageClock,
    pub(crate) platform: Option<Platform>,
    badge_timer: Timer,
    platform_timer: Timer,
    skip_intro_timer: Timer,
}

impl<P: Page> std::fmt::Debug for PageController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("instance", &self.instance)
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("tracked", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<P: Page> PageController<P> {
    /// Loads settings and, unless the page is excluded, takes control of it.
    ///
    /// A blacklisted or disabled page is never scanned. `now` is the host's
    /// monotonic page time.
    pub fn launch(
        mut page: P,
        store: Arc<dyn SettingsStore>,
        reporter: Arc<dyn Reporter>,
        url: &str,
        now: Duration,
    ) -> Result<Launch<P>, Error> {
        let url = Url::parse(url)?;
        let domain = url.host_str().unwrap_or_default().to_owned();

        let defaults = Settings::default();
        let (settings, saved_speed) = match store.get(&defaults.store_request(&domain, 1.0)) {
            Ok(stored) => {
                let saved = Settings::domain_speed(&stored, &domain);
                (defaults.merged_with(&stored), saved)
            }
            Err(err) => {
                log::warn!("loading settings failed, using defaults: {err}");
                (defaults, None)
            }
        };

        if blacklist::is_blacklisted(&settings.blacklist, url.as_str()) {
            log::info!("{} is blacklisted", url.as_str());
            return Ok(Launch::Skipped(SkipReason::Blacklisted));
        }
        if !settings.enabled {
            log::info!("extension disabled");
            return Ok(Launch::Skipped(SkipReason::Disabled));
        }
        let Some(body) = page.body() else {
            return Ok(Launch::Skipped(SkipReason::NoBody));
        };
        if page.has_class(body, INITIALIZED_CLASS) {
            log::debug!("page already initialized");
            return Ok(Launch::Skipped(SkipReason::AlreadyInitialized));
        }
        page.add_class(body, INITIALIZED_CLASS);

        static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);

        let mut clock = PageClock::new();
        clock.set(now);
        let display = SpeedDisplay::mount(&mut page, clock.now());
        let platform = Platform::detect(&domain, url.as_str());
        let max_speed = if settings.max_speed > 0.0 {
            settings.max_speed
        } else {
            DEFAULT_MAX_SPEED
        };

        let mut controller = PageController {
            instance,
            page,
            store,
            reporter,
            speeds: SpeedMemory::new(settings.last_speed),
            state: PageState {
                current_speed: 1.0,
                is_enabled: settings.global_enabled,
                domain,
                max_speed,
            },
            url,
            settings,
            registry: MediaRegistry::new(),
            display,
            clock,
            platform,
            badge_timer: Timer::default(),
            platform_timer: Timer::default(),
            skip_intro_timer: Timer::default(),
        };
        controller.init(saved_speed);
        Ok(Launch::Started(controller))
    }

    fn init(&mut self, saved_speed: Option<f64>) {
        log::info!(
            "[vsc-{}] initializing on {:?} (platform: {:?})",
            self.instance,
            self.state.domain,
            self.platform
        );

        if let Some(speed) = saved_speed.filter(|_| self.settings.persistence_enabled) {
            self.state.current_speed = speed;
            self.settings.last_speed = speed;
            self.speeds = SpeedMemory::new(speed);
        }

        self.find_existing_media();

        if let Some(config) = self.platform_config() {
            log::info!("[vsc-{}] learning platform: {}", self.instance, config.name);
            if self.state.current_speed == 1.0 {
                self.platform_timer.arm(self.clock.now(), PLATFORM_SETTLE_DELAY);
            }
        }
        self.badge_timer.arm(self.clock.now(), BADGE_DELAY);
    }

    /// Attaches a controller to every qualifying element already on the
    /// page, same-origin frames included.
    pub fn find_existing_media(&mut self) {
        if let Some(body) = self.page.body() {
            self.scan_root(body);
        }
    }

    fn scan_root(&mut self, root: P::Node) {
        let media = registry::collect_media(&self.page, root, self.settings.audio_boolean);
        log::debug!("[vsc-{}] found {} media elements", self.instance, media.len());
        for node in media {
            self.attach(node);
        }

        let frames: Vec<_> = registry::walk(&self.page, root)
            .into_iter()
            .filter(|node| self.page.tag(*node) == Tag::IFrame)
            .collect();
        for frame in frames {
            match self.page.frame_body(frame) {
                Ok(Some(body)) => {
                    self.init_frame(body);
                    self.scan_root(body);
                }
                Ok(None) => {}
                Err(Error::CrossOrigin) => log::trace!("skipping cross-origin frame {frame:?}"),
                Err(err) => log::debug!("frame {frame:?} unavailable: {err}"),
            }
        }
    }

    fn init_frame(&mut self, body: P::Node) {
        if self.page.has_class(body, INITIALIZED_CLASS) {
            return;
        }
        self.page.add_class(body, INITIALIZED_CLASS);
        self.page.inject_stylesheet(body);
    }

    /// Starts tracking `node`. Attaching an element that is already tracked
    /// returns its existing identifier; elements that do not qualify as media
    /// return `None`.
    pub fn attach(&mut self, node: P::Node) -> Option<MediaId> {
        if let Some(id) = self.registry.find(node) {
            return Some(id);
        }
        if !registry::is_media(self.page.tag(node), self.settings.audio_boolean) {
            log::debug!("[vsc-{}] {node:?} is not a media element", self.instance);
            return None;
        }
        if let Some(id) = self.page.data(node, ID_DATA_KEY).and_then(|id| MediaId::parse(&id)) {
            if self.registry.get(id).is_some() {
                return Some(id);
            }
        }

        let id = MediaId::next();
        let source = self.page.current_src(node);
        let speed = self.speeds.resolve(&source, self.settings.remember_speed);
        if self.state.is_enabled {
            self.page.set_playback_rate(node, speed);
        }

        let mut widget = Widget::new(
            id,
            self.page.offset(node),
            speed,
            self.settings.controller_opacity,
            self.settings.start_hidden,
        );
        widget.set_no_source(source.is_empty());

        if self.state.is_enabled {
            self.page.set_playback_rate(node, self.state.current_speed);
        }
        let applied = self.page.playback_rate(node);

        self.page.set_data(node, ID_DATA_KEY, &id.to_string());
        self.page.render_widget(node, &widget);
        self.registry.insert(TrackedMedia::new(id, node, applied, widget));
        log::debug!("[vsc-{}] attached {id} to {node:?} ({source:?})", self.instance);
        Some(id)
    }

    /// Stops tracking `node` and removes its widget. A no-op for elements
    /// that are not tracked.
    pub fn detach(&mut self, node: P::Node) -> bool {
        let Some(id) = self.registry.find(node) else {
            return false;
        };
        let Some(entry) = self.registry.remove(id) else {
            return false;
        };
        self.page.remove_widget(node, &entry.widget);
        self.page.remove_data(node, ID_DATA_KEY);
        self.page.remove_class(node, DRAGGING_CLASS);
        log::debug!("[vsc-{}] detached {id}", self.instance);
        true
    }

    /// Destroys every controller, as on navigation.
    pub fn teardown(&mut self) {
        let nodes: Vec<_> = self.registry.iter().map(|entry| entry.node).collect();
        for node in nodes {
            self.detach(node);
        }
    }

    /// Queues a batch of DOM mutations for idle processing.
    pub fn observe(&mut self, batch: Vec<Mutation<P::Node>>) {
        self.registry.enqueue(batch, self.clock.now());
    }

    /// The host's idle callback: processes every queued mutation now.
    pub fn run_idle(&mut self) {
        self.process_mutations(true);
    }

    fn process_mutations(&mut self, idle: bool) {
        let mutations = self.registry.take_pending(self.clock.now(), idle);
        if mutations.is_empty() {
            return;
        }
        for mutation in &mutations {
            for op in registry::plan(&self.page, mutation, self.settings.audio_boolean) {
                match op {
                    ScanOp::Attach(node) => {
                        self.attach(node);
                    }
                    ScanOp::Detach(node) => {
                        self.detach(node);
                    }
                    ScanOp::Reveal(node) => {
                        self.detach(node);
                        self.attach(node);
                    }
                    ScanOp::ScanFrame(body) => {
                        self.init_frame(body);
                        self.scan_root(body);
                    }
                }
            }
        }
        if self
            .platform_config()
            .is_some_and(|config| config.has(Feature::AutoSkipIntro))
        {
            self.skip_intro_timer.arm(self.clock.now(), SKIP_INTRO_DELAY);
        }
    }

    /// Advances page time and runs every timer that came due.
    pub fn advance(&mut self, now: Duration) {
        self.clock.set(now);
        let now = self.clock.now();

        self.process_mutations(false);

        let changed: Vec<_> = self
            .registry
            .iter_mut()
            .filter_map(|entry| entry.widget.tick(now).then_some(entry.id))
            .collect();
        for id in changed {
            self.render_widget(id);
        }

        self.display.tick(&mut self.page, now);

        if self.badge_timer.fire(now) {
            self.report_speed();
        }
        if self.platform_timer.fire(now) {
            if let Some(config) = self.platform_config() {
                self.set_speed(config.default_speed);
                self.page
                    .show_toast(&format!("Optimized for {} learning", config.name));
            }
        }
        if self.skip_intro_timer.fire(now) {
            if let Some(config) = self.platform_config() {
                if self.page.click(config.skip_intro_selector, true) {
                    log::info!("[vsc-{}] skipped intro", self.instance);
                }
            }
        }
    }

    /// Enables or disables control. Disabling hands every element back at
    /// 1.0; enabling re-applies the current speed.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.is_enabled = enabled;
        if enabled {
            self.apply_current_speed();
        } else {
            let nodes: Vec<_> = self.registry.iter().map(|entry| entry.node).collect();
            for node in nodes {
                self.page.set_playback_rate(node, 1.0);
            }
        }
    }

    /// Shows or hides every widget according to the "start hidden" switch.
    pub fn set_widgets_hidden(&mut self, hidden: bool) {
        self.settings.start_hidden = hidden;
        for id in self.registry.ids() {
            if let Some(entry) = self.registry.get_mut(id) {
                entry.widget.apply_start_hidden(hidden);
            }
            self.render_widget(id);
        }
    }

    pub(crate) fn set_widget_opacity(&mut self, opacity: f64) {
        for id in self.registry.ids() {
            if let Some(entry) = self.registry.get_mut(id) {
                entry.widget.set_opacity(opacity);
            }
            self.render_widget(id);
        }
    }

    pub(crate) fn apply_current_speed(&mut self) {
        let speed = self.state.current_speed;
        let nodes: Vec<_> = self.registry.iter().map(|entry| entry.node).collect();
        for node in nodes {
            if self.page.ready_state(node) >= 1 {
                self.page.set_playback_rate(node, speed);
            }
        }
    }

    pub(crate) fn render_widget(&mut self, id: MediaId) {
        if let Some(entry) = self.registry.get(id) {
            self.page.render_widget(entry.node, &entry.widget);
        }
    }

    pub(crate) fn report_speed(&self) {
        match self.reporter.report(self.state.current_speed, None) {
            Ok(()) => {}
            Err(Error::Unavailable) => log::debug!("badge reporter not ready"),
            Err(err) => log::debug!("badge update failed: {err}"),
        }
    }

    pub(crate) fn platform_config(&self) -> Option<&'static PlatformConfig> {
        self.platform.map(Platform::config)
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn display(&self) -> &SpeedDisplay {
        &self.display
    }

    pub fn speeds(&self) -> &SpeedMemory {
        &self.speeds
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Number of tracked media elements.
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    /// Tracked entries in attach order.
    pub fn tracked(&self) -> impl Iterator<Item = &TrackedMedia<P::Node>> {
        self.registry.iter()
    }

    pub fn entry(&self, id: MediaId) -> Option<&TrackedMedia<P::Node>> {
        self.registry.get(id)
    }

    pub fn entry_for(&self, node: P::Node) -> Option<&TrackedMedia<P::Node>> {
        self.registry.find(node).and_then(|id| self.registry.get(id))
    }
}
