#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use video_speed_controller::{
    Error, Launch, MemoryPage, MemoryStore, NodeId, PageController, Reporter, StoreMap, TabId,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every reported speed; can be switched to behave like a
/// background context that is not listening yet.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(f64, Option<TabId>)>>,
    unavailable: Mutex<bool>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(f64, Option<TabId>)> {
        self.reports.lock().clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.reports.lock().last().map(|(speed, _)| *speed)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, speed: f64, tab: Option<TabId>) -> Result<(), Error> {
        if *self.unavailable.lock() {
            return Err(Error::Unavailable);
        }
        self.reports.lock().push((speed, tab));
        Ok(())
    }
}

pub fn items(value: Value) -> StoreMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub struct Harness {
    pub controller: PageController<MemoryPage>,
    pub store: Arc<MemoryStore>,
    pub reporter: Arc<RecordingReporter>,
}

impl Harness {
    pub fn page(&self) -> &MemoryPage {
        self.controller.page()
    }

    pub fn rate(&self, node: NodeId) -> f64 {
        self.controller.page().media(node).rate
    }

    pub fn advance_ms(&mut self, ms: u64) {
        let now = self.controller.now() + Duration::from_millis(ms);
        self.controller.advance(now);
    }
}

pub fn try_launch(page: MemoryPage, store: Arc<MemoryStore>, url: &str) -> (Launch<MemoryPage>, Arc<RecordingReporter>) {
    init_logging();
    let reporter = Arc::new(RecordingReporter::default());
    let launch = PageController::launch(page, store, reporter.clone(), url, Duration::ZERO)
        .expect("valid url");
    (launch, reporter)
}

pub fn launch_with(page: MemoryPage, store: Arc<MemoryStore>, url: &str) -> Harness {
    let (launch, reporter) = try_launch(page, store.clone(), url);
    match launch {
        Launch::Started(controller) => Harness {
            controller,
            store,
            reporter,
        },
        Launch::Skipped(reason) => panic!("launch skipped: {reason:?}"),
    }
}

pub fn launch(page: MemoryPage, url: &str) -> Harness {
    launch_with(page, Arc::new(MemoryStore::new()), url)
}

/// A page with `count` videos directly under the body.
pub fn page_with_videos(count: usize) -> (MemoryPage, Vec<NodeId>) {
    let mut page = MemoryPage::new();
    let body = page.body_id();
    let videos = (0..count)
        .map(|i| page.append_video(body, &format!("https://cdn.test/{i}.mp4")))
        .collect();
    (page, videos)
}
