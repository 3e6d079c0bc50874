//! Drives a page controller over an in-memory page and prints what a user
//! would see.
//!
//! ```text
//! RUST_LOG=debug cargo run --example scripted_page
//! ```

use std::sync::Arc;
use std::time::Duration;

use video_speed_controller::{
    Badge, BadgeReporter, BadgeSurface, Error, KeyEvent, Launch, MemoryPage, MemoryStore, Mutation,
    PageController, TabId, WidgetButton,
};

struct ConsoleBadge;

impl BadgeSurface for ConsoleBadge {
    fn set_badge(&self, tab: Option<TabId>, badge: &Badge) -> Result<(), Error> {
        println!("badge {tab:?}: {:?} {:?}", badge.text, badge.color);
        Ok(())
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut page = MemoryPage::new();
    let body = page.body_id();
    let lecture = page.append_video(body, "https://cdn.example.com/lecture.mp4");
    page.media_mut(lecture).time = 95.0;

    let store = Arc::new(MemoryStore::new());
    let launch = PageController::launch(
        page,
        store.clone(),
        Arc::new(BadgeReporter::new(ConsoleBadge)),
        "https://www.coursera.org/learn/rust/lecture/1",
        Duration::ZERO,
    )?;
    let mut controller = match launch {
        Launch::Started(controller) => controller,
        Launch::Skipped(reason) => {
            println!("page skipped: {reason:?}");
            return Ok(());
        }
    };

    let mut now = Duration::ZERO;
    let mut tick = |controller: &mut PageController<MemoryPage>, ms: u64| {
        now += Duration::from_millis(ms);
        controller.advance(now);
    };

    tick(&mut controller, 2000);
    println!("after settling: {}x", controller.page().media(lecture).rate);

    for _ in 0..2 {
        controller.handle_key(&KeyEvent::new("KeyD", 68));
    }
    println!("after two faster presses: {}x", controller.page().media(lecture).rate);

    controller.handle_key(&KeyEvent::new("KeyZ", 90));
    println!("rewound to {}s", controller.page().media(lecture).time);

    let late = controller.page_mut().append_video(body, "https://cdn.example.com/extra.mp4");
    controller.observe(vec![Mutation::added(body, [late])]);
    tick(&mut controller, 1000);
    println!("tracking {} elements", controller.tracked_count());

    let labels = WidgetButton::ALL.map(WidgetButton::label);
    println!("widget buttons: {}", labels.join(" "));
    if let Some(id) = controller.entry_for(late).map(|entry| entry.id()) {
        controller.click_widget(id, WidgetButton::Slower);
    }
    println!(
        "lecture {}x, extra {}x",
        controller.page().media(lecture).rate,
        controller.page().media(late).rate
    );

    controller.handle_key(&KeyEvent::new("KeyN", 78).ctrl());
    println!("clipboard: {:?}", controller.page().clipboard());
    println!("toasts: {:?}", controller.page().toasts());
    println!("stored: {:?}", store.value("speed_www.coursera.org"));

    controller.teardown();
    Ok(())
}
