mod common;

use common::{items, launch, page_with_videos};
use pretty_assertions::assert_eq;
use serde_json::json;
use video_speed_controller::{Command, MemoryPage, Mutation, Response, SettingsStore};

#[test]
fn unknown_or_missing_actions_are_rejected() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    for request in [json!({ "action": "bogus" }), json!({}), json!({ "action": 3 })] {
        assert_eq!(
            h.controller.handle_json(request),
            json!({ "success": false, "error": "Unknown action" })
        );
    }
}

#[test]
fn malformed_requests_report_the_decoding_error() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    let response = h.controller.handle_json(json!({ "action": "setSpeed" }));
    assert_eq!(response["success"], json!(false));
    assert!(response["error"].as_str().unwrap().contains("speed"));
}

#[test]
fn get_status_describes_the_page() {
    let (page, _) = page_with_videos(2);
    let mut h = launch(page, "http://test.local/watch");

    assert_eq!(
        h.controller.handle_json(json!({ "action": "getStatus" })),
        json!({
            "success": true,
            "currentSpeed": 1.0,
            "domain": "test.local",
            "videoCount": 2,
            "controllerCount": 2,
            "isEnabled": true,
        })
    );
}

#[test]
fn set_speed_clamps_and_rejects_nonsense() {
    let (page, videos) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    assert_eq!(
        h.controller.handle_json(json!({ "action": "setSpeed", "speed": 9 })),
        json!({ "success": true, "currentSpeed": 4.0 })
    );
    assert_eq!(h.rate(videos[0]), 4.0);

    let response = h.controller.handle_message(Command::SetSpeed { speed: -1.0 });
    assert!(!response.success);
    let response = h.controller.handle_message(Command::SetSpeed { speed: f64::NAN });
    assert!(!response.success);
    assert_eq!(h.rate(videos[0]), 4.0);

    let response = h.controller.handle_message(Command::SetSpeed { speed: 1.257 });
    assert_eq!(response.current_speed, Some(1.26));
}

#[test]
fn toggle_enabled_round_trip() {
    let (page, videos) = page_with_videos(3);
    let mut h = launch(page, "http://test.local/");
    h.controller.handle_json(json!({ "action": "setSpeed", "speed": 1.5 }));

    assert_eq!(
        h.controller.handle_json(json!({ "action": "toggleEnabled", "enabled": false })),
        json!({ "success": true, "isEnabled": false })
    );
    assert!(videos.iter().all(|video| h.rate(*video) == 1.0));

    h.controller.handle_json(json!({ "action": "toggleEnabled", "enabled": true }));
    assert!(videos.iter().all(|video| h.rate(*video) == 1.5));
}

#[test]
fn max_speed_is_validated_before_it_changes() {
    let (page, videos) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    assert_eq!(
        h.controller.handle_json(json!({ "action": "updateMaxSpeed", "maxSpeed": 12 })),
        json!({ "success": false, "error": "max speed 12 is outside 2..=10" })
    );
    assert_eq!(h.controller.state().max_speed, 4.0);

    assert_eq!(
        h.controller.handle_json(json!({ "action": "updateMaxSpeed", "maxSpeed": 8 })),
        json!({ "success": true, "maxSpeed": 8.0 })
    );
    h.controller.handle_json(json!({ "action": "setSpeed", "speed": 9 }));
    assert_eq!(h.rate(videos[0]), 8.0);
    // In-memory only.
    assert_eq!(h.store.value("maxSpeed"), None);
}

#[test]
fn save_settings_writes_through_after_validation() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    let response = h.controller.handle_json(json!({
        "action": "saveSettings",
        "settings": { "maxSpeed": 1, "startHidden": true },
    }));
    assert_eq!(response["success"], json!(false));
    assert_eq!(h.store.value("maxSpeed"), None);
    assert_eq!(h.store.value("startHidden"), None);

    let response = h.controller.handle_json(json!({
        "action": "saveSettings",
        "settings": { "maxSpeed": 6, "rememberSpeed": true },
    }));
    assert_eq!(response, json!({ "success": true }));
    assert_eq!(h.store.value("maxSpeed"), Some(json!(6)));
    assert_eq!(h.store.value("rememberSpeed"), Some(json!(true)));
}

#[test]
fn get_settings_reads_the_store() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");
    h.store.set(items(json!({ "maxSpeed": 6.0 }))).unwrap();

    let response = h.controller.handle_json(json!({ "action": "getSettings" }));
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["settings"]["maxSpeed"], json!(6.0));
    assert_eq!(response["settings"]["speed_test.local"], json!(1.0));
    assert_eq!(response["settings"]["blacklist"], json!("imgur.com\nteams.microsoft.com\n"));
}

#[test]
fn store_failures_surface_in_the_response() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");
    h.store.set_failing(true);

    assert_eq!(
        h.controller.handle_json(json!({ "action": "getSettings" })),
        json!({ "success": false, "error": "settings store failure: storage quota exceeded" })
    );
    let response = h.controller.handle_message(Command::SaveSettings {
        settings: items(json!({ "startHidden": true })),
    });
    assert_eq!(
        response,
        Response::failure("settings store failure: storage quota exceeded")
    );
}

#[test]
fn enhanced_settings_apply_their_side_effects() {
    let (page, videos) = page_with_videos(2);
    let mut h = launch(page, "http://test.local/");

    let response = h.controller.handle_json(json!({
        "action": "updateEnhancedSetting",
        "setting": "startHidden",
        "value": true,
    }));
    assert_eq!(response, json!({ "success": true }));
    for video in &videos {
        assert!(h.page().widget(*video).unwrap().is_hidden());
    }

    h.controller.handle_json(json!({
        "action": "updateEnhancedSetting",
        "setting": "controllerOpacity",
        "value": 0.8,
    }));
    assert_eq!(h.page().widget(videos[1]).unwrap().opacity(), 0.8);

    // Not persisted by the controller.
    assert_eq!(h.store.value("startHidden"), None);
}

#[test]
fn enhanced_settings_reject_unknown_keys_and_bad_values() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    assert_eq!(
        h.controller.handle_json(json!({
            "action": "updateEnhancedSetting",
            "setting": "bogus",
            "value": 1,
        })),
        json!({ "success": false, "error": "unknown setting `bogus`" })
    );

    let response = h.controller.handle_json(json!({
        "action": "updateEnhancedSetting",
        "setting": "startHidden",
        "value": "yes",
    }));
    assert_eq!(response["success"], json!(false));
    assert!(!h.controller.settings().start_hidden);

    let response = h.controller.handle_json(json!({
        "action": "updateEnhancedSetting",
        "setting": "maxSpeed",
        "value": 20,
    }));
    assert_eq!(response["success"], json!(false));
    assert_eq!(h.controller.state().max_speed, 4.0);
}

#[test]
fn audio_setting_affects_later_scans() {
    let mut page = MemoryPage::new();
    let body = page.body_id();
    let audio = page.append_audio(body, "a.mp3");
    let mut h = launch(page, "http://test.local/");
    assert!(h.controller.entry_for(audio).is_none());

    h.controller.handle_json(json!({
        "action": "updateEnhancedSetting",
        "setting": "audioBoolean",
        "value": true,
    }));
    let late = h.controller.page_mut().append_audio(body, "b.mp3");
    h.controller.observe(vec![Mutation::added(body, [late])]);
    h.controller.run_idle();
    assert!(h.controller.entry_for(late).is_some());
    assert!(h.controller.entry_for(audio).is_none());
}

#[test]
fn update_badge_forwards_to_the_reporter() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");

    let response = h.controller.handle_json(json!({ "action": "updateBadge", "speed": 2.5, "tabId": 7 }));
    assert_eq!(response, json!({ "success": true }));
    assert_eq!(h.reporter.reports(), vec![(2.5, Some(7))]);
}

#[test]
fn update_shortcuts_echoes_the_bindings() {
    let (page, _) = page_with_videos(1);
    let mut h = launch(page, "http://test.local/");
    let mut shortcuts = h.controller.settings().shortcuts.clone();
    shortcuts.reset.key = "KeyQ".to_owned();

    let response = h.controller.handle_message(Command::UpdateShortcuts {
        shortcuts: shortcuts.clone(),
    });
    assert_eq!(response.shortcuts.as_ref(), Some(&shortcuts));
    assert_eq!(h.controller.settings().shortcuts, shortcuts);
}
