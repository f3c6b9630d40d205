//! Bus topics routed through a full set of handlers

mod common;

use carillon::config::{BellSettings, JukeboxSettings};
use carillon::control::{Bell, ControlHandler, Jukebox, LocalBus, MessageBus, TopicRouter};
use carillon::{Carillon, MemoryOutput, Striker, StrikerConfig, ThemeLibrary};
use common::{wait_for, write_note, write_theme};
use std::sync::Arc;
use tempfile::TempDir;

struct Rig {
    _dir: TempDir,
    output: MemoryOutput,
    bus: Arc<LocalBus>,
    router: TopicRouter,
    striker: Striker,
}

fn rig() -> Rig {
    let dir = TempDir::new().unwrap();
    let themes = dir.path().join("themes");
    let songs = dir.path().join("songs");
    write_theme(&themes, "default", &[]);
    write_theme(&themes, "westminster", &[]);
    std::fs::create_dir_all(&songs).unwrap();
    write_note(&songs.join("Regina Caeli.mid"), 67, 30.0);
    write_note(&dir.path().join("bell.mid"), 84, 0.005);

    let output = MemoryOutput::new();
    let carillon = Carillon::new(Box::new(output.clone()));
    let striker = Striker::new(
        carillon.clone(),
        ThemeLibrary::new(&themes),
        StrikerConfig::default(),
    );
    let bus = Arc::new(LocalBus::new("carillon"));

    let mut router = TopicRouter::new("carillon");
    router.attach(Arc::new(ControlHandler::new(striker.clone(), bus.clone())));
    router.attach(Arc::new(Jukebox::from_settings(
        carillon.clone(),
        bus.clone(),
        &JukeboxSettings {
            priority: 5,
            basefolder: songs,
        },
    )));
    router.attach(Arc::new(Bell::from_settings(
        carillon,
        Some(bus.clone() as Arc<dyn MessageBus>),
        &BellSettings {
            enabled: true,
            melody: Some(dir.path().join("bell.mid")),
            priority: 10,
            ..Default::default()
        },
    )));

    Rig {
        _dir: dir,
        output,
        bus,
        router,
        striker,
    }
}

#[test]
fn test_subscriptions_carry_the_base_topic() {
    let rig = rig();
    let subscriptions = rig.router.subscriptions();

    assert!(subscriptions.contains(&"carillon/control/volume/set".to_string()));
    assert!(subscriptions.contains(&"carillon/jukebox/play".to_string()));
    assert!(subscriptions.contains(&"carillon/bell/press".to_string()));
    assert!(!rig.router.dispatch("carillon/unknown", b""));
}

#[test]
fn test_theme_topics_change_the_striker() {
    let rig = rig();

    assert!(rig.router.dispatch("carillon/control/theme/set", b"westminster"));
    assert_eq!(rig.striker.theme(), "westminster");
    assert_eq!(rig.bus.last("control/theme").as_deref(), Some("westminster"));

    rig.router.dispatch("carillon/control/theme/set", b"../etc");
    assert_eq!(rig.striker.theme(), "westminster");

    rig.router.dispatch("carillon/control/theme/list/get", b"");
    assert_eq!(
        rig.bus.last("control/theme/list").as_deref(),
        Some("default\nwestminster")
    );
}

/// The bell outranks the jukebox, and control/stop silences both
#[test]
fn test_jukebox_bell_and_stop() {
    let rig = rig();

    rig.router.dispatch("carillon/jukebox/play", b"Regina Caeli");
    assert!(wait_for(|| rig.output.notes_played() == vec![67]));
    assert_eq!(rig.striker.carillon().current_priority(), Some(5));

    rig.router.dispatch("carillon/bell/press", b"");
    assert!(wait_for(|| rig.output.notes_played() == vec![67, 84]));
    rig.router.dispatch("carillon/bell/release", b"");
    assert_eq!(rig.bus.last("bell/state").as_deref(), Some("0"));
    assert!(wait_for(|| !rig.striker.carillon().is_playing()));

    rig.router.dispatch("carillon/jukebox/play", b"Regina Caeli");
    assert!(wait_for(|| rig.output.notes_played() == vec![67, 84, 67]));

    rig.router.dispatch("carillon/control/stop", b"");
    assert!(!rig.striker.carillon().is_playing());
}

#[test]
fn test_status_reports_playback() {
    let rig = rig();

    rig.router.dispatch("carillon/control/volume/set", b"0.5");
    rig.router.dispatch("carillon/jukebox/play", b"Regina Caeli");
    assert!(wait_for(|| rig.striker.carillon().is_playing()));
    rig.router.dispatch("carillon/control/status/get", b"");

    let status: serde_json::Value =
        serde_json::from_str(&rig.bus.last("control/status").unwrap()).unwrap();
    assert_eq!(status["playing"], true);
    assert_eq!(status["priority"], 5);
    assert_eq!(status["volume"], 0.5);

    rig.router.dispatch("carillon/control/stop", b"");
}

#[test]
fn test_jukebox_list() {
    let rig = rig();
    rig.router.dispatch("carillon/jukebox/list/get", b"");
    assert_eq!(rig.bus.last("jukebox/list").as_deref(), Some("Regina Caeli"));
}
