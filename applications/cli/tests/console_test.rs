//! Console integration tests
//!
//! Runs real sessions over the wall-clock output. Waits are bounded by
//! `recv_timeout` so a regression fails instead of hanging.

use cadence_cli::{
    command::Command,
    config::CliConfig,
    console::{Console, Reply},
    library::parse_tracks,
};
use cadence_playback::{PlaybackEvent, PlaybackState, TrackMetadata};
use crossbeam_channel::Receiver;
use std::io::Cursor;
use std::time::{Duration, Instant};

const LIBRARY: &str = r#"
[[tracks]]
id = "long"
title = "Long"
artist = "Tester"
duration_ms = 600000
locator = "asset://long.mp3"

[[tracks]]
id = "blip"
title = "Blip"
artist = "Tester"
duration_ms = 50
locator = "asset://blip.mp3"
"#;

fn tracks() -> Vec<TrackMetadata> {
    parse_tracks(LIBRARY).unwrap()
}

fn config(grant_focus: bool) -> CliConfig {
    let mut config = CliConfig::default();
    config.simulation.grant_focus = grant_focus;
    config.simulation.tick_ms = 5;
    config
}

/// Wait until an event matching `predicate` arrives
fn wait_for(
    events: &Receiver<PlaybackEvent>,
    predicate: impl Fn(&PlaybackEvent) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(left) {
            Ok(event) if predicate(&event) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    false
}

fn state_is(name: &'static str) -> impl Fn(&PlaybackEvent) -> bool {
    move |event| matches!(event, PlaybackEvent::StateChanged { state, .. } if state.name() == name)
}

#[test]
fn play_pause_status() {
    let (console, events) = Console::start(&config(true), &tracks()).unwrap();

    assert_eq!(console.execute(Command::Play).unwrap(), Reply::Sent);
    assert!(wait_for(&events, state_is("playing")));

    console.execute(Command::Pause).unwrap();
    assert!(wait_for(&events, state_is("paused")));

    let Reply::Text(status) = console.execute(Command::Status).unwrap() else {
        panic!("status should produce text");
    };
    assert!(status.contains("paused long"), "{status}");
    assert!(status.contains("> 0. long"), "{status}");

    console.shutdown().unwrap();
}

#[test]
fn short_item_completes_on_its_own() {
    let (console, events) = Console::start(&config(true), &tracks()).unwrap();

    console.execute(Command::Next).unwrap();
    assert!(wait_for(&events, |e| *e == PlaybackEvent::Completion));
    assert!(wait_for(&events, state_is("paused")));

    console.shutdown().unwrap();
}

#[test]
fn denied_focus_keeps_session_idle() {
    let (console, events) = Console::start(&config(false), &tracks()).unwrap();

    console.execute(Command::Play).unwrap();
    let Reply::Text(status) = console.execute(Command::Status).unwrap() else {
        panic!("status should produce text");
    };
    assert!(status.starts_with("state:    idle"), "{status}");
    assert!(!events.try_iter().any(|e| matches!(
        e,
        PlaybackEvent::StateChanged {
            state: PlaybackState::Playing { .. },
            ..
        }
    )));

    console.shutdown().unwrap();
}

#[test]
fn unknown_track_is_rejected() {
    let (console, _events) = Console::start(&config(true), &tracks()).unwrap();

    let err = console
        .execute(Command::Add("missing".into()))
        .unwrap_err();
    assert_eq!(err.to_string(), "Library error: unknown track: missing");

    console.shutdown().unwrap();
}

#[test]
fn scripted_input_runs_until_quit() {
    let (console, events) = Console::start(&config(true), &tracks()).unwrap();
    let script = "play\nbogus\n\nfocus transient\nstatus\nquit\nplay\n";
    let mut out = Vec::new();

    console.run(Cursor::new(script), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("Unrecognized command: bogus"), "{out}");
    assert!(out.contains("state:    paused long"), "{out}");
    assert!(wait_for(&events, state_is("paused")));

    console.shutdown().unwrap();
}
