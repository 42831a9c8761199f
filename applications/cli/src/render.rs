//! Console rendering of events and snapshots

use cadence_playback::{format_position, PlaybackEvent, PlaybackState, SessionSnapshot};

/// One-line description of a state
pub fn describe_state(state: &PlaybackState) -> String {
    match state {
        PlaybackState::Idle => "idle".to_string(),
        PlaybackState::Stopped => "stopped".to_string(),
        PlaybackState::Preparing { item } => format!("preparing {}", item.id),
        PlaybackState::Playing {
            item,
            position,
            rate,
        } => format!(
            "playing {} at {}/{} (x{rate})",
            item.id,
            format_position(*position),
            format_position(item.duration)
        ),
        PlaybackState::Paused { item, position } => format!(
            "paused {} at {}/{}",
            item.id,
            format_position(*position),
            format_position(item.duration)
        ),
    }
}

/// One-line description of an event
pub fn describe_event(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::StateChanged { state, actions } => format!(
            "[state] {} [{}]",
            describe_state(state),
            actions.names().join(" ")
        ),
        PlaybackEvent::Completion => "[done] item finished".to_string(),
        PlaybackEvent::MetadataChanged { metadata } => {
            format!("[track] {} - {}", metadata.artist, metadata.title)
        }
        PlaybackEvent::QueueChanged { length } => format!("[queue] {length} item(s)"),
        PlaybackEvent::Error { message } => format!("[error] {message}"),
    }
}

/// Multi-line status report
pub fn describe_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![
        format!("state:    {}", describe_state(&snapshot.state)),
        format!("position: {}", format_position(snapshot.position)),
        format!("focus:    {:?}", snapshot.focus),
        format!("active:   {}", snapshot.active),
        format!("actions:  {}", snapshot.actions.names().join(" ")),
    ];

    if let Some(current) = &snapshot.current {
        lines.push(format!("track:    {} - {}", current.artist, current.title));
    }

    lines.push(format!("queue:    {} item(s)", snapshot.queue.len()));
    for (index, item) in snapshot.queue.iter().enumerate() {
        let marker = if snapshot.cursor == Some(index) { '>' } else { ' ' };
        lines.push(format!(
            "  {marker} {index}. {} ({})",
            item.id,
            format_position(item.duration)
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_playback::{FocusState, PlaybackItem, TransportActions};
    use std::time::Duration;

    fn item() -> PlaybackItem {
        PlaybackItem::new("jazz", Duration::from_secs(103), "asset://jazz.mp3")
    }

    #[test]
    fn describes_playing_state() {
        let state = PlaybackState::Playing {
            item: item(),
            position: Duration::from_secs(65),
            rate: 1.0,
        };
        assert_eq!(describe_state(&state), "playing jazz at 1:05/1:43 (x1)");
    }

    #[test]
    fn describes_state_event_with_actions() {
        let event = PlaybackEvent::StateChanged {
            state: PlaybackState::Stopped,
            actions: TransportActions::for_state(&PlaybackState::Stopped),
        };
        assert_eq!(describe_event(&event), "[state] stopped [play next previous prepare]");
    }

    #[test]
    fn snapshot_marks_cursor() {
        let snapshot = SessionSnapshot {
            state: PlaybackState::Idle,
            actions: TransportActions::PLAY,
            focus: FocusState::None,
            queue: vec![item(), PlaybackItem::new("blues", Duration::from_secs(60), "b")],
            cursor: Some(1),
            current: None,
            position: Duration::ZERO,
            active: false,
        };

        let text = describe_snapshot(&snapshot);
        assert!(text.contains("    0. jazz (1:43)"));
        assert!(text.contains("  > 1. blues (1:00)"));
    }
}
