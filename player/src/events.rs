use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Event utility functions
pub mod event_utils {
    use super::*;
    use basestream_core::playback::KeyAction;

    /// Check if a key event matches Ctrl+C or Ctrl+Q (terminate)
    pub fn is_terminate_event(event: &Event) -> bool {
        matches!(
            event,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c') | KeyCode::Char('q'),
                modifiers: KeyModifiers::CONTROL,
                ..
            })
        )
    }

    /// Player shortcut bound to a key, if any
    pub fn playback_action(key: &KeyEvent) -> Option<KeyAction> {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        match key.code {
            KeyCode::Char(' ') => Some(KeyAction::TogglePlayback),
            KeyCode::Left => Some(KeyAction::SkipBack),
            KeyCode::Right => Some(KeyAction::SkipForward),
            KeyCode::Char('f') => Some(KeyAction::ToggleFullscreen),
            KeyCode::Char('m') => Some(KeyAction::ToggleMute),
            _ => None,
        }
    }

}
