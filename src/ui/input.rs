/// Input state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous walking while an arrow key is held
///   - Edge-triggered commands (jump, shoot, save...) that fire once per press
///
/// Terminals rarely report key releases, so a key counts as released once
/// no Press/Repeat event has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use stickrun::domain::entity::Facing;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];

/// One-shot actions bound to a key press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Jump,
    Shoot,
    Save,
    Load,
    Reset,
    Quit,
}

/// Key map for one-shot commands. Walking keys are not commands.
pub fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Up | KeyCode::Char(' ') => Some(Command::Jump),
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Command::Jump),
            'f' => Some(Command::Shoot),
            's' => Some(Command::Save),
            'l' => Some(Command::Load),
            'r' => Some(Command::Reset),
            'q' => Some(Command::Quit),
            _ => None,
        },
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                self.record_press(key.code, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record_press(&mut self, code: KeyCode, at: Instant) {
        let was_held = self.is_held(code);
        self.last_active.insert(code, at);
        if !was_held {
            self.fresh_presses.push(code);
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Walking direction from held keys. Both or neither held means stand still.
    pub fn steering(&self) -> Option<Facing> {
        match (self.any_held(&LEFT_KEYS), self.any_held(&RIGHT_KEYS)) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            _ => None,
        }
    }

    /// Commands freshly pressed this frame, in press order, without repeats.
    pub fn commands(&self) -> Vec<Command> {
        let mut out = Vec::with_capacity(self.fresh_presses.len());
        for cmd in self.fresh_presses.iter().filter_map(|c| command_for(*c)) {
            if !out.contains(&cmd) {
                out.push(cmd);
            }
        }
        out
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_map() {
        assert_eq!(command_for(KeyCode::Char(' ')), Some(Command::Jump));
        assert_eq!(command_for(KeyCode::Char('W')), Some(Command::Jump));
        assert_eq!(command_for(KeyCode::Char('f')), Some(Command::Shoot));
        assert_eq!(command_for(KeyCode::Char('S')), Some(Command::Save));
        assert_eq!(command_for(KeyCode::Char('l')), Some(Command::Load));
        assert_eq!(command_for(KeyCode::Char('r')), Some(Command::Reset));
        assert_eq!(command_for(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(command_for(KeyCode::Char('a')), None);
        assert_eq!(command_for(KeyCode::Left), None);
    }

    #[test]
    fn held_keys_steer_and_cancel_out() {
        let mut input = InputState::new();
        input.record_press(KeyCode::Left, Instant::now());
        assert_eq!(input.steering(), Some(Facing::Left));
        input.record_press(KeyCode::Char('d'), Instant::now());
        assert_eq!(input.steering(), None);
    }

    #[test]
    fn repeats_are_not_fresh() {
        let mut input = InputState::new();
        input.record_press(KeyCode::Char('f'), Instant::now());
        input.record_press(KeyCode::Char('f'), Instant::now());
        input.record_press(KeyCode::Char(' '), Instant::now());
        input.record_press(KeyCode::Up, Instant::now());
        assert_eq!(input.commands(), vec![Command::Shoot, Command::Jump]);
    }
}
