/// Whether the game accepts input and advances time.

use log::info;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum GameState {
    #[default]
    Running,
    Stopped,
}

impl GameState {
    pub fn is_running(self) -> bool {
        self == GameState::Running
    }

    /// Idempotent.
    pub fn run(self) -> GameState {
        if self != GameState::Running {
            info!("game running");
        }
        GameState::Running
    }

    /// Idempotent.
    pub fn stop(self) -> GameState {
        if self != GameState::Stopped {
            info!("game stopped");
        }
        GameState::Stopped
    }
}
