/// Game controller: the one owner of live game state.
///
/// ## Responsibilities
///   - drive `Level::tick` while the game is Running
///   - react to level events (death, win, loss) with lives and progression
///   - keep the time score: +1 per second up to the level's target,
///     -1 per second after it while the level total stays positive
///   - save and restore the single in-memory snapshot
///
/// ## Event dispatch
///
/// The controller is the `Owner` subscriber of the current level. After
/// every tick (and after a restore) it drains the level's queue and
/// handles each event. When handling an event replaces the level, the
/// rest of that batch belonged to the old level and is dropped; the new
/// level's own queue is drained next.
///
/// External observers attached through `attach_observer` are carried over
/// to every replacement level: resets, level changes and restores.

use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::config::{GameSettings, DEFAULT_LIVES};
use crate::domain::capability::PointReceiver;
use crate::domain::observer::{Observer, Subscriber};
use crate::error::{ConfigError, GameError, LevelError, SnapshotError};
use crate::sim::event::GameEvent;
use crate::sim::level::Level;
use crate::sim::loader::{build_level, LevelLoader};
use crate::sim::save::{Caretaker, GameMemento};
use crate::sim::state::GameState;
use crate::sim::timer::{Clock, Timer};

pub struct GameController {
    level: Level,
    loader: Box<dyn LevelLoader>,
    level_files: Vec<String>,
    level_index: usize,
    lives: u32,
    /// Time points of the current level; may dip below zero only while
    /// the level's own points cover it.
    current_point: i64,
    /// Set once the current level's points have gone into `total_point`.
    banked: bool,
    total_point: u32,
    previous_seconds: u64,
    timer: Timer,
    state: GameState,
    caretaker: Caretaker,
}

impl GameController {
    pub fn new(
        settings: &GameSettings,
        loader: Box<dyn LevelLoader>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, GameError> {
        let first = settings.level_files.first().ok_or(ConfigError::NoLevels)?;
        let level = open_level(loader.as_ref(), first)?;

        let lives = if settings.lives == 0 {
            warn!("lives must be positive, using {DEFAULT_LIVES}");
            DEFAULT_LIVES
        } else {
            settings.lives
        };

        let timer = Timer::new(clock);
        let previous_seconds = timer.elapsed_seconds();
        info!("starting {} with {lives} lives", level.source());

        Ok(GameController {
            level,
            loader,
            level_files: settings.level_files.clone(),
            level_index: 0,
            lives,
            current_point: 0,
            banked: false,
            total_point: 0,
            previous_seconds,
            timer,
            state: GameState::Running,
            caretaker: Caretaker::new(),
        })
    }

    // ── Queries ──

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.level_files.len()
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    /// Time points plus the level's own points, floored at zero. Zero once
    /// those points are banked.
    pub fn current_level_point(&self) -> u32 {
        if self.banked {
            return 0;
        }
        let sum = self.current_point + i64::from(self.level.current_point());
        u32::try_from(sum.max(0)).unwrap_or(u32::MAX)
    }

    /// Points banked from finished levels.
    pub fn total_point(&self) -> u32 {
        self.total_point
    }

    pub fn has_snapshot(&self) -> bool {
        self.caretaker.has_snapshot()
    }

    // ── Frame ──

    pub fn tick(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.update_point();
        self.previous_seconds = self.timer.elapsed_seconds();
        self.level.tick();
        self.dispatch_events();
    }

    /// Adjust the time score if a second has passed since the last tick.
    pub fn update_point(&mut self) {
        if !self.state.is_running() {
            return;
        }
        let now = self.timer.elapsed_seconds();
        if now.saturating_sub(self.previous_seconds) < 1 {
            return;
        }
        if now <= self.level.target_seconds() {
            self.current_point += 1;
        } else if self.current_point + i64::from(self.level.current_point()) >= 1 {
            self.current_point -= 1;
        }
    }

    /// Bank the current level's points into the total.
    pub fn reset_current_point(&mut self) {
        self.total_point = self.total_point.saturating_add(self.current_level_point());
        self.current_point = 0;
        self.banked = true;
    }

    // ── Input ──

    pub fn jump(&mut self) -> bool {
        self.state.is_running() && self.level.jump()
    }

    pub fn move_left(&mut self) -> bool {
        self.state.is_running() && self.level.move_left()
    }

    pub fn move_right(&mut self) -> bool {
        self.state.is_running() && self.level.move_right()
    }

    pub fn stop_moving(&mut self) -> bool {
        self.state.is_running() && self.level.stop_moving()
    }

    pub fn shoot(&mut self) -> bool {
        self.state.is_running() && self.level.shoot()
    }

    // ── Observers ──

    pub fn attach_observer(&mut self, observer: Rc<dyn Observer>) {
        self.level.attach(Subscriber::Shared(observer));
    }

    pub fn detach_observer(&mut self, observer: &Rc<dyn Observer>) {
        self.level.detach(&Subscriber::Shared(Rc::clone(observer)));
    }

    // ── Level lifecycle ──

    /// Rebuild the current level from its source. Time points are cleared;
    /// lives and banked points are kept. No-op while Stopped.
    pub fn reset(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let source = self.level.source().to_string();
        match open_level(self.loader.as_ref(), &source) {
            Ok(level) => {
                self.replace_level(level);
                self.current_point = 0;
                self.level.notify_observers(GameEvent::LevelReset);
                info!("level {source} reset");
                true
            }
            Err(e) => {
                error!("cannot reset: {e}");
                false
            }
        }
    }

    /// Move to the next level source. Returns false when none is left.
    fn load_next_level(&mut self) -> bool {
        self.reset_current_point();
        let next = self.level_index + 1;
        let Some(source) = self.level_files.get(next).cloned() else {
            return false;
        };
        match open_level(self.loader.as_ref(), &source) {
            Ok(level) => {
                self.replace_level(level);
                self.level_index = next;
                info!("level has been updated: {source}");
                true
            }
            Err(e) => {
                error!("cannot load next level: {e}");
                false
            }
        }
    }

    /// Swap in `level`, carrying over the current subscribers.
    fn replace_level(&mut self, mut level: Level) {
        for subscriber in self.level.observers().iter() {
            level.attach(subscriber.clone());
        }
        self.level = level;
        self.banked = false;
    }

    fn dispatch_events(&mut self) {
        loop {
            let events = self.level.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                if self.handle(&event) {
                    debug!("level replaced; dropping the rest of its events");
                    break;
                }
            }
        }
    }

    /// React to one level event. Returns true if the level was replaced.
    fn handle(&mut self, event: &GameEvent) -> bool {
        match event {
            GameEvent::PlayerKilled => self.lose_life(),
            GameEvent::LevelWon => {
                let replaced = self.load_next_level();
                if !replaced {
                    info!("no more levels");
                    self.state = self.state.stop();
                }
                self.timer.reset_to_now();
                self.previous_seconds = 0;
                replaced
            }
            GameEvent::LevelLost => {
                self.state = self.state.stop();
                self.timer.reset_to_now();
                self.previous_seconds = 0;
                false
            }
            other => {
                debug!("level event {other:?}");
                false
            }
        }
    }

    fn lose_life(&mut self) -> bool {
        if !self.state.is_running() || self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        info!("life lost, {} left", self.lives);
        if self.lives == 0 {
            self.state = self.state.stop();
            self.level.lose();
            false
        } else {
            self.reset()
        }
    }

    // ── Snapshot ──

    pub fn save_memento(&mut self) {
        let memento = GameMemento::capture(
            &self.level,
            self.state,
            self.timer.elapsed_seconds(),
            self.lives,
            self.current_point,
            self.banked,
            self.total_point,
            self.level_index,
        );
        self.caretaker.overwrite(memento);
    }

    pub fn load_memento(&mut self) -> Result<(), SnapshotError> {
        let memento = match self.caretaker.most_recent() {
            Ok(m) => m,
            Err(e) => {
                warn!("you need to save before loading: {e}");
                return Err(e);
            }
        };

        self.state = memento.state();
        self.timer.roll_back_to_seconds(memento.seconds());
        self.previous_seconds = memento.seconds();
        self.lives = memento.lives();
        self.current_point = memento.current_point();
        self.total_point = memento.total_point();
        self.level_index = memento.level_index();
        let banked = memento.banked();
        self.replace_level(memento.into_level());
        self.banked = banked;
        info!("snapshot restored: level {}", self.level_index);

        self.level.notify_observers(GameEvent::Restored);
        self.dispatch_events();
        Ok(())
    }
}

/// Load, build and subscribe to a level.
fn open_level(loader: &dyn LevelLoader, source: &str) -> Result<Level, LevelError> {
    let desc = loader.load(source)?;
    let mut level = build_level(source, &desc);
    level.attach(Subscriber::Owner);
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Entity, EntityKind};
    use crate::domain::observer::tests::Recorder;
    use crate::sim::loader::MemoryLevelLoader;
    use crate::sim::timer::ManualClock;

    const PLAIN: &str = "height = 400.0\nwidth = 1000.0\nfloor_height = 300.0\ntarget_seconds = 30\nhero_x = 50.0";

    fn with_slime() -> String {
        format!("{PLAIN}\n[[entities]]\nkind = \"slime\"\nx = 600.0\ny = 280.0\nstrategy = \"idle\"")
    }

    fn controller(levels: &[&str], lives: u32) -> (GameController, ManualClock) {
        let mut loader = MemoryLevelLoader::new().with_level("slime", &with_slime());
        for name in levels.iter().filter(|n| **n != "slime") {
            loader = loader.with_level(name, PLAIN);
        }
        let settings = GameSettings {
            lives,
            level_files: levels.iter().map(|s| s.to_string()).collect(),
        };
        let clock = ManualClock::new();
        let c = GameController::new(&settings, Box::new(loader), Box::new(clock.clone())).unwrap();
        (c, clock)
    }

    fn walk_into_slime(c: &mut GameController) {
        c.level_mut().hero_mut().body_mut().x = 600.0;
        c.tick();
    }

    #[test]
    fn missing_first_level_is_an_error() {
        let settings = GameSettings { lives: 3, level_files: vec!["gone".into()] };
        let result = GameController::new(
            &settings,
            Box::new(MemoryLevelLoader::new()),
            Box::new(ManualClock::new()),
        );
        assert!(matches!(result, Err(GameError::Level(LevelError::NotFound { .. }))));
    }

    #[test]
    fn no_levels_is_an_error() {
        let settings = GameSettings { lives: 3, level_files: vec![] };
        let result = GameController::new(
            &settings,
            Box::new(MemoryLevelLoader::new()),
            Box::new(ManualClock::new()),
        );
        assert!(matches!(result, Err(GameError::Config(ConfigError::NoLevels))));
    }

    #[test]
    fn death_costs_a_life_and_resets_the_level() {
        let (mut c, _) = controller(&["slime"], 3);
        walk_into_slime(&mut c);

        assert_eq!(c.lives(), 2);
        assert_eq!(c.state(), GameState::Running);
        assert!(c.level().hero().is_active());
        assert_eq!(c.level().hero_x(), 50.0);
    }

    #[test]
    fn last_death_stops_and_loses() {
        let (mut c, _) = controller(&["slime"], 1);
        walk_into_slime(&mut c);

        assert_eq!(c.lives(), 0);
        assert_eq!(c.state(), GameState::Stopped);
        assert!(!c.level().is_active());
        assert!(c.level().entities().any(|(_, e)| e.kind() == EntityKind::LoseMarker));

        assert!(!c.move_right());
        assert!(!c.reset());
    }

    #[test]
    fn winning_advances_then_stops_after_the_last_level() {
        let (mut c, clock) = controller(&["a", "b"], 3);
        clock.advance_seconds(5);
        c.tick();
        assert_eq!(c.current_level_point(), 1);

        c.level_mut().win();
        c.tick();
        assert_eq!(c.level_index(), 1);
        assert_eq!(c.level().source(), "b");
        assert_eq!(c.total_point(), 1);
        assert_eq!(c.elapsed_seconds(), 0);

        c.level_mut().win();
        c.tick();
        assert_eq!(c.level_index(), 1);
        assert_eq!(c.state(), GameState::Stopped);
    }

    #[test]
    fn last_level_points_are_shown_once() {
        let (mut c, _) = controller(&["a"], 3);
        c.level_mut().absorb_point(50);
        c.save_memento();
        c.level_mut().win();
        c.tick();

        assert_eq!(c.state(), GameState::Stopped);
        assert_eq!(c.total_point(), 50);
        assert_eq!(c.current_level_point(), 0);

        c.save_memento();
        c.load_memento().unwrap();
        assert_eq!(c.total_point(), 50);
        assert_eq!(c.current_level_point(), 0);
    }

    #[test]
    fn external_observer_follows_resets_and_sees_level_events() {
        let rec = Rc::new(Recorder::default());
        let (mut c, _) = controller(&["slime"], 3);
        c.attach_observer(rec.clone());

        walk_into_slime(&mut c);
        assert_eq!(*rec.seen.borrow(), vec![GameEvent::PlayerKilled, GameEvent::LevelReset]);

        c.level_mut().win();
        assert_eq!(rec.seen.borrow().last(), Some(&GameEvent::LevelWon));

        let handle: Rc<dyn Observer> = rec.clone();
        c.detach_observer(&handle);
        assert_eq!(c.level().observers().len(), 1);
    }

    #[test]
    fn shooting_is_refused_without_upgrade() {
        let (mut c, _) = controller(&["a"], 3);
        assert!(!c.shoot());
        assert!(c.jump());
        assert!(c.stop_moving());
        assert!(c.move_left());
    }

    #[test]
    fn load_without_save_is_not_found() {
        let (mut c, _) = controller(&["a"], 3);
        assert!(!c.has_snapshot());
        assert_eq!(c.load_memento(), Err(SnapshotError::NotFound));
    }

    #[test]
    fn restore_brings_back_timer_lives_and_level() {
        let rec = Rc::new(Recorder::default());
        let (mut c, clock) = controller(&["slime"], 3);
        c.attach_observer(rec.clone());
        clock.advance_seconds(7);
        c.tick();
        c.save_memento();

        walk_into_slime(&mut c);
        clock.advance_seconds(20);
        c.level_mut().hero_mut().body_mut().x = 300.0;
        assert_eq!(c.lives(), 2);

        c.load_memento().unwrap();
        assert_eq!(c.lives(), 3);
        assert_eq!(c.elapsed_seconds(), 7);
        assert_eq!(c.level().hero_x(), 50.0);
        assert_eq!(c.current_level_point(), 1);
        assert_eq!(rec.seen.borrow().last(), Some(&GameEvent::Restored));
    }
}
