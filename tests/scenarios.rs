//! End-to-end scenarios driven through the public controller API with a
//! hand-driven clock and in-memory levels.

use std::cell::RefCell;
use std::rc::Rc;

use stickrun::config::GameSettings;
use stickrun::domain::capability::PointReceiver;
use stickrun::domain::entity::{Entity, EntityKind};
use stickrun::domain::observer::Observer;
use stickrun::error::SnapshotError;
use stickrun::sim::controller::GameController;
use stickrun::sim::event::GameEvent;
use stickrun::sim::loader::{FileLevelLoader, LevelLoader, MemoryLevelLoader};
use stickrun::sim::state::GameState;
use stickrun::sim::timer::ManualClock;

const OPEN_FIELD: &str = r#"
height = 400.0
width = 1200.0
floor_height = 300.0
target_seconds = 30
hero_x = 50.0
"#;

const SLIME_AHEAD: &str = r#"
height = 400.0
width = 1200.0
floor_height = 300.0
target_seconds = 30
hero_x = 50.0

[[entities]]
kind = "mushroom"
x = 100.0
y = 280.0

[[entities]]
kind = "slime"
x = 400.0
y = 280.0
strategy = "patrol"
speed = 1.0
range = 50.0

[[entities]]
kind = "flag"
x = 1100.0
y = 260.0
"#;

#[derive(Default)]
struct Log {
    seen: RefCell<Vec<GameEvent>>,
}

impl Observer for Log {
    fn update(&self, event: &GameEvent) {
        self.seen.borrow_mut().push(event.clone());
    }
}

fn game(levels: &[(&str, &str)], lives: u32) -> (GameController, ManualClock) {
    let loader = levels
        .iter()
        .fold(MemoryLevelLoader::new(), |l, (name, text)| l.with_level(name, text));
    let settings = GameSettings {
        lives,
        level_files: levels.iter().map(|(name, _)| name.to_string()).collect(),
    };
    let clock = ManualClock::new();
    let game = GameController::new(&settings, Box::new(loader), Box::new(clock.clone())).unwrap();
    (game, clock)
}

fn kill_hero(game: &mut GameController) {
    let slime_x = game
        .level()
        .entities()
        .find(|(_, e)| e.kind() == EntityKind::Slime)
        .map(|(_, e)| e.body().x)
        .unwrap();
    game.level_mut().hero_mut().body_mut().x = slime_x;
    game.tick();
}

fn win_level(game: &mut GameController) {
    game.level_mut().win();
    game.tick();
}

#[test]
fn lethal_contact_with_lives_left_keeps_running() {
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
    kill_hero(&mut game);

    assert_eq!(game.lives(), 2);
    assert_eq!(game.state(), GameState::Running);
    assert!(game.level().is_active());
    assert!(game.level().hero().is_active());
}

#[test]
fn losing_every_life_stops_the_game() {
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
    for _ in 0..3 {
        kill_hero(&mut game);
    }
    assert_eq!(game.lives(), 0);
    assert_eq!(game.state(), GameState::Stopped);
    assert!(!game.level().is_active());

    // Frozen: nothing moves, nothing resets.
    let before = game.level().hero_x();
    game.move_right();
    game.tick();
    assert_eq!(game.level().hero_x(), before);
    assert!(!game.reset());
}

#[test]
fn time_score_climbs_to_target_then_drains_to_zero() {
    let (mut game, clock) = game(&[("a", OPEN_FIELD)], 3);

    for _ in 0..30 {
        clock.advance_seconds(1);
        game.tick();
    }
    assert_eq!(game.current_level_point(), 30);

    for _ in 0..15 {
        clock.advance_seconds(1);
        game.tick();
    }
    assert_eq!(game.elapsed_seconds(), 45);
    assert_eq!(game.current_level_point(), 15);

    for _ in 0..40 {
        clock.advance_seconds(1);
        game.tick();
    }
    assert_eq!(game.current_level_point(), 0);
}

#[test]
fn several_ticks_in_one_second_count_once() {
    let (mut game, clock) = game(&[("a", OPEN_FIELD)], 3);
    clock.advance_millis(1000);
    for _ in 0..10 {
        game.tick();
    }
    assert_eq!(game.current_level_point(), 1);
}

#[test]
fn snapshot_round_trip_across_levels() {
    let levels = [("one", OPEN_FIELD), ("two", OPEN_FIELD), ("three", OPEN_FIELD)];
    let (mut game, _) = game(&levels, 3);
    game.level_mut().absorb_point(120);
    game.save_memento();

    win_level(&mut game);
    win_level(&mut game);
    assert_eq!(game.level_index(), 2);
    game.level_mut().absorb_point(5);
    assert_eq!(game.current_level_point(), 5);

    game.load_memento().unwrap();
    assert_eq!(game.level_index(), 0);
    assert_eq!(game.current_level_point(), 120);
    assert_eq!(game.total_point(), 0);
    assert_eq!(game.level().source(), "one");
}

#[test]
fn snapshot_restores_positions_lives_and_time() {
    let (mut game, clock) = game(&[("a", SLIME_AHEAD)], 3);
    game.move_right();
    for _ in 0..10 {
        game.tick();
    }
    clock.advance_seconds(4);
    game.tick();
    let hero_x = game.level().hero_x();
    let positions: Vec<(f64, f64)> = game.level().entities().map(|(_, e)| (e.body().x, e.body().y)).collect();
    game.save_memento();

    for _ in 0..50 {
        game.tick();
    }
    clock.advance_seconds(9);
    kill_hero(&mut game);
    assert_eq!(game.lives(), 2);

    game.load_memento().unwrap();
    assert_eq!(game.lives(), 3);
    assert_eq!(game.elapsed_seconds(), 4);
    assert_eq!(game.level().hero_x(), hero_x);
    let restored: Vec<(f64, f64)> = game.level().entities().map(|(_, e)| (e.body().x, e.body().y)).collect();
    assert_eq!(restored, positions);
}

#[test]
fn restored_level_still_reports_deaths() {
    let log = Rc::new(Log::default());
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
    game.attach_observer(log.clone());
    game.save_memento();
    game.load_memento().unwrap();
    log.seen.borrow_mut().clear();

    kill_hero(&mut game);

    assert_eq!(game.lives(), 2);
    assert_eq!(game.state(), GameState::Running);
    assert!(game.level().is_active());
    assert!(game.level().hero().is_active());
    assert_eq!(*log.seen.borrow(), vec![GameEvent::PlayerKilled, GameEvent::LevelReset]);
}

#[test]
fn restoring_twice_gives_the_same_state() {
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
    game.save_memento();

    game.load_memento().unwrap();
    game.move_right();
    for _ in 0..40 {
        game.tick();
    }

    game.load_memento().unwrap();
    assert_eq!(game.level().hero_x(), 50.0);
}

#[test]
fn restore_revives_a_finished_game() {
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 1);
    game.save_memento();
    kill_hero(&mut game);
    assert_eq!(game.state(), GameState::Stopped);

    game.load_memento().unwrap();
    assert_eq!(game.state(), GameState::Running);
    assert_eq!(game.lives(), 1);
    assert!(game.level().is_active());
    assert!(game.move_right());
}

#[test]
fn load_before_save_reports_not_found() {
    let (mut game, _) = game(&[("a", OPEN_FIELD)], 3);
    assert_eq!(game.load_memento(), Err(SnapshotError::NotFound));
    assert_eq!(game.state(), GameState::Running);
}

#[test]
fn observers_follow_the_game_through_every_level_swap() {
    let log = Rc::new(Log::default());
    let (mut game, _) = game(&[("a", SLIME_AHEAD), ("b", OPEN_FIELD)], 3);
    game.attach_observer(log.clone());
    game.save_memento();

    kill_hero(&mut game);
    win_level(&mut game);
    game.level_mut().win();
    game.load_memento().unwrap();

    assert_eq!(
        *log.seen.borrow(),
        vec![
            GameEvent::PlayerKilled,
            GameEvent::LevelReset,
            GameEvent::LevelWon,
            GameEvent::LevelWon,
            GameEvent::Restored,
        ]
    );
}

#[test]
fn pickup_then_shot_scores_both_givers() {
    let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
    game.move_right();
    for _ in 0..30 {
        game.tick();
    }
    assert!(game.level().hero().upgraded());
    assert_eq!(game.current_level_point(), 50);

    game.stop_moving();
    assert!(game.shoot());
    for _ in 0..80 {
        game.tick();
    }
    assert_eq!(game.current_level_point(), 150);
    assert!(game.level().entities().all(|(_, e)| e.kind() != EntityKind::Slime));
}

#[test]
fn identical_runs_deactivate_identical_entities() {
    let run = || {
        let (mut game, _) = game(&[("a", SLIME_AHEAD)], 3);
        game.move_right();
        let mut trace = vec![];
        for _ in 0..200 {
            game.tick();
            if game.level().hero().upgraded() {
                game.shoot();
            }
            trace.push(
                game.level()
                    .entities()
                    .map(|(id, e)| (id, e.kind(), e.body().x, e.body().y))
                    .collect::<Vec<_>>(),
            );
        }
        (trace, game.lives(), game.current_level_point())
    };
    assert_eq!(run(), run());
}

#[test]
fn bundled_levels_all_load() {
    let loader = FileLevelLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/levels"));
    for name in ["level1.toml", "level2.toml", "level3.toml"] {
        let desc = loader.load(name).unwrap();
        assert!(desc.width > 0.0 && desc.height > 0.0, "{name}");
    }

    let settings = GameSettings {
        lives: 3,
        level_files: vec!["level1.toml".into(), "level2.toml".into(), "level3.toml".into()],
    };
    let game = GameController::new(&settings, Box::new(loader), Box::new(ManualClock::new())).unwrap();
    assert_eq!(game.level_count(), 3);
    assert_eq!(game.level().source(), "level1.toml");
}
