/// Entry point and game loop.

mod ui;

use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{error, info};

use stickrun::config::GameConfig;
use stickrun::domain::entity::Facing;
use stickrun::domain::observer::Observer;
use stickrun::error::GameError;
use stickrun::sim::controller::GameController;
use stickrun::sim::loader::FileLevelLoader;
use stickrun::sim::timer::SystemClock;
use ui::banner::Banner;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (mut game, config) = match start() {
        Ok(started) => started,
        Err(e) => {
            error!("{e}");
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    let banner = Rc::new(Banner::new());
    let listener: Rc<dyn Observer> = banner.clone();
    game.attach_observer(listener);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let result = game_loop(&mut game, &mut renderer, &banner, tick_rate);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Stickman Run!");
    println!("Banked Score: {}", game.total_point());
    println!("Level Score: {}", game.current_level_point());
}

fn start() -> Result<(GameController, GameConfig), GameError> {
    let config = GameConfig::load()?;
    info!("levels from {}", config.levels_dir.display());
    let loader = FileLevelLoader::new(config.levels_dir.clone());
    let game = GameController::new(&config.game, Box::new(loader), Box::new(SystemClock::new()))?;
    Ok((game, config))
}

fn game_loop(
    game: &mut GameController,
    renderer: &mut Renderer,
    banner: &Banner,
    tick_rate: Duration,
) -> std::io::Result<()> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        for command in kb.commands() {
            match command {
                Command::Quit => return Ok(()),
                Command::Jump => {
                    game.jump();
                }
                Command::Shoot => {
                    game.shoot();
                }
                Command::Save => {
                    game.save_memento();
                    banner.say("Game saved");
                }
                Command::Load => {
                    if let Err(e) = game.load_memento() {
                        banner.say(format!("Cannot load: {e}"));
                    }
                }
                Command::Reset => {
                    game.reset();
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            match kb.steering() {
                Some(Facing::Left) => game.move_left(),
                Some(Facing::Right) => game.move_right(),
                None => game.stop_moving(),
            };
            game.tick();
            last_tick = Instant::now();

            if banner.take_repaint() {
                renderer.invalidate();
            }
            renderer.render(game, &banner.text())?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
