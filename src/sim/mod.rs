pub mod controller;
pub mod event;
pub mod level;
pub mod loader;
pub mod save;
pub mod state;
mod step;
pub mod timer;
