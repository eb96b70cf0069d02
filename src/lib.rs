/// Stickman Run: a side-scrolling platformer simulation.
///
/// `domain` holds entities and their capabilities, `sim` the level,
/// controller and snapshot machinery. The terminal front-end lives in
/// the binary.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
