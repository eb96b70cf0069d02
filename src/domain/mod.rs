pub mod actors;
pub mod ai;
pub mod capability;
pub mod entity;
pub mod hero;
pub mod observer;
pub mod physics;
