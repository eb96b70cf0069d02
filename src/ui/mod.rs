pub mod banner;
pub mod input;
pub mod renderer;
