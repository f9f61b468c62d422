mod app;
mod config;
mod effects;
mod input;
mod persistence;
mod render;

pub use app::run_app;
