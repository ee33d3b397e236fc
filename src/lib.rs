pub mod ai_power;
pub mod config;
pub mod game_events;
pub mod ingest;
pub mod model;
pub mod timestamp;
