pub mod auth;
pub mod telemetry;
pub mod terminal;
pub mod ui;
pub mod viewer;
