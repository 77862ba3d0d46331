pub mod cli;
pub mod error;
pub mod view;
