//! Confvault CLI - operator command line for the configuration engine
//!
//! - `command`: clap surface and dispatch onto the engine components
//! - `model`: layered application configuration
//! - `startup`: logging initialization

pub mod command;
pub mod model;
pub mod startup;

pub use command::{App, Cli, Command, render_error};
pub use model::Configuration;
