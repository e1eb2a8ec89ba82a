//! Data models for the command line

pub mod config;

pub use config::Configuration;
