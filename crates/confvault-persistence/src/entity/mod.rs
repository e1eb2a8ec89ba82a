//! SeaORM entities

pub mod prelude;

pub mod configuration;
pub mod configuration_history;
pub mod configuration_publish;
