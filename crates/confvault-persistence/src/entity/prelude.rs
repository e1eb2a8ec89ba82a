pub use super::configuration::Entity as Configuration;
pub use super::configuration_history::Entity as ConfigurationHistory;
pub use super::configuration_publish::Entity as ConfigurationPublish;
