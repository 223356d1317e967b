use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod apis;
pub mod clients;
pub mod controller;
mod error;
pub mod managed;

pub use error::Error;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub enabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    /// Seconds between observations of an up to date resource.
    pub poll_interval: u64,
    /// Seconds to wait after creating or deleting an external resource.
    pub short_wait: u64,
    /// Seconds to wait after a failed reconcile.
    pub error_requeue: u64,
    pub rds_instance: ControllerConfig,
    pub service_linked_role: ControllerConfig,
    pub configuration_set: ControllerConfig,
    pub email_template: ControllerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: 60,
            short_wait: 30,
            error_requeue: 5,
            rds_instance: ControllerConfig::default(),
            service_linked_role: ControllerConfig::default(),
            configuration_set: ControllerConfig::default(),
            email_template: ControllerConfig::default(),
        }
    }
}

impl Config {
    pub fn options(&self) -> managed::Options {
        managed::Options {
            poll_interval: Duration::from_secs(self.poll_interval),
            short_wait: Duration::from_secs(self.short_wait),
            error_requeue: Duration::from_secs(self.error_requeue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.rds_instance.enabled);
        assert_eq!(config.options().poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn partial_config() {
        let config: Config = serde_yaml::from_str(
            r#"
pollInterval: 300
emailTemplate:
  enabled: false
"#,
        )
        .unwrap();
        assert_eq!(config.poll_interval, 300);
        assert_eq!(config.short_wait, 30);
        assert!(!config.email_template.enabled);
        assert!(config.configuration_set.enabled);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<Config>("token: abc").is_err());
    }
}
