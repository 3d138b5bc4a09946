//! Service configuration loaded via OrthoConfig.
//!
//! Queue endpoints come from `SQS_*` variables and worker tuning from
//! `NOTIFICATIONS_*` variables. Every tuning value is optional and falls back
//! to the domain defaults; the two queue URLs are required.

use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    DEFAULT_FAILURE_ORDER_ID, DlqAdminConfig, FaultInjector, NoFaultInjection,
    OrderConsumerConfig, OrderIdFaultInjector, OrderIntakeConfig,
};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const PROGRAM_NAME: &str = "notifications";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// OrthoConfig could not assemble the settings.
    #[error("failed to load {section} settings: {message}")]
    Load {
        /// Settings section being loaded.
        section: &'static str,
        /// Loader diagnostic.
        message: String,
    },
    /// A required value is missing or blank.
    #[error("{variable} must be set")]
    Missing {
        /// Environment variable naming the value.
        variable: &'static str,
    },
    /// A value is present but unusable.
    #[error("{variable} is invalid: {reason}")]
    Invalid {
        /// Environment variable naming the value.
        variable: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Queue endpoint settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SQS")]
pub struct QueueSettings {
    /// Main order queue URL.
    pub queue_url: Option<String>,
    /// Dead-letter queue URL.
    pub dlq_url: Option<String>,
    /// Custom endpoint, for example a LocalStack instance.
    pub endpoint_url: Option<String>,
    /// AWS region; defaults to `us-east-1`.
    pub region: Option<String>,
}

/// Validated pair of queue URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueUrls {
    /// Main order queue.
    pub main: String,
    /// Dead-letter queue for the main queue.
    pub dead_letter: String,
}

impl QueueSettings {
    /// Return both queue URLs, rejecting missing, blank, or identical values.
    pub fn queue_urls(&self) -> Result<QueueUrls, SettingsError> {
        let main = required(self.queue_url.as_deref(), "SQS_QUEUE_URL")?;
        let dead_letter = required(self.dlq_url.as_deref(), "SQS_DLQ_URL")?;
        if main == dead_letter {
            return Err(SettingsError::Invalid {
                variable: "SQS_DLQ_URL",
                reason: "must differ from SQS_QUEUE_URL".to_owned(),
            });
        }
        Ok(QueueUrls { main, dead_letter })
    }

    /// Return the configured region, falling back to the default.
    pub fn region(&self) -> &str {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }

    /// Return the custom endpoint, if a non-blank one is configured.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

/// Worker and HTTP listener tuning.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "NOTIFICATIONS")]
pub struct WorkerSettings {
    /// Address the admin listener binds to.
    pub host: Option<String>,
    /// Port the admin listener binds to.
    pub port: Option<u16>,
    /// Messages per consumer receive.
    pub max_messages: Option<u8>,
    /// Consumer long-poll wait in seconds.
    pub wait_time_seconds: Option<u64>,
    /// Consumer lease length in seconds.
    pub visibility_timeout_seconds: Option<u64>,
    /// Pause after a failed receive, in milliseconds.
    pub receive_backoff_millis: Option<u64>,
    /// Messages per dead-letter list or retry call.
    pub admin_batch_size: Option<u8>,
    /// Lease taken while inspecting the dead-letter queue, in seconds.
    pub inspect_visibility_seconds: Option<u64>,
    /// Order id that makes the consumer fail on purpose.
    pub failure_order_id: Option<String>,
    /// Turn the forced-failure seam off.
    #[ortho_config(default = false)]
    pub disable_fault_injection: bool,
    /// Topic recorded in envelopes built by order intake.
    pub topic_arn: Option<String>,
}

impl WorkerSettings {
    /// Socket address for the admin listener.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let ip = host
            .trim()
            .parse::<IpAddr>()
            .map_err(|err| SettingsError::Invalid {
                variable: "NOTIFICATIONS_HOST",
                reason: err.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT)))
    }

    /// Consumer configuration for the main queue.
    pub fn consumer_config(&self, urls: &QueueUrls) -> OrderConsumerConfig {
        let mut config = OrderConsumerConfig::new(urls.main.clone());
        if let Some(max_messages) = self.max_messages {
            config.max_messages = max_messages;
        }
        if let Some(seconds) = self.wait_time_seconds {
            config.wait_time = Duration::from_secs(seconds);
        }
        if let Some(seconds) = self.visibility_timeout_seconds {
            config.visibility_timeout = Duration::from_secs(seconds);
        }
        if let Some(millis) = self.receive_backoff_millis {
            config.receive_error_backoff = Duration::from_millis(millis);
        }
        config
    }

    /// Dead-letter admin configuration.
    pub fn dlq_admin_config(&self, urls: &QueueUrls) -> DlqAdminConfig {
        let mut config = DlqAdminConfig::new(urls.main.clone(), urls.dead_letter.clone());
        if let Some(batch_size) = self.admin_batch_size {
            config.batch_size = batch_size;
        }
        if let Some(seconds) = self.inspect_visibility_seconds {
            config.inspect_visibility_timeout = Duration::from_secs(seconds);
        }
        config
    }

    /// Order intake configuration.
    pub fn intake_config(&self, urls: &QueueUrls) -> OrderIntakeConfig {
        OrderIntakeConfig {
            queue_url: urls.main.clone(),
            topic_arn: self.topic_arn.clone(),
        }
    }

    /// Fault injector for the consumer: the order-id sentinel unless disabled.
    pub fn fault_injector(&self) -> Arc<dyn FaultInjector> {
        if self.disable_fault_injection {
            return Arc::new(NoFaultInjection);
        }
        let order_id = self
            .failure_order_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(DEFAULT_FAILURE_ORDER_ID);
        Arc::new(OrderIdFaultInjector::new(order_id))
    }
}

/// Both settings sections, loaded together.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Queue endpoints.
    pub queue: QueueSettings,
    /// Worker tuning.
    pub worker: WorkerSettings,
}

impl Settings {
    /// Load both sections from configuration files and the environment.
    ///
    /// Command-line arguments are not consulted, so the two sections cannot
    /// reject each other's flags.
    pub fn load() -> Result<Self, SettingsError> {
        let args = || [OsString::from(PROGRAM_NAME)];
        let queue = QueueSettings::load_from_iter(args()).map_err(|err| SettingsError::Load {
            section: "queue",
            message: err.to_string(),
        })?;
        let worker = WorkerSettings::load_from_iter(args()).map_err(|err| SettingsError::Load {
            section: "worker",
            message: err.to_string(),
        })?;
        Ok(Self { queue, worker })
    }
}

fn required(value: Option<&str>, variable: &'static str) -> Result<String, SettingsError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(SettingsError::Missing { variable })
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and validation.

    use super::*;
    use crate::test_support::sample_order;

    use env_lock::lock_env;
    use rstest::rstest;

    const QUEUE_VARS: [&str; 4] = ["SQS_QUEUE_URL", "SQS_DLQ_URL", "SQS_ENDPOINT_URL", "SQS_REGION"];
    const WORKER_VARS: [&str; 11] = [
        "NOTIFICATIONS_HOST",
        "NOTIFICATIONS_PORT",
        "NOTIFICATIONS_MAX_MESSAGES",
        "NOTIFICATIONS_WAIT_TIME_SECONDS",
        "NOTIFICATIONS_VISIBILITY_TIMEOUT_SECONDS",
        "NOTIFICATIONS_RECEIVE_BACKOFF_MILLIS",
        "NOTIFICATIONS_ADMIN_BATCH_SIZE",
        "NOTIFICATIONS_INSPECT_VISIBILITY_SECONDS",
        "NOTIFICATIONS_FAILURE_ORDER_ID",
        "NOTIFICATIONS_DISABLE_FAULT_INJECTION",
        "NOTIFICATIONS_TOPIC_ARN",
    ];

    fn cleared_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        QUEUE_VARS
            .into_iter()
            .chain(WORKER_VARS)
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value).to_owned());
                (name, value)
            })
            .collect()
    }

    fn urls() -> QueueUrls {
        QueueUrls {
            main: "http://localhost:4566/000000000000/orders".to_owned(),
            dead_letter: "http://localhost:4566/000000000000/orders-dlq".to_owned(),
        }
    }

    fn fails(injector: &dyn FaultInjector, order_id: &str) -> bool {
        injector.should_fail(&sample_order(order_id))
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared_with(&[]));

        let settings = Settings::load().expect("settings load");

        assert!(matches!(
            settings.queue.queue_urls(),
            Err(SettingsError::Missing {
                variable: "SQS_QUEUE_URL"
            })
        ));
        assert_eq!(settings.queue.region(), DEFAULT_REGION);
        assert_eq!(settings.queue.endpoint_url(), None);
        assert_eq!(
            settings.worker.bind_addr().expect("default address"),
            SocketAddr::from(([0, 0, 0, 0], 3001))
        );
        assert_eq!(
            settings.worker.consumer_config(&urls()),
            OrderConsumerConfig::new(urls().main)
        );
        assert!(fails(settings.worker.fault_injector().as_ref(), "fail-me"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_with(&[
            ("SQS_QUEUE_URL", "http://localhost:4566/000000000000/orders"),
            ("SQS_DLQ_URL", "http://localhost:4566/000000000000/orders-dlq"),
            ("SQS_ENDPOINT_URL", "http://localhost:4566"),
            ("SQS_REGION", "eu-west-2"),
            ("NOTIFICATIONS_PORT", "8088"),
            ("NOTIFICATIONS_WAIT_TIME_SECONDS", "2"),
            ("NOTIFICATIONS_ADMIN_BATCH_SIZE", "4"),
            ("NOTIFICATIONS_FAILURE_ORDER_ID", "explode"),
        ]));

        let settings = Settings::load().expect("settings load");
        let urls = settings.queue.queue_urls().expect("both urls set");

        assert_eq!(urls, self::urls());
        assert_eq!(settings.queue.region(), "eu-west-2");
        assert_eq!(settings.queue.endpoint_url(), Some("http://localhost:4566"));
        assert_eq!(settings.worker.bind_addr().expect("address").port(), 8088);
        assert_eq!(
            settings.worker.consumer_config(&urls).wait_time,
            Duration::from_secs(2)
        );
        assert_eq!(settings.worker.dlq_admin_config(&urls).batch_size, 4);
        let injector = settings.worker.fault_injector();
        assert!(fails(injector.as_ref(), "explode"));
        assert!(!fails(injector.as_ref(), "fail-me"));
    }

    #[rstest]
    fn fault_injection_can_be_disabled() {
        let _guard = lock_env(cleared_with(&[(
            "NOTIFICATIONS_DISABLE_FAULT_INJECTION",
            "true",
        )]));

        let settings = Settings::load().expect("settings load");

        assert!(!fails(settings.worker.fault_injector().as_ref(), "fail-me"));
    }

    #[rstest]
    #[case::blank_main(Some("  "), Some("dlq"), "SQS_QUEUE_URL")]
    #[case::missing_dlq(Some("main"), None, "SQS_DLQ_URL")]
    #[case::identical(Some("same"), Some("same"), "SQS_DLQ_URL")]
    fn queue_urls_are_validated(
        #[case] queue_url: Option<&str>,
        #[case] dlq_url: Option<&str>,
        #[case] variable: &str,
    ) {
        let settings = QueueSettings {
            queue_url: queue_url.map(str::to_owned),
            dlq_url: dlq_url.map(str::to_owned),
            endpoint_url: None,
            region: None,
        };

        let error = settings.queue_urls().expect_err("validation fails");

        assert!(error.to_string().starts_with(variable), "{error}");
    }

    #[rstest]
    fn invalid_hosts_are_reported() {
        let _guard = lock_env(cleared_with(&[("NOTIFICATIONS_HOST", "not-an-ip")]));

        let settings = Settings::load().expect("settings load");

        assert!(matches!(
            settings.worker.bind_addr(),
            Err(SettingsError::Invalid {
                variable: "NOTIFICATIONS_HOST",
                ..
            })
        ));
    }
}
