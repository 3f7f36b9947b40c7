use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Queue configuration
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Lark application and callback configuration
    #[serde(default)]
    pub lark: LarkConfig,

    /// Candidate keys used to resolve alert attributes
    #[serde(default)]
    pub alert_fields: AlertFieldKeys,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        // Override with config file if one was given
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            // Override with environment variables (prefix: ALERT_RELAY__)
            .add_source(
                config::Environment::with_prefix("ALERT_RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("kafka.brokers")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject configurations the relay cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.kafka.backend == QueueBackend::Kafka
            && (self.kafka.brokers.is_empty() || self.kafka.topic.is_empty())
        {
            return Err(AppError::Configuration("invalid kafka config".to_string()));
        }

        if self.lark.app_id.is_empty() || self.lark.app_secret.is_empty() || self.lark.chat_id.is_empty() {
            return Err(AppError::Configuration("invalid lark config".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Deadline for a whole inbound request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Queue backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// Kafka topic shared by ingress and worker
    #[default]
    Kafka,
    /// Process-local channel, for development and tests
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    #[serde(default)]
    pub backend: QueueBackend,

    /// Kafka bootstrap brokers
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,

    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Max size of a produced or consumed message (bytes)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Enqueue attempts per inbound batch; values below 1 mean a single attempt
    #[serde(default = "default_write_retries")]
    pub write_retries: i32,

    #[serde(default = "default_write_retry_backoff_ms")]
    pub write_retry_backoff_ms: u64,

    /// Deadline of a single enqueue attempt
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
}

impl KafkaConfig {
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            brokers: default_brokers(),
            topic: default_topic(),
            consumer_group: default_consumer_group(),
            client_id: default_client_id(),
            max_bytes: default_max_bytes(),
            write_retries: default_write_retries(),
            write_retry_backoff_ms: default_write_retry_backoff_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            session_timeout_ms: default_session_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LarkConfig {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub app_secret: String,

    /// Chat that receives firing cards
    #[serde(default)]
    pub chat_id: String,

    /// Open platform base URL
    #[serde(default = "default_lark_base_url")]
    pub base_url: String,

    /// HMAC secret for inbound callback signatures; empty disables verification
    #[serde(default)]
    pub verification_secret: String,

    /// Token expected inside verified callback bodies; empty skips the check
    #[serde(default)]
    pub verification_token: String,

    /// Key for encrypted callback bodies; empty means bodies arrive in plain text
    #[serde(default)]
    pub encrypt_key: String,

    /// Post/update attempts per card; values below 1 mean a single attempt
    #[serde(default = "default_send_retries")]
    pub send_retries: i32,

    #[serde(default = "default_send_retry_backoff_ms")]
    pub send_retry_backoff_ms: u64,

    /// HTTP client timeout for open platform calls (seconds)
    #[serde(default = "default_lark_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            chat_id: String::new(),
            base_url: default_lark_base_url(),
            verification_secret: String::new(),
            verification_token: String::new(),
            encrypt_key: String::new(),
            send_retries: default_send_retries(),
            send_retry_backoff_ms: default_send_retry_backoff_ms(),
            request_timeout_secs: default_lark_timeout(),
        }
    }
}

/// Ordered candidate keys per semantic alert attribute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertFieldKeys {
    #[serde(default = "default_alert_name_keys")]
    pub alert_name_keys: Vec<String>,

    #[serde(default = "default_project_keys")]
    pub project_keys: Vec<String>,

    #[serde(default = "default_notify_emails_keys")]
    pub notify_emails_keys: Vec<String>,

    #[serde(default = "default_grafana_url_keys")]
    pub grafana_url_keys: Vec<String>,

    #[serde(default = "default_runbook_url_keys")]
    pub runbook_url_keys: Vec<String>,

    #[serde(default = "default_description_keys")]
    pub description_keys: Vec<String>,
}

impl Default for AlertFieldKeys {
    fn default() -> Self {
        Self {
            alert_name_keys: default_alert_name_keys(),
            project_keys: default_project_keys(),
            notify_emails_keys: default_notify_emails_keys(),
            grafana_url_keys: default_grafana_url_keys(),
            runbook_url_keys: default_runbook_url_keys(),
            description_keys: default_description_keys(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    "webhook-topic".to_string()
}

fn default_consumer_group() -> String {
    "webhook-consumer".to_string()
}

fn default_client_id() -> String {
    "alert-relay".to_string()
}

fn default_max_bytes() -> usize {
    10_000_000
}

fn default_write_retries() -> i32 {
    3
}

fn default_write_retry_backoff_ms() -> u64 {
    200
}

fn default_write_timeout_ms() -> u64 {
    3000
}

fn default_session_timeout_ms() -> u64 {
    30000
}

fn default_lark_base_url() -> String {
    "https://open.larksuite.com".to_string()
}

fn default_send_retries() -> i32 {
    3
}

fn default_send_retry_backoff_ms() -> u64 {
    500
}

fn default_lark_timeout() -> u64 {
    10
}

fn default_alert_name_keys() -> Vec<String> {
    vec!["alertname".to_string()]
}

fn default_project_keys() -> Vec<String> {
    vec!["project".to_string()]
}

fn default_notify_emails_keys() -> Vec<String> {
    vec!["notify_emails".to_string()]
}

fn default_grafana_url_keys() -> Vec<String> {
    vec!["grafana_url".to_string()]
}

fn default_runbook_url_keys() -> Vec<String> {
    vec!["runbook_url".to_string()]
}

fn default_description_keys() -> Vec<String> {
    vec!["description".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
