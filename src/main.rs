use alert_relay::{
    api::{build_router, AppState, AuthContext, EventCipher},
    config::Config,
    ingress::Enqueuer,
    messaging::create_queue,
    notifications::{CardDelivery, LarkClient},
    processing::FieldExtractor,
    retry::RetryPolicy,
    supervisor::TaskSupervisor,
    worker::DeliveryWorker,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "alert-relay", version)]
#[command(about = "Relay Alertmanager alerts to Lark through Kafka", long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, global = true, env = "ALERT_RELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server and delivery worker
    Server(ServerArgs),
}

#[derive(Args, Default)]
struct ServerArgs {
    #[arg(short = 'H', long)]
    http_host: Option<String>,

    #[arg(short = 'P', long)]
    http_port: Option<u16>,

    /// Kafka brokers, comma separated
    #[arg(long, value_delimiter = ',')]
    kafka_brokers: Option<Vec<String>>,

    #[arg(long)]
    kafka_topic: Option<String>,

    #[arg(long)]
    kafka_consumer_group: Option<String>,

    /// Max size of a produced or consumed message (bytes)
    #[arg(long)]
    kafka_max_bytes: Option<usize>,

    #[arg(long)]
    lark_app_id: Option<String>,

    #[arg(long)]
    lark_app_secret: Option<String>,

    #[arg(long)]
    lark_chat_id: Option<String>,

    /// Secret used to verify callback signatures
    #[arg(long)]
    lark_verification_secret: Option<String>,

    #[arg(long)]
    lark_verification_token: Option<String>,

    /// Key used to decrypt encrypted callback bodies
    #[arg(long)]
    lark_encrypt_key: Option<String>,
}

impl ServerArgs {
    /// Flags take precedence over every other configuration source
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.http_host {
            config.server.host = host;
        }
        if let Some(port) = self.http_port {
            config.server.port = port;
        }
        if let Some(brokers) = self.kafka_brokers {
            config.kafka.brokers = brokers;
        }
        if let Some(topic) = self.kafka_topic {
            config.kafka.topic = topic;
        }
        if let Some(group) = self.kafka_consumer_group {
            config.kafka.consumer_group = group;
        }
        if let Some(max_bytes) = self.kafka_max_bytes {
            config.kafka.max_bytes = max_bytes;
        }
        if let Some(app_id) = self.lark_app_id {
            config.lark.app_id = app_id;
        }
        if let Some(app_secret) = self.lark_app_secret {
            config.lark.app_secret = app_secret;
        }
        if let Some(chat_id) = self.lark_chat_id {
            config.lark.chat_id = chat_id;
        }
        if let Some(secret) = self.lark_verification_secret {
            config.lark.verification_secret = secret;
        }
        if let Some(token) = self.lark_verification_token {
            config.lark.verification_token = token;
        }
        if let Some(key) = self.lark_encrypt_key {
            config.lark.encrypt_key = key;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let Commands::Server(args) = cli.command;
    args.apply(&mut config);

    init_tracing(&config);
    config.validate()?;

    tracing::info!("Starting alert-relay v{}", env!("CARGO_PKG_VERSION"));
    run_server(config).await
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("alert_relay={},tower_http=info", config.observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    if config.observability.prometheus_enabled {
        alert_relay::metrics::init_metrics();
        tracing::info!("✅ Prometheus metrics initialized");
    }

    let (producer, consumer) = create_queue(&config.kafka).context("failed to create queue")?;
    tracing::info!(
        backend = ?config.kafka.backend,
        brokers = %config.kafka.bootstrap_servers(),
        topic = %config.kafka.topic,
        "✅ Queue initialized"
    );

    let lark = LarkClient::new(&config.lark).context("failed to create Lark client")?;
    let delivery = CardDelivery::new(
        Arc::new(lark),
        RetryPolicy::from_millis(config.lark.send_retries, config.lark.send_retry_backoff_ms),
    );

    let shutdown = CancellationToken::new();
    let worker = DeliveryWorker::new(
        consumer,
        FieldExtractor::new(config.alert_fields.clone()),
        delivery.clone(),
        config.lark.chat_id.clone(),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));
    tracing::info!("✅ Delivery worker started");

    let supervisor = TaskSupervisor::new();
    let mut state = AppState::new(
        Enqueuer::from_config(producer, &config.kafka),
        delivery,
        supervisor.clone(),
    )
    .with_request_timeout(config.server.request_timeout());

    match AuthContext::from_settings(&config.lark.verification_secret, &config.lark.verification_token) {
        Some(auth) => {
            tracing::info!(
                signature = auth.requires_signature(),
                token = auth.expected_token().is_some(),
                "✅ Callback verification enabled"
            );
            state = state.with_auth(auth);
        }
        None => tracing::warn!("⚠️  Callback verification disabled"),
    }

    if let Some(cipher) = EventCipher::from_key(&config.lark.encrypt_key) {
        state = state.with_cipher(cipher);
        tracing::info!("✅ Encrypted callbacks enabled");
    }

    let app = build_router(state, config.observability.prometheus_enabled);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("🚀 HTTP server listening on http://{}", addr);
    tracing::info!("   Webhook: http://{}/lark/webhook", addr);
    tracing::info!("   Callback: http://{}/event/callback", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down");
    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Delivery worker terminated abnormally");
    }
    supervisor.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
