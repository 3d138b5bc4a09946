//! Service entry-point: wires the SQS adapter, the consumer loop, and the
//! admin HTTP listener.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use notifications::domain::ports::{NotificationSink, QueueClient};
use notifications::domain::{
    DlqAdminService, OrderConsumer, OrderConsumerPorts, OrderConsumerRuntime, OrderIntakeService,
    TokioSleeper,
};
use notifications::inbound::http::health::HealthState;
use notifications::inbound::http::state::HttpState;
use notifications::outbound::notification::LogNotificationSink;
use notifications::outbound::sqs::{SqsQueueClient, build_sdk_client};
use notifications::settings::Settings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load()?;
    let urls = settings.queue.queue_urls()?;
    let bind_addr = settings.worker.bind_addr()?;

    let sdk_client =
        build_sdk_client(settings.queue.region(), settings.queue.endpoint_url()).await;
    let queue: Arc<dyn QueueClient> = Arc::new(SqsQueueClient::new(sdk_client));
    let sink: Arc<dyn NotificationSink> = Arc::new(LogNotificationSink);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let consumer = OrderConsumer::with_runtime(
        OrderConsumerPorts::new(queue.clone(), sink),
        OrderConsumerRuntime {
            sleeper: Arc::new(TokioSleeper),
            fault_injector: settings.worker.fault_injector(),
        },
        settings.worker.consumer_config(&urls),
    );
    let http_state = HttpState::new(
        Arc::new(DlqAdminService::new(
            queue.clone(),
            settings.worker.dlq_admin_config(&urls),
        )),
        Arc::new(OrderIntakeService::new(
            queue,
            clock,
            settings.worker.intake_config(&urls),
        )),
    );

    info!(
        queue_url = %urls.main,
        dlq_url = %urls.dead_letter,
        %bind_addr,
        "starting order notifications service"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(async move { consumer.run(shutdown_rx).await });

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), ServerConfig::new(bind_addr, http_state))?;
    let served = server.await;

    health_state.mark_unhealthy();
    if shutdown_tx.send(true).is_err() {
        warn!("consumer loop exited before shutdown was signalled");
    }
    if let Err(e) = consumer_task.await {
        warn!(error = %e, "consumer task ended abnormally");
    }
    info!("order notifications service stopped");

    served?;
    Ok(())
}
