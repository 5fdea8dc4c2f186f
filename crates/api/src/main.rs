//! Service entry point: wires the store, broker, relay, and HTTP surface.

use std::sync::Arc;

use api::config::Config;
use broker::InMemoryBroker;
use fulfillment::{PaymentResultConsumer, PaymentSubscriptionHandler, PurchaseHandler};
use store::PostgresCatalogStore;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect to the database and run migrations
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    let store = PostgresCatalogStore::new(pool);
    store.run_migrations().await.expect("migrations failed");

    // 4. Broker, relay, and payment-result subscription
    let broker = InMemoryBroker::new();

    let relay = fulfillment::OutboxRelay::new(store.clone(), broker.clone(), config.relay_config());
    let relay_handle = relay.start();

    let (subscription_shutdown, subscription_rx) = tokio::sync::watch::channel(false);
    let subscription_handler =
        PaymentSubscriptionHandler::new(PaymentResultConsumer::new(store.clone()));
    let subscription_task =
        tokio::spawn(broker.subscribe().run(subscription_handler, subscription_rx));

    // 5. Build the application
    let state = Arc::new(api::AppState {
        purchases: PurchaseHandler::new(store.clone(), store),
    });
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Stop background workers; in-flight outbox claims are released by
    // lease expiry on the next start.
    relay_handle.shutdown().await;
    let _ = subscription_shutdown.send(true);
    let _ = subscription_task.await;

    tracing::info!("server shut down gracefully");
}
