//! LineMart Storefront - headless live customer dashboard.
//!
//! Mounts the customer dashboard against the REST backend, keeps the catalog
//! fresh by polling, and logs a summary of what the screen would show until
//! interrupted.
//!
//! # Architecture
//!
//! - `reqwest` client for the LineMart REST API
//! - Tokio tasks for polling subscriptions
//! - `tracing` for output, with Sentry for warnings and errors when configured

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::time::Duration;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linemart_core::CheckoutTotals;
use linemart_storefront::config::StorefrontConfig;
use linemart_storefront::dashboard::Dashboard;
use linemart_storefront::{AppError, AppShell};

/// How often the dashboard summary is logged.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "linemart_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

async fn run(config: StorefrontConfig) -> Result<(), AppError> {
    let shell = AppShell::new(config)?;
    match shell.auth().current_user() {
        Some(user) => tracing::info!(username = %user.username, role = %user.role, "Signed in"),
        None => tracing::info!("Browsing as guest"),
    }

    let dashboard = Dashboard::new();
    dashboard.mount(shell.polling()).await?;
    log_summary(&dashboard);

    let mut summary = tokio::time::interval(SUMMARY_INTERVAL);
    summary.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = summary.tick() => log_summary(&dashboard),
        }
    }

    dashboard.unmount();
    shell.unmount();
    Ok(())
}

fn log_summary(dashboard: &Dashboard) {
    dashboard.with_state(|state| {
        let totals = CheckoutTotals::for_cart(&state.cart);
        tracing::info!(
            products = state.products.len(),
            categories = state.categories.len(),
            advertisements = state.advertisements.len(),
            deals = state.deals.len(),
            orders = state.orders.len(),
            unread_notifications = state.unread_count(),
            cart_items = state.cart.item_count(),
            cart_total = %totals.grand_total,
            "Dashboard"
        );
        if let Some(banner) = &state.error {
            tracing::info!(banner = %banner, "Dashboard error banner shown");
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping dashboard");
}
