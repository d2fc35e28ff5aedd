//! Loadplan Worker - pallet estimation, fleet routing and container layouts
//!
//! This worker connects to NATS and answers plan and pack requests.

mod cli;
mod config;
mod defaults;
mod handlers;
mod services;
mod types;

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::services::mock::MockOrderGenerator;
use crate::services::planner::Planner;
use crate::services::routing::create_distance_source;
use crate::types::Catalog;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stderr and file, stdout stays clean for `plan` output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,loadplan_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    match cli.command {
        None | Some(Command::Serve) => serve(config).await,
        Some(Command::Plan { orders, seed, vehicles, capacity, time_limit_ms }) => {
            plan_offline(config, orders, seed, vehicles, capacity, time_limit_ms).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Loadplan Worker...");

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    // Start message handlers
    let handler_result = handlers::start_handlers(nats_client, &config).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn plan_offline(
    config: Config,
    order_count: usize,
    seed: u64,
    vehicles: Option<usize>,
    capacity: Option<f64>,
    time_limit_ms: Option<u64>,
) -> Result<()> {
    let mut settings = config.plan_settings();
    if let Some(vehicles) = vehicles {
        settings.fleet_size = vehicles;
    }
    if let Some(capacity) = capacity {
        if !capacity.is_finite() || capacity < 0.0 {
            bail!("--capacity must be a non-negative number, got {}", capacity);
        }
        settings.vehicle_capacity = capacity;
    }
    if let Some(ms) = time_limit_ms {
        settings.solver = settings.solver.with_time_limit(Duration::from_millis(ms));
    }

    let source = create_distance_source(config.osrm_url.clone(), settings.matrix_timeout);
    let orders = MockOrderGenerator::new(seed).generate(order_count);
    info!(
        "Planning {} mock orders (seed {}) with {} vehicles",
        orders.len(),
        seed,
        settings.fleet_size
    );

    let solution = Planner::new(settings)
        .plan(orders, &Catalog::demo(), &source)
        .await?;

    println!("{}", serde_json::to_string_pretty(&solution)?);
    Ok(())
}
