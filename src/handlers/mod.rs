//! NATS message handlers

pub mod pack;
pub mod ping;
pub mod plan;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::config::Config;
use crate::services::routing::create_distance_source;
use crate::types::Catalog;

use plan::PlanContext;

pub const PING_SUBJECT: &str = "loadplan.ping";
pub const PLAN_SUBJECT: &str = "loadplan.plan.calculate";
pub const PACK_SUBJECT: &str = "loadplan.pack";

/// Start all message handlers
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    let settings = config.plan_settings();
    let distance_source = create_distance_source(config.osrm_url.clone(), settings.matrix_timeout);
    info!("Distance source initialized: {:?}", distance_source);

    let context = Arc::new(PlanContext {
        settings,
        catalog: Catalog::demo(),
        distance_source,
    });

    // Subscribe to all subjects
    let ping_sub = client.subscribe(PING_SUBJECT).await?;
    let plan_sub = client.subscribe(PLAN_SUBJECT).await?;
    let pack_sub = client.subscribe(PACK_SUBJECT).await?;

    info!("Subscribed to NATS subjects: {}, {}, {}", PING_SUBJECT, PLAN_SUBJECT, PACK_SUBJECT);

    // Spawn handlers
    let client_ping = client.clone();
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });

    let client_plan = client.clone();
    let plan_context = Arc::clone(&context);
    let plan_handle = tokio::spawn(async move {
        plan::handle_calculate(client_plan, plan_sub, plan_context).await
    });

    let client_pack = client.clone();
    let pack_handle = tokio::spawn(async move {
        pack::handle_pack(client_pack, pack_sub).await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which would indicate an error)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = plan_handle => {
            error!("Plan handler finished: {:?}", result);
        }
        result = pack_handle => {
            error!("Pack handler finished: {:?}", result);
        }
    }

    Ok(())
}
