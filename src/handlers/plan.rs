//! Plan calculation message handler

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::defaults::{DEFAULT_MOCK_ORDER_COUNT, DEFAULT_MOCK_SEED};
use crate::services::mock::MockOrderGenerator;
use crate::services::planner::{PlanSettings, Planner};
use crate::services::routing::{DistanceMatrix, DistanceSource};
use crate::types::{
    Catalog, ErrorResponse, Order, PlanRequest, PlanSolution, Request, SuccessResponse,
};

/// Upper bound on generated mock orders per request
const MAX_MOCK_ORDERS: usize = 1_000;

/// Shared state for plan requests
pub struct PlanContext {
    /// Settings used when a request does not override them
    pub settings: PlanSettings,
    /// Base catalog; request entries are layered on top
    pub catalog: Catalog,
    /// Distance source used when a request does not supply a matrix
    pub distance_source: DistanceSource,
}

/// Everything a single plan run needs, after request overrides are applied
struct PreparedPlan {
    settings: PlanSettings,
    orders: Vec<Order>,
    catalog: Option<Catalog>,
    source: Option<DistanceSource>,
}

/// Handle loadplan.plan.calculate messages
///
/// Each request is planned on its own task so a long solve does not hold up the queue.
pub async fn handle_calculate(
    client: Client,
    mut subscriber: Subscriber,
    context: Arc<PlanContext>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received plan.calculate message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        // Parse request
        let request: Request<PlanRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let client = client.clone();
        let context = Arc::clone(&context);
        tokio::spawn(async move {
            let request_id = request.id;
            let body = match prepare(&context, request.payload) {
                Err(e) => {
                    warn!("Rejected plan request {}: {}", request_id, e);
                    let error = ErrorResponse::new(request_id, "INVALID_REQUEST", e.to_string());
                    serde_json::to_vec(&error)
                }
                Ok(prepared) => match run(&context, prepared).await {
                    Ok(solution) => serde_json::to_vec(&SuccessResponse::new(request_id, solution)),
                    Err(e) => {
                        error!("Planning failed for request {}: {}", request_id, e);
                        let error = ErrorResponse::new(request_id, "PLAN_ERROR", e.to_string());
                        serde_json::to_vec(&error)
                    }
                },
            };

            match body {
                Ok(bytes) => {
                    if let Err(e) = client.publish(reply, bytes.into()).await {
                        error!("Failed to publish plan response: {}", e);
                    }
                }
                Err(e) => error!("Failed to serialize plan response: {}", e),
            }
        });
    }

    Ok(())
}

/// Apply request overrides on top of the worker defaults
fn prepare(context: &PlanContext, request: PlanRequest) -> Result<PreparedPlan> {
    let mut settings = context.settings.clone();

    if let Some(depot) = request.depot {
        settings.depot = depot;
    }
    if let Some(fleet_size) = request.fleet_size {
        settings.fleet_size = fleet_size;
    }
    if let Some(capacity) = request.vehicle_capacity {
        if !capacity.is_finite() || capacity < 0.0 {
            bail!("vehicleCapacity must be a non-negative number");
        }
        settings.vehicle_capacity = capacity;
    }
    if let Some(ms) = request.time_limit_ms {
        settings.solver = settings.solver.with_time_limit(Duration::from_millis(ms));
    }

    let orders = match request.orders {
        Some(orders) => orders,
        None => {
            let count = request.mock_count.unwrap_or(DEFAULT_MOCK_ORDER_COUNT);
            if count > MAX_MOCK_ORDERS {
                bail!("mockCount must not exceed {}", MAX_MOCK_ORDERS);
            }
            let seed = request.mock_seed.unwrap_or(DEFAULT_MOCK_SEED);
            info!("No orders in request, generating {} mock orders (seed {})", count, seed);
            MockOrderGenerator::new(seed).generate(count)
        }
    };

    // Request entries extend the worker catalog and win on name clashes
    let catalog = request.catalog.map(|entries| {
        let mut catalog = context.catalog.clone();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    });

    let source = match request.distance_matrix {
        Some(values) if values.iter().flatten().any(|v| !v.is_finite()) => {
            bail!("distanceMatrix must contain finite numbers only");
        }
        Some(values) => Some(DistanceSource::Supplied(DistanceMatrix::from_supplied(&values))),
        None => None,
    };

    Ok(PreparedPlan {
        settings,
        orders,
        catalog,
        source,
    })
}

async fn run(context: &PlanContext, prepared: PreparedPlan) -> Result<PlanSolution> {
    let catalog = prepared.catalog.as_ref().unwrap_or(&context.catalog);
    let source = prepared.source.as_ref().unwrap_or(&context.distance_source);

    Planner::new(prepared.settings)
        .plan(prepared.orders, catalog, source)
        .await
}
