//! Delivery planning pipeline
//!
//! orders -> pallet estimate -> distance matrix -> CVRP solve -> per-vehicle
//! container layout -> assembled [`PlanSolution`].

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::defaults::{
    DEFAULT_DEPOT_X, DEFAULT_DEPOT_Y, DEFAULT_FLEET_SIZE, DEFAULT_MATRIX_TIMEOUT_SECONDS,
    DEFAULT_VEHICLE_CAPACITY_PALLETS,
};
use crate::services::estimator;
use crate::services::geo::GeoProjection;
use crate::services::packing;
use crate::services::routing::{resolve_matrix, DistanceMatrix, DistanceSource};
use crate::services::vrp::{CvrpProblem, CvrpSolver, DropPenalties, RoutingOutcome, SolverConfig};
use crate::types::{
    lat_lng, Catalog, ContainerDims, Location, Order, PackLine, PackedOrder, PackingVariant,
    PlanSolution, VehicleRoute,
};

/// Fleet and solver parameters for one planning run
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub depot: Location,
    pub fleet_size: usize,
    /// Per-vehicle capacity in pallets
    pub vehicle_capacity: f64,
    pub solver: SolverConfig,
    pub penalties: DropPenalties,
    /// Container used for the per-route layout
    pub container: ContainerDims,
    pub projection: GeoProjection,
    /// Upper bound on waiting for an external distance matrix
    pub matrix_timeout: Duration,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            depot: Location::new(DEFAULT_DEPOT_X, DEFAULT_DEPOT_Y),
            fleet_size: DEFAULT_FLEET_SIZE,
            vehicle_capacity: DEFAULT_VEHICLE_CAPACITY_PALLETS,
            solver: SolverConfig::default(),
            penalties: DropPenalties::default(),
            container: ContainerDims::default(),
            projection: GeoProjection::default(),
            matrix_timeout: Duration::from_secs(DEFAULT_MATRIX_TIMEOUT_SECONDS),
        }
    }
}

/// Plans a batch of orders end to end
pub struct Planner {
    settings: PlanSettings,
}

impl Planner {
    pub fn new(settings: PlanSettings) -> Self {
        Self { settings }
    }

    /// Plan every order that is awaiting planning; the others are reported as skipped
    pub async fn plan(
        &self,
        orders: Vec<Order>,
        catalog: &Catalog,
        source: &DistanceSource,
    ) -> Result<PlanSolution> {
        let settings = &self.settings;

        let (plannable, skipped): (Vec<Order>, Vec<Order>) =
            orders.into_iter().partition(|o| o.status.is_plannable());
        let skipped_orders: Vec<String> = skipped.into_iter().map(|o| o.id).collect();
        if !skipped_orders.is_empty() {
            debug!("Skipping {} orders not awaiting planning", skipped_orders.len());
        }

        if plannable.is_empty() {
            info!("No orders awaiting planning");
            let mut solution = PlanSolution::empty(settings.depot);
            solution.skipped_orders = skipped_orders;
            return Ok(solution);
        }

        let packed = estimator::estimate_all(&plannable, catalog);
        let problem = CvrpProblem::from_packed(
            settings.depot,
            &packed,
            settings.fleet_size,
            settings.vehicle_capacity,
            settings.penalties,
        );

        let matrix = resolve_matrix(source, &problem.locations(), settings.matrix_timeout).await;

        let solver = CvrpSolver::new(settings.solver.clone());
        let (outcome, problem, matrix) = tokio::task::spawn_blocking(move || {
            let outcome = solver.solve(&problem, &matrix);
            (outcome, problem, matrix)
        })
        .await
        .context("Routing solver task failed")?;

        let mut solution = assemble(settings, &packed, &problem, &matrix, &outcome, catalog);
        solution.skipped_orders = skipped_orders;

        info!(
            "Plan ready: {} orders, {} routes, {} dropped, {:.2} distance ({}), {} items omitted",
            packed.len(),
            solution.routes.len(),
            solution.dropped_orders.len(),
            solution.total_distance,
            solution.distance_source,
            solution.omitted_items
        );

        Ok(solution)
    }
}

/// Packing lines for one order, in item-name order. Items missing from the catalog are left out.
pub fn pack_lines_for(order: &Order, catalog: &Catalog) -> Vec<PackLine> {
    order
        .items
        .iter()
        .filter_map(|(name, &quantity)| {
            if quantity == 0 {
                return None;
            }
            let entry = catalog.get(name)?;
            let (width, height, depth) = entry.render_extents();
            Some(PackLine {
                order_id: order.id.clone(),
                item_name: name.clone(),
                width,
                height,
                depth,
                quantity,
                color: catalog.color_for(name),
            })
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn a routing outcome into the response shape, packing each route's cargo
fn assemble(
    settings: &PlanSettings,
    packed: &[PackedOrder],
    problem: &CvrpProblem,
    matrix: &DistanceMatrix,
    outcome: &RoutingOutcome,
    catalog: &Catalog,
) -> PlanSolution {
    let mut solution = PlanSolution::empty(settings.depot);
    for order in packed {
        solution.locations.insert(order.id().to_string(), order.order.location);
    }

    let depot_point = lat_lng(settings.projection.project(&settings.depot));
    let mut total_pallets = 0.0;

    for route in &outcome.routes {
        let orders: Vec<&PackedOrder> = route.stops.iter().map(|&s| &packed[s]).collect();

        let load: f64 = orders.iter().map(|o| o.pallets_needed).sum();
        total_pallets += load;

        let mut coordinates = Vec::with_capacity(orders.len() + 2);
        coordinates.push(depot_point);
        coordinates.extend(
            orders
                .iter()
                .map(|o| lat_lng(settings.projection.project(&o.order.location))),
        );
        coordinates.push(depot_point);

        let lines: Vec<PackLine> = orders
            .iter()
            .flat_map(|o| pack_lines_for(&o.order, catalog))
            .collect();
        let layout = packing::pack(&lines, &settings.container, PackingVariant::Shelf);
        solution.omitted_items += layout.omitted();

        let load_percent = if settings.vehicle_capacity > 0.0 {
            round2(load / settings.vehicle_capacity * 100.0)
        } else {
            0.0
        };

        solution.routes.push(VehicleRoute {
            vehicle_id: route.vehicle + 1,
            stops: orders.iter().map(|o| o.id().to_string()).collect(),
            load: round2(load),
            load_percent,
            distance: round2(matrix.unscale(route.distance)),
            is_urgent_covered: route.stops.iter().any(|&s| problem.stops[s].urgent),
            coordinates,
            packed_items: layout.placed,
        });
    }

    solution.dropped_orders = outcome
        .dropped
        .iter()
        .map(|&s| problem.stops[s].id.clone())
        .collect();
    solution.total_distance = round2(matrix.unscale(outcome.total_distance));
    solution.total_pallets = round2(total_pallets);
    solution.algorithm = outcome.algorithm.clone();
    solution.distance_source = matrix.source.clone();
    solution.solve_time_ms = outcome.solve_time_ms;
    solution.iterations = outcome.iterations;

    solution
}
