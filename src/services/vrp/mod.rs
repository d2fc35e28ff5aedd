//! CVRP (Capacitated Vehicle Routing Problem) solver with soft drops
//!
//! Every stop carries a drop penalty instead of a hard visit constraint, so
//! the all-dropped assignment is always feasible. The solver constructs a
//! starting point with penalty-ordered cheapest insertion, improves it with
//! local search, then runs seeded ruin-and-recreate until the deadline.

mod config;
mod construction;
mod problem;
mod search;
mod solution;

pub use config::SolverConfig;
pub use problem::{CvrpProblem, DropPenalties};
pub use solution::RoutingOutcome;

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::services::routing::DistanceMatrix;

use construction::construct;
use search::LocalSearch;

/// CVRP solver
pub struct CvrpSolver {
    config: SolverConfig,
}

impl CvrpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solve within the configured time budget and return the best assignment found
    pub fn solve(&self, problem: &CvrpProblem, matrix: &DistanceMatrix) -> RoutingOutcome {
        let started_at = Instant::now();

        if problem.stops.is_empty() {
            debug!("Nothing to route");
            return RoutingOutcome::empty();
        }
        if problem.fleet_size == 0 {
            warn!("No vehicles available, dropping all {} stops", problem.stops.len());
            return RoutingOutcome::all_dropped(problem);
        }

        let fallback;
        let matrix = if matrix.is_valid_for(problem.stops.len() + 1) {
            matrix
        } else {
            warn!(
                "Distance matrix of size {} does not fit {} locations, using analytical distances",
                matrix.size(),
                problem.stops.len() + 1
            );
            fallback = DistanceMatrix::analytical(&problem.locations());
            &fallback
        };

        info!(
            "Solving CVRP: {} stops, {} vehicles, capacity {}, demand {}",
            problem.stops.len(),
            problem.fleet_size,
            problem.capacity,
            problem.total_demand()
        );

        let deadline = started_at + self.config.time_limit;
        let search = LocalSearch::new(problem, matrix, deadline);
        let mut rng = SmallRng::seed_from_u64(self.config.seed);

        let mut current = construct(problem, matrix);
        search.improve(&mut current);
        let mut current_cost = current.cost(problem, matrix);

        let mut best = current.clone();
        let mut best_cost = current_cost;
        debug!("Initial solution cost {}", best_cost);

        let mut iterations: u64 = 0;
        let mut since_best: u64 = 0;

        while !search.expired()
            && iterations < self.config.max_iterations
            && since_best < self.config.max_stagnation
        {
            iterations += 1;

            let assigned = current.assigned_count();
            let count = ((assigned as f64 * self.config.ruin_fraction).ceil() as usize)
                .clamp(1, assigned.max(1));

            let mut candidate = current.clone();
            let removed = search.ruin(&mut candidate, &mut rng, count);
            if removed.is_empty() && candidate.unassigned.is_empty() {
                break;
            }
            search.recreate(&mut candidate, removed, &mut rng);
            search.improve(&mut candidate);

            let candidate_cost = candidate.cost(problem, matrix);
            if candidate_cost <= current_cost {
                current = candidate;
                current_cost = candidate_cost;
            }

            if current_cost < best_cost {
                best = current.clone();
                best_cost = current_cost;
                since_best = 0;
                debug!("Iteration {}: new best cost {}", iterations, best_cost);
            } else {
                since_best += 1;
                if since_best % self.config.restart_after.max(1) == 0 {
                    current = best.clone();
                    current_cost = best_cost;
                }
            }
        }

        debug_assert!(best.is_feasible(problem));

        let outcome = RoutingOutcome::from_assignment(
            &best,
            problem,
            matrix,
            iterations,
            started_at.elapsed(),
        );

        info!(
            "CVRP solved: {} routes, {} dropped, distance {}, {} iterations in {} ms",
            outcome.routes.len(),
            outcome.dropped.len(),
            outcome.total_distance,
            outcome.iterations,
            outcome.solve_time_ms
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::services::vrp::problem::CvrpStop;
    use crate::types::Location;

    fn stop(id: &str, x: f64, y: f64, demand: i64, urgent: bool) -> CvrpStop {
        let penalties = DropPenalties::default();
        CvrpStop {
            id: id.to_string(),
            location: Location::new(x, y),
            demand,
            penalty: if urgent { penalties.urgent } else { penalties.deferrable },
            urgent,
        }
    }

    fn quick_solver() -> CvrpSolver {
        CvrpSolver::new(
            SolverConfig::instant()
                .with_time_limit(Duration::from_millis(300))
                .with_max_iterations(300),
        )
    }

    fn solve(problem: &CvrpProblem) -> RoutingOutcome {
        let matrix = DistanceMatrix::analytical(&problem.locations());
        quick_solver().solve(problem, &matrix)
    }

    fn assert_covers_each_stop_once(problem: &CvrpProblem, outcome: &RoutingOutcome) {
        let mut seen = HashSet::new();
        for &s in outcome.routes.iter().flat_map(|r| r.stops.iter()).chain(outcome.dropped.iter()) {
            assert!(seen.insert(s), "stop {} appears twice", s);
        }
        assert_eq!(seen.len(), problem.stops.len());
    }

    fn assert_within_capacity(problem: &CvrpProblem, outcome: &RoutingOutcome) {
        for route in &outcome.routes {
            let demand: i64 = route.stops.iter().map(|&s| problem.stops[s].demand).sum();
            assert_eq!(demand, route.load);
            assert!(route.load <= problem.capacity);
        }
    }

    fn grid_problem(fleet_size: usize, capacity: i64) -> CvrpProblem {
        let stops = (0..12)
            .map(|i| {
                let x = 20.0 + (i % 4) as f64 * 20.0;
                let y = 20.0 + (i / 4) as f64 * 30.0;
                stop(&format!("ORD-{}", 1000 + i), x, y, 5 + (i as i64 % 3) * 4, i % 3 == 0)
            })
            .collect();
        CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops,
            fleet_size,
            capacity,
        }
    }

    #[test]
    fn test_empty_problem() {
        let problem = CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops: vec![],
            fleet_size: 5,
            capacity: 260,
        };
        let outcome = solve(&problem);
        assert!(outcome.routes.is_empty());
        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.total_distance, 0);
    }

    #[test]
    fn test_zero_fleet_drops_every_stop() {
        let mut problem = grid_problem(0, 260);
        problem.stops.truncate(3);
        let outcome = solve(&problem);
        assert!(outcome.routes.is_empty());
        assert_eq!(outcome.dropped, vec![0, 1, 2]);
        assert_eq!(outcome.total_distance, 0);
        assert_covers_each_stop_once(&problem, &outcome);
    }

    #[test]
    fn test_every_stop_routed_or_dropped_once() {
        for (fleet, capacity) in [(1, 20), (2, 26), (3, 40), (5, 260)] {
            let problem = grid_problem(fleet, capacity);
            let outcome = solve(&problem);
            assert_covers_each_stop_once(&problem, &outcome);
            assert_within_capacity(&problem, &outcome);
        }
    }

    #[test]
    fn test_all_urgent_with_enough_capacity_drops_nothing() {
        let mut problem = grid_problem(1, 0);
        for s in problem.stops.iter_mut() {
            s.urgent = true;
            s.penalty = DropPenalties::default().urgent;
        }
        problem.capacity = problem.total_demand();

        let outcome = solve(&problem);
        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.routes.len(), 1);
    }

    #[test]
    fn test_short_capacity_drops_deferrable_first() {
        let problem = CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops: vec![
                // deferrable stop is closer, urgent one farther away
                stop("near", 52.0, 50.0, 10, false),
                stop("urgent", 90.0, 90.0, 10, true),
                stop("other", 55.0, 55.0, 10, false),
            ],
            fleet_size: 1,
            capacity: 20,
        };

        let outcome = solve(&problem);
        assert!(!outcome.dropped.is_empty());
        assert!(!outcome.dropped.contains(&1));
        assert_within_capacity(&problem, &outcome);
    }

    #[test]
    fn test_three_single_pallet_orders_split_across_two_vehicles() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            stops: vec![
                stop("A", 10.0, 0.0, 10, true),
                stop("B", 0.0, 10.0, 10, false),
                stop("C", 10.0, 10.0, 10, false),
            ],
            fleet_size: 2,
            capacity: 26,
        };

        let outcome = solve(&problem);
        assert_within_capacity(&problem, &outcome);
        assert_covers_each_stop_once(&problem, &outcome);
        assert!(outcome.routes.iter().all(|r| r.stops.len() <= 2));
        assert!(
            (outcome.routes.len() == 2 && outcome.dropped.is_empty())
                || (outcome.routes.len() == 1 && outcome.dropped.len() == 1)
        );
    }

    #[test]
    fn test_oversized_stop_is_dropped() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            stops: vec![stop("huge", 5.0, 5.0, 300, true), stop("small", 6.0, 6.0, 5, false)],
            fleet_size: 2,
            capacity: 260,
        };

        let outcome = solve(&problem);
        assert_eq!(outcome.dropped, vec![0]);
        assert_eq!(outcome.routes.len(), 1);
    }

    #[test]
    fn test_invalid_matrix_falls_back_to_analytical() {
        let problem = grid_problem(2, 60);
        let outcome = quick_solver().solve(&problem, &DistanceMatrix::empty());
        assert_covers_each_stop_once(&problem, &outcome);
        assert!(outcome.total_distance > 0);
    }

    #[test]
    fn test_route_distance_matches_reported_total() {
        let problem = grid_problem(3, 40);
        let outcome = solve(&problem);
        let sum: i64 = outcome.routes.iter().map(|r| r.distance).sum();
        assert_eq!(sum, outcome.total_distance);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let problem = grid_problem(3, 30);
        let matrix = DistanceMatrix::analytical(&problem.locations());
        let config = SolverConfig::default()
            .with_time_limit(Duration::from_secs(30))
            .with_max_iterations(50)
            .with_seed(7);

        let first = CvrpSolver::new(config.clone()).solve(&problem, &matrix);
        let second = CvrpSolver::new(config).solve(&problem, &matrix);

        assert_eq!(first.routes, second.routes);
        assert_eq!(first.dropped, second.dropped);
        assert_eq!(first.objective, second.objective);
    }
}
