//! Working assignment and solver outcome

use std::time::Duration;

use crate::services::routing::DistanceMatrix;

use super::problem::{node, CvrpProblem, DEPOT};

/// Routes being searched over; one (possibly empty) route per vehicle slot
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub routes: Vec<Vec<usize>>,
    /// Demand carried per route
    pub loads: Vec<i64>,
    /// Stops not served by any route
    pub unassigned: Vec<usize>,
}

impl Assignment {
    pub fn new(fleet_size: usize) -> Self {
        Self {
            routes: vec![Vec::new(); fleet_size],
            loads: vec![0; fleet_size],
            unassigned: Vec::new(),
        }
    }

    pub fn insert(&mut self, problem: &CvrpProblem, route: usize, position: usize, stop: usize) {
        self.routes[route].insert(position, stop);
        self.loads[route] += problem.stops[stop].demand;
    }

    pub fn remove(&mut self, problem: &CvrpProblem, route: usize, position: usize) -> usize {
        let stop = self.routes[route].remove(position);
        self.loads[route] -= problem.stops[stop].demand;
        stop
    }

    /// Route slot and position of a stop, if assigned
    pub fn locate(&self, stop: usize) -> Option<(usize, usize)> {
        self.routes.iter().enumerate().find_map(|(r, route)| {
            route.iter().position(|&s| s == stop).map(|p| (r, p))
        })
    }

    pub fn assigned_count(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    pub fn total_distance(&self, matrix: &DistanceMatrix) -> i64 {
        self.routes.iter().map(|r| route_distance(r, matrix)).sum()
    }

    pub fn penalty(&self, problem: &CvrpProblem) -> i64 {
        self.unassigned.iter().map(|&s| problem.stops[s].penalty).sum()
    }

    /// Objective: travelled distance plus penalties of dropped stops
    pub fn cost(&self, problem: &CvrpProblem, matrix: &DistanceMatrix) -> i64 {
        self.total_distance(matrix) + self.penalty(problem)
    }

    /// Loads are consistent and within capacity, and every stop appears exactly once
    pub fn is_feasible(&self, problem: &CvrpProblem) -> bool {
        let mut seen = vec![0u8; problem.stops.len()];
        for &s in self.routes.iter().flatten().chain(self.unassigned.iter()) {
            seen[s] += 1;
        }

        let loads_ok = self.routes.iter().zip(&self.loads).all(|(route, &load)| {
            let actual: i64 = route.iter().map(|&s| problem.stops[s].demand).sum();
            actual == load && load <= problem.capacity
        });

        loads_ok && seen.iter().all(|&count| count == 1)
    }
}

/// Length of a depot -> stops -> depot tour; zero for an empty route
pub fn route_distance(route: &[usize], matrix: &DistanceMatrix) -> i64 {
    if route.is_empty() {
        return 0;
    }

    let mut total = 0;
    let mut prev = DEPOT;
    for &stop in route {
        total += matrix.distance(prev, node(stop));
        prev = node(stop);
    }
    total + matrix.distance(prev, DEPOT)
}

/// Matrix indices around a position: (before, after)
pub(super) fn neighbours(route: &[usize], position: usize) -> (usize, usize) {
    let prev = if position == 0 { DEPOT } else { node(route[position - 1]) };
    let next = if position >= route.len() { DEPOT } else { node(route[position]) };
    (prev, next)
}

/// Extra distance from inserting `stop` before `route[position]`
pub(super) fn insertion_delta(
    route: &[usize],
    position: usize,
    stop: usize,
    matrix: &DistanceMatrix,
) -> i64 {
    let (prev, next) = neighbours(route, position);
    let s = node(stop);
    matrix.distance(prev, s) + matrix.distance(s, next) - matrix.distance(prev, next)
}

/// Distance change from taking `route[position]` out
pub(super) fn removal_delta(route: &[usize], position: usize, matrix: &DistanceMatrix) -> i64 {
    let prev = if position == 0 { DEPOT } else { node(route[position - 1]) };
    let next = if position + 1 >= route.len() { DEPOT } else { node(route[position + 1]) };
    let s = node(route[position]);
    matrix.distance(prev, next) - matrix.distance(prev, s) - matrix.distance(s, next)
}

/// Distance change from putting `stop` in place of `route[position]`
pub(super) fn replacement_delta(
    route: &[usize],
    position: usize,
    stop: usize,
    matrix: &DistanceMatrix,
) -> i64 {
    let prev = if position == 0 { DEPOT } else { node(route[position - 1]) };
    let next = if position + 1 >= route.len() { DEPOT } else { node(route[position + 1]) };
    let old = node(route[position]);
    let new = node(stop);
    matrix.distance(prev, new) + matrix.distance(new, next)
        - matrix.distance(prev, old)
        - matrix.distance(old, next)
}

/// One vehicle's served stops
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedRoute {
    /// 0-based vehicle slot
    pub vehicle: usize,
    /// Stop indices in visiting order
    pub stops: Vec<usize>,
    /// Distance in matrix units
    pub distance: i64,
    /// Demand in tenths of a pallet
    pub load: i64,
}

/// Result of a routing solve
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingOutcome {
    /// Non-empty routes only
    pub routes: Vec<AssignedRoute>,
    /// Stop indices that no route serves, ascending
    pub dropped: Vec<usize>,
    /// Distance in matrix units
    pub total_distance: i64,
    /// Distance plus drop penalties
    pub objective: i64,
    pub iterations: u64,
    pub solve_time_ms: u64,
    pub algorithm: String,
}

impl RoutingOutcome {
    /// Outcome where nothing is routed and every stop is dropped
    pub fn all_dropped(problem: &CvrpProblem) -> Self {
        Self {
            dropped: (0..problem.stops.len()).collect(),
            objective: problem.stops.iter().map(|s| s.penalty).sum(),
            ..Self::empty()
        }
    }

    /// Well-formed outcome for trivial input: no routes, no drops, zero cost
    pub fn empty() -> Self {
        Self {
            routes: vec![],
            dropped: vec![],
            total_distance: 0,
            objective: 0,
            iterations: 0,
            solve_time_ms: 0,
            algorithm: "none".to_string(),
        }
    }

    pub fn from_assignment(
        assignment: &Assignment,
        problem: &CvrpProblem,
        matrix: &DistanceMatrix,
        iterations: u64,
        elapsed: Duration,
    ) -> Self {
        let routes: Vec<AssignedRoute> = assignment
            .routes
            .iter()
            .enumerate()
            .filter(|(_, route)| !route.is_empty())
            .map(|(vehicle, route)| AssignedRoute {
                vehicle,
                stops: route.clone(),
                distance: route_distance(route, matrix),
                load: assignment.loads[vehicle],
            })
            .collect();

        let mut dropped = assignment.unassigned.clone();
        dropped.sort_unstable();

        let total_distance = routes.iter().map(|r| r.distance).sum();

        Self {
            routes,
            dropped,
            total_distance,
            objective: assignment.cost(problem, matrix),
            iterations,
            solve_time_ms: elapsed.as_millis() as u64,
            algorithm: "ruin-recreate-ls".to_string(),
        }
    }
}
