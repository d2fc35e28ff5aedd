//! Deadline-bounded local search and ruin-and-recreate steps

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::services::routing::DistanceMatrix;

use super::construction::best_insertion;
use super::problem::{node, CvrpProblem};
use super::solution::{
    insertion_delta, removal_delta, replacement_delta, route_distance, Assignment,
};

/// Improvement operators over one problem, bounded by a deadline
pub struct LocalSearch<'a> {
    problem: &'a CvrpProblem,
    matrix: &'a DistanceMatrix,
    deadline: Instant,
}

impl<'a> LocalSearch<'a> {
    pub fn new(problem: &'a CvrpProblem, matrix: &'a DistanceMatrix, deadline: Instant) -> Self {
        Self {
            problem,
            matrix,
            deadline,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Apply improving moves until none is left or time runs out
    pub fn improve(&self, assignment: &mut Assignment) {
        while !self.expired() {
            let mut improved = self.insert_unassigned(assignment);
            improved |= self.replace_with_unassigned(assignment);
            improved |= self.relocate(assignment);
            improved |= self.exchange(assignment);
            improved |= self.two_opt(assignment);

            if !improved {
                break;
            }
        }
    }

    /// Serve dropped stops wherever the detour is cheaper than their penalty
    fn insert_unassigned(&self, assignment: &mut Assignment) -> bool {
        let problem = self.problem;
        let mut improved = false;

        assignment
            .unassigned
            .sort_by(|&a, &b| problem.stops[b].penalty.cmp(&problem.stops[a].penalty));

        let mut i = 0;
        while i < assignment.unassigned.len() {
            let stop = assignment.unassigned[i];
            match best_insertion(assignment, stop, problem, self.matrix) {
                Some(ins) if ins.delta < problem.stops[stop].penalty => {
                    assignment.unassigned.remove(i);
                    assignment.insert(problem, ins.route, ins.position, stop);
                    improved = true;
                }
                _ => i += 1,
            }
        }

        improved
    }

    /// Swap a dropped stop into a route in place of a served one
    fn replace_with_unassigned(&self, assignment: &mut Assignment) -> bool {
        let problem = self.problem;
        let mut improved = false;

        for ui in 0..assignment.unassigned.len() {
            let incoming = assignment.unassigned[ui];
            let incoming_demand = problem.stops[incoming].demand;
            if incoming_demand > problem.capacity {
                continue;
            }

            let mut best: Option<(usize, usize, i64)> = None;
            for (r, route) in assignment.routes.iter().enumerate() {
                for (p, &outgoing) in route.iter().enumerate() {
                    let out = &problem.stops[outgoing];
                    if assignment.loads[r] - out.demand + incoming_demand > problem.capacity {
                        continue;
                    }
                    let delta = replacement_delta(route, p, incoming, self.matrix) + out.penalty
                        - problem.stops[incoming].penalty;
                    if delta < 0 && best.map_or(true, |(_, _, d)| delta < d) {
                        best = Some((r, p, delta));
                    }
                }
            }

            if let Some((r, p, _)) = best {
                let outgoing = assignment.remove(problem, r, p);
                assignment.insert(problem, r, p, incoming);
                assignment.unassigned[ui] = outgoing;
                improved = true;
            }
        }

        improved
    }

    /// Move single stops to a cheaper position, within or across routes
    fn relocate(&self, assignment: &mut Assignment) -> bool {
        let problem = self.problem;
        let matrix = self.matrix;
        let mut improved = false;

        for from in 0..assignment.routes.len() {
            let mut pos = 0;
            while pos < assignment.routes[from].len() {
                if self.expired() {
                    return improved;
                }

                let stop = assignment.routes[from][pos];
                let demand = problem.stops[stop].demand;
                let removal = removal_delta(&assignment.routes[from], pos, matrix);

                // (target route, position, delta); same-route positions refer to the reduced route
                let mut best: Option<(usize, usize, i64)> = None;

                for to in 0..assignment.routes.len() {
                    if to == from {
                        let current = &assignment.routes[from];
                        if current.len() < 2 {
                            continue;
                        }
                        let base = route_distance(current, matrix);
                        let mut reduced = current.clone();
                        reduced.remove(pos);
                        let reduced_distance = route_distance(&reduced, matrix);
                        for p in (0..=reduced.len()).filter(|&p| p != pos) {
                            let delta = reduced_distance
                                + insertion_delta(&reduced, p, stop, matrix)
                                - base;
                            if delta < 0 && best.map_or(true, |(_, _, d)| delta < d) {
                                best = Some((to, p, delta));
                            }
                        }
                    } else {
                        if assignment.loads[to] + demand > problem.capacity {
                            continue;
                        }
                        let target = &assignment.routes[to];
                        for p in 0..=target.len() {
                            let delta = removal + insertion_delta(target, p, stop, matrix);
                            if delta < 0 && best.map_or(true, |(_, _, d)| delta < d) {
                                best = Some((to, p, delta));
                            }
                        }
                    }
                }

                match best {
                    Some((to, p, _)) => {
                        assignment.remove(problem, from, pos);
                        assignment.insert(problem, to, p, stop);
                        improved = true;
                    }
                    None => pos += 1,
                }
            }
        }

        improved
    }

    /// Swap two stops between different routes
    fn exchange(&self, assignment: &mut Assignment) -> bool {
        let problem = self.problem;
        let matrix = self.matrix;
        let mut improved = false;
        let fleet = assignment.routes.len();

        for r1 in 0..fleet {
            for r2 in (r1 + 1)..fleet {
                if self.expired() {
                    return improved;
                }

                for i in 0..assignment.routes[r1].len() {
                    for j in 0..assignment.routes[r2].len() {
                        let s1 = assignment.routes[r1][i];
                        let s2 = assignment.routes[r2][j];
                        let d1 = problem.stops[s1].demand;
                        let d2 = problem.stops[s2].demand;

                        if assignment.loads[r1] - d1 + d2 > problem.capacity
                            || assignment.loads[r2] - d2 + d1 > problem.capacity
                        {
                            continue;
                        }

                        let delta = replacement_delta(&assignment.routes[r1], i, s2, matrix)
                            + replacement_delta(&assignment.routes[r2], j, s1, matrix);
                        if delta < 0 {
                            assignment.routes[r1][i] = s2;
                            assignment.routes[r2][j] = s1;
                            assignment.loads[r1] += d2 - d1;
                            assignment.loads[r2] += d1 - d2;
                            improved = true;
                        }
                    }
                }
            }
        }

        improved
    }

    /// Reverse route segments; full recompute keeps this valid for asymmetric matrices
    fn two_opt(&self, assignment: &mut Assignment) -> bool {
        let matrix = self.matrix;
        let mut improved = false;

        for route in assignment.routes.iter_mut() {
            let n = route.len();
            if n < 2 {
                continue;
            }

            let mut best_distance = route_distance(route, matrix);
            loop {
                let mut found = false;
                for i in 0..n - 1 {
                    for j in (i + 1)..n {
                        route[i..=j].reverse();
                        let distance = route_distance(route, matrix);
                        if distance < best_distance {
                            best_distance = distance;
                            found = true;
                            improved = true;
                        } else {
                            route[i..=j].reverse();
                        }
                    }
                }

                if !found || self.expired() {
                    break;
                }
            }
        }

        improved
    }

    /// Remove a cluster of `count` served stops around a random seed stop
    pub fn ruin<R: Rng>(
        &self,
        assignment: &mut Assignment,
        rng: &mut R,
        count: usize,
    ) -> Vec<usize> {
        let served: Vec<usize> = assignment.routes.iter().flatten().copied().collect();
        let Some(&seed) = served.choose(rng) else {
            return vec![];
        };

        let mut victims: Vec<usize> = served.into_iter().filter(|&s| s != seed).collect();
        victims.sort_by_key(|&s| self.matrix.distance(node(seed), node(s)));
        victims.truncate(count.saturating_sub(1));
        victims.insert(0, seed);

        for &stop in &victims {
            if let Some((r, p)) = assignment.locate(stop) {
                assignment.remove(self.problem, r, p);
            }
        }

        victims
    }

    /// Reinsert removed and previously dropped stops, most expensive to drop first
    pub fn recreate<R: Rng>(&self, assignment: &mut Assignment, removed: Vec<usize>, rng: &mut R) {
        let problem = self.problem;
        let mut pending = removed;
        pending.append(&mut assignment.unassigned);
        pending.shuffle(rng);
        pending.sort_by(|&a, &b| problem.stops[b].penalty.cmp(&problem.stops[a].penalty));

        for stop in pending {
            match best_insertion(assignment, stop, problem, self.matrix) {
                Some(ins) if ins.delta < problem.stops[stop].penalty => {
                    assignment.insert(problem, ins.route, ins.position, stop);
                }
                _ => assignment.unassigned.push(stop),
            }
        }
    }
}
