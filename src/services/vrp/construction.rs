//! Initial solution: penalty-ordered cheapest insertion

use tracing::debug;

use crate::services::routing::DistanceMatrix;

use super::problem::CvrpProblem;
use super::solution::{insertion_delta, Assignment};

/// Where and at what cost a stop fits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub route: usize,
    pub position: usize,
    pub delta: i64,
}

/// Cheapest capacity-feasible insertion of `stop` over all routes.
///
/// Only the first empty route is tried; the others are interchangeable.
pub fn best_insertion(
    assignment: &Assignment,
    stop: usize,
    problem: &CvrpProblem,
    matrix: &DistanceMatrix,
) -> Option<Insertion> {
    let demand = problem.stops[stop].demand;
    let mut best: Option<Insertion> = None;
    let mut tried_empty = false;

    for (r, route) in assignment.routes.iter().enumerate() {
        if assignment.loads[r] + demand > problem.capacity {
            continue;
        }
        if route.is_empty() {
            if tried_empty {
                continue;
            }
            tried_empty = true;
        }

        for position in 0..=route.len() {
            let delta = insertion_delta(route, position, stop, matrix);
            if best.map_or(true, |b| delta < b.delta) {
                best = Some(Insertion { route: r, position, delta });
            }
        }
    }

    best
}

/// Build the starting assignment.
///
/// Stops are grouped by drop penalty, most expensive group first. Within a
/// group the globally cheapest insertion is applied until nothing fits or
/// serving the remaining stops would cost more than dropping them.
pub fn construct(problem: &CvrpProblem, matrix: &DistanceMatrix) -> Assignment {
    let mut assignment = Assignment::new(problem.fleet_size);

    let (fitting, oversized): (Vec<usize>, Vec<usize>) =
        (0..problem.stops.len()).partition(|&s| problem.stops[s].demand <= problem.capacity);

    for &s in &oversized {
        debug!(
            "Stop {} demand {} exceeds vehicle capacity {}, dropped",
            problem.stops[s].id, problem.stops[s].demand, problem.capacity
        );
    }
    assignment.unassigned.extend(oversized);

    let mut penalties: Vec<i64> = fitting.iter().map(|&s| problem.stops[s].penalty).collect();
    penalties.sort_unstable_by(|a, b| b.cmp(a));
    penalties.dedup();

    for penalty in penalties {
        let mut group: Vec<usize> = fitting
            .iter()
            .copied()
            .filter(|&s| problem.stops[s].penalty == penalty)
            .collect();

        while !group.is_empty() {
            let mut best: Option<(usize, Insertion)> = None;
            for (gi, &stop) in group.iter().enumerate() {
                if let Some(ins) = best_insertion(&assignment, stop, problem, matrix) {
                    if ins.delta < penalty && best.map_or(true, |(_, b)| ins.delta < b.delta) {
                        best = Some((gi, ins));
                    }
                }
            }

            match best {
                Some((gi, ins)) => {
                    let stop = group.remove(gi);
                    assignment.insert(problem, ins.route, ins.position, stop);
                }
                None => {
                    assignment.unassigned.append(&mut group);
                }
            }
        }
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vrp::problem::CvrpStop;
    use crate::types::Location;

    fn stop(id: &str, x: f64, y: f64, demand: i64, penalty: i64) -> CvrpStop {
        CvrpStop {
            id: id.to_string(),
            location: Location::new(x, y),
            demand,
            penalty,
            urgent: penalty > 1_000_000,
        }
    }

    fn solve_initial(problem: &CvrpProblem) -> Assignment {
        let matrix = DistanceMatrix::analytical(&problem.locations());
        construct(problem, &matrix)
    }

    #[test]
    fn test_construct_serves_all_when_capacity_allows() {
        let problem = CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops: vec![
                stop("A", 20.0, 20.0, 10, 1_000_000),
                stop("B", 80.0, 80.0, 10, 1_000_000),
                stop("C", 20.0, 80.0, 10, 1_000_000),
            ],
            fleet_size: 2,
            capacity: 30,
        };

        let a = solve_initial(&problem);
        assert!(a.unassigned.is_empty());
        assert!(a.is_feasible(&problem));
    }

    #[test]
    fn test_construct_respects_capacity() {
        let problem = CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops: vec![
                stop("A", 20.0, 20.0, 10, 1_000_000),
                stop("B", 80.0, 80.0, 10, 1_000_000),
                stop("C", 20.0, 80.0, 10, 1_000_000),
            ],
            fleet_size: 2,
            capacity: 26,
        };

        let a = solve_initial(&problem);
        assert!(a.is_feasible(&problem));
        assert!(a.unassigned.is_empty());
        assert!(a.loads.iter().all(|&l| l <= 26));
        assert!(a.routes.iter().all(|r| r.len() <= 2));
    }

    #[test]
    fn test_construct_prefers_urgent_when_short_of_capacity() {
        let problem = CvrpProblem {
            depot: Location::new(50.0, 50.0),
            stops: vec![
                // deferrable stop right next to the depot
                stop("near", 51.0, 50.0, 10, 1_000_000),
                stop("urgent", 90.0, 90.0, 10, 1_000_000_000),
            ],
            fleet_size: 1,
            capacity: 10,
        };

        let a = solve_initial(&problem);
        assert_eq!(a.routes[0], vec![1]);
        assert_eq!(a.unassigned, vec![0]);
    }

    #[test]
    fn test_construct_drops_oversized_stop() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            stops: vec![stop("huge", 1.0, 1.0, 500, 1_000_000_000)],
            fleet_size: 3,
            capacity: 260,
        };

        let a = solve_initial(&problem);
        assert_eq!(a.unassigned, vec![0]);
        assert_eq!(a.assigned_count(), 0);
    }

    #[test]
    fn test_construct_drops_when_detour_exceeds_penalty() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            // round trip is 2 * 100 * 100 = 20_000 units, penalty only 50
            stops: vec![stop("far", 100.0, 0.0, 1, 50)],
            fleet_size: 1,
            capacity: 10,
        };

        let a = solve_initial(&problem);
        assert_eq!(a.unassigned, vec![0]);
    }

    #[test]
    fn test_best_insertion_tries_single_empty_route() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            stops: vec![stop("A", 3.0, 4.0, 1, 1_000)],
            fleet_size: 4,
            capacity: 10,
        };
        let matrix = DistanceMatrix::analytical(&problem.locations());
        let a = Assignment::new(4);

        let ins = best_insertion(&a, 0, &problem, &matrix).unwrap();
        assert_eq!(ins.route, 0);
        assert_eq!(ins.position, 0);
        assert_eq!(ins.delta, 1000);
    }

    #[test]
    fn test_zero_fleet_drops_everything() {
        let problem = CvrpProblem {
            depot: Location::new(0.0, 0.0),
            stops: vec![stop("A", 3.0, 4.0, 1, 1_000)],
            fleet_size: 0,
            capacity: 10,
        };

        let a = solve_initial(&problem);
        assert_eq!(a.unassigned, vec![0]);
    }
}
