//! Property-based tests for the VRP solver.
//!
//! # Invariants tested
//!
//! - **Complete tours:** every node is visited exactly once, starting at the
//!   source and finishing at the destination.
//! - **Precedence:** each pickup comes before its dropoff.
//! - **Capacity:** the load never exceeds the vehicle capacity.
//! - **Timing:** arrivals never decrease and respect every time window.

use std::collections::HashSet;

use proptest::prelude::*;
use ridepool_core::{
    PickupDeliveryProblem, PickupDropoffPair, SolverTimeWindow, VehicleRoutingSolver,
};
use ridepool_solver_vrp::{VrpSolver, VrpSolverConfig};

const HORIZON: u64 = 12 * 3_600;

/// Source at 0, destination at 100 and one pickup/dropoff pair per rider,
/// placed on a line at one minute per unit.
fn corridor_problem(riders: &[(u64, u64, u32)], capacity: u32) -> PickupDeliveryProblem {
    let mut positions = vec![0_u64];
    let mut demands = vec![0_i64];
    let mut pickups_and_dropoffs = Vec::new();
    for &(from, to, size) in riders {
        let pickup = positions.len();
        positions.push(from.min(to));
        positions.push(from.max(to));
        demands.push(i64::from(size));
        demands.push(-i64::from(size));
        pickups_and_dropoffs.push(PickupDropoffPair {
            pickup,
            dropoff: pickup + 1,
        });
    }
    positions.push(100);
    demands.push(0);
    let time_matrix = positions
        .iter()
        .map(|from| positions.iter().map(|to| from.abs_diff(*to) * 60).collect())
        .collect();
    PickupDeliveryProblem {
        time_matrix,
        time_windows: vec![
            SolverTimeWindow {
                start: 0,
                end: HORIZON
            };
            positions.len()
        ],
        demands,
        vehicle_capacity: capacity,
        pickups_and_dropoffs,
        max_route_duration: HORIZON,
    }
}

fn rider_strategy() -> impl Strategy<Value = (u64, u64, u32)> {
    (1_u64..99, 1_u64..99, 1_u32..=2).prop_filter("distinct stops", |(from, to, _)| from != to)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn solved_tours_are_feasible(
        riders in prop::collection::vec(rider_strategy(), 1..=3),
        capacity in 2_u32..=4,
    ) {
        let problem = corridor_problem(&riders, capacity);
        let solver = VrpSolver::with_config(VrpSolverConfig {
            max_generations: 20,
            max_time_secs: None,
        });
        let visits = solver
            .solve(&problem)
            .expect("solve should succeed")
            .expect("generous windows leave every rider routable");

        let nodes: Vec<usize> = visits.iter().map(|visit| visit.node).collect();
        prop_assert_eq!(nodes.len(), problem.node_count());
        prop_assert_eq!(nodes.iter().copied().collect::<HashSet<_>>().len(), nodes.len());
        prop_assert_eq!(nodes.first().copied(), Some(0));
        prop_assert_eq!(nodes.last().copied(), Some(problem.node_count() - 1));

        for pair in &problem.pickups_and_dropoffs {
            let pickup = nodes.iter().position(|node| *node == pair.pickup);
            let dropoff = nodes.iter().position(|node| *node == pair.dropoff);
            prop_assert!(pickup < dropoff, "pair {:?} out of order in {:?}", pair, nodes);
        }

        let mut load = 0_i64;
        for node in &nodes {
            load += problem.demands[*node];
            prop_assert!(load <= i64::from(capacity), "overloaded in {:?}", nodes);
        }

        for window in visits.windows(2) {
            prop_assert!(window[0].arrival_secs <= window[1].arrival_secs);
        }
        for visit in &visits {
            let bounds = problem.time_windows[visit.node];
            prop_assert!(bounds.start <= visit.arrival_secs && visit.arrival_secs <= bounds.end);
        }
    }
}
