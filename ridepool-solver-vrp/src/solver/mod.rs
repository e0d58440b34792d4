//! `VrpSolver` implementation backed by `vrp-core`.

use std::time::Instant;

use log::debug;
use ridepool_core::{PickupDeliveryProblem, SolverError, VehicleRoutingSolver, Visit};

use crate::vrp::VrpSolveContext;

/// Configuration for [`VrpSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrpSolverConfig {
    /// Upper bound on `vrp-core` generations.
    pub max_generations: usize,
    /// Wall-clock budget per problem in seconds, unbounded when `None`.
    pub max_time_secs: Option<usize>,
}

impl Default for VrpSolverConfig {
    fn default() -> Self {
        Self {
            max_generations: 100,
            max_time_secs: None,
        }
    }
}

/// Native solver using `vrp-core` to search for pickup-and-delivery routes.
///
/// # Examples
///
/// ```
/// use ridepool_core::{
///     PickupDeliveryProblem, PickupDropoffPair, SolverTimeWindow, VehicleRoutingSolver,
/// };
/// use ridepool_solver_vrp::VrpSolver;
///
/// let problem = PickupDeliveryProblem {
///     time_matrix: vec![
///         vec![0, 60, 120, 180],
///         vec![60, 0, 60, 120],
///         vec![120, 60, 0, 60],
///         vec![180, 120, 60, 0],
///     ],
///     time_windows: vec![SolverTimeWindow { start: 0, end: 600 }; 4],
///     demands: vec![0, 1, -1, 0],
///     vehicle_capacity: 2,
///     pickups_and_dropoffs: vec![PickupDropoffPair { pickup: 1, dropoff: 2 }],
///     max_route_duration: 600,
/// };
/// let visits = VrpSolver::new().solve(&problem)?.expect("route exists");
/// let order: Vec<_> = visits.iter().map(|visit| visit.node).collect();
/// assert_eq!(order, [0, 1, 2, 3]);
/// # Ok::<(), ridepool_core::SolverError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct VrpSolver {
    config: VrpSolverConfig,
}

impl VrpSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpSolverConfig) -> Self {
        Self { config }
    }

    /// The solver's configuration.
    #[must_use]
    pub const fn config(&self) -> &VrpSolverConfig {
        &self.config
    }
}

impl VehicleRoutingSolver for VrpSolver {
    fn solve(&self, problem: &PickupDeliveryProblem) -> Result<Option<Vec<Visit>>, SolverError> {
        problem.validate()?;
        ensure_paired(problem)?;
        let started_at = Instant::now();

        if problem.pickups_and_dropoffs.is_empty() {
            return Ok(direct_route(problem));
        }

        let visits = VrpSolveContext::new(&self.config).solve(problem)?;
        debug!(
            "vrp solve over {} nodes finished in {:?} ({})",
            problem.node_count(),
            started_at.elapsed(),
            if visits.is_some() { "routed" } else { "infeasible" }
        );
        Ok(visits)
    }
}

/// Every node between the start and the end must belong to exactly one
/// pickup-and-dropoff pair.
fn ensure_paired(problem: &PickupDeliveryProblem) -> Result<(), SolverError> {
    let last = problem.node_count().saturating_sub(1);
    let mut seen = vec![0_usize; problem.node_count()];
    for pair in &problem.pickups_and_dropoffs {
        for node in [pair.pickup, pair.dropoff] {
            if node == 0 || node == last {
                return Err(SolverError::InvalidProblem {
                    message: format!("node {node} is a route endpoint and cannot be a stop"),
                });
            }
            if let Some(count) = seen.get_mut(node) {
                *count = count.saturating_add(1);
            }
        }
    }
    let interior = seen.get(1..last).unwrap_or_default();
    if let Some(offset) = interior.iter().position(|count| *count != 1) {
        return Err(SolverError::InvalidProblem {
            message: format!(
                "node {} must belong to exactly one pickup/dropoff pair",
                offset.saturating_add(1)
            ),
        });
    }
    Ok(())
}

fn direct_route(problem: &PickupDeliveryProblem) -> Option<Vec<Visit>> {
    let last = problem.node_count().saturating_sub(1);
    let travel = problem
        .time_matrix
        .first()
        .and_then(|row| row.get(last))
        .copied()?;
    let window = problem.time_windows.get(last)?;
    let arrival = travel.max(window.start);
    (arrival <= window.end && arrival <= problem.max_route_duration).then(|| {
        vec![
            Visit {
                node: 0,
                arrival_secs: 0,
            },
            Visit {
                node: last,
                arrival_secs: arrival,
            },
        ]
    })
}
