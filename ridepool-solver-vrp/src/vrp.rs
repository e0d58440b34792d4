//! `vrp-core` modelling helpers for `VrpSolver`.
//!
//! Node indices double as `vrp-core` locations. Node `0` is the vehicle start,
//! the last node is the vehicle end and every pickup-and-dropoff pair becomes
//! a multi-job whose sub-jobs are visited in order.

use std::sync::Arc;

use ridepool_core::{PickupDeliveryProblem, SolverError, SolverTimeWindow, Visit};
use vrp_core::models::common::{Location, Profile, TimeWindow};
use vrp_core::models::problem::{Single, TravelTime};
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;

use crate::solver::VrpSolverConfig;

fn model_error(err: impl std::fmt::Display) -> SolverError {
    SolverError::Model {
        message: err.to_string(),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "problem times are whole seconds far below f64 precision limits"
)]
pub(crate) const fn seconds(value: u64) -> f64 {
    value as f64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "arrivals are clamped to non-negative values bounded by the route duration"
)]
fn whole_seconds(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

fn define_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let unassigned_feature = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let capacity_feature = CapacityFeatureBuilder::<SingleDimLoad>::new("capacity").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-travel-time")
        .set_transport_cost(transport)
        .set_time_constrained(true)
        .build_minimize_duration()?;

    GoalContextBuilder::with_features(&[unassigned_feature, capacity_feature, transport_feature])?
        .build()
}

fn load(problem: &PickupDeliveryProblem, node: usize) -> GenericResult<i32> {
    let demand = problem.demands.get(node).copied().unwrap_or_default();
    i32::try_from(demand.unsigned_abs()).map_err(|_| format!("demand at node {node} is too large").into())
}

fn stop(
    problem: &PickupDeliveryProblem,
    node: usize,
    demand: Demand<SingleDimLoad>,
) -> GenericResult<Single> {
    let window: SolverTimeWindow = problem.time_windows.get(node).copied().unwrap_or_default();
    SingleBuilder::default()
        .id(format!("node{node}").as_str())
        .demand(demand)
        .times(vec![TimeWindow::new(seconds(window.start), seconds(window.end))])?
        .location(node)?
        .build()
}

fn define_problem(
    problem: &PickupDeliveryProblem,
    transport: Arc<dyn TransportCost>,
    goal: GoalContext,
) -> GenericResult<Problem> {
    let jobs = problem
        .pickups_and_dropoffs
        .iter()
        .enumerate()
        .map(|(idx, pair)| {
            let riders = load(problem, pair.pickup)?;
            MultiBuilder::default()
                .id(format!("request{idx}").as_str())
                .add_job(stop(problem, pair.pickup, Demand::pudo_pickup(riders))?)
                .add_job(stop(problem, pair.dropoff, Demand::pudo_delivery(riders))?)
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let end_location = problem.node_count().saturating_sub(1);
    let start = problem.time_windows.first().copied().unwrap_or_default();
    let end = problem.time_windows.last().copied().unwrap_or_default();
    let capacity = i32::try_from(problem.vehicle_capacity)
        .map_err(|_| format!("capacity {} is too large", problem.vehicle_capacity))?;
    let vehicle = VehicleBuilder::default()
        .id("driver")
        .add_detail(
            VehicleDetailBuilder::default()
                .set_start_location(0)
                .set_start_time(seconds(start.start))
                .set_end_location(end_location)
                .set_end_time(seconds(end.end.min(problem.max_route_duration)))
                .build()?,
        )
        .capacity(SingleDimLoad::new(capacity))
        .build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(std::iter::once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

struct MatrixTransportCost {
    durations: Vec<Vec<f64>>,
}

impl MatrixTransportCost {
    fn new(matrix: &[Vec<u64>]) -> Self {
        let durations = matrix
            .iter()
            .map(|row| row.iter().copied().map(seconds).collect())
            .collect();
        Self { durations }
    }

    fn duration_seconds(&self, from: Location, to: Location) -> f64 {
        let result = self
            .durations
            .get(from)
            .and_then(|row| row.get(to))
            .copied();
        debug_assert!(
            result.is_some(),
            "Matrix lookup failed: from={from}, to={to}"
        );
        result.unwrap_or(0.0)
    }
}

impl TransportCost for MatrixTransportCost {
    // Travel times come straight from the problem matrix, so the route and
    // departure arguments of the `vrp-core` trait are unused.
    fn distance(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> Cost {
        self.duration_seconds(from, to)
    }

    fn duration(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> f64 {
        self.duration_seconds(from, to)
    }

    fn distance_approx(&self, profile: &Profile, from: usize, to: usize) -> f64 {
        self.duration_approx(profile, from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.duration_seconds(from, to)
    }
}

/// Context for running a `vrp-core` solve.
pub(super) struct VrpSolveContext<'a> {
    config: &'a VrpSolverConfig,
}

impl<'a> VrpSolveContext<'a> {
    /// Create a new solve context.
    pub(super) const fn new(config: &'a VrpSolverConfig) -> Self {
        Self { config }
    }

    /// Solve `problem`, returning `None` when some request stays unassigned.
    pub(super) fn solve(
        &self,
        problem: &PickupDeliveryProblem,
    ) -> Result<Option<Vec<Visit>>, SolverError> {
        let transport = Arc::new(MatrixTransportCost::new(&problem.time_matrix));
        let goal = define_goal(transport.clone()).map_err(model_error)?;
        let vrp_problem =
            Arc::new(define_problem(problem, transport, goal).map_err(model_error)?);

        let vrp_config = VrpConfigBuilder::new(vrp_problem.clone())
            .prebuild()
            .map_err(model_error)?
            .with_max_generations(Some(self.config.max_generations))
            .with_max_time(self.config.max_time_secs)
            .build()
            .map_err(model_error)?;

        let solution = vrp_core::solver::Solver::new(vrp_problem, vrp_config)
            .solve()
            .map_err(model_error)?;

        if !solution.unassigned.is_empty() {
            return Ok(None);
        }
        let Some(route) = solution.routes.first() else {
            return Ok(None);
        };
        let visits = route
            .tour
            .all_activities()
            .map(|activity| Visit {
                node: activity.place.location,
                arrival_secs: whole_seconds(activity.schedule.arrival.max(activity.place.time.start)),
            })
            .collect();
        Ok(Some(visits))
    }
}
