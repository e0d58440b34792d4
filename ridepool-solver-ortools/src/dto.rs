//! JSON bodies exchanged with the OR-Tools service.

use ridepool_core::{PickupDeliveryProblem, Visit};
use serde::{Deserialize, Serialize};

use crate::SolverTuning;

/// Request body for `POST /solve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SolveRequestDto<'a> {
    pub time_matrix: &'a [Vec<u64>],
    pub time_windows: Vec<[u64; 2]>,
    /// Load change per node, positive at pickups.
    pub no_of_riders_per_request: &'a [i64],
    pub vehicle_capacity: u32,
    pub pickup_and_dropoffs: Vec<[usize; 2]>,
    pub max_route_duration: u64,
    /// Search budget in milliseconds.
    pub timeout: u64,
    pub method: &'a str,
    pub enable_guided_local_search: bool,
}

impl<'a> SolveRequestDto<'a> {
    pub(crate) fn new(problem: &'a PickupDeliveryProblem, tuning: &'a SolverTuning) -> Self {
        Self {
            time_matrix: &problem.time_matrix,
            time_windows: problem
                .time_windows
                .iter()
                .map(|window| [window.start, window.end])
                .collect(),
            no_of_riders_per_request: &problem.demands,
            vehicle_capacity: problem.vehicle_capacity,
            pickup_and_dropoffs: problem
                .pickups_and_dropoffs
                .iter()
                .map(|pair| [pair.pickup, pair.dropoff])
                .collect(),
            max_route_duration: problem.max_route_duration,
            timeout: tuning.timeout_ms,
            method: &tuning.method,
            enable_guided_local_search: tuning.enable_guided_local_search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct RouteStepDto {
    pub node: usize,
    pub arrival_time: u64,
}

/// Response body; `success` is false when no feasible route exists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct SolveResponseDto {
    pub success: bool,
    #[serde(default)]
    pub route: Vec<RouteStepDto>,
}

impl SolveResponseDto {
    pub(crate) fn into_visits(self) -> Option<Vec<Visit>> {
        self.success.then(|| {
            self.route
                .into_iter()
                .map(|step| Visit {
                    node: step.node,
                    arrival_secs: step.arrival_time,
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::{PickupDropoffPair, SolverTimeWindow};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn request_uses_the_service_field_names() {
        let problem = PickupDeliveryProblem {
            time_matrix: vec![vec![0, 5, 9], vec![5, 0, 4], vec![9, 4, 0]],
            time_windows: vec![SolverTimeWindow { start: 0, end: 60 }; 3],
            demands: vec![0, 2, -2],
            vehicle_capacity: 4,
            pickups_and_dropoffs: vec![PickupDropoffPair {
                pickup: 1,
                dropoff: 2,
            }],
            max_route_duration: 60,
        };
        let tuning = SolverTuning::default();
        let body = serde_json::to_value(SolveRequestDto::new(&problem, &tuning)).expect("serializes");
        assert_eq!(
            body,
            json!({
                "time_matrix": [[0, 5, 9], [5, 0, 4], [9, 4, 0]],
                "time_windows": [[0, 60], [0, 60], [0, 60]],
                "no_of_riders_per_request": [0, 2, -2],
                "vehicle_capacity": 4,
                "pickup_and_dropoffs": [[1, 2]],
                "max_route_duration": 60,
                "timeout": 100,
                "method": "parallel_cheapest_insertion",
                "enable_guided_local_search": false
            })
        );
    }

    #[rstest]
    #[case(r#"{"success": true, "route": [{"node": 0, "arrival_time": 0}, {"node": 2, "arrival_time": 9}]}"#, Some(vec![
        Visit { node: 0, arrival_secs: 0 },
        Visit { node: 2, arrival_secs: 9 },
    ]))]
    #[case(r#"{"success": false, "route": []}"#, None)]
    #[case(r#"{"success": false}"#, None)]
    fn responses_map_to_visits(#[case] body: &str, #[case] expected: Option<Vec<Visit>>) {
        let response: SolveResponseDto = serde_json::from_str(body).expect("valid response");
        assert_eq!(response.into_visits(), expected);
    }
}
