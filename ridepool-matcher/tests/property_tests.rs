//! Property-based tests for the matcher.
//!
//! # Invariants tested
//!
//! - **Insertion coverage:** an unbounded insertion yields every ordered
//!   pickup and dropoff slot once, keeping the existing stops in order.
//! - **Maximum cardinality:** Hopcroft–Karp finds matchings as large as an
//!   exhaustive search, with no offer or request used twice.
//! - **Feasible routes:** every route the matcher returns respects capacity,
//!   rider windows net of walking and the driver's detour over the direct
//!   drive, and no request is assigned twice.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use ridepool_core::test_support::{
    GridRoutingEngine, at_minutes, attach_rider, coordinate, minutes, offer, offer_from,
    offer_params, request, request_points,
};
use ridepool_core::time::{advance, rewind, saturating_elapsed};
use ridepool_core::{
    Coordinate, PathPoint, PointIdGenerator, PointType, Profile, RoutingEngine, RoutingError,
    TravelTimeMatrix,
};
use ridepool_matcher::{
    Edge, Graph, HopcroftKarp, InsertionPathGenerator, Matcher, MaximumMatching, PathGenerator,
};

#[expect(clippy::float_arithmetic, reason = "corridor stops are scaled to degrees")]
fn stop(index: u32) -> Coordinate {
    coordinate(0.0, f64::from(index) * 0.01)
}

/// Grid engine whose roads run a thousandth of a degree north of every
/// address, so riders always walk one minute to and from the car.
struct OffsetRoadEngine(GridRoutingEngine);

const ROAD_WALK: Duration = Duration::from_secs(60);

impl RoutingEngine for OffsetRoadEngine {
    fn compute_driving_time(
        &self,
        waypoints: &[Coordinate],
        departure: DateTime<Utc>,
    ) -> Result<Vec<Duration>, RoutingError> {
        self.0.compute_driving_time(waypoints, departure)
    }

    fn compute_distance_time_matrix(
        &self,
        points: &[Coordinate],
        profile: Profile,
        departure: DateTime<Utc>,
    ) -> Result<TravelTimeMatrix, RoutingError> {
        self.0.compute_distance_time_matrix(points, profile, departure)
    }

    fn compute_walking_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Duration, RoutingError> {
        self.0.compute_walking_time(origin, destination)
    }

    #[expect(clippy::float_arithmetic, reason = "road offset is in degrees")]
    fn snap_point_to_road(&self, point: &Coordinate) -> Result<Coordinate, RoutingError> {
        Ok(coordinate(point.lat() + 0.001, point.lng()))
    }
}

fn largest_matching(adjacency: &[BTreeSet<usize>], offer: usize, used: &mut Vec<usize>) -> usize {
    let Some(requests) = adjacency.get(offer) else {
        return 0;
    };
    let mut best = largest_matching(adjacency, offer + 1, used);
    for &request in requests {
        if used.contains(&request) {
            continue;
        }
        used.push(request);
        best = best.max(1 + largest_matching(adjacency, offer + 1, used));
        used.pop();
    }
    best
}

fn riders_on_board(path: &[PathPoint]) -> Vec<u32> {
    let mut on_board = 0_u32;
    path.iter()
        .map(|point| {
            if let Some(rider) = point.request() {
                match point.point_type {
                    PointType::Pickup => on_board += rider.number_of_riders,
                    PointType::Dropoff => on_board = on_board.saturating_sub(rider.number_of_riders),
                    PointType::Source | PointType::Destination => {}
                }
            }
            on_board
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: with no stop later than the rider's target times, every
    /// slot `1 <= p <= d <= n - 1` is produced exactly once.
    #[test]
    fn insertion_enumerates_every_slot(riders in 0_usize..4) {
        let ids = PointIdGenerator::new();
        let mut driver = offer("o1", &ids);
        for index in 0..riders {
            let passenger = request(&format!("m{index}"), stop(1), stop(2));
            attach_rider(&mut driver, passenger, &ids, at_minutes(1), at_minutes(2));
        }
        let mut newcomer = request("r1", stop(3), stop(4));
        newcomer.earliest_departure_time = at_minutes(200);
        newcomer.latest_arrival_time = at_minutes(300);
        let (pickup, dropoff) = request_points(&Arc::new(newcomer), &ids);

        let candidates: Vec<Vec<PathPoint>> = InsertionPathGenerator::new()
            .generate(&driver.path, &pickup, &dropoff)
            .expect("route has both ends")
            .collect();
        let slots = driver.path.len() - 1;
        prop_assert_eq!(candidates.len(), slots * (slots + 1) / 2);

        let original: Vec<_> = driver.path.iter().map(|point| point.id).collect();
        let mut seen = HashSet::new();
        for candidate in &candidates {
            let at = |id| candidate.iter().position(|point| point.id == id);
            let (Some(p), Some(d)) = (at(pickup.id), at(dropoff.id)) else {
                return Err(TestCaseError::fail("candidate lost the new stops"));
            };
            prop_assert!(p < d);
            prop_assert!(seen.insert((p, d)));
            let rest: Vec<_> = candidate
                .iter()
                .map(|point| point.id)
                .filter(|id| *id != pickup.id && *id != dropoff.id)
                .collect();
            prop_assert_eq!(&rest, &original);
        }
    }

    /// Property: the matching is as large as the best exhaustive assignment.
    #[test]
    fn hopcroft_karp_is_maximum(
        pairs in prop::collection::btree_set((0_usize..5, 0_usize..5), 0..16),
    ) {
        let mut graph = Graph::new();
        let mut adjacency = vec![BTreeSet::new(); 5];
        for &(offer_index, request_index) in &pairs {
            graph.add_edge(Edge {
                offer_id: format!("o{offer_index}"),
                request_id: format!("r{request_index}"),
                path: Vec::new(),
            });
            if let Some(requests) = adjacency.get_mut(offer_index) {
                requests.insert(request_index);
            }
        }

        let matching = HopcroftKarp::new()
            .find_maximum_matching(&graph)
            .expect("well-formed graph");
        prop_assert_eq!(
            matching.len(),
            largest_matching(&adjacency, 0, &mut Vec::new())
        );

        let offers: HashSet<_> = matching.iter().map(|edge| edge.offer_id.as_str()).collect();
        let requests: HashSet<_> = matching.iter().map(|edge| edge.request_id.as_str()).collect();
        prop_assert_eq!(offers.len(), matching.len());
        prop_assert_eq!(requests.len(), matching.len());
        for edge in &matching {
            prop_assert!(graph.edge(&edge.offer_id, &edge.request_id).is_some());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: every accepted route is feasible for the driver and for
    /// every rider on it.
    #[test]
    fn matched_routes_are_feasible(
        capacity in 1_u32..=3,
        detour in 0_u64..=30,
        trips in prop::collection::vec((0_u32..50, 1_u32..=10, 1_u32..=2, 0_i64..40), 1..6),
    ) {
        let ids = Arc::new(PointIdGenerator::new());
        let mut params = offer_params("o1");
        params.destination = stop(60);
        params.capacity = capacity;
        params.detour = minutes(detour);
        let driver = offer_from(params, &ids);
        let requests: Vec<_> = trips
            .iter()
            .enumerate()
            .map(|(index, &(from, length, party, ready))| {
                let mut rider = request(&format!("r{index}"), stop(from), stop(from + length));
                rider.number_of_riders = party;
                rider.earliest_departure_time = at_minutes(ready);
                rider
            })
            .collect();

        let engine = Arc::new(OffsetRoadEngine(GridRoutingEngine::new()));
        let direct = engine
            .compute_driving_time(&[driver.source, driver.destination], driver.departure_time)
            .expect("grid engine never fails")
            .last()
            .copied()
            .unwrap_or_default();
        let results = Matcher::new(engine, Arc::clone(&ids))
            .match_batch(vec![driver.clone()], requests)
            .expect("grid engine never fails");

        let mut assigned = HashSet::new();
        for result in &results {
            let on_board = riders_on_board(&result.path);
            prop_assert!(on_board.iter().all(|riders| *riders <= capacity));

            let Some(finish) = result.path.last().map(|point| point.expected_arrival_time) else {
                return Err(TestCaseError::fail("route has no stops"));
            };
            let driven = saturating_elapsed(driver.departure_time, finish);
            prop_assert!(driven.saturating_sub(direct) <= driver.detour);

            for matched in &result.assigned_requests {
                prop_assert!(assigned.insert(matched.request.id.clone()));
                let at = |id| result.path.iter().position(|point| point.id == id);
                let (Some(p), Some(d)) = (at(matched.pickup.id), at(matched.dropoff.id)) else {
                    return Err(TestCaseError::fail("route lost an assigned rider"));
                };
                prop_assert!(p < d);
                prop_assert_eq!(matched.pickup.walking_duration, ROAD_WALK);
                prop_assert_eq!(matched.dropoff.walking_duration, ROAD_WALK);
                let ready = advance(matched.request.earliest_departure_time, matched.pickup.walking_duration);
                let deadline = rewind(matched.request.latest_arrival_time, matched.dropoff.walking_duration);
                prop_assert!(matched.pickup.expected_arrival_time >= ready);
                prop_assert!(matched.dropoff.expected_arrival_time <= deadline);
            }
        }
    }
}
