//! Behavioural tests for building offers.

use std::cell::RefCell;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ridepool_core::{
    Coordinate, ModelError, Offer, OfferParams, PointIdGenerator, PointType, Preference,
};

fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0)
        .single()
        .expect("valid instant")
}

#[fixture]
fn params() -> RefCell<Option<OfferParams>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<Option<Result<Offer, ModelError>>> {
    RefCell::new(None)
}

#[given("offer parameters departing at {departure}:00 and arriving by {arrival}:00")]
fn given_params(
    #[from(params)] params: &RefCell<Option<OfferParams>>,
    departure: u32,
    arrival: u32,
) {
    *params.borrow_mut() = Some(OfferParams {
        id: "o1".to_owned(),
        user_id: "driver".to_owned(),
        source: Coordinate::new(30.04, 31.23).expect("valid source"),
        destination: Coordinate::new(30.07, 31.28).expect("valid destination"),
        departure_time: at_hour(departure),
        max_estimated_arrival_time: at_hour(arrival),
        detour: Duration::from_secs(600),
        capacity: 3,
        preference: Preference::default(),
    });
}

#[given("the offer has no seats")]
fn given_no_seats(#[from(params)] params: &RefCell<Option<OfferParams>>) {
    if let Some(current) = params.borrow_mut().as_mut() {
        current.capacity = 0;
    }
}

#[when("I build the offer")]
fn build_offer(
    #[from(params)] params: &RefCell<Option<OfferParams>>,
    #[from(outcome)] outcome: &RefCell<Option<Result<Offer, ModelError>>>,
) {
    let current = params.borrow().clone().expect("parameters should be set");
    *outcome.borrow_mut() = Some(Offer::new(current, &PointIdGenerator::new()));
}

#[then("the offer path runs from its source to its destination")]
fn then_direct_path(#[from(outcome)] outcome: &RefCell<Option<Result<Offer, ModelError>>>) {
    let borrow = outcome.borrow();
    let offer = borrow
        .as_ref()
        .expect("offer should be built")
        .as_ref()
        .expect("offer should be valid");
    let types: Vec<_> = offer.path.iter().map(|point| point.point_type).collect();
    assert_eq!(types, vec![PointType::Source, PointType::Destination]);
    assert!(offer.path.iter().all(|point| point.owner.id() == "o1"));
}

#[then("an inverted time window error is returned")]
fn then_inverted(#[from(outcome)] outcome: &RefCell<Option<Result<Offer, ModelError>>>) {
    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(ModelError::InvertedTimeWindow { .. }))
    ));
}

#[then("a non-positive capacity error is returned")]
fn then_no_capacity(#[from(outcome)] outcome: &RefCell<Option<Result<Offer, ModelError>>>) {
    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(ModelError::NonPositive {
            field: "capacity",
            ..
        }))
    ));
}

#[scenario(path = "tests/features/offer_model.feature", index = 0)]
fn direct_offer(
    params: RefCell<Option<OfferParams>>,
    outcome: RefCell<Option<Result<Offer, ModelError>>>,
) {
    let _ = (params, outcome);
}

#[scenario(path = "tests/features/offer_model.feature", index = 1)]
fn inverted_offer(
    params: RefCell<Option<OfferParams>>,
    outcome: RefCell<Option<Result<Offer, ModelError>>>,
) {
    let _ = (params, outcome);
}

#[scenario(path = "tests/features/offer_model.feature", index = 2)]
fn seatless_offer(
    params: RefCell<Option<OfferParams>>,
    outcome: RefCell<Option<Result<Offer, ModelError>>>,
) {
    let _ = (params, outcome);
}
