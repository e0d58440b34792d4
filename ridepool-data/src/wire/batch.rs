//! Batch input: offers, requests and riders already on an offer's route.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ridepool_core::{
    Coordinate, MatchedRequest, ModelError, Offer, OfferParams, PathPoint, PointIdGenerator,
    PointOwner, PointType, Preference, Request,
};
use serde::{Deserialize, Serialize};

use super::WireError;

const fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

const fn one() -> u32 {
    1
}

/// A latitude and longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateDto {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl CoordinateDto {
    fn decode(self, owner: &str) -> Result<Coordinate, WireError> {
        Coordinate::new(self.lat, self.lng).map_err(|source| WireError::Coordinate {
            owner: owner.to_owned(),
            source,
        })
    }
}

impl From<Coordinate> for CoordinateDto {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            lat: coordinate.lat(),
            lng: coordinate.lng(),
        }
    }
}

/// A rider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDto {
    pub id: String,
    pub user_id: String,
    pub source: CoordinateDto,
    pub destination: CoordinateDto,
    pub earliest_departure_time: DateTime<Utc>,
    pub latest_arrival_time: DateTime<Utc>,
    pub max_walking_duration_minutes: u64,
    /// Party size, one when absent.
    #[serde(default = "one")]
    pub number_of_riders: u32,
    #[serde(default)]
    pub preference: Preference,
}

impl RequestDto {
    /// Decode and validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Coordinate`] or [`WireError::Model`] for invalid
    /// fields.
    pub fn into_request(self) -> Result<Request, WireError> {
        let owner = format!("request {}", self.id);
        let request = Request {
            source: self.source.decode(&owner)?,
            destination: self.destination.decode(&owner)?,
            id: self.id,
            user_id: self.user_id,
            earliest_departure_time: self.earliest_departure_time,
            latest_arrival_time: self.latest_arrival_time,
            max_walking_duration: minutes(self.max_walking_duration_minutes),
            number_of_riders: self.number_of_riders,
            preference: self.preference,
        };
        request.validate()?;
        Ok(request)
    }
}

/// A pickup or dropoff already scheduled on an offer's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDto {
    pub point: CoordinateDto,
    /// When the driver is expected at the stop.
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub walking_duration_minutes: u64,
}

impl StopDto {
    fn decode(
        self,
        ids: &PointIdGenerator,
        point_type: PointType,
        owner: PointOwner,
    ) -> Result<PathPoint, WireError> {
        let coordinate = self
            .point
            .decode(&format!("{} {}", owner.kind(), owner.id()))?;
        Ok(
            PathPoint::new(ids.next_id(), coordinate, point_type, self.time, owner)
                .with_walking_duration(minutes(self.walking_duration_minutes)),
        )
    }
}

/// A rider matched to the offer before this batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedRequestDto {
    pub request: RequestDto,
    pub pickup_point: StopDto,
    pub dropoff_point: StopDto,
}

impl MatchedRequestDto {
    fn decode(self, ids: &PointIdGenerator) -> Result<MatchedRequest, WireError> {
        let request = Arc::new(self.request.into_request()?);
        let owner = PointOwner::Request(Arc::clone(&request));
        let pickup = self
            .pickup_point
            .decode(ids, PointType::Pickup, owner.clone())?;
        let dropoff = self.dropoff_point.decode(ids, PointType::Dropoff, owner)?;
        Ok(MatchedRequest {
            request,
            pickup,
            dropoff,
        })
    }
}

/// One stop of an explicit route.
///
/// Pickups and dropoffs name the matched request they serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntryDto {
    pub point_type: PointType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A driver offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDto {
    pub id: String,
    pub user_id: String,
    pub source: CoordinateDto,
    pub destination: CoordinateDto,
    pub departure_time: DateTime<Utc>,
    pub max_estimated_arrival_time: DateTime<Utc>,
    pub detour_minutes: u64,
    pub capacity: u32,
    #[serde(default)]
    pub preference: Preference,
    #[serde(default)]
    pub matched_requests: Vec<MatchedRequestDto>,
    /// Route through the matched riders' stops. When absent each matched
    /// rider is picked up and dropped off in turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathEntryDto>>,
}

impl OfferDto {
    /// Decode and validate the offer, issuing point ids from `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] for invalid fields or a route that does not
    /// match the offer's matched requests.
    pub fn into_offer(self, ids: &PointIdGenerator) -> Result<Offer, WireError> {
        let owner = format!("offer {}", self.id);
        let params = OfferParams {
            source: self.source.decode(&owner)?,
            destination: self.destination.decode(&owner)?,
            id: self.id,
            user_id: self.user_id,
            departure_time: self.departure_time,
            max_estimated_arrival_time: self.max_estimated_arrival_time,
            detour: minutes(self.detour_minutes),
            capacity: self.capacity,
            preference: self.preference,
        };
        let offer = Offer::new(params, ids)?;
        if self.matched_requests.is_empty() && self.path.is_none() {
            return Ok(offer);
        }
        let matched = self
            .matched_requests
            .into_iter()
            .map(|rider| rider.decode(ids))
            .collect::<Result<Vec<_>, _>>()?;
        let path = match self.path {
            Some(entries) => explicit_path(&offer, &matched, &entries)?,
            None => sequential_path(&offer, &matched)?,
        };
        Ok(offer.with_matched_requests(matched, path)?)
    }
}

fn endpoints(offer: &Offer) -> Result<(&PathPoint, &PathPoint), WireError> {
    match (offer.path.first(), offer.path.last()) {
        (Some(source), Some(destination)) => Ok((source, destination)),
        _ => Err(ModelError::MalformedPath {
            offer_id: offer.id.clone(),
            reason: "path must contain at least two points".to_owned(),
        }
        .into()),
    }
}

fn sequential_path(offer: &Offer, matched: &[MatchedRequest]) -> Result<Vec<PathPoint>, WireError> {
    let (source, destination) = endpoints(offer)?;
    let stops = matched
        .iter()
        .flat_map(|rider| [rider.pickup.clone(), rider.dropoff.clone()]);
    Ok(std::iter::once(source.clone())
        .chain(stops)
        .chain(std::iter::once(destination.clone()))
        .collect())
}

fn explicit_path(
    offer: &Offer,
    matched: &[MatchedRequest],
    entries: &[PathEntryDto],
) -> Result<Vec<PathPoint>, WireError> {
    let (source, destination) = endpoints(offer)?;
    let last = entries.len().saturating_sub(1);
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry.point_type {
            PointType::Source if index == 0 => Ok(source.clone()),
            PointType::Destination if index == last => Ok(destination.clone()),
            PointType::Source | PointType::Destination => {
                Err(WireError::misplaced(&offer.id, entry.point_type))
            }
            PointType::Pickup | PointType::Dropoff => {
                let request_id = entry
                    .request_id
                    .as_deref()
                    .ok_or_else(|| WireError::missing_request_id(&offer.id, entry.point_type))?;
                let rider = matched
                    .iter()
                    .find(|rider| rider.request.id == request_id)
                    .ok_or_else(|| WireError::UnknownRider {
                        offer_id: offer.id.clone(),
                        request_id: request_id.to_owned(),
                    })?;
                Ok(if entry.point_type == PointType::Pickup {
                    rider.pickup.clone()
                } else {
                    rider.dropoff.clone()
                })
            }
        })
        .collect()
}

/// A batch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDto {
    pub offers: Vec<OfferDto>,
    #[serde(default)]
    pub requests: Vec<RequestDto>,
}

impl BatchDto {
    /// Decode every offer and request.
    ///
    /// # Errors
    ///
    /// Returns the first decoding failure.
    pub fn into_batch(self, ids: &PointIdGenerator) -> Result<Batch, WireError> {
        let offers = self
            .offers
            .into_iter()
            .map(|offer| offer.into_offer(ids))
            .collect::<Result<_, _>>()?;
        let requests = self
            .requests
            .into_iter()
            .map(RequestDto::into_request)
            .collect::<Result<_, _>>()?;
        Ok(Batch { offers, requests })
    }
}

/// Decoded offers and requests ready for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub offers: Vec<Offer>,
    pub requests: Vec<Request>,
}

/// Read a batch document from `reader`, issuing point ids from `ids`.
///
/// The same generator must be handed to the matcher that processes the
/// batch.
///
/// # Errors
///
/// Returns [`WireError::Json`] for malformed documents and the decoding
/// errors of [`BatchDto::into_batch`].
pub fn read_batch<R: Read>(reader: R, ids: &PointIdGenerator) -> Result<Batch, WireError> {
    let document: BatchDto = serde_json::from_reader(reader)?;
    document.into_batch(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::CoordinateError;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn document() -> Value {
        json!({
            "offers": [{
                "id": "o1",
                "userId": "driver-1",
                "source": {"lat": 30.0, "lng": 31.0},
                "destination": {"lat": 30.1, "lng": 31.1},
                "departureTime": "2025-01-01T08:00:00Z",
                "maxEstimatedArrivalTime": "2025-01-01T09:00:00Z",
                "detourMinutes": 15,
                "capacity": 3,
                "matchedRequests": [{
                    "request": {
                        "id": "r0",
                        "userId": "rider-0",
                        "source": {"lat": 30.02, "lng": 31.02},
                        "destination": {"lat": 30.05, "lng": 31.05},
                        "earliestDepartureTime": "2025-01-01T08:00:00Z",
                        "latestArrivalTime": "2025-01-01T08:45:00Z",
                        "maxWalkingDurationMinutes": 5
                    },
                    "pickupPoint": {
                        "point": {"lat": 30.02, "lng": 31.02},
                        "time": "2025-01-01T08:10:00Z",
                        "walkingDurationMinutes": 2
                    },
                    "dropoffPoint": {
                        "point": {"lat": 30.05, "lng": 31.05},
                        "time": "2025-01-01T08:25:00Z"
                    }
                }]
            }],
            "requests": [{
                "id": "r1",
                "userId": "rider-1",
                "source": {"lat": 30.03, "lng": 31.03},
                "destination": {"lat": 30.08, "lng": 31.08},
                "earliestDepartureTime": "2025-01-01T08:00:00Z",
                "latestArrivalTime": "2025-01-01T09:00:00Z",
                "maxWalkingDurationMinutes": 10,
                "numberOfRiders": 2,
                "preference": {"gender": "female", "sameGender": true}
            }]
        })
    }

    fn decode(document: &Value) -> Result<Batch, WireError> {
        read_batch(document.to_string().as_bytes(), &PointIdGenerator::new())
    }

    fn path_types(offer: &Offer) -> Vec<PointType> {
        offer.path.iter().map(|point| point.point_type).collect()
    }

    #[rstest]
    fn decodes_offers_requests_and_matched_riders(document: Value) {
        let batch = decode(&document).expect("valid batch");

        let offer = batch.offers.first().expect("one offer");
        assert_eq!(offer.detour, minutes(15));
        assert_eq!(offer.current_number_of_requests, 1);
        assert_eq!(
            path_types(offer),
            [
                PointType::Source,
                PointType::Pickup,
                PointType::Dropoff,
                PointType::Destination
            ]
        );
        let matched = offer.matched_requests.first().expect("one rider");
        assert_eq!(matched.pickup.walking_duration, minutes(2));
        assert_eq!(matched.dropoff.walking_duration, Duration::ZERO);

        let request = batch.requests.first().expect("one request");
        assert_eq!(request.number_of_riders, 2);
        assert_eq!(request.max_walking_duration, minutes(10));
        assert!(request.preference.same_gender);
    }

    #[rstest]
    fn point_ids_are_unique_across_the_batch(document: Value) {
        let batch = decode(&document).expect("valid batch");
        let offer = batch.offers.first().expect("one offer");
        let mut ids: Vec<_> = offer.path.iter().map(|point| point.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), offer.path.len());
    }

    #[rstest]
    fn explicit_path_orders_the_stops(mut document: Value) {
        let mut second_rider = document["offers"][0]["matchedRequests"][0].clone();
        second_rider["request"]["id"] = json!("r9");
        document["offers"][0]["matchedRequests"]
            .as_array_mut()
            .expect("array")
            .push(second_rider);
        document["offers"][0]["path"] = json!([
            {"pointType": "source"},
            {"pointType": "pickup", "requestId": "r0"},
            {"pointType": "pickup", "requestId": "r9"},
            {"pointType": "dropoff", "requestId": "r9"},
            {"pointType": "dropoff", "requestId": "r0"},
            {"pointType": "destination"}
        ]);

        let batch = decode(&document).expect("valid batch");
        let owners: Vec<_> = batch
            .offers
            .first()
            .expect("one offer")
            .path
            .iter()
            .map(|point| point.owner.id().to_owned())
            .collect();
        assert_eq!(owners, ["o1", "r0", "r9", "r9", "r0", "o1"]);
    }

    #[rstest]
    fn explicit_path_rejects_unknown_riders(mut document: Value) {
        document["offers"][0]["path"] = json!([
            {"pointType": "source"},
            {"pointType": "pickup", "requestId": "r0"},
            {"pointType": "dropoff", "requestId": "ghost"},
            {"pointType": "destination"}
        ]);
        assert!(matches!(
            decode(&document),
            Err(WireError::UnknownRider { request_id, .. }) if request_id == "ghost"
        ));
    }

    #[rstest]
    fn explicit_path_rejects_inner_endpoints(mut document: Value) {
        document["offers"][0]["path"] = json!([
            {"pointType": "source"},
            {"pointType": "source"},
            {"pointType": "destination"}
        ]);
        assert!(matches!(
            decode(&document),
            Err(WireError::MisplacedEndpoint { point_type: "source", .. })
        ));
    }

    #[rstest]
    fn explicit_path_must_serve_every_matched_rider(mut document: Value) {
        document["offers"][0]["path"] = json!([
            {"pointType": "source"},
            {"pointType": "destination"}
        ]);
        assert!(matches!(
            decode(&document),
            Err(WireError::Model(ModelError::MalformedPath { .. }))
        ));
    }

    #[rstest]
    fn out_of_range_coordinates_name_their_owner(mut document: Value) {
        document["requests"][0]["source"]["lat"] = json!(95.0);
        let err = decode(&document).expect_err("latitude out of range");
        assert!(matches!(
            &err,
            WireError::Coordinate {
                owner,
                source: CoordinateError::Latitude(_),
            } if owner == "request r1"
        ));
    }

    #[rstest]
    fn malformed_json_is_reported() {
        let err = read_batch(&b"{\"offers\": 3}"[..], &PointIdGenerator::new())
            .expect_err("offers must be an array");
        assert!(matches!(err, WireError::Json(_)));
    }
}
