//! Batch fixtures and a grid-backed engine builder shared by CLI tests.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ridepool_core::test_support::GridRoutingEngine;
use ridepool_matcher::SharedRoutingEngine;
use serde_json::{Value, json};
use tempfile::TempDir;

use super::*;
use crate::matching::{MatchConfig, MatchEngineBuilder};

/// Serves travel times from a [`GridRoutingEngine`] instead of OSRM.
#[derive(Debug, Default)]
pub(super) struct GridEngineBuilder;

impl MatchEngineBuilder for GridEngineBuilder {
    fn build(&self, _config: &MatchConfig) -> Result<SharedRoutingEngine, CliError> {
        Ok(Arc::new(GridRoutingEngine::new()))
    }
}

pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture");
}

fn stop(index: u32) -> Value {
    json!({"lat": 0.0, "lng": f64::from(index) / 100.0})
}

/// One offer along a corridor and one rider travelling part of it.
pub(super) fn corridor_batch() -> Value {
    json!({
        "offers": [{
            "id": "o1",
            "userId": "driver-o1",
            "source": stop(0),
            "destination": stop(60),
            "departureTime": "2025-01-01T08:00:00Z",
            "maxEstimatedArrivalTime": "2025-01-01T10:00:00Z",
            "detourMinutes": 30,
            "capacity": 3
        }],
        "requests": [{
            "id": "r1",
            "userId": "rider-r1",
            "source": stop(10),
            "destination": stop(30),
            "earliestDepartureTime": "2025-01-01T08:00:00Z",
            "latestArrivalTime": "2025-01-01T10:00:00Z",
            "maxWalkingDurationMinutes": 10
        }]
    })
}

pub(super) fn write_batch(path: &Utf8Path, batch: &Value) {
    let payload = serde_json::to_string_pretty(batch).expect("serialize batch");
    write_utf8(path, payload.as_bytes());
}
