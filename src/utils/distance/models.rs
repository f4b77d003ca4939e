use crate::utils::events::models::GeoPoint;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub event_id: Uuid,
    pub point: GeoPoint,
}

/// One answered destination. `distance` is in metres, `duration` in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceEstimate {
    pub id: Uuid,
    pub distance: u64,
    pub duration: u64,
    pub distance_text: String,
    pub duration_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DistanceAnnotation {
    pub event_id: Uuid,
    pub distance_meters: u64,
    /// Seconds of travel.
    pub duration: u64,
    pub distance_text: String,
    pub duration_text: String,
}

impl From<DistanceEstimate> for DistanceAnnotation {
    fn from(estimate: DistanceEstimate) -> Self {
        Self {
            event_id: estimate.id,
            distance_meters: estimate.distance,
            duration: estimate.duration,
            distance_text: estimate.distance_text,
            duration_text: estimate.duration_text,
        }
    }
}
