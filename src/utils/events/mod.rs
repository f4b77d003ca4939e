pub mod errors;
pub mod geo;
pub mod models;

use crate::utils::distance::models::{Destination, DistanceAnnotation};
use crate::utils::distance::{rank_by_distance, DistanceRefinement};
use crate::utils::events::errors::EventError;
use crate::utils::events::geo::BoundingBox;
use crate::utils::events::models::{EventStatus, EventView, GeoPoint};
use crate::utils::pagination::{paginate, Page, PageRequest};
use crate::utils::search::{Clause, EventOrder, EventPredicate};
use crate::utils::store::DiscoveryStore;
use crate::validation::{check_range, into_result};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRequest {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub use_distance_matrix: bool,
    pub page: PageRequest,
}

impl Validate for NearbyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_range(
            &mut errors,
            "latitude",
            self.center.latitude,
            Some(-90.0),
            Some(90.0),
        );
        check_range(
            &mut errors,
            "longitude",
            self.center.longitude,
            Some(-180.0),
            Some(180.0),
        );
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            let mut error = ValidationError::new("range");
            error.message = Some("must be greater than 0".into());
            errors.add("radius", error);
        }
        into_result(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NearbyEvent {
    #[serde(flatten)]
    pub event: EventView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyEvents {
    pub page: Page<NearbyEvent>,
    /// Whether the distance service answered and the list is in travel-distance order.
    pub distance_refined: bool,
}

/// Active events inside the bounding box around `request.center`.
///
/// With refinement the list is re-ordered by travel distance and trimmed to the
/// radius. Without it, or when the service fails, the box result is returned as is.
pub async fn find_nearby(
    store: &dyn DiscoveryStore,
    distance: Option<&DistanceRefinement>,
    request: &NearbyRequest,
) -> Result<NearbyEvents, EventError> {
    let bbox = BoundingBox::around(request.center, request.radius_km);
    let predicate = EventPredicate::new()
        .and(Clause::Status(EventStatus::Active))
        .and(Clause::WithinBox(bbox));

    let events = store
        .find_events(&predicate, EventOrder::DateAsc, None)
        .await?;
    debug!("Bounding box matched {} event(s)", events.len());

    let refinement = match distance {
        Some(distance) if request.use_distance_matrix => {
            let destinations: Vec<_> = events
                .iter()
                .map(|event| Destination {
                    event_id: event.id,
                    point: event.location.point(),
                })
                .collect();
            distance.annotations(request.center, &destinations).await
        }
        _ => None,
    };

    let distance_refined = refinement.is_some();
    let nearby: Vec<_> = match refinement {
        Some(annotations) => rank_by_distance(
            events,
            |event| event.id,
            annotations,
            Some(request.radius_km * 1000.0),
        )
        .into_iter()
        .map(|(event, distance)| NearbyEvent {
            event: event.into(),
            distance,
        })
        .collect(),
        None => events
            .into_iter()
            .map(|event| NearbyEvent {
                event: event.into(),
                distance: None,
            })
            .collect(),
    };

    Ok(NearbyEvents {
        page: paginate(nearby, request.page),
        distance_refined,
    })
}
