use crate::routes::{events::*, search::*, *};
use crate::routes::{events::models::*, search::models::*};
use crate::utils::distance::models::DistanceAnnotation;
use crate::utils::events::NearbyEvent;
use crate::utils::recommendations::models::{RecommendedEvent, Signals};
use crate::utils::events::models::*;
use crate::utils::pagination::Pagination;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
info(title = "Sportmeet", description = "Sport event discovery and recommendations", ),
paths(
health,
nearby_events,
search,
recommended_events,
),
components(schemas(
NearbyResponse,
RecommendedResponse,
SearchResponse,
NearbyData,
RecommendedData,
SearchData,
NearbyEvent,
RecommendedEvent,
Signals,
EventView,
Event,
EventStatus,
EventLocation,
SportRef,
SkillLevel,
GeoPoint,
FriendSummary,
DistanceAnnotation,
Pagination,
)),
tags(
(name = "events", description = "Event discovery"),
(name = "health", description = "Service health"),
)
)]
pub struct ApiDoc;
