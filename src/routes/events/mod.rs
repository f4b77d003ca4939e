pub mod models;

use crate::config::discovery::DiscoverySettings;
use crate::modules::AppState;
use crate::routes::events::models::{
    ApiResponse, NearbyData, NearbyQuery, RecommendedData, RecommendedQuery,
};
use crate::utils::auth::models::Claims;
use crate::utils::distance::DistanceRefinement;
use crate::utils::events::errors::EventError;
use crate::utils::events::find_nearby;
use crate::utils::recommendations::errors::RecommendationError;
use crate::utils::recommendations::RecommendationAggregator;
use crate::utils::store::Store;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use time::OffsetDateTime;
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/nearby", get(nearby_events))
        .route("/recommended", get(recommended_events))
}

/// Events around a point
#[utoipa::path(get, path = "/events/nearby", tag = "events", params(NearbyQuery), responses((status = 200, body = NearbyResponse, description = "Active events inside the search radius"), (status = 400, description = "Invalid query parameter")))]
pub async fn nearby_events(
    State(store): State<Store>,
    State(distance): State<Option<DistanceRefinement>>,
    State(discovery): State<DiscoverySettings>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<NearbyData>>, EventError> {
    let request = query.into_request(&discovery)?;
    let nearby = find_nearby(store.as_ref(), distance.as_ref(), &request).await?;
    debug!(
        "Found {} nearby event(s), refined: {}",
        nearby.page.pagination.total, nearby.distance_refined
    );

    Ok(ApiResponse::ok(NearbyData {
        events: nearby.page.events,
        pagination: nearby.page.pagination,
        center: request.center,
        radius: request.radius_km,
        distance_refined: nearby.distance_refined,
    }))
}

/// Personalized event recommendations
#[utoipa::path(get, path = "/events/recommended", tag = "events", params(RecommendedQuery), responses((status = 200, body = RecommendedResponse, description = "Ranked recommendations, possibly empty with a guidance message"), (status = 400, description = "Invalid query parameter"), (status = 401, description = "Missing or invalid access token")))]
pub async fn recommended_events(
    claims: Claims,
    State(store): State<Store>,
    State(distance): State<Option<DistanceRefinement>>,
    State(discovery): State<DiscoverySettings>,
    Query(query): Query<RecommendedQuery>,
) -> Result<Json<ApiResponse<RecommendedData>>, RecommendationError> {
    let request = query.into_request(&discovery)?;
    let today = OffsetDateTime::now_utc().date();
    let recommendations = RecommendationAggregator::new(store.as_ref(), distance.as_ref())
        .recommend(claims.user_id, &request, today)
        .await?;
    debug!(
        "Recommending {} event(s) to user {}",
        recommendations.page.pagination.total, claims.user_id
    );

    Ok(ApiResponse::ok(recommendations.into()))
}
