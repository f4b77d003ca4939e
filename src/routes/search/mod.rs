pub mod models;

use crate::config::discovery::DiscoverySettings;
use crate::modules::AppState;
use crate::routes::events::models::ApiResponse;
use crate::routes::search::models::{SearchData, SearchEventsQuery};
use crate::utils::search::errors::SearchError;
use crate::utils::search::search_events;
use crate::utils::store::Store;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

/// Search events
#[utoipa::path(get, path = "/events/search", tag = "events", params(SearchEventsQuery), responses((status = 200, body = SearchResponse, description = "Matching events, ordered by date"), (status = 400, description = "Invalid query parameter")))]
pub async fn search(
    State(store): State<Store>,
    State(discovery): State<DiscoverySettings>,
    Query(query): Query<SearchEventsQuery>,
) -> Result<Json<ApiResponse<SearchData>>, SearchError> {
    let search = query.into_search(&discovery)?;
    let page = search_events(store.as_ref(), &search.predicate, search.order, search.page).await?;

    if page.events.is_empty() {
        debug!("Found no events with event search");
    } else {
        debug!("Found {} event(s) with event search", page.events.len());
    }

    Ok(ApiResponse::ok(page.into()))
}
