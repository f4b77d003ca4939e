use crate::config::discovery::DiscoverySettings;
use crate::utils::events::models::GeoPoint;
use crate::utils::events::{NearbyEvent, NearbyRequest};
use crate::routes::search::models::SearchData;
use crate::utils::pagination::{PageRequest, Pagination};
use crate::utils::recommendations::models::{
    RecommendationRequest, RecommendedEvent, Recommendations, Signals,
};
use crate::validation::{
    parse_field, parse_flag, require_field, ValidateContent, ValidateContentError,
};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Success envelope shared by the discovery endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    NearbyResponse = ApiResponse<NearbyData>,
    RecommendedResponse = ApiResponse<RecommendedData>,
    SearchResponse = ApiResponse<SearchData>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Values arrive as raw strings so a bad one is reported by name.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// Latitude of the search center, within [-90, 90]
    pub latitude: Option<String>,
    /// Longitude of the search center, within [-180, 180]
    pub longitude: Option<String>,
    /// Search radius in kilometres, defaults to 10
    pub radius: Option<String>,
    /// Re-rank by travel distance when the distance service is configured
    pub use_distance_matrix: Option<String>,
    pub page: Option<String>,
    /// Defaults to 200
    pub limit: Option<String>,
}

impl NearbyQuery {
    pub fn into_request(
        self,
        defaults: &DiscoverySettings,
    ) -> Result<NearbyRequest, ValidateContentError> {
        let request = NearbyRequest {
            center: GeoPoint::new(
                require_field("latitude", self.latitude.as_deref())?,
                require_field("longitude", self.longitude.as_deref())?,
            ),
            radius_km: parse_field("radius", self.radius.as_deref())?
                .unwrap_or(defaults.default_radius_km),
            use_distance_matrix: parse_flag(
                "useDistanceMatrix",
                self.use_distance_matrix.as_deref(),
            )?,
            page: PageRequest::parse(
                self.page.as_deref(),
                self.limit.as_deref(),
                defaults.listing_limit,
            )?,
        };
        request.validate_content()?;
        Ok(request)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyData {
    pub events: Vec<NearbyEvent>,
    pub pagination: Pagination,
    pub center: GeoPoint,
    pub radius: f64,
    pub distance_refined: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecommendedQuery {
    /// Only recommend events friends take part in
    pub only_friends: Option<String>,
    /// Sport id narrowing every candidate source
    pub sport_category: Option<String>,
    /// Backfill with generic events below this many candidates, defaults to 5
    pub min_event_count: Option<String>,
    /// Rank by travel distance from the stored location
    pub use_distance_matrix: Option<String>,
    pub page: Option<String>,
    /// Defaults to 200
    pub limit: Option<String>,
}

impl RecommendedQuery {
    pub fn into_request(
        self,
        defaults: &DiscoverySettings,
    ) -> Result<RecommendationRequest, ValidateContentError> {
        Ok(RecommendationRequest {
            only_friends: parse_flag("onlyFriends", self.only_friends.as_deref())?,
            sport_category: parse_field::<Uuid>("sportCategory", self.sport_category.as_deref())?,
            min_event_count: parse_field("minEventCount", self.min_event_count.as_deref())?
                .unwrap_or(defaults.min_event_count as usize),
            use_distance_matrix: parse_flag(
                "useDistanceMatrix",
                self.use_distance_matrix.as_deref(),
            )?,
            page: PageRequest::parse(
                self.page.as_deref(),
                self.limit.as_deref(),
                defaults.listing_limit,
            )?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendedData {
    pub events: Vec<RecommendedEvent>,
    pub pagination: Pagination,
    pub signals: Signals,
    /// Guidance for users without preferences or friends
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub message: Option<&'static str>,
}

impl From<Recommendations> for RecommendedData {
    fn from(recommendations: Recommendations) -> Self {
        Self {
            events: recommendations.page.events,
            pagination: recommendations.page.pagination,
            signals: recommendations.signals,
            message: recommendations.message,
        }
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    fn nearby(latitude: &str, longitude: &str) -> NearbyQuery {
        NearbyQuery {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            ..Default::default()
        }
    }

    #[test]
    fn nearby_defaults_come_from_settings() {
        let request = nearby("41.0", "29.0")
            .into_request(&DiscoverySettings::default())
            .unwrap();
        assert_eq!(request.radius_km, 10.0);
        assert_eq!(request.page, PageRequest { page: 1, limit: 200 });
        assert!(!request.use_distance_matrix);
    }

    #[test]
    fn nearby_names_the_bad_coordinate() {
        let defaults = DiscoverySettings::default();
        let err = nearby("north", "29.0").into_request(&defaults).unwrap_err();
        assert_eq!(err.field(), "latitude");
        let err = nearby("41.0", "200").into_request(&defaults).unwrap_err();
        assert_eq!(err.field(), "longitude");
        let err = NearbyQuery {
            radius: Some("-1".into()),
            ..nearby("41.0", "29.0")
        }
        .into_request(&defaults)
        .unwrap_err();
        assert_eq!(err.field(), "radius");
        let err = NearbyQuery::default().into_request(&defaults).unwrap_err();
        assert_eq!(err.field(), "latitude");
    }

    #[test]
    fn recommended_parses_flags_and_sport() {
        let sport = Uuid::new_v4();
        let request = RecommendedQuery {
            only_friends: Some("true".into()),
            sport_category: Some(sport.to_string()),
            min_event_count: Some("2".into()),
            ..Default::default()
        }
        .into_request(&DiscoverySettings::default())
        .unwrap();
        assert!(request.only_friends);
        assert_eq!(request.sport_category, Some(sport));
        assert_eq!(request.min_event_count, 2);

        let err = RecommendedQuery {
            sport_category: Some("tennis".into()),
            ..Default::default()
        }
        .into_request(&DiscoverySettings::default())
        .unwrap_err();
        assert_eq!(err.field(), "sportCategory");
    }
}
