use crate::utils::distance::models::DistanceAnnotation;
use crate::utils::events::models::{EventView, FriendSummary, SkillLevel};
use crate::utils::pagination::{Page, PageRequest};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportPreferenceReason {
    pub sport_id: Option<Uuid>,
    pub sport_name: String,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendParticipationReason {
    /// Every participating friend, not only the ones listed.
    pub friend_count: usize,
    pub friends: Vec<FriendSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationReason {
    SportPreference(SportPreferenceReason),
    FriendParticipation(FriendParticipationReason),
    Both {
        sport_preference: SportPreferenceReason,
        friend_participation: FriendParticipationReason,
    },
}

impl RecommendationReason {
    pub fn from_parts(
        sport: Option<SportPreferenceReason>,
        friends: Option<FriendParticipationReason>,
    ) -> Option<Self> {
        match (sport, friends) {
            (Some(sport_preference), Some(friend_participation)) => Some(Self::Both {
                sport_preference,
                friend_participation,
            }),
            (Some(sport), None) => Some(Self::SportPreference(sport)),
            (None, Some(friends)) => Some(Self::FriendParticipation(friends)),
            (None, None) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SportPreference(_) => "sport_preference",
            Self::FriendParticipation(_) => "friend_participation",
            Self::Both { .. } => "both",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecommendedEvent {
    #[serde(flatten)]
    pub event: EventView,
    /// Tagged by `type`: `sport_preference`, `friend_participation` or `both`
    #[schema(value_type = Object)]
    pub recommendation_reason: RecommendationReason,
    /// Great-circle distance from the user's stored location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceAnnotation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationRequest {
    pub only_friends: bool,
    pub sport_category: Option<Uuid>,
    pub min_event_count: usize,
    pub use_distance_matrix: bool,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Signals {
    pub sport_preferences: usize,
    pub friends: usize,
    pub has_location: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub page: Page<RecommendedEvent>,
    pub signals: Signals,
    pub message: Option<&'static str>,
}
