use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::{Date, Time};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Canceled,
    Completed,
    Draft,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Canceled => "canceled",
            EventStatus::Completed => "completed",
            EventStatus::Draft => "draft",
        }
    }
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "completed" => Ok(Self::Completed),
            "draft" => Ok(Self::Draft),
            other => Err(format!("{other} is not a known event status")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            other => Err(format!("{other} is not a known skill level")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl EventLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SportRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub sport: Option<SportRef>,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Date,
    #[schema(value_type = String, example = "18:30:00")]
    pub start_time: Time,
    #[schema(value_type = String, example = "20:00:00")]
    pub end_time: Time,
    pub location: EventLocation,
    pub max_participants: i32,
    /// As last seen by the store, may briefly exceed `max_participants`.
    pub current_participants: i64,
    pub status: EventStatus,
    pub is_private: bool,
    #[serde(skip_serializing, default)]
    pub invitation_code: Option<String>,
}

impl Event {
    pub fn sport_id(&self) -> Option<Uuid> {
        self.sport.as_ref().map(|s| s.id)
    }

    pub fn spots_left(&self) -> i64 {
        (i64::from(self.max_participants) - self.current_participants).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == 0
    }
}

/// Event with the derived capacity view used in every discovery payload.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub spots_left: i64,
    pub is_full: bool,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            spots_left: event.spots_left(),
            is_full: event.is_full(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportPreference {
    pub sport_id: Uuid,
    pub sport_name: Option<String>,
    pub skill_level: Option<SkillLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FriendSummary {
    pub id: Uuid,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// A participation row resolved to the participating user's public profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub event_id: Uuid,
    pub user: FriendSummary,
}
