pub mod postgres;

use crate::utils::events::models::{Event, GeoPoint, Participant, SportPreference};
use crate::utils::search::{EventOrder, EventPredicate, Window};
use axum::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, anyhow::Error>;

/// Read-only view of the relational store used by the discovery paths.
///
/// Implementations must only return events that are not deleted. Participation
/// counts may lag behind concurrent joins.
#[async_trait]
pub trait DiscoveryStore: Send + Sync {
    /// Events matching `predicate`, ordered by date with event id as tie-break.
    async fn find_events(
        &self,
        predicate: &EventPredicate,
        order: EventOrder,
        window: Option<Window>,
    ) -> StoreResult<Vec<Event>>;

    async fn count_events(&self, predicate: &EventPredicate) -> StoreResult<u64>;

    async fn sport_preferences(&self, user_id: Uuid) -> StoreResult<Vec<SportPreference>>;

    /// Every accepted friend of `user_id` once, whichever direction the friendship is stored in.
    async fn friend_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Participation rows for `event_ids` restricted to `user_ids`.
    async fn participants(
        &self,
        event_ids: &[Uuid],
        user_ids: &[Uuid],
    ) -> StoreResult<Vec<Participant>>;

    async fn default_location(&self, user_id: Uuid) -> StoreResult<Option<GeoPoint>>;
}

pub type Store = Arc<dyn DiscoveryStore>;
