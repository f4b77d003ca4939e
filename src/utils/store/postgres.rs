use crate::app_errors::DefaultContext;
use crate::modules::database::{PgPool, PgQuery};
use crate::utils::events::models::{
    Event, EventLocation, FriendSummary, GeoPoint, Participant, SportPreference, SportRef,
};
use crate::utils::search::{Clause, EventOrder, EventPredicate, Window};
use crate::utils::store::{DiscoveryStore, StoreResult};
use anyhow::anyhow;
use axum::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::{Date, Time};
use tracing::trace;
use uuid::Uuid;

const EVENT_COLUMNS: &str = r#"
    SELECT e.id, e.owner_id, e.sport_id, s.name AS sport_name, e.title, e.description,
           e.event_date, e.start_time, e.end_time, e.location_name, e.latitude, e.longitude,
           e.max_participants,
           (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id)
               AS current_participants,
           e.status, e.is_private, e.invitation_code
    FROM events e
    LEFT JOIN sports s ON s.id = e.sport_id
    WHERE e.deleted_at IS NULL
"#;

/// A friendship may be stored in both directions; each friend is listed once.
const FRIEND_IDS: &str = r#"
    SELECT DISTINCT CASE WHEN f.user_id = $1 THEN f.friend_id ELSE f.user_id END
    FROM friendships f
    WHERE (f.user_id = $1 OR f.friend_id = $1) AND f.status = 'accepted'
    ORDER BY 1
"#;

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    owner_id: Uuid,
    sport_id: Option<Uuid>,
    sport_name: Option<String>,
    title: String,
    description: Option<String>,
    event_date: Date,
    start_time: Time,
    end_time: Time,
    location_name: String,
    latitude: f64,
    longitude: f64,
    max_participants: i32,
    current_participants: i64,
    status: String,
    is_private: bool,
    invitation_code: Option<String>,
}

impl TryFrom<EventRow> for Event {
    type Error = anyhow::Error;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| anyhow!("Event {} has invalid status: {e}", row.id))?;
        let sport = row.sport_id.map(|id| SportRef {
            id,
            name: row.sport_name.unwrap_or_default(),
        });
        Ok(Event {
            id: row.id,
            owner_id: row.owner_id,
            sport,
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            start_time: row.start_time,
            end_time: row.end_time,
            location: EventLocation {
                name: row.location_name,
                latitude: row.latitude,
                longitude: row.longitude,
            },
            max_participants: row.max_participants,
            current_participants: row.current_participants,
            status,
            is_private: row.is_private,
            invitation_code: row.invitation_code,
        })
    }
}

#[derive(FromRow)]
struct PreferenceRow {
    sport_id: Uuid,
    sport_name: Option<String>,
    skill_level: Option<String>,
}

#[derive(FromRow)]
struct ParticipantRow {
    event_id: Uuid,
    user_id: Uuid,
    display_name: String,
    avatar: Option<String>,
}

#[derive(FromRow)]
struct LocationRow {
    default_latitude: Option<f64>,
    default_longitude: Option<f64>,
}

/// `%` and `_` in user input are literal characters, not wildcards.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_clause(qb: &mut QueryBuilder<'_, Postgres>, clause: &Clause) {
    match clause {
        Clause::Keyword(keyword) => {
            let pattern = like_pattern(keyword);
            qb.push(" AND (e.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.location_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        Clause::Sport(id) => {
            qb.push(" AND e.sport_id = ").push_bind(*id);
        }
        Clause::Status(status) => {
            qb.push(" AND e.status = ").push_bind(status.as_str());
        }
        Clause::DateFrom(from) => {
            qb.push(" AND e.event_date >= ").push_bind(*from);
        }
        Clause::DateTo(to) => {
            qb.push(" AND e.event_date <= ").push_bind(*to);
        }
        Clause::CapacityAtLeast(min) => {
            qb.push(" AND e.max_participants >= ").push_bind(*min);
        }
        Clause::CapacityAtMost(max) => {
            qb.push(" AND e.max_participants <= ").push_bind(*max);
        }
        Clause::LocationName(name) => {
            qb.push(" AND e.location_name ILIKE ")
                .push_bind(like_pattern(name));
        }
        Clause::WithinBox(bbox) => {
            qb.push(" AND e.latitude BETWEEN ")
                .push_bind(bbox.min_lat)
                .push(" AND ")
                .push_bind(bbox.max_lat)
                .push(" AND e.longitude BETWEEN ")
                .push_bind(bbox.min_lon)
                .push(" AND ")
                .push_bind(bbox.max_lon);
        }
        Clause::NotOwnedBy(user_id) => {
            qb.push(" AND e.owner_id <> ").push_bind(*user_id);
        }
        Clause::NotJoinedBy(user_id) => {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM event_participants jp")
                .push(" WHERE jp.event_id = e.id AND jp.user_id = ")
                .push_bind(*user_id)
                .push(")");
        }
        Clause::JoinedByAnyOf(user_ids) => {
            qb.push(" AND EXISTS (SELECT 1 FROM event_participants fp")
                .push(" WHERE fp.event_id = e.id AND fp.user_id = ANY(")
                .push_bind(user_ids.clone())
                .push("))");
        }
        Clause::PublicOnly => {
            qb.push(" AND NOT e.is_private");
        }
        Clause::ExcludeIds(ids) => {
            // TODO: anti-join on a temp table once backfill exclusions grow past a few hundred ids
            if !ids.is_empty() {
                qb.push(" AND NOT (e.id = ANY(")
                    .push_bind(ids.clone())
                    .push("))");
            }
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: EventOrder) {
    match order {
        EventOrder::DateAsc => {
            qb.push(" ORDER BY e.event_date ASC, e.start_time ASC, e.id ASC");
        }
        EventOrder::DateDesc => {
            qb.push(" ORDER BY e.event_date DESC, e.start_time DESC, e.id ASC");
        }
    }
}

pub struct EventSearch<'p> {
    pub predicate: &'p EventPredicate,
}

impl<'c, 'p> PgQuery<'c, EventSearch<'p>> {
    pub async fn find(
        &mut self,
        order: EventOrder,
        window: Option<Window>,
    ) -> StoreResult<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_COLUMNS);
        for clause in self.payload.predicate.clauses() {
            push_clause(&mut qb, clause);
        }
        push_order(&mut qb, order);
        if let Some(window) = window {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(window.limit).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
        }

        let rows: Vec<EventRow> = qb
            .build_query_as()
            .fetch_all(&mut *self.conn)
            .await
            .dc()?;
        trace!("Fetched {} event rows", rows.len());

        rows.into_iter().map(Event::try_from).collect()
    }

    pub async fn count(&mut self) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM events e WHERE e.deleted_at IS NULL",
        );
        for clause in self.payload.predicate.clauses() {
            push_clause(&mut qb, clause);
        }
        let (count,): (i64,) = qb
            .build_query_as()
            .fetch_one(&mut *self.conn)
            .await
            .dc()?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

pub struct UserSignals {
    pub user_id: Uuid,
}

impl<'c> PgQuery<'c, UserSignals> {
    pub async fn sport_preferences(&mut self) -> StoreResult<Vec<SportPreference>> {
        let rows = sqlx::query_as::<_, PreferenceRow>(
            r#"
                SELECT usp.sport_id, s.name AS sport_name, usp.skill_level
                FROM user_sport_preferences usp
                LEFT JOIN sports s ON s.id = usp.sport_id
                WHERE usp.user_id = $1
                ORDER BY usp.created_at ASC, usp.sport_id ASC
            "#,
        )
        .bind(self.payload.user_id)
        .fetch_all(&mut *self.conn)
        .await
        .dc()?;

        trace!(
            "Found {} sport preference(s) for user {}",
            rows.len(),
            self.payload.user_id
        );

        Ok(rows
            .into_iter()
            .map(|row| SportPreference {
                sport_id: row.sport_id,
                sport_name: row.sport_name,
                skill_level: row.skill_level.and_then(|level| level.parse().ok()),
            })
            .collect())
    }

    pub async fn friend_ids(&mut self) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(FRIEND_IDS)
        .bind(self.payload.user_id)
        .fetch_all(&mut *self.conn)
        .await
        .dc()?;

        trace!("Found {} friend(s) for user {}", ids.len(), self.payload.user_id);
        Ok(ids)
    }

    pub async fn default_location(&mut self) -> StoreResult<Option<GeoPoint>> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
                SELECT default_latitude, default_longitude
                FROM users
                WHERE id = $1
            "#,
        )
        .bind(self.payload.user_id)
        .fetch_optional(&mut *self.conn)
        .await
        .dc()?;

        Ok(row.and_then(|row| match (row.default_latitude, row.default_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        }))
    }
}

pub struct ParticipantLookup {
    pub event_ids: Vec<Uuid>,
    pub user_ids: Vec<Uuid>,
}

impl<'c> PgQuery<'c, ParticipantLookup> {
    pub async fn participants(&mut self) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
                SELECT p.event_id, u.id AS user_id,
                       COALESCE(u.display_name, u.username) AS display_name,
                       u.avatar_url AS avatar
                FROM event_participants p
                JOIN users u ON u.id = p.user_id
                WHERE p.event_id = ANY($1) AND p.user_id = ANY($2)
                ORDER BY p.event_id ASC, p.joined_at ASC, u.id ASC
            "#,
        )
        .bind(&self.payload.event_ids)
        .bind(&self.payload.user_ids)
        .fetch_all(&mut *self.conn)
        .await
        .dc()?;

        Ok(rows
            .into_iter()
            .map(|row| Participant {
                event_id: row.event_id,
                user: FriendSummary {
                    id: row.user_id,
                    display_name: row.display_name,
                    avatar: row.avatar,
                },
            })
            .collect())
    }
}

/// [`DiscoveryStore`] over the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgDiscoveryStore {
    pool: PgPool,
}

impl PgDiscoveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscoveryStore for PgDiscoveryStore {
    async fn find_events(
        &self,
        predicate: &EventPredicate,
        order: EventOrder,
        window: Option<Window>,
    ) -> StoreResult<Vec<Event>> {
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(EventSearch { predicate }, &mut *conn);
        q.find(order, window).await
    }

    async fn count_events(&self, predicate: &EventPredicate) -> StoreResult<u64> {
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(EventSearch { predicate }, &mut *conn);
        q.count().await
    }

    async fn sport_preferences(&self, user_id: Uuid) -> StoreResult<Vec<SportPreference>> {
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(UserSignals { user_id }, &mut *conn);
        q.sport_preferences().await
    }

    async fn friend_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(UserSignals { user_id }, &mut *conn);
        q.friend_ids().await
    }

    async fn participants(
        &self,
        event_ids: &[Uuid],
        user_ids: &[Uuid],
    ) -> StoreResult<Vec<Participant>> {
        if event_ids.is_empty() || user_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(
            ParticipantLookup {
                event_ids: event_ids.to_vec(),
                user_ids: user_ids.to_vec(),
            },
            &mut *conn,
        );
        q.participants().await
    }

    async fn default_location(&self, user_id: Uuid) -> StoreResult<Option<GeoPoint>> {
        let mut conn = self.pool.acquire().await.dc()?;
        let mut q = PgQuery::new(UserSignals { user_id }, &mut *conn);
        q.default_location().await
    }
}
