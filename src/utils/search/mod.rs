pub mod errors;

use crate::utils::events::geo::BoundingBox;
use crate::utils::events::models::{Event, EventStatus, EventView};
use crate::utils::pagination::{Page, PageRequest, Pagination};
use crate::utils::search::errors::SearchError;
use crate::utils::store::DiscoveryStore;
use time::Date;
use tracing::{debug, trace};
use uuid::Uuid;

/// One conjunct of an [`EventPredicate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Case-insensitive substring of title, description or location name.
    Keyword(String),
    Sport(Uuid),
    Status(EventStatus),
    DateFrom(Date),
    DateTo(Date),
    CapacityAtLeast(i32),
    CapacityAtMost(i32),
    LocationName(String),
    WithinBox(BoundingBox),
    NotOwnedBy(Uuid),
    NotJoinedBy(Uuid),
    /// At least one of these users has a participation row.
    JoinedByAnyOf(Vec<Uuid>),
    PublicOnly,
    ExcludeIds(Vec<Uuid>),
}

/// Declarative filter over events: every clause must hold.
///
/// Stores translate it into their own query language; [`EventPredicate::matches`]
/// evaluates it in memory. An empty predicate matches every event the store
/// still considers live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPredicate {
    clauses: Vec<Clause>,
}

impl EventPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn and_maybe(self, clause: Option<Clause>) -> Self {
        match clause {
            Some(clause) => self.and(clause),
            None => self,
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn sport(&self) -> Option<Uuid> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Sport(id) => Some(*id),
            _ => None,
        })
    }

    /// `participants` are the user ids with a participation row for `event`.
    pub fn matches(&self, event: &Event, participants: &[Uuid]) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause_matches(clause, event, participants))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn clause_matches(clause: &Clause, event: &Event, participants: &[Uuid]) -> bool {
    match clause {
        Clause::Keyword(keyword) => {
            contains_ci(&event.title, keyword)
                || event
                    .description
                    .as_deref()
                    .map_or(false, |d| contains_ci(d, keyword))
                || contains_ci(&event.location.name, keyword)
        }
        Clause::Sport(id) => event.sport_id() == Some(*id),
        Clause::Status(status) => event.status == *status,
        Clause::DateFrom(from) => event.event_date >= *from,
        Clause::DateTo(to) => event.event_date <= *to,
        Clause::CapacityAtLeast(min) => event.max_participants >= *min,
        Clause::CapacityAtMost(max) => event.max_participants <= *max,
        Clause::LocationName(name) => contains_ci(&event.location.name, name),
        Clause::WithinBox(bbox) => bbox.contains(event.location.point()),
        Clause::NotOwnedBy(user_id) => event.owner_id != *user_id,
        Clause::NotJoinedBy(user_id) => !participants.contains(user_id),
        Clause::JoinedByAnyOf(user_ids) => user_ids.iter().any(|id| participants.contains(id)),
        Clause::PublicOnly => !event.is_private,
        Clause::ExcludeIds(ids) => !ids.contains(&event.id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    #[default]
    DateAsc,
    DateDesc,
}

impl std::str::FromStr for EventOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::DateAsc),
            "desc" => Ok(Self::DateDesc),
            other => Err(format!("{other} is not a valid order, use `asc` or `desc`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    pub fn first(limit: u64) -> Self {
        Self::new(0, limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum StatusFilter {
    Only(EventStatus),
    All,
}

/// Builds the predicate behind the free-text/attribute event search.
///
/// Status defaults to `active`; `"all"` lifts the status restriction.
#[derive(Debug, Clone, Default)]
pub struct SearchQueryBuilder {
    keyword: Option<String>,
    sport_id: Option<Uuid>,
    status: Option<StatusFilter>,
    start_date: Option<Date>,
    end_date: Option<Date>,
    min_participants: Option<i32>,
    max_participants: Option<i32>,
    location_name: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = non_blank(keyword);
        self
    }

    pub fn sport(mut self, sport_id: Option<Uuid>) -> Self {
        self.sport_id = sport_id;
        self
    }

    pub fn status(mut self, status: Option<&str>) -> Result<Self, SearchError> {
        self.status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(s) if s.eq_ignore_ascii_case("all") => Some(StatusFilter::All),
            Some(s) => Some(StatusFilter::Only(s.parse().map_err(|reason| {
                SearchError::InvalidField {
                    field: "status",
                    reason,
                }
            })?)),
        };
        Ok(self)
    }

    pub fn dates(mut self, start_date: Option<Date>, end_date: Option<Date>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn participants(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    pub fn location_name(mut self, name: Option<String>) -> Self {
        self.location_name = non_blank(name);
        self
    }

    pub fn build(self) -> Result<EventPredicate, SearchError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(SearchError::InvalidField {
                    field: "start_date",
                    reason: format!("start_date {start} is after end_date {end}"),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_participants, self.max_participants) {
            if min > max {
                return Err(SearchError::InvalidField {
                    field: "min_participants",
                    reason: format!("min_participants {min} exceeds max_participants {max}"),
                });
            }
        }

        let status = match self.status.unwrap_or(StatusFilter::Only(EventStatus::Active)) {
            StatusFilter::Only(status) => Some(Clause::Status(status)),
            StatusFilter::All => None,
        };

        let predicate = EventPredicate::new()
            .and_maybe(self.keyword.map(Clause::Keyword))
            .and_maybe(self.sport_id.map(Clause::Sport))
            .and_maybe(status)
            .and_maybe(self.start_date.map(Clause::DateFrom))
            .and_maybe(self.end_date.map(Clause::DateTo))
            .and_maybe(self.min_participants.map(Clause::CapacityAtLeast))
            .and_maybe(self.max_participants.map(Clause::CapacityAtMost))
            .and_maybe(self.location_name.map(Clause::LocationName));

        trace!("Built search predicate {:?}", predicate.clauses());
        Ok(predicate)
    }
}

/// One page of events matching `predicate`, counted and fetched concurrently.
pub async fn search_events(
    store: &dyn DiscoveryStore,
    predicate: &EventPredicate,
    order: EventOrder,
    page: PageRequest,
) -> Result<Page<EventView>, SearchError> {
    let window = Window::new(page.offset(), u64::from(page.limit));
    let (total, events) = tokio::try_join!(
        store.count_events(predicate),
        store.find_events(predicate, order, Some(window)),
    )?;
    debug!("Search matched {total} event(s), returning {}", events.len());

    Ok(Page {
        events: events.into_iter().map(EventView::from).collect(),
        pagination: Pagination::new(page.page, page.limit, total),
    })
}
