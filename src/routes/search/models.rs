use crate::config::discovery::DiscoverySettings;
use crate::utils::events::models::EventView;
use crate::utils::pagination::{Page, PageRequest, Pagination};
use crate::utils::search::errors::SearchError;
use crate::utils::search::{EventOrder, EventPredicate, SearchQueryBuilder};
use crate::validation::{parse_date, parse_field};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchEventsQuery {
    /// Matched against title, description and location name
    pub keyword: Option<String>,
    pub sport_id: Option<String>,
    /// Event status, defaults to `active`; `all` lists every status
    pub status: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    pub end_date: Option<String>,
    /// Lower bound on event capacity
    pub min_participants: Option<String>,
    /// Upper bound on event capacity
    pub max_participants: Option<String>,
    pub location_name: Option<String>,
    /// `asc` (default) or `desc` on event date
    pub order: Option<String>,
    pub page: Option<String>,
    /// Defaults to 200
    pub limit: Option<String>,
}

pub struct EventSearch {
    pub predicate: EventPredicate,
    pub order: EventOrder,
    pub page: PageRequest,
}

impl SearchEventsQuery {
    pub fn into_search(self, defaults: &DiscoverySettings) -> Result<EventSearch, SearchError> {
        let predicate = SearchQueryBuilder::new()
            .keyword(self.keyword)
            .sport(parse_field::<Uuid>("sport_id", self.sport_id.as_deref())?)
            .status(self.status.as_deref())?
            .dates(
                parse_date("start_date", self.start_date.as_deref())?,
                parse_date("end_date", self.end_date.as_deref())?,
            )
            .participants(
                parse_field("min_participants", self.min_participants.as_deref())?,
                parse_field("max_participants", self.max_participants.as_deref())?,
            )
            .location_name(self.location_name)
            .build()?;

        Ok(EventSearch {
            predicate,
            order: parse_field("order", self.order.as_deref())?.unwrap_or_default(),
            page: PageRequest::parse(
                self.page.as_deref(),
                self.limit.as_deref(),
                defaults.listing_limit,
            )?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchData {
    pub events: Vec<EventView>,
    pub pagination: Pagination,
}

impl From<Page<EventView>> for SearchData {
    fn from(page: Page<EventView>) -> Self {
        Self {
            events: page.events,
            pagination: page.pagination,
        }
    }
}
