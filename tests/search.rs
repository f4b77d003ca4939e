use sportmeet::utils::events::models::{Event, EventStatus};
use sportmeet::utils::pagination::PageRequest;
use sportmeet::utils::search::errors::SearchError;
use sportmeet::utils::search::{search_events, EventOrder, SearchQueryBuilder};
use time::macros::date;
use tracing_test::traced_test;
use uuid::Uuid;

use crate::tools::*;


const FIRST_PAGE: PageRequest = PageRequest {
    page: 1,
    limit: 200,
};

fn ids(events: &[sportmeet::utils::events::models::EventView]) -> Vec<Uuid> {
    events.iter().map(|e| e.event.id).collect()
}

struct Listing {
    store: FakeStore,
    doubles: Event,
    league: Event,
    run: Event,
    canceled: Event,
}

fn listing() -> Listing {
    let (tennis, football) = (sport("Tennis"), sport("Football"));

    let mut doubles = event("Sunday Doubles", Some(&tennis), date!(2024 - 06 - 09));
    doubles.location.name = "Moda Tennis Club".into();
    doubles.max_participants = 4;
    let mut league = event("Office league", Some(&football), date!(2024 - 06 - 05));
    league.description = Some("Bring running shoes".into());
    league.max_participants = 14;
    let mut run = event("Morning run", None, date!(2024 - 06 - 02));
    run.location.name = "Caddebostan coast".into();
    run.max_participants = 40;
    let mut canceled = event("Rained out doubles", Some(&tennis), date!(2024 - 06 - 03));
    canceled.status = EventStatus::Canceled;

    Listing {
        store: FakeStore::new().with_events([
            doubles.clone(),
            league.clone(),
            run.clone(),
            canceled.clone(),
        ]),
        doubles,
        league,
        run,
        canceled,
    }
}

#[tokio::test]
#[traced_test]
async fn default_search_lists_active_events_by_date() {
    let l = listing();
    let predicate = SearchQueryBuilder::new().build().unwrap();

    let page = search_events(&l.store, &predicate, EventOrder::default(), FIRST_PAGE)
        .await
        .unwrap();

    assert_eq!(ids(&page.events), vec![l.run.id, l.league.id, l.doubles.id]);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.events[2].spots_left, 4);
}

#[tokio::test]
#[traced_test]
async fn keyword_matches_title_description_and_location() {
    let l = listing();
    let predicate = SearchQueryBuilder::new()
        .keyword(Some("  RUN ".into()))
        .build()
        .unwrap();

    let page = search_events(&l.store, &predicate, EventOrder::DateDesc, FIRST_PAGE)
        .await
        .unwrap();

    assert_eq!(ids(&page.events), vec![l.league.id, l.run.id]);
}

#[tokio::test]
#[traced_test]
async fn filters_combine() {
    let l = listing();
    let predicate = SearchQueryBuilder::new()
        .status(Some("all"))
        .unwrap()
        .sport(l.doubles.sport_id())
        .dates(Some(date!(2024 - 06 - 01)), Some(date!(2024 - 06 - 30)))
        .participants(None, Some(10))
        .build()
        .unwrap();

    let page = search_events(&l.store, &predicate, EventOrder::DateAsc, FIRST_PAGE)
        .await
        .unwrap();

    assert_eq!(ids(&page.events), vec![l.canceled.id, l.doubles.id]);

    let predicate = SearchQueryBuilder::new()
        .location_name(Some("coast".into()))
        .participants(Some(20), None)
        .build()
        .unwrap();
    let page = search_events(&l.store, &predicate, EventOrder::DateAsc, FIRST_PAGE)
        .await
        .unwrap();
    assert_eq!(ids(&page.events), vec![l.run.id]);
}

#[tokio::test]
#[traced_test]
async fn pagination_counts_every_match() {
    let l = listing();
    let predicate = SearchQueryBuilder::new().build().unwrap();

    let page = search_events(
        &l.store,
        &predicate,
        EventOrder::DateAsc,
        PageRequest { page: 2, limit: 2 },
    )
    .await
    .unwrap();

    assert_eq!(ids(&page.events), vec![l.doubles.id]);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.pagination.page, 2);
}

#[tokio::test]
#[traced_test]
async fn inverted_ranges_are_rejected() {
    let result = SearchQueryBuilder::new()
        .dates(Some(date!(2024 - 06 - 30)), Some(date!(2024 - 06 - 01)))
        .build();

    assert!(matches!(
        result,
        Err(SearchError::InvalidField {
            field: "start_date",
            ..
        })
    ));
}

#[tokio::test]
#[traced_test]
async fn store_failure_surfaces_as_unexpected() {
    let store = FakeStore::new().fail_events();
    let predicate = SearchQueryBuilder::new().build().unwrap();

    let result = search_events(&store, &predicate, EventOrder::DateAsc, FIRST_PAGE).await;

    assert!(matches!(result, Err(SearchError::Unexpected(_))));
}
