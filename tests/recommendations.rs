use sportmeet::utils::distance::DistanceRefinement;
use sportmeet::utils::events::models::{EventStatus, SkillLevel};
use sportmeet::utils::pagination::PageRequest;
use sportmeet::utils::recommendations::errors::RecommendationError;
use sportmeet::utils::recommendations::models::{
    RecommendationReason, RecommendationRequest, Recommendations,
};
use sportmeet::utils::recommendations::{
    RecommendationAggregator, BACKFILL_SPORT_NAME, NO_SIGNALS_MESSAGE,
};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use time::macros::date;
use tracing_test::traced_test;
use uuid::Uuid;

use crate::tools::*;


fn request() -> RecommendationRequest {
    RecommendationRequest {
        only_friends: false,
        sport_category: None,
        min_event_count: 0,
        use_distance_matrix: false,
        page: PageRequest {
            page: 1,
            limit: 200,
        },
    }
}

async fn recommend(
    store: &FakeStore,
    user_id: Uuid,
    request: RecommendationRequest,
) -> Recommendations {
    RecommendationAggregator::new(store, None)
        .recommend(user_id, &request, TODAY)
        .await
        .unwrap()
}

fn ids_and_kinds(recommendations: &Recommendations) -> Vec<(Uuid, &'static str)> {
    recommendations
        .page
        .events
        .iter()
        .map(|r| (r.event.event.id, r.recommendation_reason.kind()))
        .collect()
}

#[tokio::test]
#[traced_test]
async fn zero_signals_is_an_empty_success_with_guidance() {
    let me = user("me");
    let store = FakeStore::new().with_event(event("Open run", None, date!(2024 - 06 - 02)));

    let recommendations = recommend(&store, me.id, RecommendationRequest {
        min_event_count: 5,
        ..request()
    })
    .await;

    assert!(recommendations.page.events.is_empty());
    assert_eq!(recommendations.page.pagination.total, 0);
    assert_eq!(recommendations.message, Some(NO_SIGNALS_MESSAGE));
    assert_eq!(recommendations.signals.sport_preferences, 0);
    assert_eq!(recommendations.signals.friends, 0);
}

#[tokio::test]
#[traced_test]
async fn sport_and_friend_candidates_are_merged() {
    let (me, ada) = (user("me"), user("Ada"));
    let (tennis, football) = (sport("Tennis"), sport("Football"));
    let morning = event("Morning tennis", Some(&tennis), date!(2024 - 06 - 03));
    let evening = event("Evening tennis", Some(&tennis), date!(2024 - 06 - 05));
    let five_a_side = event("Five-a-side", Some(&football), date!(2024 - 06 - 04));

    let store = FakeStore::new()
        .with_events([morning.clone(), evening.clone(), five_a_side.clone()])
        .prefer(me.id, &tennis, Some(SkillLevel::Advanced))
        .befriend(me.id, ada.id)
        .join(five_a_side.id, &ada);

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![
            (morning.id, "sport_preference"),
            (five_a_side.id, "friend_participation"),
            (evening.id, "sport_preference"),
        ]
    );
    assert!(recommendations.message.is_none());
    match &recommendations.page.events[0].recommendation_reason {
        RecommendationReason::SportPreference(reason) => {
            assert_eq!(reason.sport_id, Some(tennis.id));
            assert_eq!(reason.sport_name, "Tennis");
            assert_eq!(reason.skill_level, SkillLevel::Advanced);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}

#[tokio::test]
#[traced_test]
async fn event_found_by_both_sources_is_tagged_both() {
    let (me, ada) = (user("me"), user("Ada"));
    let tennis = sport("Tennis");
    let morning = event("Morning tennis", Some(&tennis), date!(2024 - 06 - 03));
    let evening = event("Evening tennis", Some(&tennis), date!(2024 - 06 - 05));

    let store = FakeStore::new()
        .with_events([morning.clone(), evening.clone()])
        .prefer(me.id, &tennis, None)
        .befriend(ada.id, me.id)
        .join(evening.id, &ada);

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(morning.id, "sport_preference"), (evening.id, "both")]
    );
    match &recommendations.page.events[1].recommendation_reason {
        RecommendationReason::Both {
            sport_preference,
            friend_participation,
        } => {
            assert_eq!(sport_preference.skill_level, SkillLevel::Intermediate);
            assert_eq!(friend_participation.friend_count, 1);
            assert_eq!(friend_participation.friends, vec![ada.clone()]);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}

#[tokio::test]
#[traced_test]
async fn friends_only_mode_never_yields_sport_tags() {
    let (me, ada) = (user("me"), user("Ada"));
    let tennis = sport("Tennis");
    let morning = event("Morning tennis", Some(&tennis), date!(2024 - 06 - 03));
    let evening = event("Evening tennis", Some(&tennis), date!(2024 - 06 - 05));
    let open = event("Open run", None, date!(2024 - 06 - 06));

    let store = FakeStore::new()
        .with_events([morning, evening.clone(), open])
        .prefer(me.id, &tennis, None)
        .befriend(me.id, ada.id)
        .join(evening.id, &ada);

    let recommendations = recommend(&store, me.id, RecommendationRequest {
        only_friends: true,
        min_event_count: 5,
        ..request()
    })
    .await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(evening.id, "friend_participation")]
    );
}

#[tokio::test]
#[traced_test]
async fn friend_list_is_capped_but_counted() {
    let me = user("me");
    let friends: Vec<_> = (0..5).map(|i| user(&format!("friend {i}"))).collect();
    let match_day = event("Match day", None, date!(2024 - 06 - 08));

    let store = friends.iter().fold(
        FakeStore::new().with_event(match_day.clone()),
        |store, friend| store.befriend(me.id, friend.id).join(match_day.id, friend),
    );

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(recommendations.page.events.len(), 1);
    match &recommendations.page.events[0].recommendation_reason {
        RecommendationReason::FriendParticipation(reason) => {
            assert_eq!(reason.friend_count, 5);
            assert_eq!(reason.friends.len(), 3);
        }
        other => panic!("unexpected reason {other:?}"),
    }
    assert_eq!(recommendations.page.events[0].event.event.current_participants, 5);
}

#[tokio::test]
#[traced_test]
async fn own_joined_past_and_inactive_events_are_skipped() {
    let (me, ada) = (user("me"), user("Ada"));
    let tennis = sport("Tennis");

    let mut own = event("My tennis", Some(&tennis), date!(2024 - 06 - 03));
    own.owner_id = me.id;
    let joined = event("Joined tennis", Some(&tennis), date!(2024 - 06 - 04));
    let past = event("Last month tennis", Some(&tennis), date!(2024 - 05 - 01));
    let mut canceled = event("Rained out", Some(&tennis), date!(2024 - 06 - 06));
    canceled.status = EventStatus::Canceled;
    let today = event("Today tennis", Some(&tennis), TODAY);

    let store = FakeStore::new()
        .with_events([own.clone(), joined.clone(), past, canceled, today.clone()])
        .prefer(me.id, &tennis, None)
        .befriend(me.id, ada.id)
        .join(own.id, &ada)
        .join(joined.id, &ada)
        .join(joined.id, &me);

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(today.id, "sport_preference")]
    );
}

#[tokio::test]
#[traced_test]
async fn backfill_tops_up_with_public_events_only_once() {
    let me = user("me");
    let (tennis, football) = (sport("Tennis"), sport("Football"));
    let preferred = event("Club tennis", Some(&tennis), date!(2024 - 06 - 03));
    let kickabout = event("Kickabout", Some(&football), date!(2024 - 06 - 02));
    let open_run = event("Open run", None, date!(2024 - 06 - 10));
    let late = event("Late league", Some(&football), date!(2024 - 06 - 20));
    let latest = event("Season final", Some(&football), date!(2024 - 06 - 30));
    let mut private = event("Invite only", Some(&football), date!(2024 - 06 - 02));
    private.is_private = true;
    private.invitation_code = Some("CODE".into());
    let joined = event("Already in", None, date!(2024 - 06 - 02));

    let store = FakeStore::new()
        .with_events([
            preferred.clone(),
            kickabout.clone(),
            open_run.clone(),
            late.clone(),
            latest,
            private,
            joined.clone(),
        ])
        .prefer(me.id, &tennis, Some(SkillLevel::Expert))
        .join(joined.id, &me);

    let recommendations = recommend(&store, me.id, RecommendationRequest {
        min_event_count: 4,
        ..request()
    })
    .await;

    let ids: Vec<_> = ids_and_kinds(&recommendations)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![kickabout.id, preferred.id, open_run.id, late.id]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());

    let reason_of = |id: Uuid| {
        recommendations
            .page
            .events
            .iter()
            .find(|r| r.event.event.id == id)
            .map(|r| r.recommendation_reason.clone())
            .unwrap()
    };
    match reason_of(open_run.id) {
        RecommendationReason::SportPreference(reason) => {
            assert_eq!(reason.sport_name, BACKFILL_SPORT_NAME);
            assert_eq!(reason.skill_level, SkillLevel::Beginner);
            assert_eq!(reason.sport_id, None);
        }
        other => panic!("unexpected reason {other:?}"),
    }
    match reason_of(kickabout.id) {
        RecommendationReason::SportPreference(reason) => {
            assert_eq!(reason.sport_name, "Football");
            assert_eq!(reason.skill_level, SkillLevel::Beginner);
        }
        other => panic!("unexpected reason {other:?}"),
    }
    match reason_of(preferred.id) {
        RecommendationReason::SportPreference(reason) => {
            assert_eq!(reason.skill_level, SkillLevel::Expert);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}

#[tokio::test]
#[traced_test]
async fn failing_sport_query_only_drops_its_own_candidates() {
    let me = user("me");
    let (tennis, padel) = (sport("Tennis"), sport("Padel"));
    let club = event("Club tennis", Some(&tennis), date!(2024 - 06 - 03));
    let court = event("Padel court", Some(&padel), date!(2024 - 06 - 04));

    let store = FakeStore::new()
        .with_events([club.clone(), court])
        .prefer(me.id, &tennis, None)
        .prefer(me.id, &padel, None)
        .fail_sport(padel.id);

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(club.id, "sport_preference")]
    );
}

/// Tennis preference with one club event, plus a friend in a football match.
fn club_and_friend() -> (FakeStore, Uuid, Uuid) {
    let (me, ada) = (user("me"), user("Ada"));
    let (tennis, football) = (sport("Tennis"), sport("Football"));
    let club = event("Club tennis", Some(&tennis), date!(2024 - 06 - 03));
    let five_a_side = event("Five-a-side", Some(&football), date!(2024 - 06 - 04));
    let open_run = event("Open run", None, date!(2024 - 06 - 05));

    let store = FakeStore::new()
        .with_events([club.clone(), five_a_side.clone(), open_run])
        .prefer(me.id, &tennis, None)
        .befriend(me.id, ada.id)
        .join(five_a_side.id, &ada)
        .join(club.id, &ada);
    (store, me.id, club.id)
}

#[tokio::test]
#[traced_test]
async fn failing_friend_query_keeps_sport_candidates() {
    let (store, me, club) = club_and_friend();

    let recommendations = recommend(&store.fail_friend_events(), me, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(club, "sport_preference")]
    );
    assert_eq!(recommendations.signals.friends, 1);
}

#[tokio::test]
#[traced_test]
async fn failing_participant_lookup_keeps_sport_candidates() {
    let (store, me, club) = club_and_friend();

    let recommendations = recommend(&store.fail_participants(), me, request()).await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![(club, "sport_preference")]
    );
}

#[tokio::test]
#[traced_test]
async fn failing_backfill_leaves_the_merged_set() {
    let (store, me, club) = club_and_friend();
    let request = RecommendationRequest {
        min_event_count: 5,
        ..request()
    };

    let topped_up = recommend(&store, me, request).await;
    assert_eq!(topped_up.page.pagination.total, 3);

    let recommendations = recommend(&store.fail_backfill(), me, request).await;

    let kinds = ids_and_kinds(&recommendations);
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0], (club, "both"));
    assert_eq!(kinds[1].1, "friend_participation");
}

#[tokio::test]
#[traced_test]
async fn unreadable_signals_fail_the_request() {
    let me = user("me");
    let store = FakeStore::new().fail_signals();

    let result = RecommendationAggregator::new(&store, None)
        .recommend(me.id, &request(), TODAY)
        .await;

    assert!(matches!(result, Err(RecommendationError::Unexpected(_))));
}

#[tokio::test]
#[traced_test]
async fn sport_category_narrows_every_source() {
    let (me, ada) = (user("me"), user("Ada"));
    let (tennis, football) = (sport("Tennis"), sport("Football"));
    let club = event("Club tennis", Some(&tennis), date!(2024 - 06 - 03));
    let five_a_side = event("Five-a-side", Some(&football), date!(2024 - 06 - 04));
    let league = event("League night", Some(&football), date!(2024 - 06 - 05));

    let store = FakeStore::new()
        .with_events([club, five_a_side.clone(), league.clone()])
        .prefer(me.id, &tennis, None)
        .befriend(me.id, ada.id)
        .join(five_a_side.id, &ada);

    let recommendations = recommend(&store, me.id, RecommendationRequest {
        sport_category: Some(football.id),
        min_event_count: 2,
        ..request()
    })
    .await;

    assert_eq!(
        ids_and_kinds(&recommendations),
        vec![
            (five_a_side.id, "friend_participation"),
            (league.id, "sport_preference"),
        ]
    );
}

#[tokio::test]
#[traced_test]
async fn stored_location_ranks_by_distance_then_id() {
    let me = user("me");
    let tennis = sport("Tennis");
    let far = event_at("Far", date!(2024 - 06 - 02), offset_km(ISTANBUL, 90.0, 5.0));
    let near = event_at("Near", date!(2024 - 06 - 09), offset_km(ISTANBUL, 0.0, 1.0));
    let twin_a = event_at("Twin A", date!(2024 - 06 - 03), offset_km(ISTANBUL, 180.0, 3.0));
    let mut twin_b = twin_a.clone();
    twin_b.id = Uuid::new_v4();
    twin_b.title = "Twin B".into();

    let store = [&far, &near, &twin_a, &twin_b]
        .into_iter()
        .fold(FakeStore::new(), |store, event| {
            let mut event = (*event).clone();
            event.sport = Some(tennis.clone());
            store.with_event(event)
        })
        .prefer(me.id, &tennis, None)
        .locate(me.id, ISTANBUL);

    let recommendations = recommend(&store, me.id, request()).await;

    let (first_twin, second_twin) = if twin_a.id < twin_b.id {
        (twin_a.id, twin_b.id)
    } else {
        (twin_b.id, twin_a.id)
    };
    let ids: Vec<_> = ids_and_kinds(&recommendations)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![near.id, first_twin, second_twin, far.id]);

    let km: Vec<_> = recommendations
        .page
        .events
        .iter()
        .map(|r| r.distance_km.unwrap())
        .collect();
    assert_eq!(km, vec![1.0, 3.0, 3.0, 5.0]);
    assert!(recommendations.signals.has_location);
}

#[tokio::test]
#[traced_test]
async fn repeated_runs_give_identical_results() {
    let (me, ada, bo) = (user("me"), user("Ada"), user("Bo"));
    let tennis = sport("Tennis");
    let events: Vec<_> = (1..=6)
        .map(|day| {
            event(
                &format!("Session {day}"),
                Some(&tennis),
                date!(2024 - 06 - 01) + time::Duration::days(day % 3),
            )
        })
        .collect();

    let store = FakeStore::new()
        .with_events(events.clone())
        .with_event(event("Open run", None, date!(2024 - 06 - 02)))
        .prefer(me.id, &tennis, None)
        .befriend(me.id, ada.id)
        .befriend(bo.id, me.id)
        .join(events[0].id, &ada)
        .join(events[0].id, &bo)
        .join(events[3].id, &bo);

    let request = RecommendationRequest {
        min_event_count: 10,
        ..request()
    };
    let first = recommend(&store, me.id, request).await;
    let second = recommend(&store, me.id, request).await;

    assert_eq!(first, second);
    assert_eq!(first.page.pagination.total, 7);
}

#[tokio::test]
#[traced_test]
async fn pagination_reports_the_ranked_total() {
    let me = user("me");
    let tennis = sport("Tennis");
    let events: Vec<_> = (1..=7)
        .map(|day| {
            event(
                &format!("Session {day}"),
                Some(&tennis),
                TODAY + time::Duration::days(day),
            )
        })
        .collect();
    let store = FakeStore::new()
        .with_events(events.clone())
        .prefer(me.id, &tennis, None);

    let paged = |page| RecommendationRequest {
        page: PageRequest { page, limit: 3 },
        ..request()
    };

    let last = recommend(&store, me.id, paged(3)).await;
    assert_eq!(last.page.pagination.total, 7);
    assert_eq!(last.page.pagination.total_pages, 3);
    assert_eq!(
        ids_and_kinds(&last),
        vec![(events[6].id, "sport_preference")]
    );

    let beyond = recommend(&store, me.id, paged(4)).await;
    assert!(beyond.page.events.is_empty());
    assert_eq!(beyond.page.pagination.total, 7);
}

#[tokio::test]
#[traced_test]
async fn distance_matrix_ranking_uses_travel_distance() {
    let me = user("me");
    let tennis = sport("Tennis");
    let mut close = event_at("Close", date!(2024 - 06 - 02), offset_km(ISTANBUL, 0.0, 1.0));
    close.sport = Some(tennis.clone());
    let mut across = event_at(
        "Across the bridge",
        date!(2024 - 06 - 03),
        offset_km(ISTANBUL, 90.0, 4.0),
    );
    across.sport = Some(tennis.clone());

    let store = FakeStore::new()
        .with_events([close.clone(), across.clone()])
        .prefer(me.id, &tennis, None)
        .locate(me.id, ISTANBUL);

    let estimator = Arc::new(FixedEstimator::new([(close.id, 40_000), (across.id, 5_000)]));
    let distance = DistanceRefinement::new(estimator.clone(), Duration::from_millis(200));
    let request = RecommendationRequest {
        use_distance_matrix: true,
        ..request()
    };

    let recommendations = RecommendationAggregator::new(&store, Some(&distance))
        .recommend(me.id, &request, TODAY)
        .await
        .unwrap();

    let ids: Vec<_> = ids_and_kinds(&recommendations)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![across.id, close.id]);
    let annotation = recommendations.page.events[1].distance.as_ref().unwrap();
    assert_eq!(annotation.distance_meters, 40_000);
    assert_eq!(estimator.calls.load(Ordering::SeqCst), 1);

    let failing = refinement(FailingEstimator);
    let fallback = RecommendationAggregator::new(&store, Some(&failing))
        .recommend(me.id, &request, TODAY)
        .await
        .unwrap();
    let ids: Vec<_> = ids_and_kinds(&fallback)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![close.id, across.id]);
    assert!(fallback.page.events.iter().all(|r| r.distance.is_none()));
}

#[tokio::test]
#[traced_test]
async fn friendship_stored_both_ways_counts_once() {
    let (me, ada) = (user("me"), user("Ada"));
    let match_day = event("Match day", None, date!(2024 - 06 - 08));
    let store = FakeStore::new()
        .with_event(match_day.clone())
        .befriend(me.id, ada.id)
        .befriend(ada.id, me.id)
        .join(match_day.id, &ada);

    let recommendations = recommend(&store, me.id, request()).await;

    assert_eq!(recommendations.signals.friends, 1);
    match &recommendations.page.events[0].recommendation_reason {
        RecommendationReason::FriendParticipation(reason) => {
            assert_eq!(reason.friend_count, 1);
            assert_eq!(reason.friends, vec![ada.clone()]);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}
