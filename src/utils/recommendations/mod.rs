pub mod errors;
pub mod models;

use crate::utils::distance::models::Destination;
use crate::utils::distance::{rank_by_distance, DistanceRefinement};
use crate::utils::events::geo::{haversine_km, round2};
use crate::utils::events::models::{
    Event, EventStatus, FriendSummary, GeoPoint, SkillLevel, SportPreference,
};
use crate::utils::pagination::paginate;
use crate::utils::recommendations::errors::RecommendationError;
use crate::utils::recommendations::models::{
    FriendParticipationReason, RecommendationReason, RecommendationRequest, Recommendations,
    RecommendedEvent, Signals, SportPreferenceReason,
};
use crate::utils::search::{Clause, EventOrder, EventPredicate, Window};
use crate::utils::store::DiscoveryStore;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

pub const NO_SIGNALS_MESSAGE: &str =
    "Add sport preferences or connect with friends to get personalized event recommendations";
pub const BACKFILL_SPORT_NAME: &str = "Other Event";
/// Friends listed per candidate.
pub const LISTED_FRIENDS: usize = 3;

struct Candidate {
    event: Event,
    sport: Option<SportPreferenceReason>,
    friends: Option<FriendParticipationReason>,
}

impl Candidate {
    fn into_recommended(self) -> Option<(Event, RecommendationReason)> {
        RecommendationReason::from_parts(self.sport, self.friends).map(|r| (self.event, r))
    }
}

/// Upcoming active events the user neither organises nor joined.
fn open_to(user_id: Uuid, today: Date, sport: Option<Uuid>) -> EventPredicate {
    EventPredicate::new()
        .and(Clause::Status(EventStatus::Active))
        .and(Clause::DateFrom(today))
        .and_maybe(sport.map(Clause::Sport))
        .and(Clause::NotOwnedBy(user_id))
        .and(Clause::NotJoinedBy(user_id))
}

fn sport_name_of(event: &Event) -> Option<String> {
    event.sport.as_ref().map(|s| s.name.clone())
}

/// Turns a user's sport preferences and friends into a ranked list of events.
pub struct RecommendationAggregator<'a> {
    store: &'a dyn DiscoveryStore,
    distance: Option<&'a DistanceRefinement>,
}

impl<'a> RecommendationAggregator<'a> {
    pub fn new(store: &'a dyn DiscoveryStore, distance: Option<&'a DistanceRefinement>) -> Self {
        Self { store, distance }
    }

    pub async fn recommend(
        &self,
        user_id: Uuid,
        request: &RecommendationRequest,
        today: Date,
    ) -> Result<Recommendations, RecommendationError> {
        let (preferences, friends, location) = tokio::try_join!(
            self.store.sport_preferences(user_id),
            self.store.friend_ids(user_id),
            self.store.default_location(user_id),
        )?;
        let signals = Signals {
            sport_preferences: preferences.len(),
            friends: friends.len(),
            has_location: location.is_some(),
        };
        debug!("Signals for user {user_id}: {signals:?}");

        if preferences.is_empty() && friends.is_empty() {
            return Ok(Recommendations {
                page: paginate(vec![], request.page),
                signals,
                message: Some(NO_SIGNALS_MESSAGE),
            });
        }

        let (by_sport, by_friends) = tokio::join!(
            self.sport_candidates(user_id, &preferences, request, today),
            self.friend_candidates(user_id, &friends, request, today),
        );
        debug!(
            "Candidates: {} by sport, {} by friends",
            by_sport.len(),
            by_friends.len()
        );

        let mut candidates = merge(by_sport, by_friends, request.only_friends);
        if !request.only_friends && candidates.len() < request.min_event_count {
            let shortfall = request.min_event_count - candidates.len();
            let backfill = self
                .backfill(user_id, &candidates, shortfall, request, today)
                .await;
            debug!("Backfilled {} of {shortfall} missing event(s)", backfill.len());
            candidates.extend(backfill);
        }

        let recommended: Vec<_> = candidates
            .into_iter()
            .filter_map(Candidate::into_recommended)
            .collect();
        let ranked = self.rank(recommended, location, request).await;

        Ok(Recommendations {
            page: paginate(ranked, request.page),
            signals,
            message: None,
        })
    }

    async fn sport_candidates(
        &self,
        user_id: Uuid,
        preferences: &[SportPreference],
        request: &RecommendationRequest,
        today: Date,
    ) -> Vec<(Event, SportPreferenceReason)> {
        if request.only_friends {
            return vec![];
        }

        let fetches = preferences
            .iter()
            .filter(|p| request.sport_category.map_or(true, |s| s == p.sport_id))
            .map(|preference| async move {
                let predicate = open_to(user_id, today, Some(preference.sport_id));
                let result = self
                    .store
                    .find_events(&predicate, EventOrder::DateAsc, None)
                    .await;
                (preference, result)
            });

        let mut seen = HashSet::new();
        let mut candidates = vec![];
        for (preference, result) in join_all(fetches).await {
            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    warn!(
                        "Skipping events for sport {}: {e:?}",
                        preference.sport_id
                    );
                    continue;
                }
            };
            for event in events {
                if !seen.insert(event.id) {
                    continue;
                }
                let reason = SportPreferenceReason {
                    sport_id: Some(preference.sport_id),
                    sport_name: preference
                        .sport_name
                        .clone()
                        .or_else(|| sport_name_of(&event))
                        .unwrap_or_default(),
                    skill_level: preference.skill_level.unwrap_or(SkillLevel::Intermediate),
                };
                candidates.push((event, reason));
            }
        }
        candidates
    }

    async fn friend_candidates(
        &self,
        user_id: Uuid,
        friends: &[Uuid],
        request: &RecommendationRequest,
        today: Date,
    ) -> Vec<(Event, FriendParticipationReason)> {
        if friends.is_empty() {
            return vec![];
        }

        let predicate = open_to(user_id, today, request.sport_category)
            .and(Clause::JoinedByAnyOf(friends.to_vec()));
        let events = match self
            .store
            .find_events(&predicate, EventOrder::DateAsc, None)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!("Skipping friend events: {e:?}");
                return vec![];
            }
        };
        if events.is_empty() {
            return vec![];
        }

        let event_ids: Vec<_> = events.iter().map(|e| e.id).collect();
        let participants = match self.store.participants(&event_ids, friends).await {
            Ok(participants) => participants,
            Err(e) => {
                warn!("Skipping friend events, participants unavailable: {e:?}");
                return vec![];
            }
        };

        let mut by_event: HashMap<Uuid, Vec<FriendSummary>> = HashMap::new();
        for participant in participants {
            by_event
                .entry(participant.event_id)
                .or_default()
                .push(participant.user);
        }

        events
            .into_iter()
            .filter_map(|event| {
                let mut friends = by_event.remove(&event.id)?;
                let friend_count = friends.len();
                friends.truncate(LISTED_FRIENDS);
                Some((
                    event,
                    FriendParticipationReason {
                        friend_count,
                        friends,
                    },
                ))
            })
            .collect()
    }

    async fn backfill(
        &self,
        user_id: Uuid,
        present: &[Candidate],
        shortfall: usize,
        request: &RecommendationRequest,
        today: Date,
    ) -> Vec<Candidate> {
        let present: Vec<Uuid> = present.iter().map(|c| c.event.id).collect();
        let predicate = EventPredicate::new()
            .and(Clause::Status(EventStatus::Active))
            .and(Clause::DateFrom(today))
            .and(Clause::PublicOnly)
            .and_maybe(request.sport_category.map(Clause::Sport))
            .and(Clause::NotJoinedBy(user_id))
            .and(Clause::ExcludeIds(present.clone()));

        let events = match self
            .store
            .find_events(
                &predicate,
                EventOrder::DateAsc,
                Some(Window::first(shortfall as u64)),
            )
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!("Skipping backfill: {e:?}");
                return vec![];
            }
        };

        events
            .into_iter()
            .filter(|event| !present.contains(&event.id))
            .take(shortfall)
            .map(|event| Candidate {
                sport: Some(SportPreferenceReason {
                    sport_id: event.sport_id(),
                    sport_name: sport_name_of(&event)
                        .unwrap_or_else(|| BACKFILL_SPORT_NAME.to_string()),
                    skill_level: SkillLevel::Beginner,
                }),
                friends: None,
                event,
            })
            .collect()
    }

    async fn rank(
        &self,
        recommended: Vec<(Event, RecommendationReason)>,
        location: Option<GeoPoint>,
        request: &RecommendationRequest,
    ) -> Vec<RecommendedEvent> {
        let Some(origin) = location else {
            let mut recommended = recommended;
            recommended.sort_by(|(a, _), (b, _)| {
                a.event_date.cmp(&b.event_date).then_with(|| a.id.cmp(&b.id))
            });
            return recommended
                .into_iter()
                .map(|(event, reason)| RecommendedEvent {
                    event: event.into(),
                    recommendation_reason: reason,
                    distance_km: None,
                    distance: None,
                })
                .collect();
        };

        let annotations = match self.distance {
            Some(distance) if request.use_distance_matrix => {
                let destinations: Vec<_> = recommended
                    .iter()
                    .map(|(event, _)| Destination {
                        event_id: event.id,
                        point: event.location.point(),
                    })
                    .collect();
                distance.annotations(origin, &destinations).await
            }
            _ => None,
        };

        let with_km = |event: Event, reason, distance| RecommendedEvent {
            distance_km: Some(round2(haversine_km(origin, event.location.point()))),
            event: event.into(),
            recommendation_reason: reason,
            distance,
        };

        match annotations {
            Some(annotations) => {
                rank_by_distance(recommended, |(event, _)| event.id, annotations, None)
                    .into_iter()
                    .map(|((event, reason), distance)| with_km(event, reason, distance))
                    .collect()
            }
            None => {
                let mut ranked: Vec<_> = recommended
                    .into_iter()
                    .map(|(event, reason)| with_km(event, reason, None))
                    .collect();
                ranked.sort_by(|a, b| {
                    let a_km = a.distance_km.unwrap_or(f64::MAX);
                    let b_km = b.distance_km.unwrap_or(f64::MAX);
                    a_km.total_cmp(&b_km)
                        .then_with(|| a.event.event.id.cmp(&b.event.event.id))
                });
                ranked
            }
        }
    }
}

/// Sport candidates first, friend candidates either upgrade an existing entry or follow it.
fn merge(
    by_sport: Vec<(Event, SportPreferenceReason)>,
    by_friends: Vec<(Event, FriendParticipationReason)>,
    only_friends: bool,
) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = if only_friends {
        vec![]
    } else {
        by_sport
            .into_iter()
            .map(|(event, sport)| Candidate {
                event,
                sport: Some(sport),
                friends: None,
            })
            .collect()
    };
    let mut index: HashMap<Uuid, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, c)| (c.event.id, i))
        .collect();

    for (event, friends) in by_friends {
        match index.get(&event.id) {
            Some(&i) => merged[i].friends = Some(friends),
            None => {
                index.insert(event.id, merged.len());
                merged.push(Candidate {
                    event,
                    sport: None,
                    friends: Some(friends),
                });
            }
        }
    }
    merged
}
