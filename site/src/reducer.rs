//! Reducers of the site store.
//!
//! [`SiteReducer`] combines three concerns that all see every action:
//!
//! - the entity cache absorbs normalized success payloads
//! - the status board tracks loading and error flags per family
//! - navigation turns `OpenPage` into a page fetch when the page is missing

use crate::actions::{self, ApiRoutes};
use crate::selectors;
use crate::status::StatusReducer;
use crate::types::{SiteAction, SiteState};
use press_api::{ApiOutcome, Payload};
use press_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use press_core::environment::Clock;
use press_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde_json::Value;
use std::sync::Arc;

/// Environment dependencies for the site reducers
#[derive(Clone)]
pub struct SiteEnvironment {
    /// Clock for request status timestamps
    pub clock: Arc<dyn Clock>,
    /// Route prefixes used when building descriptors
    pub routes: ApiRoutes,
}

impl SiteEnvironment {
    /// Creates a new `SiteEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, routes: ApiRoutes) -> Self {
        Self { clock, routes }
    }
}

/// Stores normalized success payloads in the entity cache
#[derive(Clone, Debug, Default)]
pub struct CacheReducer;

impl Reducer for CacheReducer {
    type State = SiteState;
    type Action = SiteAction;
    type Environment = SiteEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let SiteAction::Api(action) = action else {
            return smallvec![Effect::None];
        };

        let family = action.split_type().0.to_string();
        if let ApiOutcome::Success {
            response: Payload::Normalized(normalized),
            ..
        } = action.outcome
        {
            // Lists replace the family's listing; single lookups only refresh records
            if matches!(normalized.result, Value::Array(_)) {
                state.cache.record_listing(&family, normalized.result_ids());
            }
            tracing::trace!(family = %family, kinds = normalized.entities.len(), "Caching entities");
            state.cache.merge_entities(normalized.entities);
        }

        smallvec![Effect::None]
    }
}

/// Fetches pages on demand
#[derive(Clone, Debug, Default)]
pub struct NavigationReducer;

impl Reducer for NavigationReducer {
    type State = SiteState;
    type Action = SiteAction;
    type Environment = SiteEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SiteAction::OpenPage { id } => {
                if !selectors::needs_page(state, id) {
                    tracing::debug!(page_id = id, "Page already cached");
                    return smallvec![Effect::None];
                }

                tracing::debug!(page_id = id, "Fetching page");
                smallvec![Effect::send(SiteAction::Call(actions::fetch_single_page(
                    &env.routes,
                    id,
                )))]
            },
            SiteAction::Call(call) => {
                tracing::warn!(
                    action_type = %call.action_type,
                    "Call descriptor reached the reducer; is the API middleware installed?"
                );
                smallvec![Effect::None]
            },
            SiteAction::Api(_) => smallvec![Effect::None],
        }
    }
}

/// Root reducer of the site store
#[derive(Clone)]
pub struct SiteReducer {
    inner: CombinedReducer<SiteState, SiteAction, SiteEnvironment>,
}

impl SiteReducer {
    /// Creates a new `SiteReducer`
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: combine_reducers(vec![
                Box::new(CacheReducer),
                Box::new(scope_reducer(StatusReducer, |site: &mut SiteState| &mut site.status)),
                Box::new(NavigationReducer),
            ]),
        }
    }
}

impl Default for SiteReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for SiteReducer {
    type State = SiteState;
    type Action = SiteAction;
    type Environment = SiteEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::actions::{FETCH_PAGE, FETCH_POSTS};
    use crate::entities;
    use press_api::schema::normalize;
    use press_api::{ActionTypes, ApiAction};
    use press_testing::{ReducerTest, assertions, run_effects, test_clock};
    use serde_json::{Map, json};

    fn env() -> SiteEnvironment {
        SiteEnvironment::new(Arc::new(test_clock()), ApiRoutes::default())
    }

    fn posts_success(body: &Value) -> SiteAction {
        let normalized = normalize(body, &entities::POST_ARRAY).unwrap();
        SiteAction::Api(ApiAction::success(
            &ActionTypes::derive(FETCH_POSTS).unwrap(),
            Payload::Normalized(normalized),
            Map::new(),
        ))
    }

    #[test]
    fn test_request_marks_family_loading() {
        ReducerTest::new(SiteReducer::new())
            .with_env(env())
            .given_state(SiteState::new())
            .when_action(SiteAction::Api(ApiAction::request(
                &ActionTypes::derive(FETCH_PAGE).unwrap(),
                Map::new(),
            )))
            .then_state(|state| {
                assert!(state.status.is_loading(FETCH_PAGE));
                assert_eq!(
                    state.status.get(FETCH_PAGE).unwrap().updated_at,
                    Some(test_clock().now())
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_fills_cache_and_listing() {
        ReducerTest::new(SiteReducer::new())
            .with_env(env())
            .given_state(SiteState::new())
            .when_actions([
                SiteAction::Api(ApiAction::request(&ActionTypes::derive(FETCH_POSTS).unwrap(), Map::new())),
                posts_success(&json!([
                    { "id": 2, "title": { "rendered": "Second" }, "author": { "id": 1, "name": "Ed" } },
                    { "id": 1, "title": { "rendered": "First" }, "author": 1 }
                ])),
            ])
            .then_state(|state| {
                assert!(!state.status.is_loading(FETCH_POSTS));
                assert_eq!(state.cache.listing(FETCH_POSTS), ["2".to_string(), "1".to_string()]);
                assert_eq!(state.cache.len(entities::kinds::POSTS), 2);
                assert_eq!(state.cache.get(entities::kinds::USERS, "1"), Some(&json!({ "id": 1, "name": "Ed" })));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_single_lookup_keeps_listing() {
        let single = normalize(&json!({ "id": 9, "title": { "rendered": "Ninth" } }), &entities::POST).unwrap();

        ReducerTest::new(SiteReducer::new())
            .with_env(env())
            .given_state(SiteState::new())
            .when_actions([
                posts_success(&json!([{ "id": 1 }])),
                SiteAction::Api(ApiAction::success(
                    &ActionTypes::derive(FETCH_POSTS).unwrap(),
                    Payload::Normalized(single),
                    Map::new(),
                )),
            ])
            .then_state(|state| {
                assert_eq!(state.cache.listing(FETCH_POSTS), ["1".to_string()]);
                assert!(state.cache.contains(entities::kinds::POSTS, "9"));
            })
            .run();
    }

    #[test]
    fn test_raw_payload_is_not_cached() {
        ReducerTest::new(SiteReducer::new())
            .with_env(env())
            .given_state(SiteState::new())
            .when_action(SiteAction::Api(ApiAction::success(
                &ActionTypes::derive("FETCH_SETTINGS").unwrap(),
                Payload::Raw(json!({ "title": "Site" })),
                Map::new(),
            )))
            .then_state(|state| assert!(state.cache.is_empty()))
            .run();
    }

    #[tokio::test]
    async fn test_open_missing_page_fetches_it() {
        let mut state = SiteState::new();
        let effects = SiteReducer::new().reduce(&mut state, SiteAction::OpenPage { id: 7 }, &env());
        assertions::assert_effects_count(&effects, 1);

        let actions = run_effects(effects.into_vec()).await;
        assert_eq!(actions.len(), 1);
        let SiteAction::Call(call) = &actions[0] else {
            panic!("expected a call descriptor, got {:?}", actions[0]);
        };
        assert_eq!(call.action_type, FETCH_PAGE);
        assert_eq!(call.endpoint.resolve(&state), "/wp/v2/pages/7");
    }

    #[test]
    fn test_open_cached_page_is_noop() {
        let mut state = SiteState::new();
        state.cache.upsert(entities::kinds::PAGES, "7", json!({ "id": 7 }));

        ReducerTest::new(SiteReducer::new())
            .with_env(env())
            .given_state(state)
            .when_actions([SiteAction::OpenPage { id: 7 }, SiteAction::OpenPage { id: 0 }])
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
