//! Loading and error flags per request family.
//!
//! A family is the base action type of a lifecycle triple, so `FETCH_POSTS`,
//! `FETCH_POSTS_SUCCESS` and `FETCH_POSTS_FAILURE` all update the same entry.
//! Several calls of one family may be in flight at once; the family is
//! loading until the last of them settles.

use crate::reducer::SiteEnvironment;
use crate::types::SiteAction;
use chrono::{DateTime, Utc};
use press_api::{ApiAction, ApiOutcome, Phase};
use press_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::collections::BTreeMap;

/// State of one request family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    /// Calls started and not yet settled
    pub in_flight: usize,
    /// Message of the last unsuppressed failure, cleared when a new call starts
    pub error: Option<String>,
    /// When the family last changed
    pub updated_at: Option<DateTime<Utc>>,
}

impl RequestStatus {
    /// Whether any call of the family is outstanding
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Request status of every family seen so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBoard {
    families: BTreeMap<String, RequestStatus>,
}

impl StatusBoard {
    /// Status of `family`, if it was ever requested
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&RequestStatus> {
        self.families.get(family)
    }

    /// Whether `family` has a call outstanding
    #[must_use]
    pub fn is_loading(&self, family: &str) -> bool {
        self.get(family).is_some_and(RequestStatus::is_loading)
    }

    /// Last unsuppressed failure of `family`
    #[must_use]
    pub fn error(&self, family: &str) -> Option<&str> {
        self.get(family).and_then(|status| status.error.as_deref())
    }

    /// Fold one lifecycle action into the board
    pub fn apply(&mut self, action: &ApiAction, now: DateTime<Utc>) {
        let (family, phase) = action.split_type();
        let status = self.families.entry(family.to_string()).or_default();

        match phase {
            Phase::Request => {
                status.in_flight += 1;
                status.error = None;
            },
            Phase::Success => {
                status.in_flight = status.in_flight.saturating_sub(1);
            },
            Phase::Failure => {
                status.in_flight = status.in_flight.saturating_sub(1);
                if let ApiOutcome::Failure {
                    error,
                    suppress_error: false,
                } = &action.outcome
                {
                    status.error = Some(error.clone());
                }
            },
        }
        status.updated_at = Some(now);
    }
}

/// Keeps the [`StatusBoard`] in step with lifecycle actions
#[derive(Clone, Debug, Default)]
pub struct StatusReducer;

impl Reducer for StatusReducer {
    type State = StatusBoard;
    type Action = SiteAction;
    type Environment = SiteEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let SiteAction::Api(action) = &action {
            state.apply(action, env.clock.now());
        }
        smallvec![Effect::None]
    }
}
