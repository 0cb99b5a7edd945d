//! State and actions of the site store.

use crate::cache::EntityCache;
use crate::status::StatusBoard;
use press_api::{ApiAction, ApiActionKind, CallApi};

/// Everything the site keeps between renders
#[derive(Debug, Clone, Default)]
pub struct SiteState {
    /// Normalized records by kind and id
    pub cache: EntityCache,
    /// Loading and error flags per request family
    pub status: StatusBoard,
}

impl SiteState {
    /// Empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Actions understood by the site store
#[derive(Debug, Clone)]
pub enum SiteAction {
    /// A call descriptor, consumed by the API middleware
    Call(CallApi<SiteState>),
    /// A request, success or failure action dispatched by the API middleware
    Api(ApiAction),
    /// A page view was opened; fetches the page unless it is cached
    OpenPage {
        /// WordPress page id; `0` means no page
        id: u64,
    },
}

impl ApiActionKind<SiteState> for SiteAction {
    fn try_into_call(self) -> Result<CallApi<SiteState>, Self> {
        match self {
            Self::Call(call) => Ok(call),
            other => Err(other),
        }
    }

    fn from_api(action: ApiAction) -> Self {
        Self::Api(action)
    }
}

impl From<CallApi<SiteState>> for SiteAction {
    fn from(call: CallApi<SiteState>) -> Self {
        Self::Call(call)
    }
}
