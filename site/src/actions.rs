//! Endpoint descriptors for the site's resources.
//!
//! Each creator returns a [`CallApi`] descriptor. Dispatching it through a
//! store with the API middleware produces the `T`, `T_SUCCESS`, `T_FAILURE`
//! lifecycle for its type.

use crate::entities;
use crate::types::SiteState;
use press_api::CallApi;

/// Single page lookups
pub const FETCH_PAGE: &str = "FETCH_PAGE";

/// Post list and single post lookups share one family
pub const FETCH_POSTS: &str = "FETCH_POSTS";

/// Media library listing
pub const FETCH_ALL_MEDIA: &str = "FETCH_ALL_MEDIA";

/// Single media lookups
pub const FETCH_MEDIA: &str = "FETCH_MEDIA";

/// Default prefix of the core WordPress routes
pub const DEFAULT_BASIC_ROUTE: &str = "/wp/v2";

/// Route prefixes under the API base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    /// Core routes, e.g. `/wp/v2`
    pub basic: String,
}

impl ApiRoutes {
    /// Routes with the given core prefix
    #[must_use]
    pub fn new(basic: impl Into<String>) -> Self {
        Self { basic: basic.into() }
    }
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_BASIC_ROUTE)
    }
}

/// Fetch one page by id
#[must_use]
pub fn fetch_single_page(routes: &ApiRoutes, id: u64) -> CallApi<SiteState> {
    CallApi::new(FETCH_PAGE, format!("{}/pages/{id}", routes.basic))
        .with_schema(entities::PAGE.clone())
        .with_field("id", id)
}

/// Fetch the post list
#[must_use]
pub fn fetch_posts() -> CallApi<SiteState> {
    CallApi::new(FETCH_POSTS, "/posts").with_schema(entities::POST_ARRAY.clone())
}

/// Fetch one post by id
///
/// Reported under [`FETCH_POSTS`]; the `id` field tells the calls apart.
#[must_use]
pub fn fetch_post(id: u64) -> CallApi<SiteState> {
    CallApi::new(FETCH_POSTS, format!("/posts/{id}"))
        .with_schema(entities::POST.clone())
        .with_field("id", id)
}

/// Fetch the media library
#[must_use]
pub fn fetch_all_media(routes: &ApiRoutes) -> CallApi<SiteState> {
    CallApi::new(FETCH_ALL_MEDIA, format!("{}/media", routes.basic)).with_schema(entities::MEDIA_ARRAY.clone())
}

/// Fetch one media attachment by id
#[must_use]
pub fn fetch_media(routes: &ApiRoutes, id: u64) -> CallApi<SiteState> {
    CallApi::new(FETCH_MEDIA, format!("{}/media/{id}", routes.basic)).with_schema(entities::MEDIA.clone())
}
