//! Data layer of the content site.
//!
//! Pages, posts and media come from a WordPress REST API. Components
//! dispatch call descriptors built by [`actions`]; the API middleware runs
//! them and the [`SiteReducer`] folds the resulting lifecycle actions into
//! the entity cache and per-family request status, which [`selectors`] read.
//!
//! # Quick Start
//!
//! ```no_run
//! use press_api::HttpTransport;
//! use press_core::environment::SystemClock;
//! use press_site::{SiteAction, configure_store, config::SiteConfig, selectors};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SiteConfig::from_env()?;
//! let store = configure_store(&config, Arc::new(HttpTransport::new()?), Arc::new(SystemClock));
//!
//! let mut handle = store.send(SiteAction::OpenPage { id: 7 }).await?;
//! handle.wait().await;
//!
//! let title = store.state(|s| selectors::page_title(s, 7).map(str::to_owned)).await;
//! println!("{title:?}");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod cache;
pub mod config;
pub mod entities;
pub mod reducer;
pub mod selectors;
pub mod status;
pub mod types;

use press_api::{ApiMiddleware, Transport};
use press_core::environment::Clock;
use press_runtime::{LoggingMiddleware, Store};
use std::sync::Arc;

// Re-export commonly used types
pub use actions::ApiRoutes;
pub use cache::EntityCache;
pub use config::{AppEnv, ConfigError, SiteConfig};
pub use reducer::{SiteEnvironment, SiteReducer};
pub use status::{RequestStatus, StatusBoard};
pub use types::{SiteAction, SiteState};

/// The site store
pub type SiteStore = Store<SiteState, SiteAction, SiteEnvironment, SiteReducer>;

/// Build the site store
///
/// The pipeline is the API middleware followed, in development only, by the
/// action logger. The logger therefore sees request and terminal actions but
/// never raw descriptors.
#[must_use]
pub fn configure_store(config: &SiteConfig, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> SiteStore {
    let env = SiteEnvironment::new(clock, config.routes.clone());
    let store = Store::new(SiteState::new(), SiteReducer::new(), env)
        .with_middleware(ApiMiddleware::new(config.api.clone(), transport));

    if config.is_development() {
        store.with_middleware(LoggingMiddleware)
    } else {
        store
    }
}
