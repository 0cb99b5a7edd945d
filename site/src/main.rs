//! Site data loader
//!
//! Fetches content through the site store and prints what landed in the
//! cache.
//!
//! ```text
//! press-site page <id>
//! press-site posts
//! press-site media
//! ```

use anyhow::{Context, Result, bail};
use press_api::HttpTransport;
use press_core::environment::SystemClock;
use press_runtime::metrics::MetricsServer;
use press_site::{SiteAction, SiteConfig, SiteStore, actions, configure_store, selectors};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

enum Command {
    Page(u64),
    Posts,
    Media,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        match args.next().as_deref() {
            Some("page") => {
                let id = args.next().context("usage: press-site page <id>")?;
                let id = id.parse().with_context(|| format!("invalid page id {id:?}"))?;
                Ok(Self::Page(id))
            },
            Some("posts") => Ok(Self::Posts),
            Some("media") => Ok(Self::Media),
            Some(other) => bail!("unknown command {other:?}; expected page, posts or media"),
            None => bail!("usage: press-site <page <id> | posts | media>"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,press_site=debug,press_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::from_env().context("invalid configuration")?;
    let command = Command::parse(std::env::args().skip(1))?;

    let _metrics = match config.metrics_addr {
        Some(addr) => {
            let mut server = MetricsServer::new(addr);
            server.start().context("failed to start metrics server")?;
            Some(server)
        },
        None => None,
    };

    tracing::info!(api = %config.api.base_url, env = ?config.env, "Starting site data loader");

    let transport = HttpTransport::new().context("failed to build HTTP client")?;
    let store = configure_store(&config, Arc::new(transport), Arc::new(SystemClock));

    match command {
        Command::Page(id) => show_page(&store, id).await?,
        Command::Posts => {
            load(&store, SiteAction::Call(actions::fetch_posts())).await?;
            report(&store, actions::FETCH_POSTS, selectors::posts).await;
        },
        Command::Media => {
            load(&store, SiteAction::Call(actions::fetch_all_media(&config.routes))).await?;
            report(&store, actions::FETCH_ALL_MEDIA, selectors::media).await;
        },
    }

    store.shutdown_gracefully().await?;
    Ok(())
}

async fn load(store: &SiteStore, action: SiteAction) -> Result<()> {
    let mut handle = store.send(action).await?;
    handle.wait().await;
    Ok(())
}

async fn show_page(store: &SiteStore, id: u64) -> Result<()> {
    load(store, SiteAction::OpenPage { id }).await?;

    let page = store
        .state(|s| {
            selectors::page_title(s, id).map(|title| {
                (
                    title.to_owned(),
                    selectors::page_subtitle(s, id).map(str::to_owned),
                    selectors::featured_image_url(s, id).map(str::to_owned),
                )
            })
        })
        .await;

    match page {
        Some((title, subtitle, image)) => {
            println!("{title}");
            if let Some(subtitle) = subtitle {
                println!("  {subtitle}");
            }
            if let Some(image) = image {
                println!("  hero: {image}");
            }
        },
        None => {
            let error = store
                .state(|s| selectors::error(s, actions::FETCH_PAGE).map(str::to_owned))
                .await;
            println!("Page {id} unavailable: {}", error.as_deref().unwrap_or("not found"));
        },
    }
    Ok(())
}

async fn report(
    store: &SiteStore,
    family: &str,
    select: for<'a> fn(&'a press_site::SiteState) -> Vec<&'a serde_json::Value>,
) {
    let (titles, error) = store
        .state(|s| {
            let titles: Vec<String> = select(s)
                .into_iter()
                .map(|record| {
                    record
                        .pointer("/title/rendered")
                        .and_then(serde_json::Value::as_str)
                        .map_or_else(|| format!("#{}", record["id"]), str::to_owned)
                })
                .collect();
            (titles, selectors::error(s, family).map(str::to_owned))
        })
        .await;

    if let Some(error) = error {
        println!("{family} failed: {error}");
    }
    for title in titles {
        println!("- {title}");
    }
}
