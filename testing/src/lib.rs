//! # Composable Press Testing
//!
//! Test support for stores built on Composable Press:
//!
//! - [`ReducerTest`]: Given/When/Then harness for reducers
//! - [`MockTransport`]: scripted HTTP transport for the API middleware
//! - [`FixedClock`]: deterministic time
//!
//! ## Example
//!
//! ```ignore
//! use press_testing::{MockTransport, test_clock};
//! use press_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_open_page() {
//!     let transport = Arc::new(
//!         MockTransport::new().respond_json(Method::GET, "/wp-json/wp/v2/pages/7", 200, page_json()),
//!     );
//!     let store = configure_store(&config, transport.clone(), Arc::new(test_clock()));
//!
//!     let mut handle = store.send(SiteAction::OpenPage { id: 7 }).await?;
//!     handle.wait().await;
//!
//!     assert_eq!(store.state(|s| selectors::page_title(s, 7).map(str::to_owned)).await.as_deref(), Some("About"));
//! }
//! ```


/// Scripted HTTP transport
pub mod mock_transport;

/// Deterministic clocks
pub mod mocks {
    use chrono::{DateTime, Utc};
    use press_core::environment::Clock;

    /// 2025-01-01T00:00:00Z as a Unix timestamp
    const TEST_EPOCH_SECS: i64 = 1_735_689_600;

    /// Clock stopped at one instant
    ///
    /// ```
    /// use press_testing::mocks::FixedClock;
    /// use press_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Clock that always reads `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Default for FixedClock {
        fn default() -> Self {
            Self::new(DateTime::from_timestamp(TEST_EPOCH_SECS, 0).unwrap_or(DateTime::UNIX_EPOCH))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock fixed at 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::default()
    }
}

/// Install a test-friendly tracing subscriber
///
/// Honors `RUST_LOG` and writes through the test harness so output only
/// shows for failing tests. Later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mock_transport::MockTransport;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions, run_effects};
