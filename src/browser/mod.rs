//! Playwright-backed implementation of [`crate::dom::DomQuery`].
//!
//! A single Node.js helper process owns the browser, context and page for the
//! lifetime of a [`PlaywrightSession`]; requests and replies travel as JSON
//! lines over its stdin/stdout.
//!
//! # Example
//!
//! ```no_run
//! use sfh_lib::{Config, PlaywrightSession, SessionOptions};
//! use sfh_lib::dom::{DomQuery, LoadState};
//!
//! # async fn example() -> sfh_lib::Result<()> {
//! let config = Config::default();
//! let session = PlaywrightSession::launch(SessionOptions::from(&config)).await?;
//! session
//!     .goto(config.product_url()?.as_str(), LoadState::DomContentLoaded, config.timings.navigation_timeout)
//!     .await?;
//! println!("{}", session.title().await?);
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

mod playwright;
mod session;

pub use session::{PlaywrightSession, SessionOptions, DEFAULT_LAUNCH_TIMEOUT};
