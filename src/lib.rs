//!# pyLoad API Client
//!
//! A Rust client library for the HTTP API of the [pyLoad](https://pyload.net) download manager,
//! plus a small `pyload` command-line tool built on top of it.
//!
//! ## Features
//!
//! - Authentication with a session cookie kept by the caller's HTTP session
//! - Server status, version and free space
//! - Pause, resume or toggle the download queue
//! - Abort all downloads, retry failed ones, delete finished ones
//! - Toggle auto-reconnect and restart the core
//! - Add packages from links and upload container files
//!
//! Every failure is reported as one of three [`client::PyLoadError`] kinds:
//! connection failures, authentication failures and parse failures.
//!
//! ## Usage example
//!
//! ```rust,no_run
//! use anyhow::Result;
//! use pyload_api::client::{PyLoadApi, new_session};
//! use std::env;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let session = new_session(Duration::from_secs(10))?;
//!     let pyload = PyLoadApi::new(
//!         &session,
//!         env::var("PYLOAD_URL")?,
//!         env::var("PYLOAD_USERNAME")?,
//!         env::var("PYLOAD_PASSWORD")?,
//!     );
//!
//!     pyload.login().await?;
//!
//!     let status = pyload.get_status().await?;
//!     println!(
//!         "active: {}, queued: {}, speed: {}",
//!         status.active,
//!         status.queued,
//!         status.calculate_speed()
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod entities;
pub mod utils;
