//! # mailsweep-client
//!
//! HTTP transport for the `mailsweep` triage service.
//!
//! ## Features
//!
//! - **Service client**: [`HttpTriageService`] implements
//!   [`mailsweep_core::TriageService`] on top of `reqwest`
//! - **Configuration**: [`ClientConfig`] with service root, timeout and session cookie
//! - **Credentials**: session cookies kept in the system keyring
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsweep_client::{ClientConfig, HttpTriageService};
//! use mailsweep_core::{Session, SessionConfig};
//!
//! let config = ClientConfig::new("http://localhost:8000")?
//!     .with_session_cookie("eyJjcmVkZW50aWFscyI6...");
//! let service = HttpTriageService::new(config)?;
//!
//! let mut session = Session::new(service, SessionConfig::default());
//! session.start().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod config;
pub mod credentials;
mod error;
mod wire;

pub use client::HttpTriageService;
pub use config::{ClientConfig, SESSION_COOKIE};
pub use error::{Error, Result};
