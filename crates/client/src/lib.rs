//! Palmetto Client - Authenticated API request pipeline.
//!
//! Two cooperating pieces:
//!
//! - [`ApiClient`] wraps outbound HTTP calls with bearer-token injection and,
//!   on a 401, performs a single silent session re-fetch and exactly one
//!   retry of the identical request.
//! - [`SessionManager`] is the session collaborator the pipeline consumes:
//!   it reuses the current access token while it is unexpired and performs
//!   the refresh exchange once it lapses.
//!
//! The two meet at the [`SessionProvider`] trait, so the pipeline can be
//! driven by any session source.
//!
//! # Example
//!
//! ```rust,ignore
//! use palmetto_client::{ApiClient, ApiRequest, ClientConfig, SessionManager};
//!
//! let config = ClientConfig::from_env()?;
//! let sessions = SessionManager::new(&config);
//! let api = ApiClient::new(config.api_base_url.clone(), sessions);
//!
//! let order: Order = api.get_json("orders/123").await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod api;
mod config;
mod error;
mod session;
mod token;

pub use api::{ApiClient, ApiRequest, ApiResponse};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, SessionError};
pub use session::{SessionManager, SessionProvider, SessionTokens};
