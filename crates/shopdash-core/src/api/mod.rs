//! REST API client module for the store API.
//!
//! - `RequestPipeline`: attaches the bearer token and recovers from expired
//!   access tokens with a single coordinated refresh
//! - `RefreshCoordinator`: the single-flight refresh state machine
//! - `ApiClient`: typed auth, product, user and dashboard operations

pub mod client;
pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod request;

pub use client::ApiClient;
pub use coordinator::{RefreshCoordinator, Refreshed, ReplayTurn};
pub use error::ApiError;
pub use pipeline::RequestPipeline;
pub use request::ApiRequest;
