pub mod admin;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod help;
pub mod invites;
pub mod middleware;
pub mod router;
pub mod service;
pub mod state;
pub mod streaming;

pub use error::ApiError;
pub use router::router;
pub use service::{Actor, SeedAccount, Service};
pub use state::{AppState, AppStateInner};
