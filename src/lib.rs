pub mod auction;
pub mod auth;
pub mod bidding;
pub mod catalog;
pub mod change_feed;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod handlers;
pub mod media;
pub mod message_broker;
pub mod moderation;
pub mod notify;
pub mod profiles;
pub mod query;
pub mod scheduler;
pub mod state;
pub mod submissions;
pub mod watchlist;

pub use handlers::router;
pub use state::AppState;
