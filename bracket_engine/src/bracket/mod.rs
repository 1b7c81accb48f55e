//! Live brackets behind an async actor model.
//!
//! This module implements:
//! - BracketActor: owns one tournament's match graph
//! - BracketManager: spawns actors and routes requests to them by id
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each bracket runs in its own Tokio task with an mpsc inbox, so results for
//! one tournament are applied strictly in arrival order while different
//! tournaments progress independently.
//!
//! ## Example
//!
//! ```
//! use bracket_engine::bracket::BracketManager;
//! use bracket_engine::engine::CreateRequest;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = BracketManager::default();
//!     let request: CreateRequest = serde_json::from_value(serde_json::json!({
//!         "config": { "stages": [{ "engine": "round_robin" }] },
//!         "participants": ["Ada", "Bo", "Cy"]
//!     })).unwrap();
//!
//!     let snapshot = manager.create(&request).await.unwrap();
//!     assert_eq!(snapshot.graph.total_matches, 3);
//! }
//! ```

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{BracketActor, BracketHandle, DEFAULT_INBOX_SIZE};
pub use manager::{BracketManager, ManagerError, ManagerResult};
pub use messages::{BracketMessage, BracketSnapshot, BracketSummary};

/// Tournament identifier
pub type TournamentId = uuid::Uuid;
