//! Board backend: authenticated CRUD over tasks and the activity log.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (build_router, ServerConfig)     │
//! │ (board)  │ <─────── │    └─ api.rs   (route handlers, AppState)    │
//! └──────────┘   JSON   │         │                                    │
//!                       │         │ auth::require_auth (bearer → JWT)  │
//!                       │         v                                    │
//!                       │  db.rs  (CommandDb behind DbHandle)          │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! Every handler runs exactly one SQL statement. A task write and the
//! activity entry describing it arrive as two separate requests and are not
//! atomic with respect to each other.

pub mod api;
pub mod auth;
pub mod db;
pub mod server;
