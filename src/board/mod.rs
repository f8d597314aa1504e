//! Board client: a cached copy of the board kept in step with its source.
//!
//! - [`adapter`]: the `PersistenceAdapter` seam and the mutations it commits
//! - [`http`]: adapter for a board server, bearer-token authenticated
//! - [`local`]: offline adapter over JSON blobs in a data directory
//! - [`store`]: `BoardStore`, the cache that only `load()` ever replaces
//! - [`dispatch`]: user intents mapped to commit + reload cycles
//! - [`render`]: columns, cards and the activity feed
//! - [`session`]: the saved login token

pub mod adapter;
pub mod dispatch;
pub mod http;
pub mod local;
pub mod render;
pub mod session;
pub mod store;
