//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                          |
//! |-----------|-------------------------------------------|
//! | `serve`   | `Serve`, `InitDb`                         |
//! | `auth`    | `Register`, `Login`, `Logout`             |
//! | `board`   | `Board`, `Agents`, `Report`               |
//! | `task`    | `Task`                                    |
//! | `config`  | `Config`                                  |

pub mod auth;
pub mod board;
pub mod config;
pub mod serve;
pub mod task;

pub use auth::{cmd_login, cmd_logout, cmd_register};
pub use board::{cmd_agents, cmd_board, cmd_report};
pub use config::cmd_config;
pub use serve::{cmd_init_db, cmd_serve};
pub use task::cmd_task;
