//! Domain and wire types shared by the Command Center server and board client.

pub mod models;
pub mod roster;

pub use models::{
    ActivityEntry, Agent, Credentials, LoginResponse, NewActivity, Priority, RegisteredUser,
    Task, TaskPayload, TaskStatus,
};
pub use roster::{Roster, default_agents, seed_tasks};
