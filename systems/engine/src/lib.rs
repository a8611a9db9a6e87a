#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session engine that wires the world, the pure systems and the action queue
//! together.
//!
//! A [`Session`] owns the authoritative world behind an async lock. Requests
//! are validated against a read-only view and, when legal, enqueued as
//! [`GameAction`] values. The queue worker executes those actions one at a
//! time, routing every resulting world event through the fog system, and
//! publishes a [`candy_quest_core::SessionSnapshot`] once each batch drains.

mod config;
mod runtime;
mod session;
mod setup;

pub use config::SessionConfig;
pub use runtime::GameAction;
pub use session::{Rejection, Session};
pub use setup::SetupError;
