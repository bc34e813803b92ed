//! Request lifecycle.
//!
//! - `machine`: the shared request slot and the per-invocation state machine.
//! - `controller`: submission handling and the task that runs each request.

pub mod controller;
pub mod machine;

pub use controller::SessionController;
pub use machine::{EventSink, RequestMachine, SessionSlot};
