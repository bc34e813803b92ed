//! Domain model module declarations.

pub mod event;
pub mod invocation;
pub mod outcome;
pub mod session;
