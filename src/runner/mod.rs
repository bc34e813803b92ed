//! Worker process execution.
//!
//! - `interpreter`: probes candidate interpreters and caches the winner.
//! - `codec`: lossy, length-limited line framing for worker pipes.
//! - `command`: spawns one worker per request and streams its merged output.

pub mod codec;
pub mod command;
pub mod interpreter;

pub use command::{CommandRunner, OutputLine, OutputStream};
pub use interpreter::Interpreter;
