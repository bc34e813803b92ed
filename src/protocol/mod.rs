//! Worker output line protocol.
//!
//! Workers print one directive per line on stdout. Fields are separated by
//! `;` and read left to right:
//!
//! | Line                                   | Event                          |
//! |----------------------------------------|--------------------------------|
//! | `PROGRESS;JPM;<op>`                    | [`ProtocolEvent::Progress`]    |
//! | `PROGRESS;JPM;<op>;<label>:<value>`    | [`ProtocolEvent::Progress`]    |
//! | `PROGRESS;GPT;generate`                | [`ProtocolEvent::Progress`]    |
//! | `OUTPUT;START`                         | [`ProtocolEvent::OutputStart`] |
//! | `OUTPUT;END`                           | [`ProtocolEvent::OutputEnd`]   |
//! | *(anything else)*                      | [`ProtocolEvent::Text`]        |
//!
//! [`ProtocolEvent::Progress`]: crate::models::event::ProtocolEvent::Progress
//! [`ProtocolEvent::OutputStart`]: crate::models::event::ProtocolEvent::OutputStart
//! [`ProtocolEvent::OutputEnd`]: crate::models::event::ProtocolEvent::OutputEnd
//! [`ProtocolEvent::Text`]: crate::models::event::ProtocolEvent::Text

pub mod classifier;
pub mod status;

pub use classifier::{classify, classify_line};
pub use status::status_label;
