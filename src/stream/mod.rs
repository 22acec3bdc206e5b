//! Incremental decoder for the event-framed chat reply.
//!
//! Raw body chunks are framed into lines, lines are parsed into
//! `(kind, payload)` records, and records are dispatched to a
//! [`ChatListener`] in arrival order. A [`Session`] ties the pieces together
//! and guarantees exactly one terminal notification per exchange.

mod dispatch;
mod error;
mod framer;
mod record;
mod session;

pub use dispatch::{ChatListener, StreamEvent};
pub use error::{BoxError, StreamError};
pub use session::{Completion, Session, SessionOptions};
