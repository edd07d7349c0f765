//! Core session conversation state machine
//!
//! Pure state transitions: one function maps the current query state plus
//! an incoming poller event to the next state and the reply owed to the
//! poller. No I/O happens here.

pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use event::{Event, PageView};
pub use state::{PageDirective, QueryState};
#[allow(unused_imports)] // Codec tests name the cursor type directly
pub use state::PageCursor;
pub use transition::{transition, Reply, Transition};
#[allow(unused_imports)] // Callers read it off Transition without naming the type
pub use transition::Anomaly;
