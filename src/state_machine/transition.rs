//! Pure state transition function

use super::event::{Event, PageView};
use super::state::{PageCursor, PageDirective, QueryState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct Transition {
    pub next: QueryState,
    pub reply: Reply,
    /// Set when the call arrived in a state that does not support it and
    /// was degraded instead of raised. The caller decides how to log it.
    pub anomaly: Option<Anomaly>,
}

impl Transition {
    pub fn new(next: QueryState, reply: Reply) -> Self {
        Self {
            next,
            reply,
            anomaly: None,
        }
    }

    pub fn with_anomaly(mut self, anomaly: Anomaly) -> Self {
        self.anomaly = Some(anomaly);
        self
    }
}

/// What the poller is owed after one round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Next command to hand the poller; `None` is the empty command,
    /// "nothing further to send."
    Command(Option<PageDirective>),

    /// Round-trip progress in `[0, 100]`.
    Progress(u8),
}

/// Out-of-protocol calls, absorbed rather than raised.
///
/// The poller cannot be left without a usable reply, so these degrade to
/// the empty command or to full completion and surface only in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("command requested while one is already outstanding")]
    CommandAlreadyOutstanding,

    #[error("response delivered in state {state} with no command outstanding")]
    ResponseWithoutCommand { state: &'static str },

    #[error("page reports {remaining} items remaining but no continuation cursor")]
    ContinuationUnavailable { remaining: u64 },
}

/// Pure transition function
///
/// Given the same state and event this always produces the same result,
/// with no I/O side effects. Invalid-state calls never fail; they degrade
/// and carry the anomaly out for the caller to log.
pub fn transition(state: &QueryState, event: Event) -> Transition {
    match (state, event) {
        // ============================================================
        // Command Generation
        // ============================================================

        // Idle: open a fresh iteration, counter reset to zero
        (QueryState::Idle, Event::CommandRequested) => Transition::new(
            QueryState::AwaitingPage {
                cursor: None,
                items_consumed: 0,
            },
            Reply::Command(Some(PageDirective::Start)),
        ),

        // PageReady: resume from the stored cursor
        (
            QueryState::PageReady {
                cursor,
                items_consumed,
            },
            Event::CommandRequested,
        ) => Transition::new(
            QueryState::AwaitingPage {
                cursor: Some(cursor.clone()),
                items_consumed: *items_consumed,
            },
            Reply::Command(Some(PageDirective::Continue {
                cursor: cursor.clone(),
            })),
        ),

        // Done: nothing further to send
        (QueryState::Done { .. }, Event::CommandRequested) => {
            Transition::new(state.clone(), Reply::Command(None))
        }

        // At most one in-flight command per session
        (QueryState::AwaitingPage { .. }, Event::CommandRequested) => {
            Transition::new(state.clone(), Reply::Command(None))
                .with_anomaly(Anomaly::CommandAlreadyOutstanding)
        }

        // ============================================================
        // Response Processing
        // ============================================================

        (
            QueryState::AwaitingPage {
                cursor,
                items_consumed,
            },
            Event::PageReceived(page),
        ) => consume_page(cursor.as_ref(), *items_consumed, page),

        // No command outstanding: force completion without touching the
        // counter, so the poller stops polling instead of retrying forever
        (state, Event::PageReceived(_)) => {
            Transition::new(state.clone(), Reply::Progress(100)).with_anomaly(
                Anomaly::ResponseWithoutCommand {
                    state: state.name(),
                },
            )
        }
    }
}

/// Advance past one consumed page while a command is outstanding.
fn consume_page(prior_cursor: Option<&PageCursor>, items_consumed: u64, page: PageView) -> Transition {
    let consumed = items_consumed.saturating_add(page.item_count);

    if page.remaining == 0 {
        return Transition::new(
            QueryState::Done {
                items_consumed: consumed,
            },
            Reply::Progress(100),
        );
    }

    // The backend re-issues the cursor on every partial page; fall back to
    // the stored one if a response omits it.
    let cursor = page.cursor.map(PageCursor::new).or_else(|| prior_cursor.cloned());

    match cursor {
        Some(cursor) => Transition::new(
            QueryState::PageReady {
                cursor,
                items_consumed: consumed,
            },
            Reply::Progress(percent_consumed(consumed, page.remaining)),
        ),
        // No cursor means no continuation is possible; completing is the
        // only reply that does not strand the poller
        None => Transition::new(
            QueryState::Done {
                items_consumed: consumed,
            },
            Reply::Progress(100),
        )
        .with_anomaly(Anomaly::ContinuationUnavailable {
            remaining: page.remaining,
        }),
    }
}

/// Integer percentage of the query consumed so far, rounded down.
///
/// Hits exactly 100 only when nothing remains.
fn percent_consumed(consumed: u64, remaining: u64) -> u8 {
    let consumed = u128::from(consumed);
    let total = consumed + u128::from(remaining);
    if total == 0 {
        return 100;
    }
    u8::try_from(consumed * 100 / total).unwrap_or(100)
}
