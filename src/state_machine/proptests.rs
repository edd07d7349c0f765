//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::event::{Event, PageView};
use super::state::{PageCursor, PageDirective, QueryState};
use super::transition::{transition, Anomaly, Reply};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_cursor() -> impl Strategy<Value = PageCursor> {
    "[a-z0-9]{6,16}".prop_map(PageCursor::new)
}

fn arb_idle_state() -> impl Strategy<Value = QueryState> {
    Just(QueryState::Idle)
}

fn arb_awaiting_state() -> impl Strategy<Value = QueryState> {
    (proptest::option::of(arb_cursor()), 0u64..10_000).prop_map(|(cursor, items_consumed)| {
        QueryState::AwaitingPage {
            cursor,
            items_consumed,
        }
    })
}

fn arb_page_ready_state() -> impl Strategy<Value = QueryState> {
    (arb_cursor(), 1u64..10_000).prop_map(|(cursor, items_consumed)| QueryState::PageReady {
        cursor,
        items_consumed,
    })
}

fn arb_done_state() -> impl Strategy<Value = QueryState> {
    (0u64..10_000).prop_map(|items_consumed| QueryState::Done { items_consumed })
}

fn arb_state() -> impl Strategy<Value = QueryState> {
    prop_oneof![
        arb_idle_state(),
        arb_awaiting_state(),
        arb_page_ready_state(),
        arb_done_state(),
    ]
}

fn arb_page() -> impl Strategy<Value = PageView> {
    (0u64..500, 0u64..10_000, proptest::option::of("[a-z0-9]{6,16}")).prop_map(
        |(item_count, remaining, cursor)| PageView {
            item_count,
            remaining,
            cursor,
        },
    )
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::CommandRequested),
        arb_page().prop_map(Event::PageReceived),
    ]
}

fn page(item_count: u64, remaining: u64, cursor: Option<&str>) -> PageView {
    PageView {
        item_count,
        remaining,
        cursor: cursor.map(String::from),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: transitions are total and never lose consumed items
    #[test]
    fn prop_transitions_never_shrink_counter(state in arb_state(), event in arb_event()) {
        let result = transition(&state, event);
        prop_assert!(result.next.items_consumed() >= state.items_consumed());
    }

    // Invariant 2: a page-ready state always carries a cursor
    #[test]
    fn prop_page_ready_always_has_cursor(
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut state = QueryState::Idle;
        for event in events {
            state = transition(&state, event).next;
            if matches!(state, QueryState::PageReady { .. }) {
                prop_assert!(state.cursor().is_some());
            }
        }
    }

    // Invariant 3: progress is within [0, 100] and hits 100 exactly when
    // nothing remains
    #[test]
    fn prop_progress_bounded(
        items_consumed in 0u64..10_000,
        cursor in arb_cursor(),
        page in arb_page(),
    ) {
        let state = QueryState::AwaitingPage {
            cursor: Some(cursor),
            items_consumed,
        };
        let remaining = page.remaining;
        let result = transition(&state, Event::PageReceived(page));

        match result.reply {
            Reply::Progress(p) => {
                prop_assert!(p <= 100);
                if remaining == 0 {
                    prop_assert_eq!(p, 100);
                } else {
                    prop_assert!(p < 100);
                }
            }
            Reply::Command(_) => prop_assert!(false, "expected a progress reply"),
        }
    }

    // Invariant 4: progress is non-decreasing across a full page sequence
    // and reaches 100 only on the final page
    #[test]
    fn prop_progress_monotone_over_sequence(
        sizes in proptest::collection::vec(1u64..200, 1..12),
        cursor in "[a-z0-9]{8}",
    ) {
        let total: u64 = sizes.iter().sum();
        let mut delivered = 0u64;
        let mut state = QueryState::Idle;
        let mut last_progress = 0u8;

        for (i, size) in sizes.iter().enumerate() {
            let result = transition(&state, Event::CommandRequested);
            match result.reply {
                Reply::Command(Some(PageDirective::Start)) => prop_assert_eq!(i, 0),
                Reply::Command(Some(PageDirective::Continue { .. })) => prop_assert!(i > 0),
                other => prop_assert!(false, "expected a command, got {:?}", other),
            }
            prop_assert!(result.anomaly.is_none());
            state = result.next;

            delivered += size;
            let remaining = total - delivered;
            let result = transition(
                &state,
                Event::PageReceived(page(*size, remaining, Some(cursor.as_str()))),
            );
            let progress = match result.reply {
                Reply::Progress(p) => p,
                other => {
                    prop_assert!(false, "expected progress, got {:?}", other);
                    unreachable!()
                }
            };
            prop_assert!(result.anomaly.is_none());
            prop_assert!(progress >= last_progress, "progress regressed: {} -> {}", last_progress, progress);
            if remaining == 0 {
                prop_assert_eq!(progress, 100);
            } else {
                prop_assert!(progress < 100);
            }
            last_progress = progress;
            state = result.next;
        }

        prop_assert!(state.is_terminal());
        prop_assert_eq!(state.items_consumed(), total);
    }

    // Invariant 5: a response with no command outstanding degrades to 100
    // without touching state or counter
    #[test]
    fn prop_response_without_command_degrades(
        state in prop_oneof![arb_idle_state(), arb_page_ready_state(), arb_done_state()],
        page in arb_page(),
    ) {
        let result = transition(&state, Event::PageReceived(page));
        prop_assert_eq!(result.reply, Reply::Progress(100));
        prop_assert_eq!(&result.next, &state);
        prop_assert!(
            matches!(result.anomaly, Some(Anomaly::ResponseWithoutCommand { .. })),
            "unexpected anomaly: {:?}",
            result.anomaly
        );
    }

    // Invariant 6: a command request while one is outstanding degrades to
    // the empty command and leaves the state alone
    #[test]
    fn prop_command_while_outstanding_degrades(state in arb_awaiting_state()) {
        let result = transition(&state, Event::CommandRequested);
        prop_assert_eq!(result.reply, Reply::Command(None));
        prop_assert_eq!(&result.next, &state);
        prop_assert!(matches!(
            result.anomaly,
            Some(Anomaly::CommandAlreadyOutstanding)
        ));
    }

    // Invariant 7: a completed query answers every further command request
    // with the empty command, without anomaly
    #[test]
    fn prop_done_yields_empty_command(state in arb_done_state()) {
        let result = transition(&state, Event::CommandRequested);
        prop_assert_eq!(result.reply, Reply::Command(None));
        prop_assert_eq!(&result.next, &state);
        prop_assert!(result.anomaly.is_none());
    }

    // Invariant 8: starting from idle always resets the counter and opens
    // with a Start directive
    #[test]
    fn prop_idle_starts_fresh(_dummy in Just(())) {
        let result = transition(&QueryState::Idle, Event::CommandRequested);
        prop_assert_eq!(
            result.reply,
            Reply::Command(Some(PageDirective::Start))
        );
        match result.next {
            QueryState::AwaitingPage {
                cursor,
                items_consumed,
            } => {
                prop_assert!(cursor.is_none());
                prop_assert_eq!(items_consumed, 0);
            }
            s => prop_assert!(false, "expected AwaitingPage, got {:?}", s),
        }
    }
}

// ============================================================================
// Sequence Tests - Multi-Step Scenarios
// ============================================================================

/// A query whose first page already exhausts the backend completes in one
/// round trip.
#[test]
fn test_single_page_query() {
    let result = transition(&QueryState::Idle, Event::CommandRequested);
    assert_eq!(result.reply, Reply::Command(Some(PageDirective::Start)));
    let state = result.next;

    let result = transition(&state, Event::PageReceived(page(5, 0, None)));
    assert_eq!(result.reply, Reply::Progress(100));
    assert!(result.anomaly.is_none());
    assert_eq!(result.next, QueryState::Done { items_consumed: 5 });
}

/// Two-page walk: 8 of 20 items on page one, the rest on page two.
#[test]
fn test_two_page_query() {
    let mut state = QueryState::Idle;

    // Round 1: start
    let result = transition(&state, Event::CommandRequested);
    assert_eq!(result.reply, Reply::Command(Some(PageDirective::Start)));
    state = result.next;

    // Page 1: 8 items, 12 remaining -> floor(100 * 8 / 20) = 40
    let result = transition(&state, Event::PageReceived(page(8, 12, Some("cur-1"))));
    assert_eq!(result.reply, Reply::Progress(40));
    state = result.next;
    assert_eq!(state.cursor().map(PageCursor::as_str), Some("cur-1"));

    // Round 2: continue with the stored cursor
    let result = transition(&state, Event::CommandRequested);
    match result.reply {
        Reply::Command(Some(PageDirective::Continue { ref cursor })) => {
            assert_eq!(cursor.as_str(), "cur-1");
        }
        other => panic!("expected Continue, got {other:?}"),
    }
    state = result.next;

    // Page 2: 12 items, nothing remaining
    let result = transition(&state, Event::PageReceived(page(12, 0, None)));
    assert_eq!(result.reply, Reply::Progress(100));
    assert_eq!(result.next, QueryState::Done { items_consumed: 20 });
}

/// A partial page that omits the cursor falls back to the one already
/// stored for the session.
#[test]
fn test_cursor_fallback_when_page_omits_it() {
    let state = QueryState::AwaitingPage {
        cursor: Some(PageCursor::new("held")),
        items_consumed: 4,
    };

    let result = transition(&state, Event::PageReceived(page(3, 9, None)));
    assert!(result.anomaly.is_none());
    match result.next {
        QueryState::PageReady {
            cursor,
            items_consumed,
        } => {
            assert_eq!(cursor.as_str(), "held");
            assert_eq!(items_consumed, 7);
        }
        s => panic!("expected PageReady, got {s:?}"),
    }
}

/// A first page claiming more items remain but carrying no cursor cannot
/// be continued; the query completes instead of stranding the poller.
#[test]
fn test_missing_cursor_completes_with_anomaly() {
    let state = QueryState::AwaitingPage {
        cursor: None,
        items_consumed: 0,
    };

    let result = transition(&state, Event::PageReceived(page(2, 7, None)));
    assert_eq!(result.reply, Reply::Progress(100));
    assert_eq!(result.next, QueryState::Done { items_consumed: 2 });
    assert!(matches!(
        result.anomaly,
        Some(Anomaly::ContinuationUnavailable { remaining: 7 })
    ));
}

/// An empty final page still terminates cleanly.
#[test]
fn test_empty_final_page() {
    let state = QueryState::AwaitingPage {
        cursor: Some(PageCursor::new("cur")),
        items_consumed: 10,
    };

    let result = transition(&state, Event::PageReceived(page(0, 0, None)));
    assert_eq!(result.reply, Reply::Progress(100));
    assert_eq!(result.next, QueryState::Done { items_consumed: 10 });
}

/// A query against an empty backend (zero items, zero remaining, first
/// page) completes at 100 rather than dividing by zero.
#[test]
fn test_empty_backend_completes_immediately() {
    let result = transition(&QueryState::Idle, Event::CommandRequested);
    let state = result.next;

    let result = transition(&state, Event::PageReceived(page(0, 0, None)));
    assert_eq!(result.reply, Reply::Progress(100));
    assert_eq!(result.next, QueryState::Done { items_consumed: 0 });
}
