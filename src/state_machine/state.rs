//! Query conversation state types

// ============================================================================
// Pagination Vocabulary
// ============================================================================

/// Backend-issued pagination token.
///
/// Opaque to this server: captured from the first page response and
/// forwarded verbatim on every continuation until the query completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pagination directive carried by the next outbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDirective {
    /// Open a fresh iteration, no cursor yet.
    Start,
    /// Resume an iteration from the stored cursor.
    Continue { cursor: PageCursor },
}

// ============================================================================
// Query State
// ============================================================================

/// Per-session query state.
///
/// The cursor and the consumed-item counter live inside the variants so
/// that impossible combinations (a continuation with no cursor) cannot be
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryState {
    /// No query started.
    #[default]
    Idle,

    /// A command is outstanding, first or continuation. The cursor is
    /// absent until the first page has been consumed.
    AwaitingPage {
        cursor: Option<PageCursor>,
        items_consumed: u64,
    },

    /// A page was consumed and the backend reports more remaining.
    PageReady {
        cursor: PageCursor,
        items_consumed: u64,
    },

    /// The query ran to completion. Terminal: further command requests
    /// get the empty command rather than a restarted query.
    Done { items_consumed: u64 },
}

impl QueryState {
    /// Check if the query has run to completion
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Done { .. })
    }

    /// Items consumed across the session's page sequence so far
    pub fn items_consumed(&self) -> u64 {
        match self {
            QueryState::Idle => 0,
            QueryState::AwaitingPage { items_consumed, .. }
            | QueryState::PageReady { items_consumed, .. }
            | QueryState::Done { items_consumed } => *items_consumed,
        }
    }

    /// The stored continuation cursor, when one exists
    #[allow(dead_code)] // Used by tests; commands carry the cursor themselves
    pub fn cursor(&self) -> Option<&PageCursor> {
        match self {
            QueryState::Idle | QueryState::Done { .. } => None,
            QueryState::AwaitingPage { cursor, .. } => cursor.as_ref(),
            QueryState::PageReady { cursor, .. } => Some(cursor),
        }
    }

    /// Short name for logs and anomaly reports
    pub fn name(&self) -> &'static str {
        match self {
            QueryState::Idle => "idle",
            QueryState::AwaitingPage { .. } => "awaiting_page",
            QueryState::PageReady { .. } => "page_ready",
            QueryState::Done { .. } => "done",
        }
    }
}
