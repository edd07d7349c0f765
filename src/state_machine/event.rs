//! Events that drive a session's query conversation

/// One page of backend results, decoded from an inbound response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Items carried by this page.
    pub item_count: u64,
    /// Items the backend still holds beyond this page.
    pub remaining: u64,
    /// Continuation token for the next page, when one was issued.
    pub cursor: Option<String>,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The poller asked for the next command to execute.
    CommandRequested,

    /// The poller delivered a response, already decoded into a page.
    PageReceived(PageView),
}
