use crate::model::ViewId;

mod effect;
mod message;

pub use effect::Effect;
pub use message::Msg;

/// Notifications delivered to the consumer after the state has settled.
/// Events for one reduce step are emitted together, after merging, so a
/// single logical update never produces two racing notifications.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreEvent {
    /// Catch-all for state changes outside the graph/search/selection
    /// surfaces (open progress, head info, hover cache fills).
    StateChanged,
    RowsChanged {
        view_id: ViewId,
    },
    SearchProgress {
        view_id: ViewId,
        notice: SearchNotice,
    },
    SelectionChanged {
        view_id: ViewId,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchNotice {
    /// Results were discarded (supersession or cancel-without-preserve).
    Cleared,
    /// A progressive batch was merged; more may follow.
    Partial,
    /// The search ran to completion.
    Final,
    /// Stopped with results preserved; a later resume continues it.
    Paused,
    /// The query was rejected or the provider failed; session results, if
    /// any, are intact.
    Failed,
}
