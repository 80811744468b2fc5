use crate::model::ViewId;
use gitscope_core::cancel::CancelToken;
use std::collections::HashMap;

/// Independent cancellation domains. Starting a new operation in a domain
/// cancels only that domain's predecessor; a fresh search never disturbs
/// an in-flight row load, hover fetch, or branch-state lookup.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(super) enum CancelDomain {
    Search,
    Rows,
    Hover,
    BranchState,
}

const ALL_DOMAINS: [CancelDomain; 4] = [
    CancelDomain::Search,
    CancelDomain::Rows,
    CancelDomain::Hover,
    CancelDomain::BranchState,
];

#[derive(Default)]
pub(super) struct CancelRegistry {
    tokens: HashMap<(ViewId, CancelDomain), CancelToken>,
}

impl CancelRegistry {
    /// Cancels the domain's in-flight operation, if any, and hands out
    /// the token for its replacement.
    pub(super) fn begin(&mut self, view_id: ViewId, domain: CancelDomain) -> CancelToken {
        let token = CancelToken::new();
        if let Some(previous) = self.tokens.insert((view_id, domain), token.clone()) {
            previous.cancel();
        }
        token
    }

    pub(super) fn cancel(&mut self, view_id: ViewId, domain: CancelDomain) {
        if let Some(token) = self.tokens.remove(&(view_id, domain)) {
            token.cancel();
        }
    }

    pub(super) fn cancel_view(&mut self, view_id: ViewId) {
        for domain in ALL_DOMAINS {
            self.cancel(view_id, domain);
        }
    }
}
