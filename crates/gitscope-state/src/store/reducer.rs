use crate::model::{AppState, ViewId};
use crate::msg::{Effect, Msg, StoreEvent};
use gitscope_core::services::HistoryProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

mod rows;
mod search;
mod selection;
mod util;
mod view;

/// Output of one reduce step: effects to schedule and events to deliver.
/// The store loop delivers the events first, so all notifications for one
/// logical update go out together, after the state has settled.
#[derive(Default)]
pub(super) struct Reduction {
    pub(super) effects: Vec<Effect>,
    pub(super) events: Vec<StoreEvent>,
}

impl Reduction {
    pub(super) fn none() -> Self {
        Self::default()
    }

    pub(super) fn effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
            events: Vec::new(),
        }
    }

    pub(super) fn event(event: StoreEvent) -> Self {
        Self {
            effects: Vec::new(),
            events: vec![event],
        }
    }
}

pub(super) fn reduce(
    providers: &mut HashMap<ViewId, Arc<dyn HistoryProvider>>,
    id_alloc: &AtomicU64,
    state: &mut AppState,
    msg: Msg,
) -> Reduction {
    match msg {
        Msg::OpenView(path) => view::open_view(id_alloc, state, path),
        Msg::CloseView { view_id } => view::close_view(providers, state, view_id),
        Msg::SetActiveView { view_id } => view::set_active_view(state, view_id),
        Msg::ViewOpenedOk {
            view_id,
            spec,
            provider,
        } => view::view_opened_ok(providers, state, view_id, spec, provider),
        Msg::ViewOpenedErr {
            view_id,
            spec,
            error,
        } => view::view_opened_err(state, view_id, spec, error),
        Msg::BranchStateLoaded { view_id, result } => {
            view::branch_state_loaded(state, view_id, result)
        }

        Msg::RequestMoreRows { view_id, target } => {
            rows::request_more_rows(state, view_id, target)
        }
        Msg::GraphRowsLoaded {
            view_id,
            target,
            result,
        } => rows::graph_rows_loaded(state, view_id, target, result),

        Msg::RequestSearch {
            view_id,
            query,
            resume,
        } => search::request_search(state, view_id, query, resume),
        Msg::CancelSearch {
            view_id,
            preserve_results,
        } => search::cancel_search(state, view_id, preserve_results),
        Msg::SearchBatchLoaded {
            view_id,
            generation,
            result,
        } => search::search_batch_loaded(state, view_id, generation, result),

        Msg::SetSelection { view_id, id, multi } => {
            selection::set_selection(state, view_id, id, multi)
        }
        Msg::ClearSelection { view_id } => selection::clear_selection(state, view_id),
        Msg::RevealCommit { view_id, id } => selection::reveal_commit(state, view_id, id),

        Msg::HoverCommit { view_id, id } => view::hover_commit(state, view_id, id),
        Msg::CommitDetailsLoaded {
            view_id,
            id,
            result,
            enrichment,
        } => view::commit_details_loaded(state, view_id, id, result, enrichment),
        Msg::CommitEnrichmentLoaded {
            view_id,
            id,
            result,
        } => view::commit_enrichment_loaded(state, view_id, id, result),
    }
}
