use super::util::{normalize_view_path, push_diagnostic};
use super::Reduction;
use crate::caches::AuthorBadge;
use crate::model::{
    AppState, CommitHover, DiagnosticKind, INITIAL_ROW_LIMIT, Loadable, ViewId, ViewState,
};
use crate::msg::{Effect, StoreEvent};
use gitscope_core::domain::{CommitDetails, CommitEnrichment, CommitId, HeadInfo, RepoSpec};
use gitscope_core::error::Error;
use gitscope_core::services::HistoryProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub(super) fn open_view(id_alloc: &AtomicU64, state: &mut AppState, path: PathBuf) -> Reduction {
    let path = normalize_view_path(path);
    if let Some(view_id) = state
        .views
        .iter()
        .find(|v| v.spec.workdir == path)
        .map(|v| v.id)
    {
        state.active_view = Some(view_id);
        return Reduction::none();
    }

    let view_id = ViewId(id_alloc.fetch_add(1, Ordering::Relaxed));
    let spec = RepoSpec { workdir: path };

    state
        .views
        .push(ViewState::new_opening(view_id, spec.clone()));
    state.active_view = Some(view_id);
    Reduction::effect(Effect::OpenView {
        view_id,
        path: spec.workdir,
    })
}

pub(super) fn close_view(
    providers: &mut HashMap<ViewId, Arc<dyn HistoryProvider>>,
    state: &mut AppState,
    view_id: ViewId,
) -> Reduction {
    state.views.retain(|v| v.id != view_id);
    providers.remove(&view_id);
    if state.active_view == Some(view_id) {
        state.active_view = state.views.first().map(|v| v.id);
    }
    Reduction::effect(Effect::CancelView { view_id })
}

pub(super) fn set_active_view(state: &mut AppState, view_id: ViewId) -> Reduction {
    if state.view(view_id).is_none() {
        return Reduction::none();
    }

    state.active_view = Some(view_id);
    Reduction::effect(Effect::LoadBranchState { view_id })
}

pub(super) fn view_opened_ok(
    providers: &mut HashMap<ViewId, Arc<dyn HistoryProvider>>,
    state: &mut AppState,
    view_id: ViewId,
    spec: RepoSpec,
    provider: Arc<dyn HistoryProvider>,
) -> Reduction {
    providers.insert(view_id, provider);

    let spec = RepoSpec {
        workdir: normalize_view_path(spec.workdir),
    };
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    view.spec = spec;
    view.open = Loadable::Ready(());
    view.head = Loadable::Loading;
    view.graph.reset();
    view.graph.has_more = true;
    view.rows_loading = true;
    view.search = None;
    view.hover_cache.clear();
    view.badge_cache.clear();
    view.last_error = None;

    Reduction {
        effects: vec![
            Effect::LoadBranchState { view_id },
            Effect::LoadGraphRows {
                view_id,
                limit: INITIAL_ROW_LIMIT,
                target: None,
                cursor: None,
            },
        ],
        events: Vec::new(),
    }
}

pub(super) fn view_opened_err(
    state: &mut AppState,
    view_id: ViewId,
    spec: RepoSpec,
    error: Error,
) -> Reduction {
    let spec = RepoSpec {
        workdir: normalize_view_path(spec.workdir),
    };
    if let Some(view) = state.view_mut(view_id) {
        view.spec = spec;
        view.open = Loadable::Error(error.to_string());
        view.last_error = Some(error.to_string());
        push_diagnostic(view, DiagnosticKind::Error, error.to_string());
    }
    Reduction::none()
}

pub(super) fn branch_state_loaded(
    state: &mut AppState,
    view_id: ViewId,
    result: Result<HeadInfo, Error>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    match result {
        Ok(head) => {
            // The selection was computed against a head that no longer
            // exists; window growth alone never clears it, a moved head
            // does.
            let head_moved = view
                .selection
                .head_anchor
                .as_ref()
                .is_some_and(|anchor| anchor != &head.target);

            let mut reduction = Reduction::none();
            if head_moved {
                log::debug!(
                    "head moved for view {:?}; resetting selection",
                    view_id
                );
                view.selection.clear();
                reduction.events.push(StoreEvent::SelectionChanged { view_id });
            }

            view.selection.head_anchor = Some(head.target.clone());
            view.head = Loadable::Ready(head);
            reduction
        }
        Err(e) => {
            push_diagnostic(view, DiagnosticKind::Error, e.to_string());
            view.head = Loadable::Error(e.to_string());
            Reduction::none()
        }
    }
}

pub(super) fn hover_commit(state: &mut AppState, view_id: ViewId, id: CommitId) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    let id = id.canonical();
    if view.hover_cache.contains_key(&id) {
        return Reduction::none();
    }

    Reduction::effect(Effect::LoadCommitDetails { view_id, id })
}

pub(super) fn commit_details_loaded(
    state: &mut AppState,
    view_id: ViewId,
    id: CommitId,
    result: Result<CommitDetails, Error>,
    enrichment: Option<CommitEnrichment>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    match result {
        Ok(details) => {
            view.badge_cache
                .insert(id.clone(), AuthorBadge::from_author(&details.author));
            view.hover_cache.insert(
                id,
                CommitHover {
                    details,
                    enrichment,
                },
            );
        }
        Err(e) => {
            push_diagnostic(view, DiagnosticKind::Warning, e.to_string());
        }
    }
    Reduction::none()
}

pub(super) fn commit_enrichment_loaded(
    state: &mut AppState,
    view_id: ViewId,
    id: CommitId,
    result: Result<CommitEnrichment, Error>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    match result {
        Ok(enrichment) => {
            if let Some(hover) = view.hover_cache.get_mut(&id) {
                hover.enrichment = Some(enrichment);
            }
        }
        Err(e) => {
            // Enrichment is best-effort; the primary hover already went out.
            log::debug!("enrichment for {} unavailable: {e}", id.as_ref());
        }
    }
    Reduction::none()
}
