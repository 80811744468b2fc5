use super::Reduction;
use super::util::push_diagnostic;
use crate::model::{AppState, DiagnosticKind, MultiSelection, ViewId};
use crate::msg::{Effect, StoreEvent};
use gitscope_core::domain::CommitId;

pub(super) fn set_selection(
    state: &mut AppState,
    view_id: ViewId,
    id: CommitId,
    multi: Option<Vec<MultiSelection>>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    view.selection.set(id, multi);
    Reduction::event(StoreEvent::SelectionChanged { view_id })
}

pub(super) fn clear_selection(state: &mut AppState, view_id: ViewId) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    view.selection.clear();
    Reduction::event(StoreEvent::SelectionChanged { view_id })
}

/// Ensure a commit is materialized, growing the window if needed, then
/// select it. Always terminates definitively: the id ends up either in
/// the window (selected) or confirmed absent, never ambiguous.
pub(super) fn reveal_commit(state: &mut AppState, view_id: ViewId, id: CommitId) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    let id = id.canonical();
    if view.graph.contains(&id) {
        view.selection.reveal_pending = None;
        view.selection.set(id, None);
        return Reduction::event(StoreEvent::SelectionChanged { view_id });
    }

    if !view.graph.has_more {
        push_diagnostic(
            view,
            DiagnosticKind::Warning,
            format!("commit {} not found in history", id.as_ref()),
        );
        return Reduction::event(StoreEvent::SelectionChanged { view_id });
    }

    // Uncapped, target-driven load; it ends with the id found, the
    // history exhausted, or a surfaced failure. Each resolves the reveal.
    view.selection.reveal_pending = Some(id.clone());
    view.rows_loading = true;
    let cursor = view.graph.cursor.clone();
    Reduction::effect(Effect::LoadGraphRows {
        view_id,
        limit: 0,
        target: Some(id),
        cursor,
    })
}
