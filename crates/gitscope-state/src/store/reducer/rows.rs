use super::Reduction;
use super::search;
use super::util::push_diagnostic;
use crate::model::{AppState, DiagnosticKind, ROW_PAGE_LIMIT, ViewId};
use crate::msg::{Effect, StoreEvent};
use gitscope_core::domain::{CommitId, GraphPage};
use gitscope_core::error::Error;

pub(super) fn request_more_rows(
    state: &mut AppState,
    view_id: ViewId,
    target: Option<CommitId>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    if let Some(target) = &target
        && view.graph.contains(target)
    {
        return Reduction::none();
    }

    // Coalesce while a load is in flight; exhausted history has nothing
    // left to page.
    if view.rows_loading || !view.graph.has_more {
        return Reduction::none();
    }

    view.rows_loading = true;
    Reduction::effect(Effect::LoadGraphRows {
        view_id,
        limit: ROW_PAGE_LIMIT,
        target,
        cursor: view.graph.cursor.clone(),
    })
}

pub(super) fn graph_rows_loaded(
    state: &mut AppState,
    view_id: ViewId,
    target: Option<CommitId>,
    result: Result<GraphPage, Error>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    view.rows_loading = false;
    let mut reduction = Reduction::none();

    match result {
        Err(e) => {
            // A transient failure must not present as exhaustion: the
            // cursor and `has_more` stay untouched so the next request
            // retries from the same spot.
            let msg = e.to_string();
            log::warn!(
                "row load failed for view {view_id:?} (target {:?}): {msg}",
                target.as_ref().map(|t| t.as_ref())
            );
            view.last_error = Some(msg.clone());
            push_diagnostic(view, DiagnosticKind::Error, msg);

            // A pending reveal still resolves definitively: as failed.
            if let Some(pending) = view.selection.reveal_pending.take() {
                push_diagnostic(
                    view,
                    DiagnosticKind::Warning,
                    format!("could not reveal commit {}", pending.as_ref()),
                );
                reduction.events.push(StoreEvent::SelectionChanged { view_id });
            }
        }
        Ok(page) => {
            view.graph.append(page.rows);
            view.graph.cursor = page.next_cursor;
            view.graph.has_more = page.has_more;
            reduction.events.push(StoreEvent::RowsChanged { view_id });

            if let Some(pending) = view.selection.reveal_pending.clone() {
                if view.graph.contains(&pending) {
                    view.selection.reveal_pending = None;
                    view.selection.set(pending, None);
                    reduction.events.push(StoreEvent::SelectionChanged { view_id });
                } else if !view.graph.has_more {
                    view.selection.reveal_pending = None;
                    push_diagnostic(
                        view,
                        DiagnosticKind::Warning,
                        format!("commit {} not found in history", pending.as_ref()),
                    );
                    reduction.events.push(StoreEvent::SelectionChanged { view_id });
                } else {
                    // Not materialized yet and history remains: keep
                    // driving toward the target so the reveal terminates.
                    view.rows_loading = true;
                    let cursor = view.graph.cursor.clone();
                    reduction.effects.push(Effect::LoadGraphRows {
                        view_id,
                        limit: 0,
                        target: Some(pending),
                        cursor,
                    });
                }
            }

            search::after_row_growth(view_id, view, &mut reduction);
        }
    }

    reduction
}
