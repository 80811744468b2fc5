use super::Reduction;
use super::util::push_diagnostic;
use crate::model::{
    AppState, DiagnosticKind, ROW_PAGE_LIMIT, SEARCH_LIMIT, SearchPhase, SearchSession, ViewId,
    ViewState,
};
use crate::msg::{Effect, SearchNotice, StoreEvent};
use crate::search_history;
use gitscope_core::domain::SearchChunk;
use gitscope_core::error::Error;
use gitscope_core::query::SearchQuery;

pub(super) fn request_search(
    state: &mut AppState,
    view_id: ViewId,
    query: SearchQuery,
    resume: bool,
) -> Reduction {
    if state.view(view_id).is_none() {
        return Reduction::none();
    }

    // Malformed predicates are rejected before any session exists; they
    // never look like a search with zero results.
    if let Err(error) = query.validate() {
        let msg = error.to_string();
        log::warn!("rejected search for view {view_id:?}: {msg}");
        let Some(view) = state.view_mut(view_id) else {
            return Reduction::none();
        };
        view.last_error = Some(msg.clone());
        push_diagnostic(view, DiagnosticKind::Error, msg);
        return Reduction::event(StoreEvent::SearchProgress {
            view_id,
            notice: SearchNotice::Failed,
        });
    }

    state.search_history.store(&query.to_query_string());
    let _ = search_history::persist(&state.search_history);

    let key = query.comparison_key();
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };

    if let Some(session) = view.search.as_mut()
        && session.comparison_key == key
    {
        // Same search: presentation-only differences (filter mode) apply
        // in place without restarting anything.
        session.query = query.clone();

        let resumable = resume
            && session.has_more
            && matches!(
                session.phase,
                SearchPhase::Capped | SearchPhase::Paused | SearchPhase::Failed
            );

        if resumable && let Some(cursor) = session.resume_cursor.clone() {
            session.phase = SearchPhase::Searching;
            session.requested = session.results.len() + SEARCH_LIMIT;
            return Reduction {
                effects: vec![Effect::RunSearch {
                    view_id,
                    generation: session.generation,
                    query: session.query.clone(),
                    limit: SEARCH_LIMIT,
                    cursor: Some(cursor),
                }],
                events: vec![StoreEvent::SearchProgress {
                    view_id,
                    notice: SearchNotice::Partial,
                }],
            };
        }

        // A failed run restarts from scratch, as does a stop that never
        // got far enough to report a resume point. Anything else keeps
        // the live session.
        let restart =
            session.phase == SearchPhase::Failed || (resumable && session.resume_cursor.is_none());
        if !restart {
            return Reduction::none();
        }
    }

    // Distinct query (or a restart of a dead run): supersede the old
    // session without merging anything from it. Its in-flight chunk is
    // cancelled when the new one is scheduled, and any chunk already in
    // the channel is dropped by the generation check.
    view.search_generation += 1;
    let generation = view.search_generation;
    view.search = Some(SearchSession::new(query.clone(), generation));

    Reduction {
        effects: vec![Effect::RunSearch {
            view_id,
            generation,
            query,
            limit: SEARCH_LIMIT,
            cursor: None,
        }],
        events: vec![StoreEvent::SearchProgress {
            view_id,
            notice: SearchNotice::Cleared,
        }],
    }
}

pub(super) fn cancel_search(
    state: &mut AppState,
    view_id: ViewId,
    preserve_results: bool,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };
    let Some(session) = view.search.as_mut() else {
        return Reduction::none();
    };

    let mut reduction = Reduction::effect(Effect::CancelSearch { view_id });
    if preserve_results {
        if session.phase != SearchPhase::Completed {
            session.phase = SearchPhase::Paused;
        }
        reduction.events.push(StoreEvent::SearchProgress {
            view_id,
            notice: SearchNotice::Paused,
        });
    } else {
        view.search = None;
        reduction.events.push(StoreEvent::SearchProgress {
            view_id,
            notice: SearchNotice::Cleared,
        });
    }
    reduction
}

pub(super) fn search_batch_loaded(
    state: &mut AppState,
    view_id: ViewId,
    generation: u64,
    result: Result<SearchChunk, Error>,
) -> Reduction {
    let Some(view) = state.view_mut(view_id) else {
        return Reduction::none();
    };
    let Some(session) = view.search.as_mut() else {
        log::debug!("dropping search batch for view {view_id:?}: no live session");
        return Reduction::none();
    };

    // Stale generation: a superseded invocation's chunk arrived late.
    // Dropped before any merge, unconditionally.
    if session.generation != generation {
        log::debug!(
            "dropping stale search batch (generation {generation}, live {})",
            session.generation
        );
        return Reduction::none();
    }

    let chunk = match result {
        Ok(chunk) => chunk,
        Err(error) => {
            // The session itself stays intact: accumulated results and
            // the resume cursor survive a transient provider failure.
            session.phase = SearchPhase::Failed;
            let msg = error.to_string();
            log::warn!("search failed for view {view_id:?}: {msg}");
            view.last_error = Some(msg.clone());
            push_diagnostic(view, DiagnosticKind::Error, msg);
            return Reduction::event(StoreEvent::SearchProgress {
                view_id,
                notice: SearchNotice::Failed,
            });
        }
    };

    let mut reduction = Reduction::none();

    // Pure merge first; every notification follows the settled state.
    session.results.merge_chunk(&chunk);
    if chunk.next_cursor.is_some() {
        session.resume_cursor = chunk.next_cursor.clone();
    }
    session.has_more = chunk.has_more;

    let mut notice = SearchNotice::Partial;
    if !chunk.has_more {
        session.resume_cursor = None;
        session.phase = SearchPhase::Completed;
        notice = SearchNotice::Final;
    } else if session.phase == SearchPhase::Searching {
        let cursor_in_window = session
            .resume_cursor
            .as_ref()
            .is_some_and(|c| view.graph.contains(&c.last_seen));
        let cursor_at_frontier = session
            .resume_cursor
            .as_ref()
            .map(|c| &c.last_seen)
            .is_some_and(|id| view.graph.last_id() == Some(id));

        if session.results.len() >= session.requested {
            // Explicit cutoff: the requested match budget is satisfied.
            session.phase = SearchPhase::Capped;
            notice = SearchNotice::Final;
        } else if session.resume_cursor.is_none() {
            session.phase = SearchPhase::Capped;
            notice = SearchNotice::Final;
        } else if cursor_in_window && !cursor_at_frontier {
            // Still scanning inside the materialized window: fetch the
            // next chunk right away.
            reduction.effects.push(Effect::RunSearch {
                view_id,
                generation,
                query: session.query.clone(),
                limit: session.requested - session.results.len(),
                cursor: session.resume_cursor.clone(),
            });
        } else {
            // The scan reached (or overran) the window frontier. Rest
            // here; window growth auto-continues the run so row order and
            // match order stay mutually consistent.
            session.phase = SearchPhase::Capped;
            notice = SearchNotice::Final;
        }
    }

    // A match that is not yet visible pulls the window toward it, so the
    // UI can jump there without a second round trip.
    if let Some(target) = session.results.first_not_in(&view.graph).cloned()
        && view.graph.has_more
        && !view.rows_loading
    {
        view.rows_loading = true;
        let cursor = view.graph.cursor.clone();
        reduction.effects.push(Effect::LoadGraphRows {
            view_id,
            limit: ROW_PAGE_LIMIT,
            target: Some(target),
            cursor,
        });
        // Growth will auto-continue a resting run, so the stream is still
        // logically in progress.
        if session.phase == SearchPhase::Capped && notice == SearchNotice::Final {
            notice = SearchNotice::Partial;
        }
    }

    reduction.events.push(StoreEvent::SearchProgress { view_id, notice });

    if !session.auto_selected
        && let Some(first) = session.results.first()
        && view.graph.contains(first)
    {
        session.auto_selected = true;
        let first = first.clone();
        view.selection.set(first, None);
        reduction.events.push(StoreEvent::SelectionChanged { view_id });
    }

    reduction
}

/// Called after every window growth while a session exists: resolves the
/// first-match selection, keeps pulling rows toward not-yet-visible
/// matches, and auto-continues a run resting on a cutoff once the window
/// has caught up with everything reported so far. The continuation is
/// folded into the row-growth notification that triggered it; its chunk
/// notifies on its own arrival.
pub(super) fn after_row_growth(view_id: ViewId, view: &mut ViewState, reduction: &mut Reduction) {
    let Some(session) = view.search.as_mut() else {
        return;
    };

    if !session.auto_selected
        && let Some(first) = session.results.first()
        && view.graph.contains(first)
    {
        session.auto_selected = true;
        let first = first.clone();
        view.selection.set(first, None);
        reduction.events.push(StoreEvent::SelectionChanged { view_id });
    }

    if let Some(target) = session.results.first_not_in(&view.graph).cloned() {
        if view.graph.has_more && !view.rows_loading {
            view.rows_loading = true;
            let cursor = view.graph.cursor.clone();
            reduction.effects.push(Effect::LoadGraphRows {
                view_id,
                limit: ROW_PAGE_LIMIT,
                target: Some(target),
                cursor,
            });
        }
        return;
    }

    if session.phase == SearchPhase::Capped
        && session.has_more
        && let Some(cursor) = session.resume_cursor.clone()
    {
        session.phase = SearchPhase::Searching;
        session.requested = session.results.len() + SEARCH_LIMIT;
        reduction.effects.push(Effect::RunSearch {
            view_id,
            generation: session.generation,
            query: session.query.clone(),
            limit: SEARCH_LIMIT,
            cursor: Some(cursor),
        });
    }
}
