use crate::model::ViewId;
use crate::msg::{Effect, Msg};
use gitscope_core::domain::{GraphPage, GraphRow, RepoSpec};
use gitscope_core::services::{HistoryBackend, HistoryProvider};
use std::collections::HashMap;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use super::cancel::{CancelDomain, CancelRegistry};
use super::executor::TaskExecutor;

/// Provider page size for one row-loader round trip.
const ROW_CHUNK: usize = 100;
/// Provider chunk size for one search round trip; each chunk is a
/// progressive batch delivered to the reducer.
const SEARCH_CHUNK: usize = 50;
/// How long the hover path waits for enrichment before deferring it.
const ENRICHMENT_DEADLINE: Duration = Duration::from_millis(100);

pub(super) fn schedule_effect(
    executor: &TaskExecutor,
    backend: &Arc<dyn HistoryBackend>,
    providers: &HashMap<ViewId, Arc<dyn HistoryProvider>>,
    cancels: &mut CancelRegistry,
    msg_tx: mpsc::Sender<Msg>,
    effect: Effect,
) {
    match effect {
        Effect::OpenView { view_id, path } => {
            let backend = Arc::clone(backend);
            executor.spawn(move || {
                let spec = RepoSpec { workdir: path };
                match backend.open(&spec.workdir) {
                    Ok(provider) => {
                        let _ = msg_tx.send(Msg::ViewOpenedOk {
                            view_id,
                            spec,
                            provider,
                        });
                    }
                    Err(error) => {
                        let _ = msg_tx.send(Msg::ViewOpenedErr {
                            view_id,
                            spec,
                            error,
                        });
                    }
                }
            });
        }

        Effect::LoadBranchState { view_id } => {
            if let Some(provider) = providers.get(&view_id).cloned() {
                let token = cancels.begin(view_id, CancelDomain::BranchState);
                executor.spawn(move || {
                    if token.is_cancelled() {
                        return;
                    }
                    let result = provider.head();
                    if token.is_cancelled() {
                        return;
                    }
                    let _ = msg_tx.send(Msg::BranchStateLoaded { view_id, result });
                });
            }
        }

        Effect::LoadGraphRows {
            view_id,
            limit,
            target,
            cursor,
        } => {
            if let Some(provider) = providers.get(&view_id).cloned() {
                let token = cancels.begin(view_id, CancelDomain::Rows);
                executor.spawn(move || {
                    let mut acc: Vec<GraphRow> = Vec::new();
                    let mut cursor = cursor;

                    let result = loop {
                        // Suspension point: the token is observed before
                        // every provider round trip.
                        if token.is_cancelled() {
                            return;
                        }

                        let page_limit = if limit == 0 {
                            ROW_CHUNK
                        } else {
                            ROW_CHUNK.min(limit - acc.len())
                        };

                        match provider.graph_page(page_limit, cursor.as_ref(), &token) {
                            Err(error) => break Err(error),
                            Ok(page) => {
                                let target_found = target
                                    .as_ref()
                                    .is_some_and(|t| page.rows.iter().any(|r| &r.id == t));
                                let stalled = page.rows.is_empty();
                                let has_more = page.has_more;
                                let next_cursor = page.next_cursor.clone();
                                acc.extend(page.rows);

                                if !has_more {
                                    break Ok(GraphPage {
                                        rows: std::mem::take(&mut acc),
                                        next_cursor: None,
                                        has_more: false,
                                    });
                                }
                                cursor = next_cursor;
                                if target_found
                                    || stalled
                                    || (limit > 0 && acc.len() >= limit)
                                {
                                    break Ok(GraphPage {
                                        rows: std::mem::take(&mut acc),
                                        next_cursor: cursor.clone(),
                                        has_more: true,
                                    });
                                }
                            }
                        }
                    };

                    if token.is_cancelled() {
                        return;
                    }
                    let _ = msg_tx.send(Msg::GraphRowsLoaded {
                        view_id,
                        target,
                        result,
                    });
                });
            }
        }

        Effect::RunSearch {
            view_id,
            generation,
            query,
            limit,
            cursor,
        } => {
            if let Some(provider) = providers.get(&view_id).cloned() {
                let token = cancels.begin(view_id, CancelDomain::Search);
                executor.spawn(move || {
                    // Suspension point: cancellation here is a truncation.
                    // Everything already reported stands, nothing further
                    // is fetched.
                    if token.is_cancelled() {
                        return;
                    }

                    let chunk_limit = SEARCH_CHUNK.min(limit).max(1);
                    let result = provider.search_page(
                        &query,
                        query.ordering,
                        chunk_limit,
                        cursor.as_ref(),
                        &token,
                    );

                    if token.is_cancelled() {
                        return;
                    }
                    let _ = msg_tx.send(Msg::SearchBatchLoaded {
                        view_id,
                        generation,
                        result,
                    });
                });
            }
        }

        Effect::CancelSearch { view_id } => {
            cancels.cancel(view_id, CancelDomain::Search);
        }

        Effect::CancelView { view_id } => {
            cancels.cancel_view(view_id);
        }

        Effect::LoadCommitDetails { view_id, id } => {
            if let Some(provider) = providers.get(&view_id).cloned() {
                let token = cancels.begin(view_id, CancelDomain::Hover);
                executor.spawn(move || {
                    if token.is_cancelled() {
                        return;
                    }

                    let details = match provider.commit_details(&id) {
                        Ok(details) => details,
                        Err(error) => {
                            if !token.is_cancelled() {
                                let _ = msg_tx.send(Msg::CommitDetailsLoaded {
                                    view_id,
                                    id,
                                    result: Err(error),
                                    enrichment: None,
                                });
                            }
                            return;
                        }
                    };

                    // Enrichment races a short deadline: resolved in time
                    // it rides along with the primary result, otherwise
                    // the primary goes out now and a follow-up message
                    // patches it in.
                    let (etx, erx) = mpsc::channel();
                    {
                        let provider = Arc::clone(&provider);
                        let id = id.clone();
                        thread::spawn(move || {
                            let _ = etx.send(provider.commit_enrichment(&id));
                        });
                    }

                    let (inline, deferred) = match erx.recv_timeout(ENRICHMENT_DEADLINE) {
                        Ok(Ok(enrichment)) => (Some(enrichment), false),
                        Ok(Err(_)) => (None, false),
                        Err(_) => (None, true),
                    };

                    if token.is_cancelled() {
                        return;
                    }
                    let _ = msg_tx.send(Msg::CommitDetailsLoaded {
                        view_id,
                        id: id.clone(),
                        result: Ok(details),
                        enrichment: inline,
                    });

                    if deferred && let Ok(result) = erx.recv() {
                        if token.is_cancelled() {
                            return;
                        }
                        let _ = msg_tx.send(Msg::CommitEnrichmentLoaded {
                            view_id,
                            id,
                            result,
                        });
                    }
                });
            }
        }
    }
}
