use crate::model::{AppState, ViewId};
use crate::msg::{Msg, StoreEvent};
use crate::search_history;
use gitscope_core::services::{HistoryBackend, HistoryProvider};
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock, mpsc};
use std::thread;

mod cancel;
mod effects;
mod executor;
mod reducer;

use cancel::CancelRegistry;
use effects::schedule_effect;
use executor::{TaskExecutor, default_worker_threads};
use reducer::reduce;

/// One store per open history surface. The store thread owns the state
/// and runs the reducer; long-running work goes to the worker pool and
/// completes by sending messages back. Events for one reduce step are
/// delivered before its effects are scheduled, so consumers observe
/// merge-then-notify ordering.
pub struct AppStore {
    state: Arc<RwLock<AppState>>,
    msg_tx: mpsc::Sender<Msg>,
}

impl Clone for AppStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            msg_tx: self.msg_tx.clone(),
        }
    }
}

impl AppStore {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> (Self, mpsc::Receiver<StoreEvent>) {
        let state = Arc::new(RwLock::new(AppState {
            search_history: search_history::load(),
            ..AppState::default()
        }));
        let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
        let (event_tx, event_rx) = mpsc::channel::<StoreEvent>();

        let thread_state = Arc::clone(&state);
        let thread_msg_tx = msg_tx.clone();

        thread::spawn(move || {
            let executor = TaskExecutor::new(default_worker_threads());
            let mut providers: HashMap<ViewId, Arc<dyn HistoryProvider>> = HashMap::new();
            let mut cancels = CancelRegistry::default();
            let id_alloc = AtomicU64::new(1);

            while let Ok(msg) = msg_rx.recv() {
                let reduction = {
                    let mut app_state = thread_state.write().expect("state lock poisoned (write)");

                    reduce(&mut providers, &id_alloc, &mut app_state, msg)
                };

                if reduction.events.is_empty() {
                    let _ = event_tx.send(StoreEvent::StateChanged);
                } else {
                    for event in &reduction.events {
                        let _ = event_tx.send(*event);
                    }
                }

                for effect in reduction.effects {
                    schedule_effect(
                        &executor,
                        &backend,
                        &providers,
                        &mut cancels,
                        thread_msg_tx.clone(),
                        effect,
                    );
                }
            }
        });

        (Self { state, msg_tx }, event_rx)
    }

    pub fn dispatch(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }

    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .expect("state lock poisoned (read)")
            .clone()
    }
}

#[cfg(test)]
mod tests;
