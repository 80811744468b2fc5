mod mem;
mod noop_backend;

pub use mem::{MemoryBackend, MemoryHistory, MemoryHistoryBuilder};
pub use noop_backend::NoopBackend;

use gitscope_core::services::HistoryBackend;
use std::sync::Arc;

pub fn default_backend() -> Arc<dyn HistoryBackend> {
    Arc::new(NoopBackend)
}
