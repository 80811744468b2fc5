use crate::model::{DiagnosticEntry, DiagnosticKind, ViewState};
use std::path::PathBuf;
use std::time::SystemTime;

pub(super) fn push_diagnostic(view: &mut ViewState, kind: DiagnosticKind, message: String) {
    const MAX_DIAGNOSTICS: usize = 200;
    view.diagnostics.push(DiagnosticEntry {
        time: SystemTime::now(),
        kind,
        message,
    });
    if view.diagnostics.len() > MAX_DIAGNOSTICS {
        let extra = view.diagnostics.len() - MAX_DIAGNOSTICS;
        view.diagnostics.drain(0..extra);
    }
}

pub(super) fn normalize_view_path(path: PathBuf) -> PathBuf {
    let path = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path
    };

    std::fs::canonicalize(&path).unwrap_or(path)
}
