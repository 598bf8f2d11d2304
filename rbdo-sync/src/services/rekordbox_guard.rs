//! Rekordbox process check
//!
//! Rekordbox keeps its own copy of the catalog in memory and overwrites
//! `master.db` on exit, so changes committed while it runs are lost.

use crate::error::{Result, SyncError};
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// True for the Rekordbox application itself (not its helper agents)
pub fn is_rekordbox_process(name: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    name == "rekordbox"
}

/// Fail with `CommitBlocked` when any of `names` is Rekordbox
pub fn check_not_running<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    match names.into_iter().find(|name| is_rekordbox_process(name)) {
        Some(name) => Err(SyncError::CommitBlocked(format!(
            "Rekordbox is running (process {})",
            name
        ))),
        None => Ok(()),
    }
}

/// Check the live process table before committing
pub fn ensure_rekordbox_closed() -> Result<()> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new()),
    );
    let result = check_not_running(system.processes().values().map(|p| p.name()));
    tracing::debug!(
        processes = system.processes().len(),
        running = result.is_err(),
        "Checked for a running Rekordbox"
    );
    result
}
