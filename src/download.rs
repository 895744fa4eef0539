//! The archive fetching seam and scenario directory resolution.

use crate::{
    common::*,
    config::{archive_for, ArchiveSpec, Scenario, TaskKind, SCENARIO_ARCHIVES},
    error::DatasetError,
};

/// Fetches, verifies and extracts dataset archives.
///
/// The dataset facade only decides *what* to fetch; transport and
/// extraction are left to the implementation injected by the caller.
pub trait Downloader {
    /// Ensure the archive described by `spec` is downloaded and
    /// extracted under `root`, returning the extracted directory.
    fn ensure_local_copy(&self, spec: &ArchiveSpec, root: &Path) -> Result<PathBuf>;
}

/// Find the extracted data directory of a named scenario under `root`.
///
/// Exactly one directory in the archive table may match; none is a
/// missing resource, more than one means the root is in a state no
/// archive layout can produce.
pub(crate) fn resolve_scenario_dir(
    root: &Path,
    scenario: Scenario,
    task: TaskKind,
) -> Result<PathBuf> {
    let wanted = archive_for(scenario, task).dir_name();

    let mut matched = None;
    for spec in SCENARIO_ARCHIVES {
        let name = spec.dir_name();
        if name != wanted {
            continue;
        }
        let candidate = root.join(name);
        if candidate.is_dir() {
            ensure!(
                matched.is_none(),
                DatasetError::Integrity(format!(
                    "two directories under '{}' match scenario data '{}'",
                    root.display(),
                    wanted
                ))
            );
            matched = Some(candidate);
        }
    }

    matched.ok_or_else(|| DatasetError::MissingResource(root.join(wanted)).into())
}
