//! `sigcheck clean`: removes cached signatures.

use sigcheck_cache::ArtifactStore;
use tracing::info;

use crate::pipeline::{load_project, select_units};
use crate::{CleanArgs, GlobalArgs};

/// Runs the `sigcheck clean` command.
///
/// Removes the artifacts of the selected units, then any artifact whose
/// unit is no longer declared. Returns exit code 0 on success.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let units = select_units(&config, &args.units)?;
    let store = ArtifactStore::new(&project_dir.join(&config.check.cache_dir));

    let mut removed = 0;
    for unit in &units {
        if store.remove(unit)? {
            info!(unit = %unit, "removed cached signature");
            removed += 1;
        }
    }

    let declared: Vec<&str> = config.units.keys().map(String::as_str).collect();
    let stale = store.gc(&declared)?;
    if stale > 0 {
        info!(count = stale, "removed artifacts of undeclared units");
    }

    if !global.quiet {
        eprintln!(
            "   Removed {} cached signature(s) from {}",
            removed + stale,
            store.cache_dir().display()
        );
    }
    Ok(0)
}
