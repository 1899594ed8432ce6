//! Go modules regeneration after a replay
//!
//! Each run restores `go.mod`/`go.sum` from the source branch, runs
//! `go mod tidy` (and `go mod vendor` when a vendor tree already exists) and
//! commits the result with [`GENERATED_COMMIT_MESSAGE`]. The next run drops
//! that commit during selection and regenerates it.

use crate::error::{Error, Result};
use crate::repo::GitWorkspace;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Message of the generated commit.
///
/// Reserved: matched by exact equality to prune the previous run's commit.
pub const GENERATED_COMMIT_MESSAGE: &str =
    "UPSTREAM: <carry>: Updating and vendoring go modules after an upstream rebase";

const LOCKFILES: [&str; 2] = ["go.mod", "go.sum"];

/// Directories (relative to the workspace root) that contain a `go.mod`
pub fn find_module_roots(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = root.join("**").join("go.mod");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::LockfileUpdate(format!("non UTF-8 path {}", root.display())))?;

    let mut roots = Vec::new();
    for entry in glob::glob(pattern).map_err(|e| Error::LockfileUpdate(e.to_string()))? {
        let path = entry.map_err(|e| Error::LockfileUpdate(e.to_string()))?;
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        // go.mod files inside vendored dependencies are not ours to tidy
        if relative
            .components()
            .any(|c| c.as_os_str() == "vendor" || c.as_os_str() == ".git")
        {
            continue;
        }
        if let Some(dir) = relative.parent() {
            roots.push(dir.to_path_buf());
        }
    }
    roots.sort();
    Ok(roots)
}

fn run_go(module_dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("go")
        .args(args)
        .current_dir(module_dir)
        .output()
        .map_err(|e| Error::LockfileUpdate(format!("failed to run go {}: {e}", args.join(" "))))?;

    debug!(
        args = ?args,
        stdout = %String::from_utf8_lossy(&output.stdout),
        "go command output"
    );

    if !output.status.success() {
        return Err(Error::LockfileUpdate(format!(
            "go {} in {}: {}",
            args.join(" "),
            module_dir.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn restore_from_source(ws: &GitWorkspace, source_ref: &str, module: &Path) {
    for name in LOCKFILES {
        let relative = module.join(name);
        if !ws.root().join(&relative).exists() {
            continue;
        }
        let path = relative.to_string_lossy();
        if ws.checkout_path_from(source_ref, &path).is_err() {
            debug!(module = %module.display(), "go.mod and go.sum are not present upstream, skip resetting them");
            break;
        }
    }
}

/// Regenerate module files and commit them if anything changed.
///
/// Returns whether a commit was created.
pub fn update_go_modules(ws: &GitWorkspace, source_ref: &str) -> Result<bool> {
    info!("performing go modules update");

    for module in find_module_roots(ws.root())? {
        restore_from_source(ws, source_ref, &module);

        let dir = ws.root().join(&module);
        run_go(&dir, &["mod", "tidy"])?;
        if dir.join("vendor").is_dir() {
            run_go(&dir, &["mod", "vendor"])?;
        }
    }

    if !ws.is_dirty()? {
        return Ok(false);
    }

    ws.add_all()?;
    ws.commit(GENERATED_COMMIT_MESSAGE, None)
        .map_err(|e| Error::LockfileUpdate(format!("unable to commit go module changes: {e}")))?;
    Ok(true)
}
