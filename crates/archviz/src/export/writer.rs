//! Writes the rendered outputs of one diagram.
//!
//! Every output is first written to a temporary file in the target
//! directory and only moved to its final name once all of them exist. An
//! existing file at a target name is moved aside before it is replaced and
//! put back if a later output cannot be moved into place, so a failure
//! leaves the directory as it was.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tempfile::{NamedTempFile, TempPath};

use archviz_core::model::OutputFormat;

use crate::error::ArchvizError;

/// An output moved to its final name, with the file it replaced.
struct Persisted {
    path: PathBuf,
    previous: Option<TempPath>,
}

/// Writes `outputs` as `<basename>.<extension>` files in `out_dir`.
///
/// Returns the written paths in the order of `outputs`.
pub(crate) fn write_outputs(
    out_dir: &Path,
    basename: &str,
    outputs: &[(OutputFormat, Vec<u8>)],
) -> Result<Vec<PathBuf>, ArchvizError> {
    fs::create_dir_all(out_dir).map_err(|source| ArchvizError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut staged = Vec::with_capacity(outputs.len());
    for (format, bytes) in outputs {
        let path = out_dir.join(format!("{basename}.{}", format.extension()));
        let mut file = NamedTempFile::new_in(out_dir).map_err(|source| ArchvizError::Write {
            path: path.clone(),
            source,
        })?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|source| ArchvizError::Write {
                path: path.clone(),
                source,
            })?;
        staged.push((file, path));
    }

    let mut persisted: Vec<Persisted> = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        let previous = match move_aside(out_dir, &path) {
            Ok(previous) => previous,
            Err(source) => {
                roll_back(persisted);
                return Err(ArchvizError::Write { path, source });
            }
        };
        if let Err(err) = file.persist(&path) {
            if previous.is_some() {
                restore(&path, previous);
            }
            roll_back(persisted);
            return Err(ArchvizError::Write {
                path,
                source: err.error,
            });
        }
        debug!(path:? = path, replaced = previous.is_some(); "Output written");
        persisted.push(Persisted { path, previous });
    }

    // Dropping the moved-aside files deletes them.
    Ok(persisted.into_iter().map(|output| output.path).collect())
}

/// Moves an existing regular file at `path` to a temporary name in `out_dir`.
fn move_aside(out_dir: &Path, path: &Path) -> io::Result<Option<TempPath>> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup = NamedTempFile::new_in(out_dir)?.into_temp_path();
    fs::rename(path, &backup)?;
    Ok(Some(backup))
}

/// Puts `previous` back at `path`, or removes `path` if nothing was there.
fn restore(path: &Path, previous: Option<TempPath>) {
    let result = match previous {
        Some(backup) => {
            let result = fs::rename(&backup, path);
            if result.is_ok() {
                // The backup now lives at `path`; keep it from being deleted.
                let _ = backup.keep();
            }
            result
        }
        None => fs::remove_file(path),
    };
    if let Err(err) = result {
        warn!(path:? = path, err:% = err; "Failed to restore previous output");
    }
}

fn roll_back(persisted: Vec<Persisted>) {
    for output in persisted.into_iter().rev() {
        restore(&output.path, output.previous);
    }
}
