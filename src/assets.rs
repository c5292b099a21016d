//! Copies the static asset tree into the output directory verbatim.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively copies every file under `src` into `dst`, overwriting existing
/// files and preserving the directory structure. Anything under `exclude`
/// (normally the output root) is skipped, so an output directory nested in
/// the asset directory is never copied into itself. Returns the number of
/// files copied.
pub fn copy_dir(src: &Path, dst: &Path, exclude: &Path) -> Result<usize> {
    let src = std::fs::canonicalize(src).map_err(|err| Error::Io {
        path: src.to_owned(),
        err,
    })?;
    let exclude = std::fs::canonicalize(exclude)
        .ok()
        .filter(|exclude| exclude.starts_with(&src));

    let mut copied = 0;
    let walker = WalkDir::new(&src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match &exclude {
            Some(exclude) => !entry.path().starts_with(exclude),
            None => true,
        });
    for result in walker {
        let entry = result.map_err(|err| Error::Walk {
            path: src.clone(),
            err,
        })?;
        // `entry` always lives under `src`.
        let relative = match entry.path().strip_prefix(&src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|err| Error::Io {
                path: target.clone(),
                err,
            })?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Io {
                path: entry.path().to_owned(),
                err,
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure copying static assets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("copying static files from `{}`: {err}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        err: walkdir::Error,
    },

    #[error("copying static file `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
