//! Package loader
//!
//! The type checker runs outside this crate and leaves one `*.tree.json`
//! dump per package in the scanned directory. The loader accepts a directory
//! holding exactly one such dump whose package checked without errors.

use crate::tree::{Package, FORMAT_VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of package dump files
pub const DUMP_EXTENSION: &str = ".tree.json";

/// Failures to obtain a single, well-formed package
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("no package found in {}", .0.display())]
    NoPackage(PathBuf),

    #[error("multiple packages found in {}: {}", .dir.display(), .found.join(", "))]
    MultiplePackages { dir: PathBuf, found: Vec<String> },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported dump format version {found} in {} (expected {expected})", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("package {package} has errors: {}", .errors.join("; "))]
    PackageErrors { package: String, errors: Vec<String> },
}

fn is_dump(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(DUMP_EXTENSION))
}

/// Dump files in `dir`, sorted by name
pub fn find_dumps(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut dumps = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if is_dump(&path) {
            dumps.push(path);
        }
    }
    dumps.sort();
    Ok(dumps)
}

/// Parse one dump file and check that it can be analyzed
pub fn load_dump(path: &Path) -> Result<Package, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let package: Package = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if package.format_version != FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: package.format_version,
            expected: FORMAT_VERSION,
        });
    }
    if !package.errors.is_empty() {
        return Err(LoadError::PackageErrors {
            package: package.path,
            errors: package.errors,
        });
    }
    Ok(package)
}

/// Load the single package dumped into `dir`
pub fn load_package<P: AsRef<Path>>(dir: P) -> Result<Package, LoadError> {
    let dir = dir.as_ref();
    let dumps = find_dumps(dir)?;

    let path = match dumps.as_slice() {
        [] => return Err(LoadError::NoPackage(dir.to_path_buf())),
        [path] => path,
        _ => {
            return Err(LoadError::MultiplePackages {
                dir: dir.to_path_buf(),
                found: dumps
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect(),
            })
        }
    };

    tracing::debug!(path = %path.display(), "loading package dump");
    let package = load_dump(path)?;
    tracing::debug!(
        package = %package.path,
        files = package.files.len(),
        "package loaded"
    );
    Ok(package)
}
