//! Path sandboxing for file-valued tool parameters.

use crate::error::{GeminiError, Result};
use std::path::{Component, Path, PathBuf};

/// Extra checks applied once a path is known to be inside the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRequirement {
    /// Only the sandbox check.
    Any,
    /// The path must exist.
    Exists,
    /// The path must exist and be a regular file.
    File,
}

/// The set of directories file parameters may resolve into.
///
/// Built once at start-up and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AllowedDirectories {
    roots: Vec<PathBuf>,
}

impl AllowedDirectories {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = dirs
            .into_iter()
            .filter_map(|dir| match resolve(dir.as_ref()) {
                Ok(root) => {
                    if !root.is_dir() {
                        tracing::warn!("Allowed directory does not exist yet: {}", root.display());
                    }
                    Some(root)
                }
                Err(e) => {
                    tracing::warn!("Ignoring allowed directory {}: {}", dir.as_ref().display(), e);
                    None
                }
            })
            .collect();

        Self { roots }
    }

    /// Sandbox rooted at the process working directory.
    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self::new([std::env::current_dir()?]))
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether an already canonical path lies at or below one of the roots.
    pub fn contains(&self, canonical: &Path) -> bool {
        self.roots.iter().any(|root| canonical.starts_with(root))
    }

    /// Resolve `path` and accept it only if it stays inside the sandbox.
    ///
    /// The sandbox check runs before the existence and file-type checks, so a
    /// path that escapes the roots is always reported as such.
    pub fn validate(&self, path: &str, requirement: PathRequirement) -> Result<PathBuf> {
        let resolved = resolve(Path::new(path))?;

        if !self.contains(&resolved) {
            return Err(GeminiError::PathOutsideSandbox {
                path: path.to_string(),
                allowed: self.roots.clone(),
            });
        }

        match requirement {
            PathRequirement::Any => {}
            PathRequirement::Exists => {
                if !resolved.exists() {
                    return Err(GeminiError::PathNotFound(path.to_string()));
                }
            }
            PathRequirement::File => {
                if !resolved.exists() {
                    return Err(GeminiError::PathNotFound(path.to_string()));
                }
                if !resolved.is_file() {
                    return Err(GeminiError::NotAFile(path.to_string()));
                }
            }
        }

        Ok(resolved)
    }
}

/// Make `path` absolute and canonical.
///
/// Paths that do not exist are resolved through their deepest existing
/// ancestor, with the remaining components normalized lexically.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let first_err = match absolute.canonicalize() {
        Ok(canonical) => return Ok(canonical),
        Err(e) => e,
    };

    let components: Vec<Component<'_>> = absolute.components().collect();
    for split in (1..components.len()).rev() {
        let ancestor: PathBuf = components[..split].iter().collect();
        let Ok(mut base) = ancestor.canonicalize() else {
            continue;
        };
        for component in &components[split..] {
            match component {
                Component::ParentDir => {
                    base.pop();
                }
                Component::Normal(part) => base.push(part),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(base);
    }

    Err(first_err)
}
