//! Walk parameters and their validation.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use logging::trace_walk;
use url::Url;

use crate::entry::Entry;
use crate::error::ConfigError;
use crate::flow::DEFAULT_BACKLOG_THRESHOLD;

/// Metadata probes allowed in flight when nothing else is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Directory listings allowed in flight when nothing else is configured.
pub const DEFAULT_LISTING_CONCURRENCY: usize = 1;

/// Environment variable consulted when `max_concurrency` is not set explicitly.
pub const MAX_CONCURRENCY_ENV: &str = "FSWALK_MAX_CONCURRENCY";

pub(crate) type VisitFn = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Traversal root: a filesystem path or a `file://` URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkRoot {
    /// Plain path, absolute or relative to the current directory.
    Path(PathBuf),
    /// `file://` URL converted to a path before use.
    Url(Url),
}

impl WalkRoot {
    /// Resolves the root to an absolute, lexically normalised path.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        let path = match self {
            Self::Path(path) => path.clone(),
            Self::Url(url) => {
                if url.scheme() != "file" {
                    return Err(ConfigError::NotAFileUrl(url.clone()));
                }
                url.to_file_path()
                    .map_err(|()| ConfigError::NotAFileUrl(url.clone()))?
            }
        };
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }
        absolutize(&path)
    }
}

impl From<PathBuf> for WalkRoot {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for WalkRoot {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&PathBuf> for WalkRoot {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&str> for WalkRoot {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for WalkRoot {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Url> for WalkRoot {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<&Url> for WalkRoot {
    fn from(url: &Url) -> Self {
        Self::Url(url.clone())
    }
}

/// Tunables for a walk.
///
/// ```
/// use walk::WalkOptions;
///
/// let options = WalkOptions::new()
///     .max_concurrency(4)
///     .visit(|entry| entry.name() != "target");
/// assert_eq!(options.resolved_max_concurrency(), 4);
/// ```
#[derive(Clone, Default)]
pub struct WalkOptions {
    max_concurrency: Option<usize>,
    listing_concurrency: Option<usize>,
    backlog_threshold: Option<usize>,
    follow_symlinks: Option<bool>,
    max_depth: Option<usize>,
    visit: Option<VisitFn>,
}

impl WalkOptions {
    /// Creates options with every value at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of metadata probes in flight. Must be positive.
    ///
    /// Also serves as the backpressure threshold: once this many entries are
    /// emitted but not yet pulled, probing throttles down.
    #[must_use]
    pub const fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Maximum number of directory listings in flight. Must be positive.
    #[must_use]
    pub const fn listing_concurrency(mut self, max: usize) -> Self {
        self.listing_concurrency = Some(max);
        self
    }

    /// Pending probe count above which directory listing slows down.
    #[must_use]
    pub const fn backlog_threshold(mut self, threshold: usize) -> Self {
        self.backlog_threshold = Some(threshold);
        self
    }

    /// Whether metadata lookups follow symbolic links (default `true`).
    ///
    /// Followed links to directories are descended into. No cycle detection
    /// is performed.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = Some(follow);
        self
    }

    /// Deepest depth at which entries are emitted (root children are `0`).
    ///
    /// Directories at this depth are emitted but never listed, so nothing
    /// below the limit is ever read.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Installs a filter. Entries for which it returns `false` are neither
    /// emitted nor, for directories, descended into.
    #[must_use]
    pub fn visit<F>(mut self, visit: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.visit = Some(Arc::new(visit));
        self
    }

    /// Effective probe concurrency: explicit value, then
    /// [`MAX_CONCURRENCY_ENV`], then [`DEFAULT_MAX_CONCURRENCY`].
    #[must_use]
    pub fn resolved_max_concurrency(&self) -> usize {
        if let Some(max) = self.max_concurrency {
            return max;
        }
        match std::env::var(MAX_CONCURRENCY_ENV) {
            Ok(value) => parse_env_concurrency(&value).unwrap_or_else(|| {
                tracing::warn!(
                    target: "fswalk::walk",
                    "ignoring invalid {}={:?}, using {}",
                    MAX_CONCURRENCY_ENV,
                    value,
                    DEFAULT_MAX_CONCURRENCY
                );
                DEFAULT_MAX_CONCURRENCY
            }),
            Err(_) => DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub(crate) fn validate(self) -> Result<ResolvedOptions, ConfigError> {
        let max_concurrency = self.resolved_max_concurrency();
        if max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        let listing_concurrency = self
            .listing_concurrency
            .unwrap_or(DEFAULT_LISTING_CONCURRENCY);
        if listing_concurrency == 0 {
            return Err(ConfigError::ZeroListingConcurrency);
        }
        let backlog_threshold = self.backlog_threshold.unwrap_or(DEFAULT_BACKLOG_THRESHOLD);
        if backlog_threshold == 0 {
            return Err(ConfigError::ZeroBacklogThreshold);
        }
        let resolved = ResolvedOptions {
            max_concurrency,
            listing_concurrency,
            backlog_threshold,
            follow_symlinks: self.follow_symlinks.unwrap_or(true),
            max_depth: self.max_depth,
            visit: self.visit,
        };
        trace_walk!(
            "options: max_concurrency={} listing_concurrency={} backlog_threshold={} follow_symlinks={} max_depth={:?} visit={}",
            resolved.max_concurrency,
            resolved.listing_concurrency,
            resolved.backlog_threshold,
            resolved.follow_symlinks,
            resolved.max_depth,
            resolved.visit.is_some()
        );
        Ok(resolved)
    }
}

impl fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkOptions")
            .field("max_concurrency", &self.max_concurrency)
            .field("listing_concurrency", &self.listing_concurrency)
            .field("backlog_threshold", &self.backlog_threshold)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("max_depth", &self.max_depth)
            .field("visit", &self.visit.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

pub(crate) struct ResolvedOptions {
    pub(crate) max_concurrency: usize,
    pub(crate) listing_concurrency: usize,
    pub(crate) backlog_threshold: usize,
    pub(crate) follow_symlinks: bool,
    pub(crate) max_depth: Option<usize>,
    pub(crate) visit: Option<VisitFn>,
}

fn parse_env_concurrency(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|max| *max > 0)
}

/// Joins relative paths onto the current directory and drops `.` and `..`
/// components without touching the filesystem.
fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(ConfigError::CurrentDir)?
            .join(path)
    };

    let mut normalised = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_os_str()),
        }
    }
    Ok(normalised)
}
