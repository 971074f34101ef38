use tokio::runtime::Handle;

use crate::engine;
use crate::entry::Entry;
use crate::error::ConfigError;
use crate::fs::{FileSystem, TokioFs};
use crate::options::{WalkOptions, WalkRoot};
use crate::stream::Walk;

/// Configures a traversal rooted at a path or `file://` URL.
///
/// ```no_run
/// # async fn demo() -> Result<(), walk::ConfigError> {
/// let mut walk = walk::WalkBuilder::new("/var/log")
///     .max_concurrency(32)
///     .visit(|entry| entry.name() != "journal")
///     .build()?;
/// while let Some(entry) = walk.next_entry().await {
///     println!("{}", entry.path().display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: WalkRoot,
    options: WalkOptions,
}

impl WalkBuilder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new(root: impl Into<WalkRoot>) -> Self {
        Self {
            root: root.into(),
            options: WalkOptions::default(),
        }
    }

    /// Replaces every option at once.
    #[must_use]
    pub fn options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// See [`WalkOptions::max_concurrency`].
    #[must_use]
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.options = self.options.max_concurrency(max);
        self
    }

    /// See [`WalkOptions::listing_concurrency`].
    #[must_use]
    pub fn listing_concurrency(mut self, max: usize) -> Self {
        self.options = self.options.listing_concurrency(max);
        self
    }

    /// See [`WalkOptions::backlog_threshold`].
    #[must_use]
    pub fn backlog_threshold(mut self, threshold: usize) -> Self {
        self.options = self.options.backlog_threshold(threshold);
        self
    }

    /// See [`WalkOptions::follow_symlinks`].
    #[must_use]
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.options = self.options.follow_symlinks(follow);
        self
    }

    /// See [`WalkOptions::max_depth`].
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options = self.options.max_depth(depth);
        self
    }

    /// See [`WalkOptions::visit`].
    #[must_use]
    pub fn visit<F>(mut self, visit: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.visit(visit);
        self
    }

    /// Starts the traversal on the real filesystem.
    ///
    /// Must be called from within a Tokio runtime; the driver task is spawned
    /// onto it.
    pub fn build(self) -> Result<Walk, ConfigError> {
        let runtime = current_runtime()?;
        let root = self.root.resolve()?;
        let options = self.options.validate()?;
        let fs = TokioFs::new(options.follow_symlinks);
        Ok(engine::spawn(root, options, fs, &runtime))
    }

    /// Starts the traversal against a custom [`FileSystem`].
    ///
    /// The symlink option is not consulted; `fs` decides how links resolve.
    pub fn build_on<F: FileSystem>(self, fs: F) -> Result<Walk, ConfigError> {
        let runtime = current_runtime()?;
        let root = self.root.resolve()?;
        let options = self.options.validate()?;
        Ok(engine::spawn(root, options, fs, &runtime))
    }
}

/// Starts a traversal of `root` on the real filesystem.
///
/// Shorthand for `WalkBuilder::new(root).options(options).build()`.
pub fn walk(root: impl Into<WalkRoot>, options: WalkOptions) -> Result<Walk, ConfigError> {
    WalkBuilder::new(root).options(options).build()
}

fn current_runtime() -> Result<Handle, ConfigError> {
    Handle::try_current().map_err(|_| ConfigError::NoRuntime)
}
