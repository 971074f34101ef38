use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Coarse classification of a filesystem object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKind {
    /// A directory; the walker descends into it.
    Directory,
    /// A regular file.
    File,
    /// A symbolic link that was not followed.
    Symlink,
    /// Sockets, FIFOs, device nodes and anything else.
    Other,
}

impl FileKind {
    /// Short lowercase label used in diagnostics and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "dir",
            Self::File => "file",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

impl From<fs::FileType> for FileKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

/// Metadata snapshot captured for an entry.
///
/// The walker owns this type rather than exposing [`fs::Metadata`] so that
/// alternative [`FileSystem`](crate::FileSystem) implementations can produce
/// it without touching the operating system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    kind: FileKind,
    len: u64,
    modified: Option<SystemTime>,
    readonly: bool,
    mode: Option<u32>,
}

impl Metadata {
    /// Creates metadata of the given kind and size with no timestamps.
    #[must_use]
    pub const fn new(kind: FileKind, len: u64) -> Self {
        Self {
            kind,
            len,
            modified: None,
            readonly: false,
            mode: None,
        }
    }

    /// Shorthand for directory metadata.
    #[must_use]
    pub const fn directory() -> Self {
        Self::new(FileKind::Directory, 0)
    }

    /// Shorthand for regular file metadata of `len` bytes.
    #[must_use]
    pub const fn file(len: u64) -> Self {
        Self::new(FileKind::File, len)
    }

    /// Sets the modification time.
    #[must_use]
    pub const fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Sets the permission bits.
    #[must_use]
    pub const fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Marks the entry read-only.
    #[must_use]
    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Returns the entry kind.
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        self.kind
    }

    /// Returns `true` for directories (including followed directory symlinks).
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, FileKind::Directory)
    }

    /// Returns `true` for regular files.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, FileKind::File)
    }

    /// Returns `true` for symbolic links that were not followed.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.kind, FileKind::Symlink)
    }

    /// Size in bytes as reported by the filesystem.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` when the reported size is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last modification time, when the platform provides it.
    #[must_use]
    pub const fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Whether the permissions mark the entry read-only.
    #[must_use]
    pub const fn readonly(&self) -> bool {
        self.readonly
    }

    /// Unix permission bits, `None` on other platforms.
    #[must_use]
    pub const fn mode(&self) -> Option<u32> {
        self.mode
    }
}

impl From<fs::Metadata> for Metadata {
    fn from(metadata: fs::Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Self {
            kind: FileKind::from(metadata.file_type()),
            len: metadata.len(),
            modified: metadata.modified().ok(),
            readonly: metadata.permissions().readonly(),
            mode,
        }
    }
}

/// A filesystem object discovered by the walker.
///
/// Entries are immutable once emitted. The depth counts directory boundaries
/// crossed from the traversal root, so the root's direct children sit at
/// depth `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub(crate) path: PathBuf,
    pub(crate) name: OsString,
    pub(crate) depth: usize,
    pub(crate) metadata: Metadata,
}

impl Entry {
    /// Returns the absolute path to the filesystem entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the final component of the path.
    #[must_use]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Reports the depth of the entry relative to the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Provides access to the metadata captured for the entry.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns `true` when the entry is a directory the walker descends into.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    /// Returns the path relative to `root`, when the entry lives under it.
    #[must_use]
    pub fn relative_to<'a>(&'a self, root: &Path) -> Option<&'a Path> {
        self.path.strip_prefix(root).ok()
    }

    /// Consumes the entry and returns its absolute path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}
