//! Debug flags and their per-flag levels.

use std::fmt;

/// Diagnostic categories of the walker, one per tracing target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DebugFlag {
    /// Traversal lifecycle: start, end, pruning and per-node errors.
    Walk,
    /// Queue dispatch, ceiling changes and shutdown.
    Queue,
    /// Flow controller decisions and consumer pulls.
    Flow,
    /// Calls into the filesystem primitives.
    Fs,
}

impl DebugFlag {
    /// Every flag, in the order used for rendering.
    pub const ALL: [Self; 4] = [Self::Walk, Self::Queue, Self::Flow, Self::Fs];

    /// Token accepted by `--debug`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Queue => "queue",
            Self::Flow => "flow",
            Self::Fs => "fs",
        }
    }

    /// Tracing target the matching `trace_*!` macro emits on.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Walk => "fswalk::walk",
            Self::Queue => "fswalk::queue",
            Self::Flow => "fswalk::flow",
            Self::Fs => "fswalk::fs",
        }
    }

    /// Looks a flag up by its `--debug` token.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

impl fmt::Display for DebugFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Debug verbosity level for each flag. `0` disables the flag.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// Traversal lifecycle level.
    pub walk: u8,
    /// Queue scheduling level.
    pub queue: u8,
    /// Flow control level.
    pub flow: u8,
    /// Filesystem primitive level.
    pub fs: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    #[must_use]
    pub const fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Walk => self.walk,
            DebugFlag::Queue => self.queue,
            DebugFlag::Flow => self.flow,
            DebugFlag::Fs => self.fs,
        }
    }

    /// Set the level for a specific flag.
    pub const fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Walk => self.walk = level,
            DebugFlag::Queue => self.queue = level,
            DebugFlag::Flow => self.flow = level,
            DebugFlag::Fs => self.fs = level,
        }
    }

    /// Set all flags to the specified level.
    pub const fn set_all(&mut self, level: u8) {
        self.walk = level;
        self.queue = level;
        self.flow = level;
        self.fs = level;
    }

    /// Returns `true` when no flag is enabled.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        self.walk == 0 && self.queue == 0 && self.flow == 0 && self.fs == 0
    }
}
