//! Runtime error types.
//!
//! The unit registry, patch table and listener table are fixed-capacity;
//! exhausting any of them is an explicit error rather than a silent drop.
//! Numeric parameter setters everywhere else follow the clamp-don't-throw
//! posture instead and never produce errors.

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The unit registry is full.
    #[error("unit registry full ({capacity} slots); raise MAX_UNITS")]
    RegistryFull {
        /// Compile-time registry capacity.
        capacity: usize,
    },

    /// The event listener table is full.
    #[error("event listener table full ({capacity} entries)")]
    ListenerTableFull {
        /// Compile-time listener capacity.
        capacity: usize,
    },

    /// The patch table is full.
    #[error("patch table full ({capacity} entries)")]
    PatchTableFull {
        /// Compile-time patch capacity.
        capacity: usize,
    },
}

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("settings I/O error: {0}")]
    Io(String),

    /// TOML parse error.
    #[error("settings parse error: {0}")]
    Parse(String),

    /// Semantic validation failed.
    #[error("settings validation: {0}")]
    Validation(String),
}
