//! Error types for shared memory operations

use thiserror::Error;

/// Errors that can occur while creating or attaching a shared region
#[derive(Error, Debug)]
pub enum ShmError {
    /// Name is not a valid POSIX shared memory object name
    #[error("Invalid segment name: {name:?} (must be '/name', no further slashes)")]
    InvalidName {
        /// Offending name
        name: String,
    },

    /// `shm_open` failed
    #[error("Failed to create segment {name}: {source}")]
    CreateFailed {
        name: String,
        #[source]
        source: nix::Error,
    },

    /// Setting the object size failed
    #[error("Failed to resize segment {name}: {source}")]
    ResizeFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Mapping the object failed
    #[error("Failed to map segment {name}: {source}")]
    MapFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Segment not found
    #[error("Segment not found: {name}")]
    NotFound {
        /// Segment name
        name: String,
    },

    /// Permission denied
    #[error("Permission denied accessing segment: {name}")]
    PermissionDenied {
        /// Segment name
        name: String,
    },

    /// Existing object is smaller than the layout
    #[error("Segment {name} is {size} bytes, layout needs {expected}")]
    InvalidSize {
        name: String,
        size: usize,
        expected: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

/// Result type for shared memory operations
pub type ShmResult<T> = Result<T, ShmError>;
