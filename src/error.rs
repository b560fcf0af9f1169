//! Error types for world construction, synchronization and queries.

use thiserror::Error;

/// Errors that can occur while mirroring a simulation into a planning world.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An entity reference of a kind that cannot be resolved on this path.
    #[error("unsupported entity type: {kind} '{name}'")]
    UnsupportedType {
        /// The reference kind (e.g. `"link"`).
        kind: &'static str,
        /// Declared name of the entity.
        name: String,
    },

    /// A collision shape outside the supported set.
    #[error("unsupported collision shape '{kind}' on body '{body}'")]
    UnsupportedShape {
        /// Engine-side shape kind.
        kind: String,
        /// Name of the owning body.
        body: String,
    },

    /// A referenced entity has no registered planning entry.
    #[error("{what} '{name}' not found in planning world (the scene might have changed since last update)")]
    NotFound {
        /// What was looked up (articulation, object, link, ...).
        what: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// A live articulation has no matching articulated model.
    #[error("articulation '{articulation}' not found in planning world, world is out of sync with the scene")]
    OutOfSync {
        /// Declared name of the live articulation.
        articulation: String,
    },

    /// Structural preconditions of a component are violated.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfig(String),

    /// Geometry could not be built from the given data.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The kinematic backend rejected a chain or configuration.
    #[error("kinematics error: {0}")]
    Kinematics(String),

    /// A mesh file could not be parsed.
    #[error("invalid mesh file: {0}")]
    MeshFile(String),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Creates an unsupported entity type error.
    #[must_use]
    pub fn unsupported_type(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            kind,
            name: name.into(),
        }
    }

    /// Creates an unsupported shape error.
    #[must_use]
    pub fn unsupported_shape(kind: impl Into<String>, body: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            kind: kind.into(),
            body: body.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    /// Creates an out of sync error.
    #[must_use]
    pub fn out_of_sync(articulation: impl Into<String>) -> Self {
        Self::OutOfSync {
            articulation: articulation.into(),
        }
    }

    /// Creates an unsupported configuration error.
    #[must_use]
    pub fn unsupported_config(reason: impl Into<String>) -> Self {
        Self::UnsupportedConfig(reason.into())
    }

    /// Creates an invalid geometry error.
    #[must_use]
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry(reason.into())
    }

    /// Creates a kinematics error.
    #[must_use]
    pub fn kinematics(reason: impl Into<String>) -> Self {
        Self::Kinematics(reason.into())
    }

    /// Creates a mesh file error.
    #[must_use]
    pub fn mesh_file(reason: impl Into<String>) -> Self {
        Self::MeshFile(reason.into())
    }
}

/// Result type for planning world operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
