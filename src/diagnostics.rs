//! Non-fatal findings reported alongside successful results.
//!
//! Diagnostics never abort an operation. Each one is logged through `tracing`
//! when it is raised and is also handed back to the caller so tests and tools
//! can inspect it without scraping logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured warning raised during synchronization or planner setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A live body with collision shapes is not registered in the planning world.
    ///
    /// Synchronization never registers new objects on its own; add it explicitly
    /// with [`PlanningWorld::add_entity`](crate::PlanningWorld::add_entity).
    UnregisteredEntity {
        /// Declared name of the simulation entity.
        entity: String,
        /// The unique name it would be registered under.
        unique_name: String,
    },

    /// The planned articulation collides with something in its initial state.
    InitialCollision {
        /// Robot link involved in the collision.
        link: String,
        /// Link (or shape owner) on the other side.
        other_link: String,
        /// Object or articulation owning `other_link`.
        other_object: String,
    },
}

impl Diagnostic {
    /// Logs the diagnostic as a `tracing` warning.
    pub fn emit(&self) {
        tracing::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredEntity {
                entity,
                unique_name,
            } => write!(
                f,
                "entity '{entity}' ({unique_name}) not found in planning world; \
                 the scene might have changed since last update, \
                 use PlanningWorld::add_entity() to add the object"
            ),
            Self::InitialCollision {
                link,
                other_link,
                other_object,
            } => write!(
                f,
                "robot's {link} collides with {other_link} of {other_object} in initial state; \
                 use the allowed collision matrix to disable collisions if planning fails"
            ),
        }
    }
}

/// Collects diagnostics, emitting each one as it is pushed.
#[derive(Clone, Debug, Default)]
pub(crate) struct DiagnosticSink {
    items: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.items.push(diagnostic);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
