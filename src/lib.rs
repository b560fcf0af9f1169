//! # simplan-bridge
//!
//! Keeps a motion-planning world in step with a live rigid-body simulation.
//!
//! The simulation side is read through [`SimScene`]; the planning side is a
//! [`PlanningWorld`] holding one [`ArticulatedModel`] per articulation, one
//! [`FclObject`] per collidable actor, the objects attached to robot links and
//! an [`AllowedCollisionMatrix`]. The crate covers the layer in between:
//!
//! - unique naming of simulation entities ([`unique_name`]),
//! - conversion of engine collision shapes into planning geometry
//!   ([`convert_body`]), including the capsule/cylinder axis fixup,
//! - world construction and per-step synchronization
//!   ([`PlanningWorld::from_scene`], [`PlanningWorld::update_from_simulation`]),
//! - pairwise collision and distance queries
//!   ([`PlanningWorld::check_collision_between`], [`PlanningWorld::distance_between`]),
//! - the attach/detach lifecycle with touch-link discovery
//!   ([`PlanningWorld::attach_object`], [`PlanningWorld::detach_object`]),
//! - a planner adapter binding one planned articulation ([`SimPlanner`]).
//!
//! Narrow-phase geometry tests, forward kinematics, description export and path
//! search are supplied by the caller through [`NarrowPhase`], [`ChainBuilder`],
//! [`DescriptionExporter`] and [`PathPlanner`].

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod attach;
pub mod collision;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod kinematics;
pub mod mesh_file;
pub mod planner;
pub mod pose;
pub mod query;
pub mod sim;
pub mod sync;
pub mod world;

pub use attach::{AttachPose, TouchLinks};
pub use collision::{
    AllowedCollision, AllowedCollisionMatrix, CollisionKind, CollisionResult, CollisionShape,
    CollisionTarget, Contact, DistanceResult, FclModel, FclObject, NarrowPhase,
    WorldCollisionResult, WorldDistanceResult,
};
pub use convert::{convert_body, convert_shape};
pub use diagnostics::Diagnostic;
pub use error::{BridgeError, Result};
pub use geometry::{BvhModel, CollisionGeometry};
pub use identity::{EntityRef, LinkRef, NameRef, unique_name};
pub use kinematics::{
    ArticulatedModel, ChainBuilder, ChainDescription, DescriptionExporter, JointLimit, JointSpec,
    JointType, KinematicChain,
};
pub use mesh_file::{MeshData, load_stl};
pub use planner::{PathPlanner, PlanRequest, PlannerConfig, SimPlanner};
pub use pose::Pose;
pub use query::{Distance, DistanceMode};
pub use sim::{
    CollisionBody, SceneSnapshot, SimActor, SimArticulation, SimGeometry, SimJoint, SimLink,
    SimScene, SimShape,
};
pub use sync::{SyncOptions, SyncReport};
pub use world::{AttachedBody, PlanningWorld};
