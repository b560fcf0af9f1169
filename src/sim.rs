//! The view of the live simulation this crate consumes.
//!
//! The simulation engine owns its entities; this layer only borrows them. A
//! scene exposes its articulations, its free-standing rigid bodies ("actors")
//! and its gravity through [`SimScene`]. [`SceneSnapshot`] is a plain owned
//! implementation, handy for tests and for replaying recorded scenes.

use crate::identity::EntityRef;
use crate::kinematics::{JointLimit, JointType};
use crate::pose::Pose;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Access to the live simulation state.
pub trait SimScene {
    /// All articulations currently in the scene.
    fn articulations(&self) -> &[SimArticulation];

    /// All free-standing rigid bodies currently in the scene.
    fn actors(&self) -> &[SimActor];

    /// The scene's gravity vector.
    fn gravity(&self) -> Vec3;
}

/// Engine-side collision geometry, in the engine's own conventions.
///
/// Capsules and cylinders extend along the local X axis. Planes are half-spaces
/// whose outward normal is the local +X axis of the shape pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimGeometry {
    /// A box defined by half-extents (x, y, z).
    Box { half_size: Vec3 },
    Sphere { radius: f32 },
    /// Capsule along local X: `half_length` excludes the hemispherical caps.
    Capsule { radius: f32, half_length: f32 },
    /// Cylinder along local X.
    Cylinder { radius: f32, half_length: f32 },
    /// Convex hull, with a per-axis scale applied to `vertices`.
    ConvexMesh {
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        scale: Vec3,
    },
    TriangleMesh {
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    },
    /// Half-space, encoded entirely by the shape's local pose.
    Plane,
    /// Any engine shape without a planning counterpart (heightfields, SDFs, ...).
    Unsupported { kind: String },
}

impl SimGeometry {
    /// Short engine-facing name of the shape kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::ConvexMesh { .. } => "convex_mesh",
            Self::TriangleMesh { .. } => "triangle_mesh",
            Self::Plane => "plane",
            Self::Unsupported { kind } => kind,
        }
    }
}

/// A collision shape attached to a rigid body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimShape {
    /// Pose of the shape relative to its owning body.
    pub local_pose: Pose,
    pub geometry: SimGeometry,
}

impl SimShape {
    pub fn new(geometry: SimGeometry, local_pose: Pose) -> Self {
        Self {
            local_pose,
            geometry,
        }
    }
}

/// A free-standing rigid body (static, kinematic or dynamic).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimActor {
    pub name: String,
    /// Simulation-assigned id, unique among live entities of one scene.
    pub per_scene_id: u32,
    /// Current world pose.
    pub pose: Pose,
    pub collision_shapes: Vec<SimShape>,
}

/// One rigid link of an articulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimLink {
    /// Link name, unique within its articulation.
    pub name: String,
    pub per_scene_id: u32,
    /// Current world pose.
    pub pose: Pose,
    pub collision_shapes: Vec<SimShape>,
}

/// An active (non-fixed) joint of an articulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimJoint {
    pub name: String,
    pub joint_type: JointType,
    pub limits: JointLimit,
}

/// An articulated body: a tree of links connected by joints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimArticulation {
    pub name: String,
    /// Links in engine order; the first link is the root.
    pub links: Vec<SimLink>,
    /// Active joints, ordered like `qpos`.
    pub active_joints: Vec<SimJoint>,
    /// World pose of the root link.
    pub root_pose: Pose,
    /// Full joint configuration.
    pub qpos: Vec<f32>,
}

impl SimArticulation {
    /// The root link, if the articulation has any links.
    pub fn root(&self) -> Option<&SimLink> {
        self.links.first()
    }

    pub fn link(&self, name: &str) -> Option<&SimLink> {
        self.links.iter().find(|link| link.name == name)
    }
}

/// Anything that carries collision shapes at a world pose.
pub trait CollisionBody {
    fn body_name(&self) -> &str;
    fn world_pose(&self) -> Pose;
    fn collision_shapes(&self) -> &[SimShape];
    /// The entity owning the shapes.
    fn entity(&self) -> EntityRef<'_>;
}

impl CollisionBody for SimActor {
    fn body_name(&self) -> &str {
        &self.name
    }

    fn world_pose(&self) -> Pose {
        self.pose
    }

    fn collision_shapes(&self) -> &[SimShape] {
        &self.collision_shapes
    }

    fn entity(&self) -> EntityRef<'_> {
        EntityRef::Actor(self)
    }
}

impl CollisionBody for SimLink {
    fn body_name(&self) -> &str {
        &self.name
    }

    fn world_pose(&self) -> Pose {
        self.pose
    }

    fn collision_shapes(&self) -> &[SimShape] {
        &self.collision_shapes
    }

    fn entity(&self) -> EntityRef<'_> {
        EntityRef::Link(self)
    }
}

/// An owned copy of a scene's state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub articulations: Vec<SimArticulation>,
    pub actors: Vec<SimActor>,
    pub gravity: Vec3,
}

impl SceneSnapshot {
    /// Captures the current state of any scene.
    pub fn capture<S: SimScene + ?Sized>(scene: &S) -> Self {
        Self {
            articulations: scene.articulations().to_vec(),
            actors: scene.actors().to_vec(),
            gravity: scene.gravity(),
        }
    }

    pub fn actor(&self, name: &str) -> Option<&SimActor> {
        self.actors.iter().find(|actor| actor.name == name)
    }

    pub fn actor_mut(&mut self, name: &str) -> Option<&mut SimActor> {
        self.actors.iter_mut().find(|actor| actor.name == name)
    }

    pub fn articulation(&self, name: &str) -> Option<&SimArticulation> {
        self.articulations.iter().find(|art| art.name == name)
    }

    pub fn articulation_mut(&mut self, name: &str) -> Option<&mut SimArticulation> {
        self.articulations.iter_mut().find(|art| art.name == name)
    }
}

impl SimScene for SceneSnapshot {
    fn articulations(&self) -> &[SimArticulation] {
        &self.articulations
    }

    fn actors(&self) -> &[SimActor] {
        &self.actors
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }
}
