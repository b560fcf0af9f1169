//! Collision entries, query results and the narrow-phase seam.
//!
//! The narrow phase itself (primitive-vs-primitive intersection and distance)
//! is supplied by the caller through [`NarrowPhase`]. This module composes it
//! into object-level queries: every shape pair of two [`FclObject`]s is placed
//! at its world pose and handed to the backend, after a bounding-box cull for
//! collision checks.

pub mod acm;
pub mod model;

pub use acm::{AllowedCollision, AllowedCollisionMatrix};
pub use model::{CollisionTarget, FclModel};

use crate::geometry::CollisionGeometry;
use crate::pose::Pose;
use bevy_math::bounding::IntersectsVolume;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One collision geometry placed relative to its owning body.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionShape {
    pub geometry: Arc<CollisionGeometry>,
    pub local_pose: Pose,
}

impl CollisionShape {
    pub fn new(geometry: impl Into<Arc<CollisionGeometry>>, local_pose: Pose) -> Self {
        Self {
            geometry: geometry.into(),
            local_pose,
        }
    }
}

/// A named bundle of collision shapes sharing one world pose.
///
/// Shapes keep their insertion order. Their geometry is shared, so rebuilding
/// an entry at a new pose does not copy meshes.
#[derive(Clone, Debug, PartialEq)]
pub struct FclObject {
    pub name: String,
    /// World pose of the owning body.
    pub pose: Pose,
    pub shapes: Vec<CollisionShape>,
}

impl FclObject {
    pub fn new(name: impl Into<String>, pose: Pose, shapes: Vec<CollisionShape>) -> Self {
        Self {
            name: name.into(),
            pose,
            shapes,
        }
    }

    /// A copy of this entry moved to `pose`, sharing the same shapes.
    pub fn with_pose(&self, pose: Pose) -> Self {
        Self {
            name: self.name.clone(),
            pose,
            shapes: self.shapes.clone(),
        }
    }

    /// World pose of the shape at `index`.
    pub fn shape_world_pose(&self, index: usize) -> Option<Pose> {
        self.shapes.get(index).map(|s| self.pose * s.local_pose)
    }

    fn posed_shapes(&self) -> impl Iterator<Item = (&CollisionGeometry, Pose)> + '_ {
        self.shapes
            .iter()
            .map(|s| (s.geometry.as_ref(), self.pose * s.local_pose))
    }
}

/// A single contact reported by the narrow phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// World-space contact point.
    pub position: Vec3,
    /// Contact normal, pointing from the first shape to the second.
    pub normal: Vec3,
    pub penetration_depth: f32,
}

/// Result of a collision query between two entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    pub contacts: Vec<Contact>,
}

impl CollisionResult {
    pub fn is_collision(&self) -> bool {
        !self.contacts.is_empty()
    }
}

/// Result of a distance query between two entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    /// Minimum distance; zero or negative when the shapes overlap.
    pub min_distance: f32,
    /// Closest points on the first and second entry, in world space.
    pub nearest_points: [Vec3; 2],
}

impl Default for DistanceResult {
    fn default() -> Self {
        Self {
            min_distance: f32::MAX,
            nearest_points: [Vec3::ZERO; 2],
        }
    }
}

/// Primitive-level collision and distance tests.
pub trait NarrowPhase {
    /// Returns the contact between two posed geometries, if they intersect.
    fn collide(
        &self,
        a: &CollisionGeometry,
        a_pose: &Pose,
        b: &CollisionGeometry,
        b_pose: &Pose,
    ) -> Option<Contact>;

    /// Returns the distance between two posed geometries.
    fn distance(
        &self,
        a: &CollisionGeometry,
        a_pose: &Pose,
        b: &CollisionGeometry,
        b_pose: &Pose,
    ) -> DistanceResult;
}

/// Checks every shape pair of `a` against `b`.
pub fn collide(narrow_phase: &dyn NarrowPhase, a: &FclObject, b: &FclObject) -> CollisionResult {
    let mut result = CollisionResult::default();
    for (geom_a, pose_a) in a.posed_shapes() {
        let aabb_a = geom_a.world_aabb(&pose_a);
        for (geom_b, pose_b) in b.posed_shapes() {
            // Broad phase: skip pairs whose bounds are disjoint.
            if let (Some(box_a), Some(box_b)) = (aabb_a, geom_b.world_aabb(&pose_b))
                && !box_a.intersects(&box_b)
            {
                continue;
            }
            if let Some(contact) = narrow_phase.collide(geom_a, &pose_a, geom_b, &pose_b) {
                result.contacts.push(contact);
            }
        }
    }
    result
}

/// Minimum distance over every shape pair of `a` and `b`.
pub fn distance(narrow_phase: &dyn NarrowPhase, a: &FclObject, b: &FclObject) -> DistanceResult {
    let mut best = DistanceResult::default();
    for (geom_a, pose_a) in a.posed_shapes() {
        for (geom_b, pose_b) in b.posed_shapes() {
            let d = narrow_phase.distance(geom_a, &pose_a, geom_b, &pose_b);
            if d.min_distance < best.min_distance {
                best = d;
            }
        }
    }
    best
}

/// Which kinds of entities a world-level result refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Two links of the same articulation.
    SelfCollision,
    /// An attached object against a link of its own articulation.
    SelfAttached,
    ArticulationArticulation,
    ArticulationObject,
    AttachedArticulation,
    AttachedObject,
    AttachedAttached,
    ObjectObject,
}

/// A collision between two named entries of the planning world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldCollisionResult {
    pub result: CollisionResult,
    pub kind: CollisionKind,
    /// Articulation or object owning the first entry.
    pub object_name1: String,
    pub object_name2: String,
    /// Link (or object) name of the first entry.
    pub link_name1: String,
    pub link_name2: String,
}

/// The closest pair found by a world-level distance query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldDistanceResult {
    pub result: DistanceResult,
    pub min_distance: f32,
    /// `None` when no pair was evaluated.
    pub kind: Option<CollisionKind>,
    pub object_name1: String,
    pub object_name2: String,
    pub link_name1: String,
    pub link_name2: String,
}

impl Default for WorldDistanceResult {
    fn default() -> Self {
        Self {
            result: DistanceResult::default(),
            min_distance: f32::MAX,
            kind: None,
            object_name1: String::new(),
            object_name2: String::new(),
            link_name1: String::new(),
            link_name2: String::new(),
        }
    }
}

impl WorldDistanceResult {
    /// Keeps whichever of `self` and `other` is closer.
    pub fn keep_min(&mut self, other: WorldDistanceResult) {
        if other.min_distance < self.min_distance {
            *self = other;
        }
    }
}
