//! Planning-side collision geometry.
//!
//! These are the shapes the narrow phase consumes. Unlike the engine shapes in
//! [`crate::sim`], capsules and cylinders extend along the local Z axis and
//! half-spaces carry their normal and offset explicitly.

use crate::error::{BridgeError, Result};
use crate::pose::Pose;
use bevy_math::bounding::{Aabb3d, Bounded3d};
use bevy_math::primitives::{Capsule3d, Cuboid, Cylinder, Sphere};
use glam::{Quat, Vec3, Vec3A};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Supported collision primitives. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CollisionGeometry {
    /// An axis-aligned box given by full side lengths.
    Box { side: Vec3 },
    Sphere { radius: f32 },
    /// Capsule along local Z; `lz` is the length of the cylindrical part.
    Capsule { radius: f32, lz: f32 },
    /// Cylinder along local Z with total height `lz`.
    Cylinder { radius: f32, lz: f32 },
    /// Convex polyhedron.
    Convex {
        vertices: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
    },
    /// Triangle soup prepared for a bounding-volume hierarchy.
    Bvh(BvhModel),
    /// The half-space `{ x : n . x <= d }`.
    Halfspace { n: Vec3, d: f32 },
}

impl CollisionGeometry {
    /// Wraps a finished [`BvhModel`]. Fails if the build was not completed.
    pub fn bvh(model: BvhModel) -> Result<Self> {
        if model.state != BuildState::Ready {
            return Err(BridgeError::invalid_geometry(
                "BVH model used before end_model() was called",
            ));
        }
        Ok(Self::Bvh(model))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::Convex { .. } => "convex",
            Self::Bvh(_) => "bvh",
            Self::Halfspace { .. } => "halfspace",
        }
    }

    /// World-space bounding box of the geometry placed at `pose`.
    ///
    /// Returns `None` for unbounded geometry (half-spaces) and for empty meshes.
    pub fn world_aabb(&self, pose: &Pose) -> Option<Aabb3d> {
        let isometry = pose.to_isometry();
        match self {
            Self::Box { side } => Some(Cuboid::new(side.x, side.y, side.z).aabb_3d(isometry)),
            Self::Sphere { radius } => Some(Sphere::new(*radius).aabb_3d(isometry)),
            Self::Capsule { radius, lz } => {
                Some(Capsule3d::new(*radius, *lz).aabb_3d(z_aligned(pose)))
            }
            Self::Cylinder { radius, lz } => {
                Some(Cylinder::new(*radius, *lz).aabb_3d(z_aligned(pose)))
            }
            Self::Convex { vertices, .. } => point_cloud_aabb(pose, vertices),
            Self::Bvh(model) => point_cloud_aabb(pose, &model.vertices),
            Self::Halfspace { .. } => None,
        }
    }
}

/// `bevy_math` round primitives extend along Y; ours extend along Z.
fn z_aligned(pose: &Pose) -> bevy_math::Isometry3d {
    (*pose * Pose::from_rotation(Quat::from_rotation_x(FRAC_PI_2))).to_isometry()
}

fn point_cloud_aabb(pose: &Pose, points: &[Vec3]) -> Option<Aabb3d> {
    if points.is_empty() {
        return None;
    }
    Some(Aabb3d::from_point_cloud(
        pose.to_isometry(),
        points.iter().map(|&v| Vec3A::from(v)),
    ))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum BuildState {
    #[default]
    Empty,
    Building,
    Ready,
}

/// A triangle mesh built with the begin / add / end protocol.
///
/// ```
/// use simplan_bridge::BvhModel;
/// use glam::Vec3;
///
/// let mut model = BvhModel::new();
/// model.begin_model().unwrap();
/// model
///     .add_sub_model(&[Vec3::ZERO, Vec3::X, Vec3::Y], &[[0, 1, 2]])
///     .unwrap();
/// model.end_model().unwrap();
/// assert_eq!(model.num_triangles(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BvhModel {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    state: BuildState,
}

impl BvhModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the build. A model can only be built once.
    pub fn begin_model(&mut self) -> Result<()> {
        match self.state {
            BuildState::Empty => {}
            BuildState::Building => {
                return Err(BridgeError::invalid_geometry(
                    "begin_model() called while a build is in progress",
                ));
            }
            BuildState::Ready => {
                return Err(BridgeError::invalid_geometry(
                    "begin_model() called on a finished model",
                ));
            }
        }
        self.state = BuildState::Building;
        Ok(())
    }

    /// Appends a sub-mesh. Face indices are relative to `vertices`.
    pub fn add_sub_model(&mut self, vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<()> {
        if self.state != BuildState::Building {
            return Err(BridgeError::invalid_geometry(
                "add_sub_model() called outside begin_model()/end_model()",
            ));
        }
        let count = vertices.len();
        if let Some(face) = faces.iter().find(|f| f.iter().any(|&i| i as usize >= count)) {
            return Err(BridgeError::invalid_geometry(format!(
                "face {face:?} references a vertex outside 0..{count}"
            )));
        }

        let offset = u32::try_from(self.vertices.len())
            .map_err(|_| BridgeError::invalid_geometry("mesh exceeds u32 vertex indices"))?;
        self.vertices.extend_from_slice(vertices);
        self.triangles
            .extend(faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
        Ok(())
    }

    /// Finishes the build. The model is immutable afterwards.
    pub fn end_model(&mut self) -> Result<()> {
        if self.state != BuildState::Building {
            return Err(BridgeError::invalid_geometry(
                "end_model() called without begin_model()",
            ));
        }
        self.state = BuildState::Ready;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state == BuildState::Ready
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
}
