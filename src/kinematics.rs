//! Kinematic chains and the articulated models built on them.
//!
//! Forward kinematics and description export live outside this crate. The
//! [`DescriptionExporter`] turns a simulation articulation into opaque chain and
//! semantics descriptions (URDF / SRDF text in practice), a [`ChainBuilder`]
//! turns those into a [`KinematicChain`], and [`ArticulatedModel`] pairs the
//! chain with the collision entries of its links.

use crate::collision::{
    AllowedCollisionMatrix, FclModel, FclObject, NarrowPhase, WorldCollisionResult,
};
use crate::error::{BridgeError, Result};
use crate::pose::Pose;
use crate::sim::SimArticulation;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Kinds of active joints. Fixed joints never appear in a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointType {
    /// Bounded rotation about one axis.
    Revolute,
    /// Unbounded rotation about one axis.
    Continuous,
    /// Translation along one axis.
    Prismatic,
}

impl JointType {
    pub fn is_revolute(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous)
    }
}

/// Position bounds of one joint, plus the drive limits reported with them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    /// Lower bound: radians for revolute joints, meters for prismatic ones.
    pub min: f32,
    pub max: f32,
    /// Drive torque (Nm) or force (N) limit.
    pub effort: f32,
    /// Velocity limit (rad/s or m/s).
    pub velocity: f32,
}

impl JointLimit {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            effort: f32::INFINITY,
            velocity: f32::INFINITY,
        }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Whether two configurations a full turn apart are the same pose.
    pub fn wraps_full_turn(&self) -> bool {
        self.range() > TAU
    }
}

/// One active joint as handed to the chain builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    pub name: String,
    pub joint_type: JointType,
    pub limits: JointLimit,
}

/// Everything a [`ChainBuilder`] needs to build one chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainDescription {
    /// Planning-world name of the articulation.
    pub name: String,
    /// Kinematic chain description (URDF text).
    pub chain: String,
    /// Semantics description (SRDF text).
    pub semantics: String,
    /// Link names in simulation order.
    pub link_names: Vec<String>,
    /// Active joints in `qpos` order.
    pub joints: Vec<JointSpec>,
    pub gravity: Vec3,
}

/// Exports the textual descriptions of a simulation articulation.
pub trait DescriptionExporter {
    fn export_chain(&self, articulation: &SimArticulation) -> Result<String>;
    fn export_semantics(&self, articulation: &SimArticulation) -> Result<String>;
}

/// Builds a kinematic chain from its description.
pub trait ChainBuilder {
    fn build(&self, description: &ChainDescription) -> Result<Box<dyn KinematicChain>>;
}

/// Forward kinematics of one articulation.
pub trait KinematicChain {
    fn link_names(&self) -> &[String];
    fn joint_names(&self) -> &[String];
    /// One entry per active joint.
    fn joint_types(&self) -> &[JointType];
    /// One entry per active joint.
    fn joint_limits(&self) -> &[JointLimit];
    fn set_base_pose(&mut self, pose: Pose);
    /// Recomputes all link poses for a full joint configuration.
    fn compute_forward_kinematics(&mut self, qpos: &[f32]) -> Result<()>;
    /// World pose of a link after the last forward-kinematics pass.
    fn link_pose(&self, link_index: usize) -> Pose;
    /// Indices of the joints between the root and `link_index`, root first.
    fn chain_joint_indices(&self, link_index: usize) -> Vec<usize>;
    /// Link-name pairs never checked for self-collision.
    fn disabled_collision_pairs(&self) -> Vec<(String, String)>;
}

/// Planning-side mirror of one simulation articulation.
pub struct ArticulatedModel {
    name: String,
    chain: Box<dyn KinematicChain>,
    fcl_model: FclModel,
    base_pose: Pose,
    qpos: Vec<f32>,
    planned: bool,
    move_group_link: Option<usize>,
    move_group_joint_indices: Vec<usize>,
}

impl std::fmt::Debug for ArticulatedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticulatedModel")
            .field("name", &self.name)
            .field("links", &self.chain.link_names())
            .field("base_pose", &self.base_pose)
            .field("qpos", &self.qpos)
            .field("planned", &self.planned)
            .finish_non_exhaustive()
    }
}

impl ArticulatedModel {
    /// Builds a model from a chain description and its links' collision entries.
    ///
    /// Each entry must be named after a link of the chain.
    pub fn create(
        description: &ChainDescription,
        builder: &dyn ChainBuilder,
        collision_links: Vec<FclObject>,
    ) -> Result<Self> {
        let chain = builder.build(description)?;
        Self::from_chain(&description.name, chain, collision_links)
    }

    pub fn from_chain(
        name: &str,
        chain: Box<dyn KinematicChain>,
        collision_links: Vec<FclObject>,
    ) -> Result<Self> {
        if chain.joint_types().len() != chain.joint_names().len()
            || chain.joint_limits().len() != chain.joint_names().len()
        {
            return Err(BridgeError::kinematics(format!(
                "chain '{name}' reports {} joints but {} types and {} limits",
                chain.joint_names().len(),
                chain.joint_types().len(),
                chain.joint_limits().len()
            )));
        }

        let mut indexed = Vec::with_capacity(collision_links.len());
        for entry in collision_links {
            let index = chain
                .link_names()
                .iter()
                .position(|link| *link == entry.name)
                .ok_or_else(|| BridgeError::not_found("link", &entry.name))?;
            indexed.push((index, entry));
        }
        let fcl_model = FclModel::new(name, indexed, &chain.disabled_collision_pairs());
        let qpos = vec![0.0; chain.joint_names().len()];

        Ok(Self {
            name: name.to_owned(),
            chain,
            fcl_model,
            base_pose: Pose::IDENTITY,
            qpos,
            planned: false,
            move_group_link: None,
            move_group_joint_indices: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain(&self) -> &dyn KinematicChain {
        self.chain.as_ref()
    }

    pub fn fcl_model(&self) -> &FclModel {
        &self.fcl_model
    }

    pub fn link_names(&self) -> &[String] {
        self.chain.link_names()
    }

    pub fn joint_names(&self) -> &[String] {
        self.chain.joint_names()
    }

    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.chain.link_names().iter().position(|link| link == name)
    }

    pub fn base_pose(&self) -> Pose {
        self.base_pose
    }

    pub fn set_base_pose(&mut self, pose: Pose) -> Result<()> {
        self.base_pose = pose;
        self.chain.set_base_pose(pose);
        self.refresh()
    }

    pub fn qpos(&self) -> &[f32] {
        &self.qpos
    }

    /// Sets the joint configuration.
    ///
    /// With `full`, `qpos` covers every active joint; otherwise it covers the
    /// move-group joints only and the rest keep their values.
    pub fn set_qpos(&mut self, qpos: &[f32], full: bool) -> Result<()> {
        if full {
            if qpos.len() != self.qpos.len() {
                return Err(BridgeError::kinematics(format!(
                    "'{}' expects {} joint values, got {}",
                    self.name,
                    self.qpos.len(),
                    qpos.len()
                )));
            }
            self.qpos.copy_from_slice(qpos);
        } else {
            if qpos.len() != self.move_group_joint_indices.len() {
                return Err(BridgeError::kinematics(format!(
                    "'{}' move group expects {} joint values, got {}",
                    self.name,
                    self.move_group_joint_indices.len(),
                    qpos.len()
                )));
            }
            for (&index, &value) in self.move_group_joint_indices.iter().zip(qpos) {
                let slot = self.qpos.get_mut(index).ok_or_else(|| {
                    BridgeError::kinematics(format!("'{}' has no joint {index}", self.name))
                })?;
                *slot = value;
            }
        }
        self.refresh()
    }

    /// World pose of a link at the current configuration.
    pub fn link_pose(&self, link_index: usize) -> Result<Pose> {
        if link_index >= self.chain.link_names().len() {
            return Err(BridgeError::not_found("link", link_index.to_string()));
        }
        Ok(self.chain.link_pose(link_index))
    }

    pub fn is_planned(&self) -> bool {
        self.planned
    }

    pub(crate) fn set_planned(&mut self, planned: bool) {
        self.planned = planned;
    }

    /// Selects the end-effector link whose chain forms the move group.
    pub fn set_move_group(&mut self, link_name: &str) -> Result<()> {
        let index = self
            .link_index(link_name)
            .ok_or_else(|| BridgeError::not_found("link", link_name))?;
        self.move_group_joint_indices = self.chain.chain_joint_indices(index);
        self.move_group_link = Some(index);
        Ok(())
    }

    pub fn move_group_link(&self) -> Option<usize> {
        self.move_group_link
    }

    pub fn move_group_joint_indices(&self) -> &[usize] {
        &self.move_group_joint_indices
    }

    /// Current values of the move-group joints.
    pub fn move_group_qpos(&self) -> Vec<f32> {
        self.move_group_joint_indices
            .iter()
            .filter_map(|&i| self.qpos.get(i).copied())
            .collect()
    }

    pub fn check_self_collision(
        &self,
        narrow_phase: &dyn NarrowPhase,
        acm: &AllowedCollisionMatrix,
    ) -> Vec<WorldCollisionResult> {
        self.fcl_model.check_self_collision(narrow_phase, acm)
    }

    fn refresh(&mut self) -> Result<()> {
        self.chain.compute_forward_kinematics(&self.qpos)?;
        let chain = &self.chain;
        self.fcl_model.update_link_poses(|index| chain.link_pose(index));
        Ok(())
    }
}
