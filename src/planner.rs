//! Adapter between a planning world and a path-planning backend.
//!
//! [`SimPlanner`] binds the single planned articulation of a world, derives
//! the joint metadata a backend needs and forwards planning requests to a
//! [`PathPlanner`]. Multi-arm planning is not supported: the world must have
//! exactly one planned articulation.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{BridgeError, Result};
use crate::kinematics::{ArticulatedModel, JointLimit, JointType};
use crate::sim::SimScene;
use crate::sync::{SyncOptions, SyncReport};
use crate::world::PlanningWorld;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Limits used for time parameterization of planned paths.
///
/// Both default to one per move-group joint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub joint_vel_limits: Option<Vec<f32>>,
    pub joint_acc_limits: Option<Vec<f32>>,
}

/// Everything a backend needs to plan one motion of the move group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Current move-group configuration.
    pub start: Vec<f32>,
    /// Acceptable goal configurations of the move group.
    pub goals: Vec<Vec<f32>>,
    /// Indices of the move-group joints in the full configuration.
    pub move_group_joint_indices: Vec<usize>,
    /// Per active joint: values a full turn apart are the same pose.
    pub equivalent_joints: Vec<bool>,
    pub joint_vel_limits: Vec<f32>,
    pub joint_acc_limits: Vec<f32>,
}

/// A path-search backend.
pub trait PathPlanner: Sized {
    /// Creates the backend for an assembled world.
    fn from_world(world: &PlanningWorld) -> Result<Self>;

    /// Plans a path of move-group configurations from `request.start` to one
    /// of `request.goals`.
    fn plan(&mut self, world: &PlanningWorld, request: &PlanRequest) -> Result<Vec<Vec<f32>>>;
}

/// Planner bound to the one planned articulation of a [`PlanningWorld`].
#[derive(Debug)]
pub struct SimPlanner<P: PathPlanner> {
    world: PlanningWorld,
    robot: String,
    user_link_names: Vec<String>,
    user_joint_names: Vec<String>,
    joint_name_2_idx: HashMap<String, usize>,
    link_name_2_idx: HashMap<String, usize>,
    move_group: String,
    move_group_joint_indices: Vec<usize>,
    move_group_link_id: usize,
    joint_types: Vec<JointType>,
    joint_limits: Vec<JointLimit>,
    joint_vel_limits: Vec<f32>,
    joint_acc_limits: Vec<f32>,
    equiv_joint_mask: Vec<bool>,
    diagnostics: Vec<Diagnostic>,
    planner: P,
}

impl<P: PathPlanner> SimPlanner<P> {
    /// Binds `world`'s planned articulation with `move_group` as end effector.
    ///
    /// Fails with [`BridgeError::UnsupportedConfig`] when the world does not
    /// have exactly one planned articulation, when `move_group` is not one of
    /// its links, or when the limit vectors do not match the move group.
    /// Collisions present in the initial state are reported as diagnostics.
    pub fn new(mut world: PlanningWorld, move_group: &str, config: PlannerConfig) -> Result<Self> {
        let planned = world.planned_articulations();
        if planned.len() != 1 {
            return Err(BridgeError::unsupported_config(format!(
                "must have exactly one planned articulation, found {}",
                planned.len()
            )));
        }
        let robot = planned[0].name().to_owned();

        let model = world
            .get_articulation_mut(&robot)
            .ok_or_else(|| BridgeError::not_found("articulation", &robot))?;
        let user_link_names = model.link_names().to_vec();
        let user_joint_names = model.joint_names().to_vec();
        let link_name_2_idx = index_by_name(&user_link_names);
        let joint_name_2_idx = index_by_name(&user_joint_names);

        let Some(&move_group_link_id) = link_name_2_idx.get(move_group) else {
            return Err(BridgeError::unsupported_config(format!(
                "end-effector '{move_group}' not found as one of the links in {user_link_names:?}"
            )));
        };
        model.set_move_group(move_group)?;
        let move_group_joint_indices = model.move_group_joint_indices().to_vec();

        let joint_types = model.chain().joint_types().to_vec();
        let joint_limits = model.chain().joint_limits().to_vec();
        let n_group = move_group_joint_indices.len();
        let joint_vel_limits = config.joint_vel_limits.unwrap_or_else(|| vec![1.0; n_group]);
        let joint_acc_limits = config.joint_acc_limits.unwrap_or_else(|| vec![1.0; n_group]);

        if joint_vel_limits.len() != n_group
            || joint_acc_limits.len() != n_group
            || n_group > joint_limits.len()
        {
            return Err(BridgeError::unsupported_config(format!(
                "length of joint_vel_limits, joint_acc_limits and move_group_joint_indices \
                 should be equal and <= number of total joints: {} == {} == {} <= {}",
                joint_vel_limits.len(),
                joint_acc_limits.len(),
                n_group,
                joint_limits.len()
            )));
        }

        let equiv_joint_mask = equivalent_joint_mask(model);

        let mut diagnostics = DiagnosticSink::default();
        for collision in world.check_collision() {
            diagnostics.push(Diagnostic::InitialCollision {
                link: collision.link_name1,
                other_link: collision.link_name2,
                other_object: collision.object_name2,
            });
        }

        let planner = P::from_world(&world)?;
        tracing::debug!(
            robot = %robot,
            move_group,
            joints = n_group,
            "planner bound to articulation"
        );

        Ok(Self {
            world,
            robot,
            user_link_names,
            user_joint_names,
            joint_name_2_idx,
            link_name_2_idx,
            move_group: move_group.to_owned(),
            move_group_joint_indices,
            move_group_link_id,
            joint_types,
            joint_limits,
            joint_vel_limits,
            joint_acc_limits,
            equiv_joint_mask,
            diagnostics: diagnostics.into_vec(),
            planner,
        })
    }

    /// Synchronizes the underlying world with `scene`.
    pub fn update_from_simulation<S: SimScene + ?Sized>(
        &mut self,
        scene: &S,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        self.world.update_from_simulation(scene, options)
    }

    /// Plans from the current move-group configuration to one of `goals`.
    pub fn plan_qpos(&mut self, goals: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let n_group = self.move_group_joint_indices.len();
        if let Some(goal) = goals.iter().find(|goal| goal.len() != n_group) {
            return Err(BridgeError::kinematics(format!(
                "goal has {} joint values, move group has {n_group}",
                goal.len()
            )));
        }

        let start = self.robot()?.move_group_qpos();
        let request = PlanRequest {
            start,
            goals: goals.to_vec(),
            move_group_joint_indices: self.move_group_joint_indices.clone(),
            equivalent_joints: self.equiv_joint_mask.clone(),
            joint_vel_limits: self.joint_vel_limits.clone(),
            joint_acc_limits: self.joint_acc_limits.clone(),
        };
        self.planner.plan(&self.world, &request)
    }

    pub fn world(&self) -> &PlanningWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PlanningWorld {
        &mut self.world
    }

    /// The bound articulation.
    ///
    /// Fails only if it was removed through [`world_mut`](Self::world_mut).
    pub fn robot(&self) -> Result<&ArticulatedModel> {
        self.world
            .get_articulation(&self.robot)
            .ok_or_else(|| BridgeError::not_found("articulation", &self.robot))
    }

    pub fn robot_name(&self) -> &str {
        &self.robot
    }

    pub fn user_link_names(&self) -> &[String] {
        &self.user_link_names
    }

    pub fn user_joint_names(&self) -> &[String] {
        &self.user_joint_names
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_name_2_idx.get(name).copied()
    }

    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.link_name_2_idx.get(name).copied()
    }

    pub fn move_group(&self) -> &str {
        &self.move_group
    }

    pub fn move_group_joint_indices(&self) -> &[usize] {
        &self.move_group_joint_indices
    }

    pub fn move_group_link_id(&self) -> usize {
        self.move_group_link_id
    }

    pub fn joint_types(&self) -> &[JointType] {
        &self.joint_types
    }

    pub fn joint_limits(&self) -> &[JointLimit] {
        &self.joint_limits
    }

    pub fn joint_vel_limits(&self) -> &[f32] {
        &self.joint_vel_limits
    }

    pub fn joint_acc_limits(&self) -> &[f32] {
        &self.joint_acc_limits
    }

    /// Per active joint: revolute with a range wider than a full turn.
    pub fn equivalent_joint_mask(&self) -> &[bool] {
        &self.equiv_joint_mask
    }

    /// Diagnostics raised while binding the planner.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn backend(&self) -> &P {
        &self.planner
    }
}

fn index_by_name(names: &[String]) -> HashMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

fn equivalent_joint_mask(model: &ArticulatedModel) -> Vec<bool> {
    let chain = model.chain();
    chain
        .joint_types()
        .iter()
        .zip(chain.joint_limits())
        .map(|(joint_type, limits)| joint_type.is_revolute() && limits.wraps_full_turn())
        .collect()
}
