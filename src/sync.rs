//! Building a planning world from a live scene and keeping it in step.
//!
//! Construction registers every articulation and every actor with collision
//! shapes. Synchronization only moves what is already registered: it never
//! adds new objects, and it never refreshes shape local poses. If those change,
//! build a new world.

use crate::collision::NarrowPhase;
use crate::convert::convert_body;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{BridgeError, Result};
use crate::identity::{EntityRef, unique_name};
use crate::kinematics::{
    ArticulatedModel, ChainBuilder, ChainDescription, DescriptionExporter, JointSpec,
};
use crate::sim::{SimActor, SimArticulation, SimScene};
use crate::world::PlanningWorld;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Options for [`PlanningWorld::update_from_simulation`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Recompute the attached pose of attached actors from their live pose.
    ///
    /// When `false`, attached actors follow their link with the pose captured
    /// at attach time, whatever the simulation did to them.
    pub update_attached_object: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            update_attached_object: true,
        }
    }
}

/// Outcome of a successful synchronization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl SyncReport {
    /// True when the pass raised no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl PlanningWorld {
    /// Builds a world mirroring every articulation and actor of `scene`.
    ///
    /// Articulations listed in `planned` are marked as planned. Actors without
    /// collision shapes are skipped.
    pub fn from_scene<S: SimScene + ?Sized>(
        scene: &S,
        exporter: &dyn DescriptionExporter,
        builder: &dyn ChainBuilder,
        narrow_phase: Box<dyn NarrowPhase>,
        planned: &[&SimArticulation],
    ) -> Result<Self> {
        let mut world = Self::new(narrow_phase);

        for articulation in scene.articulations() {
            let model = build_articulated_model(articulation, scene.gravity(), exporter, builder)?;
            world.add_articulation(model);
        }

        for &articulation in planned {
            world.set_entity_planned(articulation, true)?;
        }

        for actor in scene.actors() {
            if let Some(object) = convert_body(actor)? {
                world.add_object(object);
            }
        }

        tracing::debug!(
            articulations = world.articulations.len(),
            objects = world.objects.len(),
            "planning world built from scene"
        );
        Ok(world)
    }

    /// Converts and registers one actor at its current pose.
    ///
    /// Returns `false` (and registers nothing) when the actor has no collision
    /// shapes.
    pub fn add_entity(&mut self, actor: &SimActor) -> Result<bool> {
        match convert_body(actor)? {
            Some(object) => {
                self.add_object(object);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Refreshes every registered pose and configuration from `scene`.
    ///
    /// Fails with [`BridgeError::OutOfSync`] if a live articulation has no
    /// model. Live actors with collision shapes that are not registered are
    /// reported as [`Diagnostic::UnregisteredEntity`] and left out.
    pub fn update_from_simulation<S: SimScene + ?Sized>(
        &mut self,
        scene: &S,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        let mut diagnostics = DiagnosticSink::default();

        // 1. Articulations: base pose, then full configuration.
        for articulation in scene.articulations() {
            let name = unique_name(EntityRef::Articulation(articulation))?;
            let model = self
                .articulations
                .get_mut(&name)
                .ok_or_else(|| BridgeError::out_of_sync(&articulation.name))?;
            model.set_base_pose(articulation.root_pose)?;
            model.set_qpos(&articulation.qpos, true)?;
        }

        // 2. Attached objects follow their links, whether or not they are actors.
        self.refresh_all_attached()?;

        // 3. Actors.
        for actor in scene.actors() {
            let name = unique_name(EntityRef::Actor(actor))?;

            if self.attached.contains_key(&name) {
                if options.update_attached_object {
                    let link_pose = self.attached_link_global_pose(&name)?;
                    if let Some(body) = self.attached.get_mut(&name) {
                        body.pose = link_pose.inverse() * actor.pose;
                    }
                }
                self.update_attached_pose(&name)?;
            } else if let Some(object) = self.objects.get(&name) {
                let moved = object.with_pose(actor.pose);
                self.add_object(moved);
            } else if !actor.collision_shapes.is_empty() {
                diagnostics.push(Diagnostic::UnregisteredEntity {
                    entity: actor.name.clone(),
                    unique_name: name,
                });
            }
        }

        Ok(SyncReport {
            diagnostics: diagnostics.into_vec(),
        })
    }
}

/// Exports, builds and poses the model of one simulation articulation.
fn build_articulated_model(
    articulation: &SimArticulation,
    gravity: Vec3,
    exporter: &dyn DescriptionExporter,
    builder: &dyn ChainBuilder,
) -> Result<ArticulatedModel> {
    let name = unique_name(EntityRef::Articulation(articulation))?;

    let mut collision_links = Vec::new();
    for link in &articulation.links {
        if let Some(entry) = convert_body(link)? {
            collision_links.push(entry);
        }
    }

    let description = ChainDescription {
        chain: exporter.export_chain(articulation)?,
        semantics: exporter.export_semantics(articulation)?,
        link_names: articulation.links.iter().map(|l| l.name.clone()).collect(),
        joints: articulation
            .active_joints
            .iter()
            .map(|joint| JointSpec {
                name: joint.name.clone(),
                joint_type: joint.joint_type,
                limits: joint.limits,
            })
            .collect(),
        gravity,
        name,
    };

    let mut model = ArticulatedModel::create(&description, builder, collision_links)?;
    model.set_base_pose(articulation.root_pose)?;
    model.set_qpos(&articulation.qpos, true)?;
    tracing::debug!(
        articulation = model.name(),
        links = model.link_names().len(),
        joints = model.joint_names().len(),
        "built articulated model"
    );
    Ok(model)
}
