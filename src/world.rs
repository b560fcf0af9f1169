//! The planning world: articulations, free objects, attachments and the ACM.
//!
//! [`PlanningWorld`] is a plain owned aggregate. Mutation goes through
//! `&mut self`, queries through `&self`; nothing here locks. Construction from a
//! live scene and per-step synchronization live in [`crate::sync`], pairwise
//! entity queries in [`crate::query`] and the attach/detach lifecycle in
//! [`crate::attach`].
//!
//! Attached objects stay registered as objects. The attached record only adds
//! the binding to a link, so the object's entry always holds its current world
//! pose.

use crate::collision::model::check_entries;
use crate::collision::{
    AllowedCollisionMatrix, CollisionKind, FclObject, NarrowPhase, WorldCollisionResult,
};
use crate::error::{BridgeError, Result};
use crate::identity::NameRef;
use crate::kinematics::ArticulatedModel;
use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An object bound to a link of a planned articulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachedBody {
    /// Name of the attached object.
    pub name: String,
    /// Articulation the object is attached to.
    pub articulation: String,
    /// Chain index of the attachment link.
    pub link_id: usize,
    /// Pose of the object in the attachment link's frame.
    pub pose: Pose,
    /// Links allowed to touch the object.
    pub touch_links: Vec<String>,
}

/// Planning-side mirror of one simulation scene.
pub struct PlanningWorld {
    pub(crate) articulations: BTreeMap<String, ArticulatedModel>,
    pub(crate) objects: BTreeMap<String, FclObject>,
    pub(crate) attached: BTreeMap<String, AttachedBody>,
    pub(crate) acm: AllowedCollisionMatrix,
    pub(crate) narrow_phase: Box<dyn NarrowPhase>,
}

impl fmt::Debug for PlanningWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanningWorld")
            .field("articulations", &self.articulations.keys().collect::<Vec<_>>())
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .field("attached", &self.attached.keys().collect::<Vec<_>>())
            .field("acm_entries", &self.acm.len())
            .finish_non_exhaustive()
    }
}

impl PlanningWorld {
    /// Creates an empty world using `narrow_phase` for primitive tests.
    pub fn new(narrow_phase: Box<dyn NarrowPhase>) -> Self {
        Self {
            articulations: BTreeMap::new(),
            objects: BTreeMap::new(),
            attached: BTreeMap::new(),
            acm: AllowedCollisionMatrix::new(),
            narrow_phase,
        }
    }

    pub fn narrow_phase(&self) -> &dyn NarrowPhase {
        self.narrow_phase.as_ref()
    }

    // --- Articulations ---

    /// Registers an articulated model under its name, replacing any previous one.
    pub fn add_articulation(&mut self, model: ArticulatedModel) {
        tracing::debug!(articulation = model.name(), "adding articulation");
        self.articulations.insert(model.name().to_owned(), model);
    }

    pub fn get_articulation(&self, name: &str) -> Option<&ArticulatedModel> {
        self.articulations.get(name)
    }

    pub fn get_articulation_mut(&mut self, name: &str) -> Option<&mut ArticulatedModel> {
        self.articulations.get_mut(name)
    }

    pub fn has_articulation(&self, name: &str) -> bool {
        self.articulations.contains_key(name)
    }

    pub fn articulation_names(&self) -> impl Iterator<Item = &str> {
        self.articulations.keys().map(String::as_str)
    }

    /// Removes an articulation together with the objects attached to it.
    ///
    /// Returns `false` if no such articulation was registered.
    pub fn remove_articulation(&mut self, name: &str) -> bool {
        if self.articulations.remove(name).is_none() {
            return false;
        }
        self.attached.retain(|_, body| body.articulation != name);
        true
    }

    pub fn is_articulation_planned(&self, name: &str) -> bool {
        self.articulations
            .get(name)
            .is_some_and(ArticulatedModel::is_planned)
    }

    /// Same as [`is_articulation_planned`](Self::is_articulation_planned), by name or entity.
    pub fn is_entity_planned<'a>(&self, articulation: impl Into<NameRef<'a>>) -> Result<bool> {
        let name = articulation.into().object_name()?;
        Ok(self.is_articulation_planned(&name))
    }

    /// Marks an articulation as subject to planning (or as a background obstacle).
    pub fn set_articulation_planned(&mut self, name: &str, planned: bool) -> Result<()> {
        let model = self
            .articulations
            .get_mut(name)
            .ok_or_else(|| BridgeError::not_found("articulation", name))?;
        model.set_planned(planned);
        Ok(())
    }

    pub fn set_entity_planned<'a>(
        &mut self,
        articulation: impl Into<NameRef<'a>>,
        planned: bool,
    ) -> Result<()> {
        let name = articulation.into().object_name()?;
        self.set_articulation_planned(&name, planned)
    }

    /// All planned articulations, ordered by name.
    pub fn planned_articulations(&self) -> Vec<&ArticulatedModel> {
        self.articulations
            .values()
            .filter(|model| model.is_planned())
            .collect()
    }

    /// Sets an articulation's joint configuration and moves its attached objects.
    pub fn set_qpos(&mut self, articulation: &str, qpos: &[f32], full: bool) -> Result<()> {
        self.articulations
            .get_mut(articulation)
            .ok_or_else(|| BridgeError::not_found("articulation", articulation))?
            .set_qpos(qpos, full)?;
        self.refresh_attached_of(articulation)
    }

    // --- Objects ---

    /// Registers a collision entry under its name, replacing any previous one.
    pub fn add_object(&mut self, object: FclObject) {
        self.objects.insert(object.name.clone(), object);
    }

    pub fn get_object(&self, name: &str) -> Option<&FclObject> {
        self.objects.get(name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn has_entity<'a>(&self, object: impl Into<NameRef<'a>>) -> Result<bool> {
        let name = object.into().object_name()?;
        Ok(self.has_object(&name))
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Removes an object, detaching it first if needed.
    ///
    /// ACM entries are left alone. Returns `false` if the object did not exist.
    pub fn remove_object(&mut self, name: &str) -> bool {
        self.attached.remove(name);
        self.objects.remove(name).is_some()
    }

    pub fn remove_entity<'a>(&mut self, object: impl Into<NameRef<'a>>) -> Result<bool> {
        let name = object.into().object_name()?;
        Ok(self.remove_object(&name))
    }

    pub fn is_object_attached(&self, name: &str) -> bool {
        self.attached.contains_key(name)
    }

    pub fn is_entity_attached<'a>(&self, object: impl Into<NameRef<'a>>) -> Result<bool> {
        let name = object.into().object_name()?;
        Ok(self.is_object_attached(&name))
    }

    pub fn get_attached_object(&self, name: &str) -> Option<&AttachedBody> {
        self.attached.get(name)
    }

    pub fn attached_objects(&self) -> impl Iterator<Item = &AttachedBody> {
        self.attached.values()
    }

    // --- Allowed collisions ---

    pub fn acm(&self) -> &AllowedCollisionMatrix {
        &self.acm
    }

    pub fn acm_mut(&mut self) -> &mut AllowedCollisionMatrix {
        &mut self.acm
    }

    /// Sets the allowance of a pair given by name or entity.
    ///
    /// Links are entered under their plain link name.
    pub fn set_allowed_collision<'a, 'b>(
        &mut self,
        first: impl Into<NameRef<'a>>,
        second: impl Into<NameRef<'b>>,
        allowed: bool,
    ) -> Result<()> {
        let first = first.into().collision_name()?;
        let second = second.into().collision_name()?;
        self.acm.set_entry(&first, &second, allowed);
        Ok(())
    }

    // --- Attached poses ---

    /// Current world pose of the link an object is attached to.
    pub fn attached_link_global_pose(&self, name: &str) -> Result<Pose> {
        let body = self
            .attached
            .get(name)
            .ok_or_else(|| BridgeError::not_found("attached object", name))?;
        self.articulations
            .get(&body.articulation)
            .ok_or_else(|| BridgeError::not_found("articulation", &body.articulation))?
            .link_pose(body.link_id)
    }

    /// Moves an attached object's entry to `link pose * relative pose`.
    pub fn update_attached_pose(&mut self, name: &str) -> Result<()> {
        let link_pose = self.attached_link_global_pose(name)?;
        let relative = self
            .attached
            .get(name)
            .map(|body| body.pose)
            .ok_or_else(|| BridgeError::not_found("attached object", name))?;
        let object = self
            .objects
            .get_mut(name)
            .ok_or_else(|| BridgeError::not_found("object", name))?;
        object.pose = link_pose * relative;
        Ok(())
    }

    pub(crate) fn refresh_attached_of(&mut self, articulation: &str) -> Result<()> {
        let names: Vec<String> = self
            .attached
            .values()
            .filter(|body| body.articulation == articulation)
            .map(|body| body.name.clone())
            .collect();
        for name in names {
            self.update_attached_pose(&name)?;
        }
        Ok(())
    }

    pub(crate) fn refresh_all_attached(&mut self) -> Result<()> {
        let names: Vec<String> = self.attached.keys().cloned().collect();
        for name in names {
            self.update_attached_pose(&name)?;
        }
        Ok(())
    }

    // --- World-level collision checks ---

    /// Free objects, i.e. those not attached to any articulation.
    fn free_objects(&self) -> impl Iterator<Item = &FclObject> {
        self.objects
            .values()
            .filter(|object| !self.attached.contains_key(&object.name))
    }

    fn attached_entries(&self) -> impl Iterator<Item = (&AttachedBody, &FclObject)> {
        self.attached
            .values()
            .filter_map(|body| self.objects.get(&body.name).map(|object| (body, object)))
    }

    /// Self-collisions of the planned articulations and their attached objects.
    pub fn check_self_collision(&self) -> Vec<WorldCollisionResult> {
        let np = self.narrow_phase();
        let mut results = Vec::new();

        for model in self.planned_articulations() {
            results.extend(model.check_self_collision(np, &self.acm));
        }

        let attached: Vec<_> = self
            .attached_entries()
            .filter(|(body, _)| self.is_articulation_planned(&body.articulation))
            .collect();
        for (i, (body, object)) in attached.iter().enumerate() {
            // Attached object vs. links of every planned articulation.
            for model in self.planned_articulations() {
                let fcl = model.fcl_model();
                let kind = if model.name() == body.articulation {
                    CollisionKind::SelfAttached
                } else {
                    CollisionKind::AttachedArticulation
                };
                results.extend(check_entries(
                    np,
                    &self.acm,
                    (object.name.as_str(), std::slice::from_ref(*object)),
                    (fcl.name(), fcl.collision_links()),
                    kind,
                ));
            }
            for (_, other) in &attached[i + 1..] {
                results.extend(check_entries(
                    np,
                    &self.acm,
                    (object.name.as_str(), std::slice::from_ref(*object)),
                    (other.name.as_str(), std::slice::from_ref(*other)),
                    CollisionKind::AttachedAttached,
                ));
            }
        }
        results
    }

    /// Collisions between the planned articulations (with their attached
    /// objects) and everything else in the world.
    pub fn check_robot_collision(&self) -> Vec<WorldCollisionResult> {
        let np = self.narrow_phase();
        let mut results = Vec::new();
        let unplanned: Vec<_> = self
            .articulations
            .values()
            .filter(|model| !model.is_planned())
            .collect();
        let free: Vec<_> = self.free_objects().collect();

        for model in self.planned_articulations() {
            let fcl = model.fcl_model();
            for other in &unplanned {
                let other = other.fcl_model();
                results.extend(check_entries(
                    np,
                    &self.acm,
                    (fcl.name(), fcl.collision_links()),
                    (other.name(), other.collision_links()),
                    CollisionKind::ArticulationArticulation,
                ));
            }
            for object in &free {
                results.extend(check_entries(
                    np,
                    &self.acm,
                    (fcl.name(), fcl.collision_links()),
                    (object.name.as_str(), std::slice::from_ref(*object)),
                    CollisionKind::ArticulationObject,
                ));
            }
        }

        for (body, object) in self.attached_entries() {
            if !self.is_articulation_planned(&body.articulation) {
                continue;
            }
            let this = (object.name.as_str(), std::slice::from_ref(object));
            for other in &unplanned {
                let other = other.fcl_model();
                results.extend(check_entries(
                    np,
                    &self.acm,
                    this,
                    (other.name(), other.collision_links()),
                    CollisionKind::AttachedArticulation,
                ));
            }
            for other in &free {
                results.extend(check_entries(
                    np,
                    &self.acm,
                    this,
                    (other.name.as_str(), std::slice::from_ref(*other)),
                    CollisionKind::AttachedObject,
                ));
            }
        }
        results
    }

    /// Self and robot collisions combined.
    pub fn check_collision(&self) -> Vec<WorldCollisionResult> {
        let mut results = self.check_self_collision();
        results.extend(self.check_robot_collision());
        results
    }
}
