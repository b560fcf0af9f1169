//! Per-articulation collision model: one [`FclObject`] per colliding link.

use super::{
    AllowedCollisionMatrix, CollisionKind, FclObject, NarrowPhase, WorldCollisionResult,
    WorldDistanceResult, collide, distance,
};
use crate::pose::Pose;

/// The other side of an articulation-level query.
#[derive(Clone, Copy, Debug)]
pub enum CollisionTarget<'a> {
    Model(&'a FclModel),
    Object(&'a FclObject),
}

/// Collision entries of all links of one articulation.
///
/// Each entry is named after its link and posed at the link's world pose.
#[derive(Clone, Debug, PartialEq)]
pub struct FclModel {
    name: String,
    links: Vec<FclObject>,
    /// Chain link index of each entry in `links`.
    link_indices: Vec<usize>,
    /// Entry pairs considered for self-collision.
    self_pairs: Vec<(usize, usize)>,
}

impl FclModel {
    /// Builds the model from `(chain link index, entry)` pairs.
    ///
    /// `disabled_pairs` lists link-name pairs excluded from self-collision
    /// (typically adjacent links and pairs the semantics description disables).
    pub fn new(
        name: impl Into<String>,
        links: Vec<(usize, FclObject)>,
        disabled_pairs: &[(String, String)],
    ) -> Self {
        let (link_indices, links): (Vec<usize>, Vec<FclObject>) = links.into_iter().unzip();

        let is_disabled = |a: &str, b: &str| {
            disabled_pairs
                .iter()
                .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
        };
        let mut self_pairs = Vec::new();
        for i in 0..links.len() {
            for j in (i + 1)..links.len() {
                if !is_disabled(&links[i].name, &links[j].name) {
                    self_pairs.push((i, j));
                }
            }
        }

        Self {
            name: name.into(),
            links,
            link_indices,
            self_pairs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collision_links(&self) -> &[FclObject] {
        &self.links
    }

    pub fn collision_link_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|link| link.name.as_str())
    }

    pub fn collision_link_indices(&self) -> &[usize] {
        &self.link_indices
    }

    pub fn self_collision_pairs(&self) -> &[(usize, usize)] {
        &self.self_pairs
    }

    /// Moves every entry to the pose reported for its chain link.
    pub fn update_link_poses(&mut self, link_pose: impl Fn(usize) -> Pose) {
        for (entry, &index) in self.links.iter_mut().zip(&self.link_indices) {
            entry.pose = link_pose(index);
        }
    }

    pub fn check_self_collision(
        &self,
        narrow_phase: &dyn NarrowPhase,
        acm: &AllowedCollisionMatrix,
    ) -> Vec<WorldCollisionResult> {
        let mut results = Vec::new();
        for &(i, j) in &self.self_pairs {
            let (a, b) = (&self.links[i], &self.links[j]);
            if !acm.should_check(&a.name, &b.name) {
                continue;
            }
            let result = collide(narrow_phase, a, b);
            if result.is_collision() {
                results.push(WorldCollisionResult {
                    result,
                    kind: CollisionKind::SelfCollision,
                    object_name1: self.name.clone(),
                    object_name2: self.name.clone(),
                    link_name1: a.name.clone(),
                    link_name2: b.name.clone(),
                });
            }
        }
        results
    }

    /// Checks this articulation against another model or a free object.
    ///
    /// Querying a model against itself is a self-collision check.
    pub fn check_collision_with(
        &self,
        narrow_phase: &dyn NarrowPhase,
        target: CollisionTarget<'_>,
        acm: &AllowedCollisionMatrix,
    ) -> Vec<WorldCollisionResult> {
        match target {
            CollisionTarget::Model(other) if other.name == self.name => {
                self.check_self_collision(narrow_phase, acm)
            }
            CollisionTarget::Model(other) => check_entries(
                narrow_phase,
                acm,
                (self.name.as_str(), self.links.as_slice()),
                (other.name.as_str(), other.links.as_slice()),
                CollisionKind::ArticulationArticulation,
            ),
            CollisionTarget::Object(object) => check_entries(
                narrow_phase,
                acm,
                (self.name.as_str(), self.links.as_slice()),
                (object.name.as_str(), std::slice::from_ref(object)),
                CollisionKind::ArticulationObject,
            ),
        }
    }

    pub fn distance_self(
        &self,
        narrow_phase: &dyn NarrowPhase,
        acm: &AllowedCollisionMatrix,
    ) -> WorldDistanceResult {
        let mut best = WorldDistanceResult::default();
        for &(i, j) in &self.self_pairs {
            let (a, b) = (&self.links[i], &self.links[j]);
            if !acm.should_check(&a.name, &b.name) {
                continue;
            }
            let result = distance(narrow_phase, a, b);
            best.keep_min(WorldDistanceResult {
                result,
                min_distance: result.min_distance,
                kind: Some(CollisionKind::SelfCollision),
                object_name1: self.name.clone(),
                object_name2: self.name.clone(),
                link_name1: a.name.clone(),
                link_name2: b.name.clone(),
            });
        }
        best
    }

    pub fn distance_with(
        &self,
        narrow_phase: &dyn NarrowPhase,
        target: CollisionTarget<'_>,
        acm: &AllowedCollisionMatrix,
    ) -> WorldDistanceResult {
        match target {
            CollisionTarget::Model(other) if other.name == self.name => {
                self.distance_self(narrow_phase, acm)
            }
            CollisionTarget::Model(other) => distance_entries(
                narrow_phase,
                acm,
                (self.name.as_str(), self.links.as_slice()),
                (other.name.as_str(), other.links.as_slice()),
                CollisionKind::ArticulationArticulation,
            ),
            CollisionTarget::Object(object) => distance_entries(
                narrow_phase,
                acm,
                (self.name.as_str(), self.links.as_slice()),
                (object.name.as_str(), std::slice::from_ref(object)),
                CollisionKind::ArticulationObject,
            ),
        }
    }
}

/// Checks every entry of `left` against every entry of `right`.
///
/// Each side is `(owner name, entries)`; pairs are gated by entry name.
pub(crate) fn check_entries(
    narrow_phase: &dyn NarrowPhase,
    acm: &AllowedCollisionMatrix,
    (left_owner, left): (&str, &[FclObject]),
    (right_owner, right): (&str, &[FclObject]),
    kind: CollisionKind,
) -> Vec<WorldCollisionResult> {
    let mut results = Vec::new();
    for a in left {
        for b in right {
            if !acm.should_check(&a.name, &b.name) {
                continue;
            }
            let result = collide(narrow_phase, a, b);
            if result.is_collision() {
                results.push(WorldCollisionResult {
                    result,
                    kind,
                    object_name1: left_owner.to_owned(),
                    object_name2: right_owner.to_owned(),
                    link_name1: a.name.clone(),
                    link_name2: b.name.clone(),
                });
            }
        }
    }
    results
}

pub(crate) fn distance_entries(
    narrow_phase: &dyn NarrowPhase,
    acm: &AllowedCollisionMatrix,
    (left_owner, left): (&str, &[FclObject]),
    (right_owner, right): (&str, &[FclObject]),
    kind: CollisionKind,
) -> WorldDistanceResult {
    let mut best = WorldDistanceResult::default();
    for a in left {
        for b in right {
            if !acm.should_check(&a.name, &b.name) {
                continue;
            }
            let result = distance(narrow_phase, a, b);
            best.keep_min(WorldDistanceResult {
                result,
                min_distance: result.min_distance,
                kind: Some(kind),
                object_name1: left_owner.to_owned(),
                object_name2: right_owner.to_owned(),
                link_name1: a.name.clone(),
                link_name2: b.name.clone(),
            });
        }
    }
    best
}
