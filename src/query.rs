//! Pairwise collision and distance queries between simulation entities.
//!
//! Dispatch, in order:
//!
//! 1. the first entity is an articulation: its collision model is queried
//!    against the second entity;
//! 2. the second entity is an articulation: its model is queried against the
//!    first;
//! 3. both are objects: the pair is tested directly, unless the ACM allows it.
//!
//! The articulation paths apply the ACM per link pair inside the model.

use crate::collision::{
    AllowedCollisionMatrix, CollisionKind, CollisionTarget, FclObject, NarrowPhase,
    WorldCollisionResult, WorldDistanceResult, collide, distance,
};
use crate::error::{BridgeError, Result};
use crate::identity::{EntityRef, unique_name};
use crate::world::PlanningWorld;

/// What a distance query returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceMode {
    /// Only the minimum distance.
    #[default]
    MinDistanceOnly,
    /// The full closest-pair record.
    FullResult,
}

/// Result of [`PlanningWorld::distance_between`].
#[derive(Clone, Debug, PartialEq)]
pub enum Distance {
    Scalar(f32),
    Full(WorldDistanceResult),
}

impl Distance {
    pub fn min_distance(&self) -> f32 {
        match self {
            Self::Scalar(d) => *d,
            Self::Full(result) => result.min_distance,
        }
    }
}

impl PlanningWorld {
    /// Collisions between two articulations or actors.
    ///
    /// Empty when they do not collide or when the ACM allows every colliding
    /// pair.
    pub fn check_collision_between<'a, 'b>(
        &self,
        a: impl Into<EntityRef<'a>>,
        b: impl Into<EntityRef<'b>>,
        acm: &AllowedCollisionMatrix,
    ) -> Result<Vec<WorldCollisionResult>> {
        let (a, b) = (a.into(), b.into());
        let target_a = self.collision_target(a)?;
        let target_b = self.collision_target(b)?;
        let np = self.narrow_phase();

        match (target_a, target_b) {
            (CollisionTarget::Model(model), other) | (other, CollisionTarget::Model(model)) => {
                Ok(model.check_collision_with(np, other, acm))
            }
            (CollisionTarget::Object(first), CollisionTarget::Object(second)) => {
                if !acm.should_check(&first.name, &second.name) {
                    return Ok(Vec::new());
                }
                let result = collide(np, first, second);
                if !result.is_collision() {
                    return Ok(Vec::new());
                }
                Ok(vec![WorldCollisionResult {
                    result,
                    kind: CollisionKind::ObjectObject,
                    object_name1: first.name.clone(),
                    object_name2: second.name.clone(),
                    link_name1: first.name.clone(),
                    link_name2: second.name.clone(),
                }])
            }
        }
    }

    /// Distance between two articulations or actors.
    ///
    /// A pair skipped by the ACM reports `f32::MAX`.
    pub fn distance_between<'a, 'b>(
        &self,
        a: impl Into<EntityRef<'a>>,
        b: impl Into<EntityRef<'b>>,
        acm: &AllowedCollisionMatrix,
        mode: DistanceMode,
    ) -> Result<Distance> {
        let (a, b) = (a.into(), b.into());
        let target_a = self.collision_target(a)?;
        let target_b = self.collision_target(b)?;
        let np = self.narrow_phase();

        let result = match (target_a, target_b) {
            (CollisionTarget::Model(model), other) | (other, CollisionTarget::Model(model)) => {
                model.distance_with(np, other, acm)
            }
            (CollisionTarget::Object(first), CollisionTarget::Object(second)) => {
                object_distance(np, first, second, acm)
            }
        };

        Ok(match mode {
            DistanceMode::MinDistanceOnly => Distance::Scalar(result.min_distance),
            DistanceMode::FullResult => Distance::Full(result),
        })
    }

    /// The registered collision representation of an entity.
    fn collision_target(&self, entity: EntityRef<'_>) -> Result<CollisionTarget<'_>> {
        let name = unique_name(entity)?;
        match entity {
            EntityRef::Articulation(_) => self
                .get_articulation(&name)
                .map(|model| CollisionTarget::Model(model.fcl_model()))
                .ok_or_else(|| BridgeError::not_found("articulation", name)),
            EntityRef::Actor(_) => self
                .get_object(&name)
                .map(CollisionTarget::Object)
                .ok_or_else(|| BridgeError::not_found("object", name)),
            // `unique_name` already rejected links.
            EntityRef::Link(link) => Err(BridgeError::unsupported_type("link", &link.name)),
        }
    }
}

fn object_distance(
    np: &dyn NarrowPhase,
    first: &FclObject,
    second: &FclObject,
    acm: &AllowedCollisionMatrix,
) -> WorldDistanceResult {
    if !acm.should_check(&first.name, &second.name) {
        return WorldDistanceResult::default();
    }
    let result = distance(np, first, second);
    WorldDistanceResult {
        result,
        min_distance: result.min_distance,
        kind: Some(CollisionKind::ObjectObject),
        object_name1: first.name.clone(),
        object_name2: second.name.clone(),
        link_name1: first.name.clone(),
        link_name2: second.name.clone(),
    }
}
