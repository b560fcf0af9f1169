//! Mapping between simulation entities and planning-world names.
//!
//! Planning entries are keyed by strings that must be unique within a world.
//! Simulation names are not, so every entity is suffixed with its per-scene id:
//! `"{name}_{per_scene_id}"`. Ids are unique among live entities of one scene
//! but may be reused after a scene reload, so names are only stable for the
//! lifetime of an entity.

use crate::error::{BridgeError, Result};
use crate::sim::{SimActor, SimArticulation, SimLink};
use std::borrow::Cow;

/// A borrowed reference to a simulation entity.
#[derive(Clone, Copy, Debug)]
pub enum EntityRef<'a> {
    Articulation(&'a SimArticulation),
    Actor(&'a SimActor),
    /// A single articulation link. Links have no world-level unique name.
    Link(&'a SimLink),
}

impl<'a> EntityRef<'a> {
    /// The entity's declared (non-unique) name.
    pub fn declared_name(&self) -> &'a str {
        match self {
            Self::Articulation(art) => &art.name,
            Self::Actor(actor) => &actor.name,
            Self::Link(link) => &link.name,
        }
    }
}

impl<'a> From<&'a SimArticulation> for EntityRef<'a> {
    fn from(art: &'a SimArticulation) -> Self {
        Self::Articulation(art)
    }
}

impl<'a> From<&'a SimActor> for EntityRef<'a> {
    fn from(actor: &'a SimActor) -> Self {
        Self::Actor(actor)
    }
}

impl<'a> From<&'a SimLink> for EntityRef<'a> {
    fn from(link: &'a SimLink) -> Self {
        Self::Link(link)
    }
}

/// Returns the planning-world name of a simulation entity.
///
/// Articulations are identified through their root link's per-scene id.
pub fn unique_name(entity: EntityRef<'_>) -> Result<String> {
    match entity {
        EntityRef::Articulation(art) => {
            let root = art.root().ok_or_else(|| {
                BridgeError::unsupported_type("articulation without links", &art.name)
            })?;
            Ok(format!("{}_{}", art.name, root.per_scene_id))
        }
        EntityRef::Actor(actor) => Ok(format!("{}_{}", actor.name, actor.per_scene_id)),
        EntityRef::Link(link) => Err(BridgeError::unsupported_type("link", &link.name)),
    }
}

/// Either a planning-world name or a simulation entity to derive it from.
#[derive(Clone, Copy, Debug)]
pub enum NameRef<'a> {
    Name(&'a str),
    Entity(EntityRef<'a>),
}

impl<'a> NameRef<'a> {
    /// Resolves to an articulation or object name.
    pub fn object_name(&self) -> Result<Cow<'a, str>> {
        match *self {
            Self::Name(name) => Ok(Cow::Borrowed(name)),
            Self::Entity(entity) => unique_name(entity).map(Cow::Owned),
        }
    }

    /// Resolves to a name usable in the allowed-collision matrix.
    ///
    /// Links are listed in the matrix under their plain link name.
    pub fn collision_name(&self) -> Result<Cow<'a, str>> {
        match *self {
            Self::Entity(EntityRef::Link(link)) => Ok(Cow::Borrowed(&link.name)),
            _ => self.object_name(),
        }
    }
}

impl<'a> From<&'a str> for NameRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for NameRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<EntityRef<'a>> for NameRef<'a> {
    fn from(entity: EntityRef<'a>) -> Self {
        Self::Entity(entity)
    }
}

impl<'a> From<&'a SimArticulation> for NameRef<'a> {
    fn from(art: &'a SimArticulation) -> Self {
        Self::Entity(EntityRef::Articulation(art))
    }
}

impl<'a> From<&'a SimActor> for NameRef<'a> {
    fn from(actor: &'a SimActor) -> Self {
        Self::Entity(EntityRef::Actor(actor))
    }
}

impl<'a> From<&'a SimLink> for NameRef<'a> {
    fn from(link: &'a SimLink) -> Self {
        Self::Entity(EntityRef::Link(link))
    }
}

/// A link of an articulated model, by chain index or by simulation link.
#[derive(Clone, Copy, Debug)]
pub enum LinkRef<'a> {
    Index(usize),
    Link(&'a SimLink),
}

impl From<usize> for LinkRef<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a SimLink> for LinkRef<'a> {
    fn from(link: &'a SimLink) -> Self {
        Self::Link(link)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    fn link(name: &str, id: u32) -> SimLink {
        SimLink {
            name: name.into(),
            per_scene_id: id,
            pose: Pose::IDENTITY,
            collision_shapes: Vec::new(),
        }
    }

    #[test]
    fn articulation_uses_root_link_id() {
        let art = SimArticulation {
            name: "panda".into(),
            links: vec![link("base", 12), link("hand", 13)],
            active_joints: Vec::new(),
            root_pose: Pose::IDENTITY,
            qpos: Vec::new(),
        };
        assert_eq!(unique_name(EntityRef::from(&art)).unwrap(), "panda_12");
    }

    #[test]
    fn actor_uses_own_id() {
        let actor = SimActor {
            name: "cube".into(),
            per_scene_id: 4,
            pose: Pose::IDENTITY,
            collision_shapes: Vec::new(),
        };
        assert_eq!(unique_name(EntityRef::from(&actor)).unwrap(), "cube_4");
    }

    #[test]
    fn link_is_unsupported_for_unique_name() {
        let l = link("hand", 3);
        let err = unique_name(EntityRef::from(&l)).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { kind: "link", .. }));
    }

    #[test]
    fn link_resolves_to_plain_collision_name() {
        let l = link("hand", 3);
        let name_ref = NameRef::from(&l);
        assert_eq!(name_ref.collision_name().unwrap(), "hand");
        assert!(name_ref.object_name().is_err());
    }
}
