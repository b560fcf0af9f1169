// tests/identity.rs
mod common;

use common::{arm, sphere_actor};
use glam::Vec3;
use proptest::prelude::*;
use simplan_bridge::{BridgeError, EntityRef, NameRef, SimActor, unique_name};
use std::collections::HashSet;

fn actors(names: &[String], ids: &[u32]) -> Vec<SimActor> {
    names
        .iter()
        .zip(ids)
        .map(|(name, &id)| sphere_actor(name, id, Vec3::ZERO, 0.1))
        .collect()
}

proptest! {
    // Live entities carry distinct per-scene ids; their names may repeat freely.
    #[test]
    fn unique_names_are_injective(
        ids in prop::collection::hash_set(0u32..100_000, 1..32),
        names in prop::collection::vec("[a-z_]{1,6}(_[0-9]{1,3})?", 32),
    ) {
        let ids: Vec<u32> = ids.into_iter().collect();
        let actors = actors(&names, &ids);

        let unique: HashSet<String> = actors
            .iter()
            .map(|actor| unique_name(EntityRef::from(actor)).unwrap())
            .collect();
        prop_assert_eq!(unique.len(), actors.len());
    }

    #[test]
    fn unique_name_is_deterministic(name in "[a-zA-Z0-9_]{1,12}", id in any::<u32>()) {
        let actor = sphere_actor(&name, id, Vec3::ZERO, 0.1);
        let first = unique_name(EntityRef::from(&actor)).unwrap();
        let second = unique_name(EntityRef::from(&actor)).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, format!("{name}_{id}"));
    }
}

#[test]
fn test_articulation_and_actor_with_same_name_differ() {
    let robot = arm("thing", 3, 2);
    let actor = sphere_actor("thing", 5, Vec3::ZERO, 0.1);

    let robot_name = unique_name(EntityRef::from(&robot)).unwrap();
    let actor_name = unique_name(EntityRef::from(&actor)).unwrap();
    assert_eq!(robot_name, "thing_3", "Articulations use the root link id");
    assert_ne!(robot_name, actor_name);
}

#[test]
fn test_name_refs_resolve() {
    let robot = arm("panda", 1, 3);
    let link = &robot.links[2];

    assert_eq!(NameRef::from("cube_4").object_name().unwrap(), "cube_4");
    assert_eq!(NameRef::from(&robot).object_name().unwrap(), "panda_1");
    assert_eq!(NameRef::from(link).collision_name().unwrap(), "link_2");

    let err = NameRef::from(link).object_name().unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedType { .. }), "got {err}");
}
