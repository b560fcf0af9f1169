//! Attaching objects to links of planned articulations.
//!
//! An attached object keeps its entry in the world; the attachment records the
//! link it rides on, its pose in that link's frame and the links allowed to
//! touch it. Touch links are entered in the ACM as allowed pairs and removed
//! again on detach.

use crate::collision::{AllowedCollisionMatrix, CollisionShape, CollisionTarget, FclObject};
use crate::error::{BridgeError, Result};
use crate::geometry::{BvhModel, CollisionGeometry};
use crate::identity::{LinkRef, NameRef};
use crate::mesh_file::load_stl;
use crate::pose::Pose;
use crate::world::{AttachedBody, PlanningWorld};
use glam::Vec3;
use std::path::Path;
use std::sync::Arc;

/// Where an attached object sits relative to its link.
#[derive(Clone, Debug, PartialEq)]
pub enum AttachPose {
    /// Keep the object where it is now.
    Current,
    /// Use the given link-to-object pose.
    Given(Pose),
    /// Replace the object's shapes with `geometry` and place it at `pose`.
    WithGeometry {
        geometry: Arc<CollisionGeometry>,
        pose: Pose,
    },
}

/// Which links may touch an attached object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TouchLinks {
    /// The links currently colliding with the object.
    Discover,
    /// Exactly these link names.
    Given(Vec<String>),
    /// Keep the set of an already-attached object and leave the ACM as is.
    /// A fresh attachment discovers its touch links instead.
    #[default]
    PreserveExisting,
}

impl PlanningWorld {
    /// Attaches object `name` to link `link_id` of the planned articulation
    /// `articulation`.
    pub fn attach_object(
        &mut self,
        name: &str,
        articulation: &str,
        link_id: usize,
        pose: AttachPose,
        touch_links: TouchLinks,
    ) -> Result<()> {
        // 1. The target link must exist on a planned articulation.
        let model = self
            .articulations
            .get(articulation)
            .filter(|model| model.is_planned())
            .ok_or_else(|| BridgeError::not_found("planned articulation", articulation))?;
        let link_pose = model.link_pose(link_id)?;

        // 2. Relative pose, replacing the geometry if asked to.
        let relative = match pose {
            AttachPose::Current => {
                let object = self
                    .objects
                    .get(name)
                    .ok_or_else(|| BridgeError::not_found("object", name))?;
                link_pose.inverse() * object.pose
            }
            AttachPose::Given(pose) => {
                if !self.objects.contains_key(name) {
                    return Err(BridgeError::not_found("object", name));
                }
                pose
            }
            AttachPose::WithGeometry { geometry, pose } => {
                let shape = CollisionShape::new(geometry, Pose::IDENTITY);
                self.add_object(FclObject::new(name, Pose::IDENTITY, vec![shape]));
                pose
            }
        };

        // 3. Bind the object and move it onto the link.
        let previous = self.attached.insert(
            name.to_owned(),
            AttachedBody {
                name: name.to_owned(),
                articulation: articulation.to_owned(),
                link_id,
                pose: relative,
                touch_links: Vec::new(),
            },
        );
        self.update_attached_pose(name)?;

        // 4. Touch links. A replaced set gives up its ACM allowances.
        let touch_links = match (touch_links, previous) {
            (TouchLinks::PreserveExisting, Some(previous)) => previous.touch_links,
            (policy, previous) => {
                if let Some(previous) = previous {
                    self.acm.remove_entries(name, &previous.touch_links);
                }
                let links = match policy {
                    TouchLinks::Given(links) => links,
                    TouchLinks::Discover | TouchLinks::PreserveExisting => {
                        self.touching_links(name, articulation)?
                    }
                };
                self.acm.set_entries(name, &links, true);
                links
            }
        };

        tracing::debug!(
            object = name,
            articulation,
            link_id,
            touch_links = ?touch_links,
            "attached object"
        );
        if let Some(body) = self.attached.get_mut(name) {
            body.touch_links = touch_links;
        }
        Ok(())
    }

    /// [`attach_object`](Self::attach_object) with entities in place of names.
    pub fn attach_entity<'a, 'b, 'c>(
        &mut self,
        object: impl Into<NameRef<'a>>,
        articulation: impl Into<NameRef<'b>>,
        link: impl Into<LinkRef<'c>>,
        pose: AttachPose,
        touch_links: TouchLinks,
    ) -> Result<()> {
        let object = object.into().object_name()?;
        let articulation = articulation.into().object_name()?;
        let link_id = self.resolve_link(&articulation, link.into())?;
        self.attach_object(&object, &articulation, link_id, pose, touch_links)
    }

    /// Detaches an object, dropping the ACM allowances of its touch links.
    ///
    /// With `also_remove`, the object and every ACM entry naming it are removed
    /// as well. Returns `false` if the object was not attached.
    pub fn detach_object(&mut self, name: &str, also_remove: bool) -> bool {
        let body = self.attached.remove(name);
        if also_remove {
            self.objects.remove(name);
            self.acm.remove_name(name);
        }
        let Some(body) = body else {
            return false;
        };
        self.acm.remove_entries(name, &body.touch_links);
        tracing::debug!(object = name, also_remove, "detached object");
        true
    }

    pub fn detach_entity<'a>(
        &mut self,
        object: impl Into<NameRef<'a>>,
        also_remove: bool,
    ) -> Result<bool> {
        let name = object.into().object_name()?;
        Ok(self.detach_object(&name, also_remove))
    }

    /// Attaches a sphere named `"{articulation}_{link_id}_sphere"`.
    pub fn attach_sphere<'a, 'b>(
        &mut self,
        radius: f32,
        articulation: impl Into<NameRef<'a>>,
        link: impl Into<LinkRef<'b>>,
        pose: Pose,
    ) -> Result<()> {
        self.attach_primitive(
            "sphere",
            CollisionGeometry::Sphere { radius },
            articulation,
            link,
            pose,
        )
    }

    /// Attaches a box with full side lengths `size`, named
    /// `"{articulation}_{link_id}_box"`.
    pub fn attach_box<'a, 'b>(
        &mut self,
        size: Vec3,
        articulation: impl Into<NameRef<'a>>,
        link: impl Into<LinkRef<'b>>,
        pose: Pose,
    ) -> Result<()> {
        self.attach_primitive(
            "box",
            CollisionGeometry::Box { side: size },
            articulation,
            link,
            pose,
        )
    }

    /// Attaches the mesh stored at `path` (STL), named
    /// `"{articulation}_{link_id}_mesh"`.
    ///
    /// With `convex`, the mesh is used as a convex hull; otherwise it becomes a
    /// BVH triangle mesh.
    pub fn attach_mesh<'a, 'b>(
        &mut self,
        path: impl AsRef<Path>,
        articulation: impl Into<NameRef<'a>>,
        link: impl Into<LinkRef<'b>>,
        pose: Pose,
        convex: bool,
    ) -> Result<()> {
        let mesh = load_stl(path)?;
        let geometry = if convex {
            CollisionGeometry::Convex {
                vertices: mesh.vertices,
                faces: mesh.triangles,
            }
        } else {
            let mut model = BvhModel::new();
            model.begin_model()?;
            model.add_sub_model(&mesh.vertices, &mesh.triangles)?;
            model.end_model()?;
            CollisionGeometry::bvh(model)?
        };
        self.attach_primitive("mesh", geometry, articulation, link, pose)
    }

    fn attach_primitive<'a, 'b>(
        &mut self,
        suffix: &str,
        geometry: CollisionGeometry,
        articulation: impl Into<NameRef<'a>>,
        link: impl Into<LinkRef<'b>>,
        pose: Pose,
    ) -> Result<()> {
        let articulation = articulation.into().object_name()?;
        let link_id = self.resolve_link(&articulation, link.into())?;
        let name = format!("{articulation}_{link_id}_{suffix}");
        self.attach_object(
            &name,
            &articulation,
            link_id,
            AttachPose::WithGeometry {
                geometry: Arc::new(geometry),
                pose,
            },
            TouchLinks::PreserveExisting,
        )
    }

    /// Chain index of a link given by index or by simulation link.
    fn resolve_link(&self, articulation: &str, link: LinkRef<'_>) -> Result<usize> {
        match link {
            LinkRef::Index(index) => Ok(index),
            LinkRef::Link(link) => self
                .articulations
                .get(articulation)
                .ok_or_else(|| BridgeError::not_found("articulation", articulation))?
                .link_index(&link.name)
                .ok_or_else(|| BridgeError::not_found("link", &link.name)),
        }
    }

    /// Links of `articulation` currently colliding with object `name`,
    /// ignoring every ACM entry.
    fn touching_links(&self, name: &str, articulation: &str) -> Result<Vec<String>> {
        let object = self
            .objects
            .get(name)
            .ok_or_else(|| BridgeError::not_found("object", name))?;
        let model = self
            .articulations
            .get(articulation)
            .ok_or_else(|| BridgeError::not_found("articulation", articulation))?;

        let mut links: Vec<String> = Vec::new();
        let collisions = model.fcl_model().check_collision_with(
            self.narrow_phase(),
            CollisionTarget::Object(object),
            &AllowedCollisionMatrix::new(),
        );
        for collision in collisions {
            if !links.contains(&collision.link_name1) {
                links.push(collision.link_name1);
            }
        }
        Ok(links)
    }
}
