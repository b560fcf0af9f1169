// tests/common/mod.rs
//! Shared test doubles: a bounding-sphere narrow phase, a serial prismatic
//! chain and a straight-line planner, plus scene builders.
#![allow(dead_code, clippy::unwrap_used)]

use glam::Vec3;
use simplan_bridge::{
    BridgeError, ChainBuilder, ChainDescription, CollisionGeometry, Contact, DescriptionExporter,
    DistanceResult, JointLimit, JointType, KinematicChain, NarrowPhase, PathPlanner,
    PlanRequest, PlanningWorld, Pose, Result, SceneSnapshot, SimActor, SimArticulation,
    SimGeometry, SimJoint, SimLink, SimShape,
};

/// Distance between links of the test arm along Z.
pub const SPACING: f32 = 0.5;
/// Radius of the sphere on every arm link.
pub const LINK_RADIUS: f32 = 0.1;

// --- Narrow phase ---

/// Treats every geometry as its bounding sphere (half-spaces stay exact).
#[derive(Clone, Copy, Debug, Default)]
pub struct SphereNarrowPhase;

pub fn bounding_radius(geometry: &CollisionGeometry) -> f32 {
    let farthest = |points: &[Vec3]| points.iter().map(|v| v.length()).fold(0.0, f32::max);
    match geometry {
        CollisionGeometry::Box { side } => side.length() * 0.5,
        CollisionGeometry::Sphere { radius } => *radius,
        CollisionGeometry::Capsule { radius, lz } => radius + lz * 0.5,
        CollisionGeometry::Cylinder { radius, lz } => (radius * radius + lz * lz * 0.25).sqrt(),
        CollisionGeometry::Convex { vertices, .. } => farthest(vertices),
        CollisionGeometry::Bvh(model) => farthest(model.vertices()),
        CollisionGeometry::Halfspace { .. } => f32::INFINITY,
    }
}

impl SphereNarrowPhase {
    fn signed_distance(
        &self,
        a: &CollisionGeometry,
        a_pose: &Pose,
        b: &CollisionGeometry,
        b_pose: &Pose,
    ) -> DistanceResult {
        match (a, b) {
            (CollisionGeometry::Halfspace { n, d }, other) => {
                let normal = a_pose.q * *n;
                let offset = d + normal.dot(a_pose.p);
                let r = bounding_radius(other);
                let dist = normal.dot(b_pose.p) - offset - r;
                DistanceResult {
                    min_distance: dist,
                    nearest_points: [b_pose.p - normal * (dist + r), b_pose.p - normal * r],
                }
            }
            (_, CollisionGeometry::Halfspace { .. }) => {
                let mut flipped = self.signed_distance(b, b_pose, a, a_pose);
                flipped.nearest_points.swap(0, 1);
                flipped
            }
            _ => {
                let (ra, rb) = (bounding_radius(a), bounding_radius(b));
                let dir = (b_pose.p - a_pose.p).normalize_or_zero();
                DistanceResult {
                    min_distance: a_pose.p.distance(b_pose.p) - ra - rb,
                    nearest_points: [a_pose.p + dir * ra, b_pose.p - dir * rb],
                }
            }
        }
    }
}

impl NarrowPhase for SphereNarrowPhase {
    fn collide(
        &self,
        a: &CollisionGeometry,
        a_pose: &Pose,
        b: &CollisionGeometry,
        b_pose: &Pose,
    ) -> Option<Contact> {
        let d = self.signed_distance(a, a_pose, b, b_pose);
        (d.min_distance < 0.0).then(|| Contact {
            position: (d.nearest_points[0] + d.nearest_points[1]) * 0.5,
            normal: (b_pose.p - a_pose.p).normalize_or_zero(),
            penetration_depth: -d.min_distance,
        })
    }

    fn distance(
        &self,
        a: &CollisionGeometry,
        a_pose: &Pose,
        b: &CollisionGeometry,
        b_pose: &Pose,
    ) -> DistanceResult {
        self.signed_distance(a, a_pose, b, b_pose)
    }
}

// --- Kinematics ---

/// Serial chain where joint `j` slides link `j + 1` along Z.
///
/// Link `i` sits at `base * (0, 0, i * SPACING + q[0] + ... + q[i - 1])`,
/// whatever the declared joint types are.
pub struct SerialChain {
    link_names: Vec<String>,
    joint_names: Vec<String>,
    joint_types: Vec<JointType>,
    joint_limits: Vec<JointLimit>,
    base: Pose,
    poses: Vec<Pose>,
}

pub fn serial_link_offset(link: usize, qpos: &[f32]) -> f32 {
    link as f32 * SPACING + qpos.iter().take(link).sum::<f32>()
}

impl KinematicChain for SerialChain {
    fn link_names(&self) -> &[String] {
        &self.link_names
    }

    fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    fn joint_types(&self) -> &[JointType] {
        &self.joint_types
    }

    fn joint_limits(&self) -> &[JointLimit] {
        &self.joint_limits
    }

    fn set_base_pose(&mut self, pose: Pose) {
        self.base = pose;
    }

    fn compute_forward_kinematics(&mut self, qpos: &[f32]) -> Result<()> {
        if qpos.len() != self.joint_names.len() {
            return Err(BridgeError::kinematics("wrong configuration size"));
        }
        for (i, pose) in self.poses.iter_mut().enumerate() {
            *pose = self.base * Pose::from_translation(Vec3::Z * serial_link_offset(i, qpos));
        }
        Ok(())
    }

    fn link_pose(&self, link_index: usize) -> Pose {
        self.poses[link_index]
    }

    fn chain_joint_indices(&self, link_index: usize) -> Vec<usize> {
        (0..link_index.min(self.joint_names.len())).collect()
    }

    fn disabled_collision_pairs(&self) -> Vec<(String, String)> {
        self.link_names
            .windows(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

/// Exporter and chain builder in one.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockBackend;

impl DescriptionExporter for MockBackend {
    fn export_chain(&self, articulation: &SimArticulation) -> Result<String> {
        Ok(format!("<robot name=\"{}\"/>", articulation.name))
    }

    fn export_semantics(&self, articulation: &SimArticulation) -> Result<String> {
        Ok(format!("<robot name=\"{}\"></robot>", articulation.name))
    }
}

impl ChainBuilder for MockBackend {
    fn build(&self, description: &ChainDescription) -> Result<Box<dyn KinematicChain>> {
        assert!(description.chain.starts_with("<robot"));
        Ok(Box::new(SerialChain {
            link_names: description.link_names.clone(),
            joint_names: description.joints.iter().map(|j| j.name.clone()).collect(),
            joint_types: description.joints.iter().map(|j| j.joint_type).collect(),
            joint_limits: description.joints.iter().map(|j| j.limits).collect(),
            base: Pose::IDENTITY,
            poses: vec![Pose::IDENTITY; description.link_names.len()],
        }))
    }
}

// --- Planner ---

/// Returns `[start, first goal]` and remembers the last request.
#[derive(Debug, Default)]
pub struct StraightLinePlanner {
    pub robots: Vec<String>,
    pub last_request: Option<PlanRequest>,
}

impl PathPlanner for StraightLinePlanner {
    fn from_world(world: &PlanningWorld) -> Result<Self> {
        Ok(Self {
            robots: world
                .planned_articulations()
                .iter()
                .map(|model| model.name().to_owned())
                .collect(),
            last_request: None,
        })
    }

    fn plan(&mut self, _world: &PlanningWorld, request: &PlanRequest) -> Result<Vec<Vec<f32>>> {
        self.last_request = Some(request.clone());
        let goal = request
            .goals
            .first()
            .ok_or_else(|| BridgeError::unsupported_config("no goal"))?;
        Ok(vec![request.start.clone(), goal.clone()])
    }
}

// --- Scene builders ---

pub fn sphere(radius: f32) -> SimShape {
    SimShape::new(SimGeometry::Sphere { radius }, Pose::IDENTITY)
}

pub fn sphere_actor(name: &str, id: u32, position: Vec3, radius: f32) -> SimActor {
    SimActor {
        name: name.into(),
        per_scene_id: id,
        pose: Pose::from_translation(position),
        collision_shapes: vec![sphere(radius)],
    }
}

/// An arm of `links` links on prismatic joints, root link id `root_id`.
pub fn arm(name: &str, root_id: u32, links: usize) -> SimArticulation {
    let joints = (0..links.saturating_sub(1))
        .map(|i| SimJoint {
            name: format!("joint_{i}"),
            joint_type: JointType::Prismatic,
            limits: JointLimit::new(-1.0, 1.0),
        })
        .collect::<Vec<_>>();
    let mut art = SimArticulation {
        name: name.into(),
        links: (0..links)
            .map(|i| SimLink {
                name: format!("link_{i}"),
                per_scene_id: root_id + i as u32,
                pose: Pose::IDENTITY,
                collision_shapes: vec![sphere(LINK_RADIUS)],
            })
            .collect(),
        qpos: vec![0.0; joints.len()],
        active_joints: joints,
        root_pose: Pose::IDENTITY,
    };
    pose_links(&mut art);
    art
}

/// Recomputes link poses from root pose and qpos, as the engine would.
pub fn pose_links(art: &mut SimArticulation) {
    let root = art.root_pose;
    let qpos = art.qpos.clone();
    for (i, link) in art.links.iter_mut().enumerate() {
        link.pose = root * Pose::from_translation(Vec3::Z * serial_link_offset(i, &qpos));
    }
}

/// A three-link arm `panda` (root id 1) and two free spheres far from it.
pub fn scene() -> SceneSnapshot {
    SceneSnapshot {
        articulations: vec![arm("panda", 1, 3)],
        actors: vec![
            sphere_actor("cube", 10, Vec3::new(2.0, 0.0, 0.0), 0.2),
            sphere_actor("ball", 11, Vec3::new(2.3, 0.0, 0.0), 0.2),
        ],
        gravity: Vec3::new(0.0, 0.0, -9.81),
    }
}

pub fn build_world(scene: &SceneSnapshot, planned: &[&SimArticulation]) -> PlanningWorld {
    PlanningWorld::from_scene(
        scene,
        &MockBackend,
        &MockBackend,
        Box::new(SphereNarrowPhase),
        planned,
    )
    .unwrap()
}

/// World built from [`scene`] with the arm planned.
pub fn setup() -> (SceneSnapshot, PlanningWorld) {
    let scene = scene();
    let world = build_world(&scene, &[&scene.articulations[0]]);
    (scene, world)
}
