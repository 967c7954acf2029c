use std::collections::BTreeMap;
use std::fmt;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use stagecraft_common::{BoxError, NodeId};
use stagecraft_config::PhysicsConfig;
use stagecraft_kernel::{PhysicsScene, SceneGraph};

/// Fixed timestep for one `simulate` call (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// Description of a rigid body attached to a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub dynamic: bool,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl BodyDesc {
    pub fn ball(radius: f32) -> Self {
        Self {
            shape: BodyShape::Ball { radius },
            dynamic: true,
            density: 1.0,
            restitution: 0.3,
            friction: 0.5,
        }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self {
            shape: BodyShape::Cuboid { half_extents },
            ..Self::ball(0.0)
        }
    }

    pub fn fixed(mut self) -> Self {
        self.dynamic = false;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

/// Rapier-backed physics scene. Bodies are keyed by the scene node they drive;
/// each step writes body poses back into the node transforms.
pub struct RapierScene {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vec3,
    bodies: BTreeMap<NodeId, RigidBodyHandle>,
    config: Option<PhysicsConfig>,
    steps: u64,
}

impl Default for RapierScene {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RapierScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierScene")
            .field("steps", &self.steps)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.collider_set.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl RapierScene {
    pub fn new() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            ..Default::default()
        };
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vec3::ZERO,
            bodies: BTreeMap::new(),
            config: None,
            steps: 0,
        }
    }

    /// Add a fixed ground slab whose top face lies at `height`.
    pub fn add_ground(&mut self, height: f32) -> ColliderHandle {
        let ground = ColliderBuilder::cuboid(500.0, 0.5, 500.0)
            .translation(Vector::new(0.0, height - 0.5, 0.0))
            .friction(0.8)
            .build();
        self.collider_set.insert(ground)
    }

    /// Attach a rigid body to `node`, starting at `position`.
    /// Replaces any body previously attached to the same node.
    pub fn attach(&mut self, node: NodeId, position: Vec3, desc: BodyDesc) {
        self.detach(node);
        let builder = if desc.dynamic {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = match desc.shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
        .density(desc.density)
        .restitution(desc.restitution)
        .friction(desc.friction)
        .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.bodies.insert(node, handle);
        tracing::debug!(node = %node.short(), shape = ?desc.shape, "body attached");
    }

    /// Remove the body driving `node`. Returns whether one existed.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(handle) = self.bodies.remove(&node) else {
            return false;
        };
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of completed simulation steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Tuning applied by the last `configure` call.
    pub fn config(&self) -> Option<&PhysicsConfig> {
        self.config.as_ref()
    }

    /// Solver iterations used per step.
    pub fn solver_iterations(&self) -> usize {
        self.integration_parameters.num_solver_iterations
    }

    pub fn linear_velocity(&self, node: NodeId) -> Option<Vec3> {
        let body = self.rigid_body_set.get(*self.bodies.get(&node)?)?;
        let v = body.linvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    fn write_back(&self, graph: &mut SceneGraph) {
        for (node, handle) in &self.bodies {
            let (Some(body), Some(target)) =
                (self.rigid_body_set.get(*handle), graph.get_mut(*node))
            else {
                continue;
            };
            let t = body.translation();
            let r = body.rotation();
            target.transform.position = Vec3::new(t.x, t.y, t.z);
            target.transform.rotation = Quat::from_xyzw(r.x, r.y, r.z, r.w);
        }
    }
}

impl PhysicsScene for RapierScene {
    fn configure(&mut self, config: &PhysicsConfig) {
        tracing::debug!(
            iterations = config.solver.iterations,
            tolerance = config.solver.tolerance,
            quat_normalize_skip = config.quat_normalize_skip,
            "physics configured"
        );
        self.integration_parameters.num_solver_iterations = (config.solver.iterations as usize).max(1);
        self.config = Some(*config);
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn simulate(&mut self, graph: &mut SceneGraph) -> Result<(), BoxError> {
        let gravity = Vector::new(self.gravity.x, self.gravity.y, self.gravity.z);
        self.physics_pipeline.step(
            gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.steps += 1;
        self.write_back(graph);
        tracing::trace!(step = self.steps, bodies = self.bodies.len(), "physics step");
        Ok(())
    }
}
