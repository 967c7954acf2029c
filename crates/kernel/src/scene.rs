use glam::Vec3;
use stagecraft_common::{BoxError, NodeId, Transform};
use stagecraft_config::PhysicsConfig;
use std::collections::BTreeMap;
use std::fmt;

/// Physics engine driving a [`Scene`].
///
/// The backend owns body state (velocities, contacts); node transforms live in
/// the [`SceneGraph`] and are written back on every [`PhysicsScene::simulate`].
pub trait PhysicsScene {
    /// Apply solver and material tuning. Called once during scene init.
    fn configure(&mut self, _config: &PhysicsConfig) {}

    fn set_gravity(&mut self, gravity: Vec3);

    fn gravity(&self) -> Vec3;

    /// Advance the simulation by one step.
    fn simulate(&mut self, graph: &mut SceneGraph) -> Result<(), BoxError>;
}

/// Animation mixer attached to a morph node.
pub trait AnimationMixer {
    /// Advance all running clips by `delta` seconds.
    fn update(&mut self, delta: f64);
}

/// What a scene node represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Mesh,
    /// Marker for an attached camera.
    Camera,
    AxisHelper { size: f32 },
    GridHelper { size: f32, step: f32 },
    /// Animated node whose mixer advances every tick.
    Morph,
}

/// A node in the scene graph.
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    mixer: Option<Box<dyn AnimationMixer>>,
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("transform", &self.transform)
            .field("has_mixer", &self.mixer.is_some())
            .finish()
    }
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, transform: Transform) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            kind,
            transform,
            mixer: None,
        }
    }

    pub fn mesh(name: impl Into<String>, transform: Transform) -> Self {
        Self::new(name, NodeKind::Mesh, transform)
    }

    pub fn morph(
        name: impl Into<String>,
        transform: Transform,
        mixer: Box<dyn AnimationMixer>,
    ) -> Self {
        Self {
            mixer: Some(mixer),
            ..Self::new(name, NodeKind::Morph, transform)
        }
    }

    pub fn axis_helper(size: f32) -> Self {
        Self::new("axis_helper", NodeKind::AxisHelper { size }, Transform::default())
    }

    pub fn grid_helper(size: f32, step: f32) -> Self {
        Self::new(
            "grid_helper",
            NodeKind::GridHelper { size, step },
            Transform::default(),
        )
    }

    pub fn camera_marker(position: Vec3) -> Self {
        Self::new("camera", NodeKind::Camera, Transform::from_position(position))
    }

    pub fn is_morph(&self) -> bool {
        self.kind == NodeKind::Morph
    }

    /// Advance this node's animation mixer, if it has one.
    pub fn advance_animation(&mut self, delta: f64) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.update(delta);
        }
    }
}

/// Insertion-ordered node storage.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    order: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn count_kind(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.iter().filter(|n| pred(&n.kind)).count()
    }
}

/// The physics-capable root container of all visual and simulated nodes.
pub struct Scene {
    graph: SceneGraph,
    physics: Option<Box<dyn PhysicsScene>>,
    gravity: Vec3,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.graph.len())
            .field("has_physics", &self.physics.is_some())
            .field("gravity", &self.gravity)
            .finish()
    }
}

impl Scene {
    pub fn new(physics: Option<Box<dyn PhysicsScene>>) -> Self {
        let gravity = physics.as_ref().map(|p| p.gravity()).unwrap_or(Vec3::ZERO);
        Self {
            graph: SceneGraph::new(),
            physics,
            gravity,
        }
    }

    /// A scene without a physics backend.
    pub fn empty() -> Self {
        Self::new(None)
    }

    pub fn has_physics(&self) -> bool {
        self.physics.is_some()
    }

    pub fn physics(&self) -> Option<&dyn PhysicsScene> {
        self.physics.as_deref()
    }

    pub fn physics_mut(&mut self) -> Option<&mut (dyn PhysicsScene + 'static)> {
        self.physics.as_deref_mut()
    }

    pub(crate) fn configure_physics(&mut self, config: &PhysicsConfig) {
        if let Some(physics) = self.physics.as_mut() {
            physics.configure(config);
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        if let Some(physics) = self.physics.as_mut() {
            physics.set_gravity(gravity);
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Step the physics backend once. A scene without physics does nothing.
    pub fn simulate(&mut self) -> Result<(), BoxError> {
        match self.physics.as_mut() {
            Some(physics) => physics.simulate(&mut self.graph),
            None => Ok(()),
        }
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.graph.add(node)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }
}
