use stagecraft_common::NodeId;
use stagecraft_kernel::{NodeKind, SchedulerState, World};

/// World inspector for developer tooling.
///
/// Read-only queries against a running world for debugging and CLI output.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        let loops = world.loops();
        let names = loops.names();
        WorldSummary {
            state: world.state(),
            frames: world.frames(),
            nodes: world.scene().graph().len(),
            children: world.children().len(),
            loops: names.len(),
            enabled_loops: names.iter().filter(|n| loops.is_enabled(n)).count(),
            warnings: world.warnings().len(),
            simulate: world.is_simulating(),
            render: world.is_rendering(),
        }
    }

    /// Describe a single scene node.
    pub fn inspect_node(world: &World, id: NodeId) -> Option<NodeInfo> {
        world.scene().graph().get(id).map(|node| {
            let t = &node.transform;
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: kind_label(&node.kind),
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
            }
        })
    }

    /// Every node id in scene order.
    pub fn list_nodes(world: &World) -> Vec<NodeId> {
        world.scene().graph().iter().map(|n| n.id).collect()
    }
}

fn kind_label(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Mesh => "mesh",
        NodeKind::Camera => "camera",
        NodeKind::Morph => "morph",
        NodeKind::AxisHelper { .. } => "axis",
        NodeKind::GridHelper { .. } => "grid",
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSummary {
    pub state: SchedulerState,
    pub frames: u64,
    pub nodes: usize,
    pub children: usize,
    pub loops: usize,
    pub enabled_loops: usize,
    pub warnings: usize,
    pub simulate: bool,
    pub render: bool,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: state={:?} frames={} nodes={} children={} loops={}/{} warnings={} simulate={} render={}",
            self.state,
            self.frames,
            self.nodes,
            self.children,
            self.enabled_loops,
            self.loops,
            self.warnings,
            self.simulate,
            self.render
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] {} \"{}\" pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.id.short(),
            self.kind,
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}
