//! Scene layers and the renderer/allocator/scene-graph seam (SPEC_FULL.md
//! §4.5, §6, §10.6).
//!
//! The teacher inlines scene-tree calls ad hoc across `aigi_udev/src/render.rs`
//! and `backend.rs`, directly against a `GlesRenderer`. Those are dropped
//! (see `DESIGN.md`); what's kept is the shape of the operations it performs
//! on scene nodes, lifted here into the `SceneBackend` trait so core layout
//! and container code never binds a GPU context.

use smithay::utils::{Logical, Point};

use crate::ids::ContainerId;

/// Fixed back-to-front stack a container or layer-shell surface is placed
/// into (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SceneLayer {
    Background,
    Bottom,
    Below,
    Toplevel,
    Above,
    Top,
    Overlay,
    SessionLock,
}

impl SceneLayer {
    pub const ORDER: [SceneLayer; 8] = [
        SceneLayer::Background,
        SceneLayer::Bottom,
        SceneLayer::Below,
        SceneLayer::Toplevel,
        SceneLayer::Above,
        SceneLayer::Top,
        SceneLayer::Overlay,
        SceneLayer::SessionLock,
    ];
}

/// An opaque handle to a node in the external scene graph. The core never
/// looks inside it; it only ever hands nodes back to the `SceneBackend` that
/// created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneNodeId(pub u64);

/// The renderer + allocator + scene graph collaborator (§6). A real backend
/// wraps `smithay::backend::renderer`/`smithay::desktop`; this crate never
/// binds a GPU context itself, so core logic is written against this trait
/// and tested against [`NullSceneBackend`].
pub trait SceneBackend {
    fn create_node(&mut self, layer: SceneLayer, owner: ContainerId) -> SceneNodeId;
    fn reparent(&mut self, node: SceneNodeId, layer: SceneLayer);
    fn set_position(&mut self, node: SceneNodeId, position: Point<i32, Logical>);
    fn set_enabled(&mut self, node: SceneNodeId, enabled: bool);
    fn raise_to_top(&mut self, node: SceneNodeId);
    fn lower_to_bottom(&mut self, node: SceneNodeId);
    /// Opacity multiplier applied during repaint; children inherit the
    /// product of every ancestor's multiplier (§6).
    fn set_opacity(&mut self, node: SceneNodeId, opacity: f32);
    fn destroy_node(&mut self, node: SceneNodeId);
    /// Returns the topmost enabled node whose rectangle contains `point`,
    /// if any (§6 "at-point").
    fn node_at(&self, point: Point<i32, Logical>) -> Option<SceneNodeId>;
}

/// A `SceneBackend` that does nothing but bookkeep node identities and
/// positions, for testing core logic without a GPU context (§10.7).
#[derive(Default)]
pub struct NullSceneBackend {
    next_id: u64,
    nodes: std::collections::HashMap<u64, NullNode>,
}

struct NullNode {
    layer: SceneLayer,
    owner: ContainerId,
    position: Point<i32, Logical>,
    enabled: bool,
    opacity: f32,
}

impl NullSceneBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position_of(&self, node: SceneNodeId) -> Option<Point<i32, Logical>> {
        self.nodes.get(&node.0).map(|n| n.position)
    }

    pub fn is_enabled(&self, node: SceneNodeId) -> Option<bool> {
        self.nodes.get(&node.0).map(|n| n.enabled)
    }

    pub fn layer_of(&self, node: SceneNodeId) -> Option<SceneLayer> {
        self.nodes.get(&node.0).map(|n| n.layer)
    }
}

impl SceneBackend for NullSceneBackend {
    fn create_node(&mut self, layer: SceneLayer, owner: ContainerId) -> SceneNodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            NullNode {
                layer,
                owner,
                position: (0, 0).into(),
                enabled: true,
                opacity: 1.0,
            },
        );
        SceneNodeId(id)
    }

    fn reparent(&mut self, node: SceneNodeId, layer: SceneLayer) {
        if let Some(n) = self.nodes.get_mut(&node.0) {
            n.layer = layer;
        }
    }

    fn set_position(&mut self, node: SceneNodeId, position: Point<i32, Logical>) {
        if let Some(n) = self.nodes.get_mut(&node.0) {
            n.position = position;
        }
    }

    fn set_enabled(&mut self, node: SceneNodeId, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&node.0) {
            n.enabled = enabled;
        }
    }

    fn raise_to_top(&mut self, _node: SceneNodeId) {}

    fn lower_to_bottom(&mut self, _node: SceneNodeId) {}

    fn set_opacity(&mut self, node: SceneNodeId, opacity: f32) {
        if let Some(n) = self.nodes.get_mut(&node.0) {
            n.opacity = opacity;
        }
    }

    fn destroy_node(&mut self, node: SceneNodeId) {
        self.nodes.remove(&node.0);
    }

    fn node_at(&self, point: Point<i32, Logical>) -> Option<SceneNodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.enabled && n.position == point)
            .map(|(id, _)| SceneNodeId(*id))
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn container_id() -> ContainerId {
        let mut map: SlotMap<ContainerId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn layer_order_is_back_to_front() {
        assert!(SceneLayer::Background < SceneLayer::Toplevel);
        assert!(SceneLayer::Toplevel < SceneLayer::Overlay);
        assert!(SceneLayer::Overlay < SceneLayer::SessionLock);
    }

    #[test]
    fn null_backend_tracks_position_and_enabled() {
        let mut backend = NullSceneBackend::new();
        let owner = container_id();
        let node = backend.create_node(SceneLayer::Toplevel, owner);
        backend.set_position(node, (10, 20).into());
        backend.set_enabled(node, false);
        assert_eq!(backend.position_of(node), Some((10, 20).into()));
        assert_eq!(backend.is_enabled(node), Some(false));
    }

    #[test]
    fn destroyed_node_is_gone() {
        let mut backend = NullSceneBackend::new();
        let owner = container_id();
        let node = backend.create_node(SceneLayer::Background, owner);
        backend.destroy_node(node);
        assert_eq!(backend.position_of(node), None);
    }
}
