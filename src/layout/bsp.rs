//! Binary space partition tree (SPEC_FULL.md §4.3.3).
//!
//! Ported directly from `aigi/src/tiling.rs`'s `TilingState`/`Node::{Structure,
//! Tile}` — the closest single file in the whole retrieval pack to a spec
//! module. The teacher's `Rc<RefCell<_>>` intrusive tree becomes a `slotmap`
//! arena addressed by `NodeId` (REDESIGN FLAGS §9/§11); the enable/disable
//! cascade and `toggle_split` the teacher never implemented are added here.
//!
//! Naming note: the teacher's `Split::Horizontal` divides *width* (producing
//! a vertical dividing line) and `Split::Vertical` divides *height*. This
//! module uses the spec's (and the more common GUI) convention instead —
//! `SplitKind::Vertical` divides width, `SplitKind::Horizontal` divides
//! height — because SPEC_FULL.md §8's seed scenario 2 is expressed in those
//! terms. The split arithmetic itself (halve the dominant axis, offset the
//! second half) is unchanged from the teacher.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};
use smithay::utils::{Logical, Rectangle};

use crate::error::BspError;
use crate::ids::ContainerId;

new_key_type! {
    struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    /// Divides width; children sit side by side.
    Vertical,
    /// Divides height; children stack top/bottom.
    Horizontal,
}

impl SplitKind {
    fn flipped(self) -> SplitKind {
        match self {
            SplitKind::Vertical => SplitKind::Horizontal,
            SplitKind::Horizontal => SplitKind::Vertical,
        }
    }

    /// The natural split for a rectangle being bisected for the first time:
    /// wide rectangles split side by side, tall ones split top/bottom
    /// (SPEC_FULL.md §4.3.3 `Insert`).
    fn natural_for(rect: Rectangle<i32, Logical>) -> SplitKind {
        if rect.size.w >= rect.size.h {
            SplitKind::Vertical
        } else {
            SplitKind::Horizontal
        }
    }
}

#[derive(Debug, Clone)]
struct Internal {
    rect: Rectangle<i32, Logical>,
    split: SplitKind,
    left_wfact: f64,
    enabled: bool,
    left: NodeId,
    right: NodeId,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Leaf {
    rect: Rectangle<i32, Logical>,
    container: ContainerId,
    enabled: bool,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
enum Node {
    Internal(Internal),
    Leaf(Leaf),
}

/// Which side of its parent a child occupies. Used only while re-parenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A per-workspace binary space partition of an output rectangle.
#[derive(Debug, Clone)]
pub struct BspTree {
    nodes: SlotMap<NodeId, Node>,
    root: Option<NodeId>,
    /// The container chosen as the sibling for the next `insert` — "the
    /// sibling chosen on next insertion" (SPEC_FULL.md §4.3.3).
    last_focused: Option<ContainerId>,
    leaf_of: HashMap<ContainerId, NodeId>,
}

impl Default for BspTree {
    fn default() -> Self {
        Self {
            nodes: SlotMap::default(),
            root: None,
            last_focused: None,
            leaf_of: HashMap::new(),
        }
    }
}

impl BspTree {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, container: ContainerId) -> bool {
        self.leaf_of.contains_key(&container)
    }

    pub fn set_last_focused(&mut self, container: ContainerId) {
        if self.leaf_of.contains_key(&container) {
            self.last_focused = Some(container);
        }
    }

    pub fn leaf_rect(&self, container: ContainerId) -> Option<Rectangle<i32, Logical>> {
        self.leaf_of.get(&container).map(|id| self.node_rect(*id))
    }

    /// Inserts `container` into the tree. If the tree is empty, `area`
    /// becomes its root rectangle; otherwise `area` is ignored and the
    /// new leaf is sized by bisecting `last_focused`'s rectangle.
    pub fn insert(
        &mut self,
        container: ContainerId,
        area: Rectangle<i32, Logical>,
    ) -> Result<(), BspError> {
        let Some(_root) = self.root else {
            let leaf = self.nodes.insert(Node::Leaf(Leaf {
                rect: area,
                container,
                enabled: true,
                parent: None,
            }));
            self.root = Some(leaf);
            self.last_focused = Some(container);
            self.leaf_of.insert(container, leaf);
            return Ok(());
        };

        let sibling_container = self.last_focused.ok_or(BspError::EmptyTree)?;
        let sibling_id = *self
            .leaf_of
            .get(&sibling_container)
            .ok_or(BspError::NotInTree)?;
        let sibling_rect = self.node_rect(sibling_id);
        let split = SplitKind::natural_for(sibling_rect);
        let sibling_parent_slot = self.parent_slot(sibling_id);

        let new_leaf = self.nodes.insert(Node::Leaf(Leaf {
            rect: sibling_rect,
            container,
            enabled: true,
            parent: None,
        }));
        let internal = self.nodes.insert(Node::Internal(Internal {
            rect: sibling_rect,
            split,
            left_wfact: 0.5,
            enabled: true,
            left: sibling_id,
            right: new_leaf,
            parent: self.node_parent(sibling_id),
        }));
        self.set_parent(sibling_id, Some(internal));
        self.set_parent(new_leaf, Some(internal));

        match sibling_parent_slot {
            Some((parent, side)) => self.replace_child(parent, side, internal),
            None => self.root = Some(internal),
        }

        self.leaf_of.insert(container, new_leaf);
        self.last_focused = Some(container);
        self.update_geometry(internal, Some(sibling_rect));
        Ok(())
    }

    /// Removes `container` from the tree. Returns the subtree root that now
    /// needs its geometry re-applied to live containers (via [`Self::for_each_leaf`]),
    /// or `None` if the tree is now empty.
    pub fn remove(&mut self, container: ContainerId) -> Result<Option<()>, BspError> {
        let leaf_id = self.leaf_of.remove(&container).ok_or(BspError::NotInTree)?;
        let parent_id = self.node_parent(leaf_id);

        let Some(parent_id) = parent_id else {
            self.nodes.remove(leaf_id);
            self.root = None;
            if self.last_focused == Some(container) {
                self.last_focused = None;
            }
            return Ok(None);
        };

        let sibling_id = self.sibling_of(parent_id, leaf_id);
        let parent_rect = self.node_rect(parent_id);
        let grandparent_slot = self.parent_slot(parent_id);
        self.set_parent(sibling_id, self.node_parent(parent_id));

        match grandparent_slot {
            Some((grandparent, side)) => self.replace_child(grandparent, side, sibling_id),
            None => self.root = Some(sibling_id),
        }

        if self.last_focused == Some(container) {
            self.last_focused = Some(self.leftmost_container(sibling_id));
        }

        self.nodes.remove(parent_id);
        self.nodes.remove(leaf_id);
        self.update_geometry(sibling_id, Some(parent_rect));
        Ok(Some(()))
    }

    /// Toggles the enabled flag on `container`'s leaf, bubbles the change
    /// up (a parent is enabled iff either child is), and re-arranges the
    /// nearest still-enabled ancestor (SPEC_FULL.md §4.3.3 `Enable/Disable`).
    pub fn set_enabled(&mut self, container: ContainerId, enabled: bool) -> Result<(), BspError> {
        let leaf_id = *self.leaf_of.get(&container).ok_or(BspError::NotInTree)?;
        self.set_node_enabled(leaf_id, enabled);
        self.bubble_enabled(leaf_id);
        if let Some(anchor) = self.nearest_enabled_ancestor(leaf_id) {
            let rect = self.node_rect(anchor);
            self.update_geometry(anchor, Some(rect));
        }
        Ok(())
    }

    /// Flips the split axis of `container`'s parent internal node and
    /// re-arranges it.
    pub fn toggle_split(&mut self, container: ContainerId) -> Result<(), BspError> {
        let leaf_id = *self.leaf_of.get(&container).ok_or(BspError::NotInTree)?;
        let parent_id = self.node_parent(leaf_id).ok_or(BspError::NoParentToSplit)?;
        match &mut self.nodes[parent_id] {
            Node::Internal(internal) => internal.split = internal.split.flipped(),
            Node::Leaf(_) => unreachable!("a leaf's parent is always Internal"),
        }
        let rect = self.node_rect(parent_id);
        self.update_geometry(parent_id, Some(rect));
        Ok(())
    }

    /// Visits every leaf in the tree, reporting its container, current
    /// rectangle, and whether it is enabled (visible). Callers apply this to
    /// live containers via `Container::set_position_gap`/`set_size`, gated on
    /// the container's own configure-allowed state.
    pub fn for_each_leaf(&self, mut f: impl FnMut(ContainerId, Rectangle<i32, Logical>, bool)) {
        if let Some(root) = self.root {
            self.walk(root, &mut f);
        }
    }

    fn walk(&self, id: NodeId, f: &mut impl FnMut(ContainerId, Rectangle<i32, Logical>, bool)) {
        match &self.nodes[id] {
            Node::Leaf(leaf) => f(leaf.container, leaf.rect, leaf.enabled),
            Node::Internal(internal) => {
                self.walk(internal.left, f);
                self.walk(internal.right, f);
            }
        }
    }

    // -- node bookkeeping helpers ------------------------------------------------

    fn node_rect(&self, id: NodeId) -> Rectangle<i32, Logical> {
        match &self.nodes[id] {
            Node::Internal(i) => i.rect,
            Node::Leaf(l) => l.rect,
        }
    }

    fn set_node_rect(&mut self, id: NodeId, rect: Rectangle<i32, Logical>) {
        match &mut self.nodes[id] {
            Node::Internal(i) => i.rect = rect,
            Node::Leaf(l) => l.rect = rect,
        }
    }

    fn node_parent(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id] {
            Node::Internal(i) => i.parent,
            Node::Leaf(l) => l.parent,
        }
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        match &mut self.nodes[id] {
            Node::Internal(i) => i.parent = parent,
            Node::Leaf(l) => l.parent = parent,
        }
    }

    fn is_enabled(&self, id: NodeId) -> bool {
        match &self.nodes[id] {
            Node::Internal(i) => i.enabled,
            Node::Leaf(l) => l.enabled,
        }
    }

    /// Sets the enabled flag, returning whether it actually changed.
    fn set_node_enabled(&mut self, id: NodeId, enabled: bool) -> bool {
        match &mut self.nodes[id] {
            Node::Internal(i) => {
                let changed = i.enabled != enabled;
                i.enabled = enabled;
                changed
            }
            Node::Leaf(l) => {
                let changed = l.enabled != enabled;
                l.enabled = enabled;
                changed
            }
        }
    }

    /// `(parent, side)` of `id`, or `None` if `id` is the root.
    fn parent_slot(&self, id: NodeId) -> Option<(NodeId, Side)> {
        let parent = self.node_parent(id)?;
        match &self.nodes[parent] {
            Node::Internal(i) if i.left == id => Some((parent, Side::Left)),
            Node::Internal(i) if i.right == id => Some((parent, Side::Right)),
            _ => unreachable!("parent pointer inconsistent with child slot"),
        }
    }

    fn replace_child(&mut self, parent: NodeId, side: Side, new_child: NodeId) {
        match &mut self.nodes[parent] {
            Node::Internal(i) => match side {
                Side::Left => i.left = new_child,
                Side::Right => i.right = new_child,
            },
            Node::Leaf(_) => unreachable!("a leaf cannot be a parent"),
        }
    }

    fn sibling_of(&self, parent: NodeId, child: NodeId) -> NodeId {
        match &self.nodes[parent] {
            Node::Internal(i) if i.left == child => i.right,
            Node::Internal(i) if i.right == child => i.left,
            _ => unreachable!("child is not a child of parent"),
        }
    }

    fn leftmost_container(&self, id: NodeId) -> ContainerId {
        match &self.nodes[id] {
            Node::Leaf(l) => l.container,
            Node::Internal(i) => self.leftmost_container(i.left),
        }
    }

    fn bubble_enabled(&mut self, start: NodeId) {
        let mut current = self.node_parent(start);
        while let Some(id) = current {
            let (left, right) = match &self.nodes[id] {
                Node::Internal(i) => (i.left, i.right),
                Node::Leaf(_) => unreachable!("walked above a leaf"),
            };
            let new_enabled = self.is_enabled(left) || self.is_enabled(right);
            let changed = self.set_node_enabled(id, new_enabled);
            current = self.node_parent(id);
            if !changed {
                break;
            }
        }
    }

    fn nearest_enabled_ancestor(&self, start: NodeId) -> Option<NodeId> {
        let mut current = Some(start);
        while let Some(id) = current {
            if self.is_enabled(id) {
                return Some(id);
            }
            current = self.node_parent(id);
        }
        None
    }

    /// Recursive rectangle assignment (SPEC_FULL.md §4.3.3 `Update`). If one
    /// child is disabled, the other inherits the full parent rect.
    fn update_geometry(&mut self, id: NodeId, new_rect: Option<Rectangle<i32, Logical>>) {
        if let Some(rect) = new_rect {
            self.set_node_rect(id, rect);
        }
        let rect = self.node_rect(id);
        let (split, left_wfact, left, right) = match &self.nodes[id] {
            Node::Leaf(_) => return,
            Node::Internal(i) => (i.split, i.left_wfact, i.left, i.right),
        };
        match (self.is_enabled(left), self.is_enabled(right)) {
            (true, true) => {
                let (left_rect, right_rect) = split_rect(rect, split, left_wfact);
                self.update_geometry(left, Some(left_rect));
                self.update_geometry(right, Some(right_rect));
            }
            (true, false) => self.update_geometry(left, Some(rect)),
            (false, true) => self.update_geometry(right, Some(rect)),
            (false, false) => {}
        }
    }
}

fn split_rect(
    rect: Rectangle<i32, Logical>,
    split: SplitKind,
    left_wfact: f64,
) -> (Rectangle<i32, Logical>, Rectangle<i32, Logical>) {
    match split {
        SplitKind::Vertical => {
            let left_w = (rect.size.w as f64 * left_wfact).floor() as i32;
            let left = Rectangle::from_loc_and_size(rect.loc, (left_w, rect.size.h));
            let right = Rectangle::from_loc_and_size(
                (rect.loc.x + left_w, rect.loc.y),
                (rect.size.w - left_w, rect.size.h),
            );
            (left, right)
        }
        SplitKind::Horizontal => {
            let left_h = (rect.size.h as f64 * left_wfact).floor() as i32;
            let left = Rectangle::from_loc_and_size(rect.loc, (rect.size.w, left_h));
            let right = Rectangle::from_loc_and_size(
                (rect.loc.x, rect.loc.y + left_h),
                (rect.size.w, rect.size.h - left_h),
            );
            (left, right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ContainerId;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ContainerId> {
        let mut map: SlotMap<ContainerId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::from_loc_and_size((x, y), (w, h))
    }

    #[test]
    fn insert_into_empty_tree_becomes_root() {
        let cs = ids(1);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 1600, 900)));
    }

    #[test]
    fn four_way_insert_matches_seed_scenario_2() {
        let cs = ids(4);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap(); // A
        tree.insert(cs[1], rect(0, 0, 0, 0)).unwrap(); // B
        tree.insert(cs[2], rect(0, 0, 0, 0)).unwrap(); // C
        tree.insert(cs[3], rect(0, 0, 0, 0)).unwrap(); // D

        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 800, 900)));
        assert_eq!(tree.leaf_rect(cs[1]), Some(rect(800, 0, 800, 450)));
        assert_eq!(tree.leaf_rect(cs[2]), Some(rect(800, 450, 400, 450)));
        assert_eq!(tree.leaf_rect(cs[3]), Some(rect(1200, 450, 400, 450)));
    }

    #[test]
    fn insert_then_remove_restores_tree_shape() {
        let cs = ids(2);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        tree.insert(cs[1], rect(0, 0, 0, 0)).unwrap();
        tree.remove(cs[1]).unwrap();
        assert!(!tree.contains(cs[1]));
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 1600, 900)));
    }

    #[test]
    fn removing_root_empties_the_tree() {
        let cs = ids(1);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        let result = tree.remove(cs[0]).unwrap();
        assert!(result.is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn disabling_a_leaf_gives_its_sibling_the_full_rect() {
        let cs = ids(2);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        tree.insert(cs[1], rect(0, 0, 0, 0)).unwrap();
        tree.set_enabled(cs[1], false).unwrap();
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 1600, 900)));
        tree.set_enabled(cs[1], true).unwrap();
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 800, 900)));
        assert_eq!(tree.leaf_rect(cs[1]), Some(rect(800, 0, 800, 900)));
    }

    #[test]
    fn toggle_split_flips_the_parent_axis() {
        let cs = ids(2);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        tree.insert(cs[1], rect(0, 0, 0, 0)).unwrap();
        // initial split was Vertical (side by side): A is the left half
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 800, 900)));
        tree.toggle_split(cs[1]).unwrap();
        // now Horizontal (top/bottom): A is the top half
        assert_eq!(tree.leaf_rect(cs[0]), Some(rect(0, 0, 1600, 450)));
        assert_eq!(tree.leaf_rect(cs[1]), Some(rect(0, 450, 1600, 450)));
    }

    #[test]
    fn for_each_leaf_visits_every_container() {
        let cs = ids(3);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 1600, 900)).unwrap();
        tree.insert(cs[1], rect(0, 0, 0, 0)).unwrap();
        tree.insert(cs[2], rect(0, 0, 0, 0)).unwrap();

        let mut seen = Vec::new();
        tree.for_each_leaf(|c, _, enabled| {
            assert!(enabled);
            seen.push(c);
        });
        seen.sort_by_key(|id| format!("{id:?}"));
        let mut expected = cs.clone();
        expected.sort_by_key(|id| format!("{id:?}"));
        assert_eq!(seen, expected);
    }

    #[test]
    fn not_in_tree_operations_error() {
        let cs = ids(2);
        let mut tree = BspTree::default();
        tree.insert(cs[0], rect(0, 0, 100, 100)).unwrap();
        assert!(matches!(tree.remove(cs[1]), Err(BspError::NotInTree)));
        assert!(matches!(
            tree.set_enabled(cs[1], false),
            Err(BspError::NotInTree)
        ));
    }
}
