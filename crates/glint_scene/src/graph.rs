//! Scene tree storage and structural mutation.
//!
//! Nodes live in a generational slotmap; the tree shape is parent pointers
//! plus ordered child lists on group nodes. Structural edits validate
//! before mutating, so a rejected edit leaves the tree untouched.

use crate::error::{Result, SceneError};
use crate::node::{NodeKind, SceneNode};
use glint_core::{OwnerId, PropertyStore};
use slotmap::{new_key_type, Key, SlotMap};

new_key_type! {
    /// Unique identifier for a scene node
    pub struct NodeId;
}

/// Owner tag under which a node's property cells are registered.
pub fn owner_of(node: NodeId) -> OwnerId {
    OwnerId(node.data().as_ffi())
}

#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        store: &mut PropertyStore,
        build: fn(&mut PropertyStore, OwnerId) -> SceneNode,
    ) -> NodeId {
        self.nodes.insert_with_key(|key| build(store, owner_of(key)))
    }

    pub fn get(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Child list of a group, in paint order.
    pub fn children(&self, group: NodeId) -> Result<&[NodeId]> {
        let node = self.nodes.get(group).ok_or(SceneError::DeadNode(group))?;
        match &node.kind {
            NodeKind::Group { children, .. } => Ok(children),
            _ => Err(SceneError::NotAGroup(group)),
        }
    }

    /// Whether `candidate` is `node` itself or one of its ancestors.
    fn is_self_or_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Shared validation for attaching `node` under `group`.
    fn check_attach(&self, group: NodeId, node: NodeId) -> Result<()> {
        if !self.contains(node) {
            return Err(SceneError::DeadNode(node));
        }
        let group_node = self.nodes.get(group).ok_or(SceneError::DeadNode(group))?;
        if !group_node.kind.is_group() {
            return Err(SceneError::NotAGroup(group));
        }
        if self.is_self_or_ancestor(node, group) {
            return Err(SceneError::CyclicParent { group, node });
        }
        if self.parent(node) == Some(group) {
            return Err(SceneError::DuplicateChild(node));
        }
        Ok(())
    }

    /// Remove `node` from whatever parent currently holds it.
    fn detach(&mut self, node: NodeId) {
        let old_parent = match self.nodes.get(node) {
            Some(n) => n.parent,
            None => return,
        };
        if let Some(parent) = old_parent {
            if let Some(NodeKind::Group { children, .. }) =
                self.nodes.get_mut(parent).map(|n| &mut n.kind)
            {
                children.retain(|c| *c != node);
            }
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = None;
        }
    }

    fn attach_at(&mut self, group: NodeId, node: NodeId, index: Option<usize>) {
        if let Some(NodeKind::Group { children, .. }) =
            self.nodes.get_mut(group).map(|n| &mut n.kind)
        {
            match index {
                Some(i) => children.insert(i, node),
                None => children.push(node),
            }
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = Some(group);
        }
    }

    /// Append `node` as the last child of `group`.
    ///
    /// A node parented elsewhere is reparented: it is removed from its old
    /// parent first. Re-adding a node to its current parent is rejected as
    /// `DuplicateChild`.
    pub fn add(&mut self, group: NodeId, node: NodeId) -> Result<()> {
        self.check_attach(group, node)?;
        self.detach(node);
        self.attach_at(group, node, None);
        Ok(())
    }

    /// Insert `node` immediately before `sibling` in `group`'s child list.
    pub fn insert_before(&mut self, group: NodeId, node: NodeId, sibling: NodeId) -> Result<()> {
        let index = self.sibling_index(group, node, sibling)?;
        self.detach(node);
        self.attach_at(group, node, Some(index));
        Ok(())
    }

    /// Insert `node` immediately after `sibling` in `group`'s child list.
    pub fn insert_after(&mut self, group: NodeId, node: NodeId, sibling: NodeId) -> Result<()> {
        let index = self.sibling_index(group, node, sibling)?;
        self.detach(node);
        self.attach_at(group, node, Some(index + 1));
        Ok(())
    }

    fn sibling_index(&self, group: NodeId, node: NodeId, sibling: NodeId) -> Result<usize> {
        self.check_attach(group, node)?;
        self.children(group)?
            .iter()
            .position(|c| *c == sibling)
            .ok_or(SceneError::SiblingNotFound(sibling))
    }

    /// Detach `node` from `group`. A node that is not a child is a no-op.
    pub fn remove(&mut self, group: NodeId, node: NodeId) -> Result<()> {
        let group_node = self.nodes.get(group).ok_or(SceneError::DeadNode(group))?;
        if !group_node.kind.is_group() {
            return Err(SceneError::NotAGroup(group));
        }
        if self.parent(node) == Some(group) {
            self.detach(node);
        }
        Ok(())
    }

    /// Detach all children of `group`. The children stay alive and remain
    /// externally addressable.
    pub fn clear(&mut self, group: NodeId) -> Result<()> {
        let node = self.nodes.get_mut(group).ok_or(SceneError::DeadNode(group))?;
        let detached = match &mut node.kind {
            NodeKind::Group { children, .. } => std::mem::take(children),
            _ => return Err(SceneError::NotAGroup(group)),
        };
        for child in detached {
            if let Some(n) = self.nodes.get_mut(child) {
                n.parent = None;
            }
        }
        Ok(())
    }

    /// Destroy `node` and its entire subtree, removing every property cell
    /// the nodes own. Bindings and animations that still reference those
    /// cells become inert.
    pub fn destroy(&mut self, store: &mut PropertyStore, node: NodeId) -> Result<()> {
        if !self.contains(node) {
            return Err(SceneError::DeadNode(node));
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.nodes.remove(current) {
                if let NodeKind::Group { children, .. } = removed.kind {
                    stack.extend(children);
                }
                store.remove_owner(owner_of(current));
            }
        }
        Ok(())
    }
}
