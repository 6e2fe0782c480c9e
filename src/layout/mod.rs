mod error;
mod overlay;
mod packing;
pub(crate) mod types;
pub use error::LayoutError;
pub use overlay::*;
pub use packing::*;
pub use types::*;

use std::collections::HashMap;

/// A badge merged onto `center` inside `group`, anchored on `corner`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Badge {
    pub group: NodeId,
    pub center: NodeId,
    pub badge: NodeId,
    pub corner: Corner,
}

/// The run-scoped node set. Nodes are stored once and addressed by
/// [`NodeId`]; containment and arrows refer to nodes by id, never by value.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    arrows: Vec<Arrow>,
    badges: Vec<Badge>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the node `id` unless it already exists, in which case the
    /// existing node is returned untouched.
    pub fn ensure_node(
        &mut self,
        id: &str,
        label: &str,
        kind: NodeKind,
        rect: Rect,
        style: NodeStyle,
    ) -> NodeId {
        if let Some(existing) = self.index.get(id) {
            return *existing;
        }
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            rect,
            style,
            contained_in: None,
        });
        self.index.insert(id.to_string(), node_id);
        node_id
    }

    /// Creates a node whose id is derived from `base`, suffixed with a
    /// counter when `base` is already taken.
    pub fn insert_derived(
        &mut self,
        base: &str,
        label: &str,
        kind: NodeKind,
        rect: Rect,
        style: NodeStyle,
    ) -> NodeId {
        let mut id = base.to_string();
        let mut suffix = 1usize;
        while self.index.contains_key(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.ensure_node(&id, label, kind, rect, style)
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) {
        let rect = &mut self.nodes[id.0].rect;
        rect.x = x;
        rect.y = y;
    }

    /// Resizes `id`. When `id` is the center of an icon group, the group
    /// follows and its badge is re-anchored, up through nested groups.
    pub fn set_dimensions(&mut self, id: NodeId, width: f32, height: f32) {
        let rect = &mut self.nodes[id.0].rect;
        rect.width = width;
        rect.height = height;

        let mut current = id;
        while let Some(badge) = self.badge_centered_on(current) {
            let center = self.nodes[current.0].rect;
            let group = &mut self.nodes[badge.group.0].rect;
            group.width = center.width;
            group.height = center.height;
            set_icon_relative_to(self, badge.badge, badge.center, badge.corner);
            current = badge.group;
        }
    }

    pub(crate) fn record_badge(&mut self, badge: Badge) {
        self.badges.push(badge);
    }

    fn badge_centered_on(&self, center: NodeId) -> Option<Badge> {
        self.badges.iter().find(|badge| badge.center == center).copied()
    }

    /// Outermost container of `id`, or `id` itself when it is not nested.
    pub fn parent_or_this(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].contained_in {
            current = parent;
        }
        current
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].contained_in {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn set_contained_in(
        &mut self,
        id: NodeId,
        container: Option<NodeId>,
    ) -> Result<(), LayoutError> {
        if let Some(container) = container {
            let mut current = Some(container);
            while let Some(ancestor) = current {
                if ancestor == id {
                    return Err(LayoutError::ContainmentCycle {
                        node: self.nodes[id.0].id.clone(),
                        container: self.nodes[container.0].id.clone(),
                    });
                }
                current = self.nodes[ancestor.0].contained_in;
            }
        }
        self.nodes[id.0].contained_in = container;
        Ok(())
    }

    /// Direct children of `container`, in creation order.
    pub fn children(&self, container: NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.contained_in == Some(container))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.contained_in.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Rectangle of `id` in page coordinates.
    pub fn absolute_rect(&self, id: NodeId) -> Rect {
        let mut rect = self.nodes[id.0].rect;
        let mut current = self.nodes[id.0].contained_in;
        while let Some(parent) = current {
            let parent_rect = self.nodes[parent.0].rect;
            rect.x += parent_rect.x;
            rect.y += parent_rect.y;
            current = self.nodes[parent.0].contained_in;
        }
        rect
    }

    /// Adds `arrow` unless an identical one exists. Both endpoints must be
    /// nodes of this diagram.
    pub fn add_arrow(&mut self, arrow: Arrow) -> Result<bool, LayoutError> {
        for endpoint in [&arrow.from, &arrow.to] {
            if !self.index.contains_key(endpoint) {
                return Err(LayoutError::UnknownNode(endpoint.clone()));
            }
        }
        if self
            .arrows
            .iter()
            .any(|existing| existing.from == arrow.from && existing.to == arrow.to)
        {
            return Ok(false);
        }
        self.arrows.push(arrow);
        Ok(true)
    }

    /// Places every top-level node on the page with the same banded packing
    /// used for containers. Returns the page size.
    pub fn arrange_roots(&mut self, padding: f32) -> (f32, f32) {
        let roots = self.roots();
        let sizes: Vec<(f32, f32)> = roots
            .iter()
            .map(|id| (self.nodes[id.0].rect.width, self.nodes[id.0].rect.height))
            .collect();
        let packed = pack_rects(&sizes, padding);
        for (id, (x, y)) in roots.iter().zip(packed.positions.iter()) {
            self.set_position(*id, *x, *y);
        }
        (packed.width, packed.height)
    }

    /// Extent of all top-level nodes.
    pub fn bounds(&self) -> (f32, f32) {
        let mut max_x: f32 = 0.0;
        let mut max_y: f32 = 0.0;
        for (_, node) in self.nodes().filter(|(_, n)| n.contained_in.is_none()) {
            max_x = max_x.max(node.rect.right());
            max_y = max_y.max(node.rect.bottom());
        }
        (max_x, max_y)
    }
}
