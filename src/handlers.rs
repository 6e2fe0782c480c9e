//! Per-resource-type drawing policy.
//!
//! The conversion pipeline never knows about concrete resource types. It
//! looks up a [`ResourceHandler`] for each record's type in a
//! [`HandlerRegistry`] that the caller builds and passes in.

pub mod builtin;

use std::collections::{BTreeMap, HashMap};

use regex::{Regex, RegexBuilder};

use crate::ir::Resource;
use crate::layout::{Arrow, Diagram, LayoutError, NodeId};
use crate::theme::Theme;

/// Read-only view of every handled resource and the node drawn for it.
#[derive(Debug)]
pub struct Scene<'a> {
    resources: &'a [Resource],
    positions: HashMap<&'a str, usize>,
    nodes: HashMap<&'a str, NodeId>,
}

impl<'a> Scene<'a> {
    pub fn new(resources: &'a [Resource], diagram: &Diagram) -> Self {
        let mut positions = HashMap::with_capacity(resources.len());
        let mut nodes = HashMap::with_capacity(resources.len());
        for (idx, resource) in resources.iter().enumerate() {
            positions.insert(resource.id.as_str(), idx);
            if let Some(node) = diagram.lookup(&resource.id) {
                nodes.insert(resource.id.as_str(), node);
            }
        }
        Self {
            resources,
            positions,
            nodes,
        }
    }

    /// Resources in input order.
    pub fn resources(&self) -> &'a [Resource] {
        self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&'a Resource> {
        self.positions.get(id).map(|&idx| &self.resources[idx])
    }

    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.nodes.get(id).copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&'a Resource> {
        self.resources
            .iter()
            .find(|resource| resource.name.eq_ignore_ascii_case(name))
    }

    /// Resources declaring a dependency on `id`, in input order.
    pub fn dependents(&self, id: &str) -> Vec<&'a Resource> {
        self.resources
            .iter()
            .filter(|resource| resource.depends_on.iter().any(|dep| dep == id))
            .collect()
    }
}

pub trait ResourceHandler {
    /// Materializes the shape of `resource`. Must be idempotent: drawing a
    /// resource that already has a node returns that node.
    fn draw(&self, resource: &Resource, diagram: &mut Diagram, theme: &Theme) -> NodeId;

    /// Ids of resources that must depend on `resource` before anything is
    /// drawn.
    fn back_references(&self, _resource: &Resource) -> Vec<String> {
        Vec::new()
    }

    /// Runs once every resource has a node; may merge or regroup shapes.
    fn post_process(
        &self,
        _resource: &Resource,
        _node: NodeId,
        _scene: &Scene<'_>,
        _diagram: &mut Diagram,
    ) -> Result<Option<NodeId>, LayoutError> {
        Ok(None)
    }

    /// Connectors for `resource`. The default draws one arrow per resolved
    /// dependency.
    fn arrows(
        &self,
        resource: &Resource,
        dependencies: &[&Resource],
        _scene: &Scene<'_>,
    ) -> Vec<Arrow> {
        dependencies
            .iter()
            .map(|dep| Arrow::new(&resource.id, &dep.id))
            .collect()
    }

    /// Grouping boxes owned by `resource`. Called dependents-first, so boxes
    /// of inner resources are complete before outer boxes pack them.
    fn containers(
        &self,
        _resource: &Resource,
        _node: NodeId,
        _scene: &Scene<'_>,
        _diagram: &mut Diagram,
        _theme: &Theme,
    ) -> Result<Vec<NodeId>, LayoutError> {
        Ok(Vec::new())
    }
}

/// Anchored, case-insensitive patterns over resource type tags.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<Regex>,
}

impl Blacklist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(&format!("^(?:{})$", pattern.as_ref()))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, kind: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(kind))
    }
}

/// Type tag to handler table, with an optional handler for unknown types.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Box<dyn ResourceHandler>>,
    fallback: Option<Box<dyn ResourceHandler>>,
    blacklist: Blacklist,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: &str, handler: impl ResourceHandler + 'static) {
        self.register_boxed(kind, Box::new(handler));
    }

    pub fn register_boxed(&mut self, kind: &str, handler: Box<dyn ResourceHandler>) {
        self.handlers.insert(kind.trim().to_lowercase(), handler);
    }

    pub fn with(mut self, kind: &str, handler: impl ResourceHandler + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn with_fallback(mut self, handler: impl ResourceHandler + 'static) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    pub fn get(&self, kind: &str) -> Option<&dyn ResourceHandler> {
        if self.blacklist.matches(kind) {
            return None;
        }
        self.handlers
            .get(kind)
            .or(self.fallback.as_ref())
            .map(|handler| handler.as_ref())
    }

    /// Registered type tags, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// The same table minus every type the blacklist matches. Blacklisted
    /// types are not picked up by the fallback either.
    pub fn without_blacklisted(mut self, blacklist: &Blacklist) -> Self {
        self.handlers.retain(|kind, _| !blacklist.matches(kind));
        self.blacklist
            .patterns
            .extend(blacklist.patterns.iter().cloned());
        self
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .field("blacklist", &self.blacklist)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::builtin::IconHandler;
    use super::*;

    #[test]
    fn lookup_prefers_specific_handler_then_fallback() {
        let registry = HandlerRegistry::new().with("Microsoft.Compute/virtualMachines", IconHandler::default());
        assert!(registry.get("microsoft.compute/virtualmachines").is_some());
        assert!(registry.get("microsoft.web/sites").is_none());

        let registry = registry.with_fallback(IconHandler::default());
        assert!(registry.get("microsoft.web/sites").is_some());
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec!["microsoft.compute/virtualmachines"]
        );
    }

    #[test]
    fn blacklist_removes_handlers_and_blocks_fallback() {
        let blacklist = Blacklist::new(&["microsoft.insights/.*", "Microsoft.Network/networkWatchers"]).unwrap();
        let registry = HandlerRegistry::new()
            .with("microsoft.insights/components", IconHandler::default())
            .with("microsoft.network/networkwatchers", IconHandler::default())
            .with("microsoft.web/sites", IconHandler::default())
            .with_fallback(IconHandler::default())
            .without_blacklisted(&blacklist);

        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["microsoft.web/sites"]);
        assert!(registry.get("microsoft.insights/components").is_none());
        assert!(registry.get("microsoft.insights/actiongroups").is_none());
        assert!(registry.get("microsoft.network/networkwatchers").is_none());
        assert!(registry.get("microsoft.storage/storageaccounts").is_some());
    }

    #[test]
    fn blacklist_patterns_are_anchored() {
        let blacklist = Blacklist::new(&["microsoft.web/sites"]).unwrap();
        assert!(blacklist.matches("microsoft.web/sites"));
        assert!(!blacklist.matches("microsoft.web/sites/slots"));
        assert!(Blacklist::new(&["("]).is_err());
        assert!(Blacklist::default().is_empty());
    }

    #[test]
    fn scene_indexes_resources_and_nodes() {
        let resources = vec![
            Resource::new("vnet", "t").with_name("Hub"),
            Resource::new("subnet", "t").depends_on("vnet"),
            Resource::new("nic", "t").depends_on("vnet"),
        ];
        let mut diagram = Diagram::new();
        let theme = Theme::default();
        let node = IconHandler::default().draw(&resources[0], &mut diagram, &theme);
        let scene = Scene::new(&resources, &diagram);

        assert_eq!(scene.node("vnet"), Some(node));
        assert_eq!(scene.node("subnet"), None);
        assert_eq!(scene.find_by_name("hub").map(|r| r.id.as_str()), Some("vnet"));
        let dependents: Vec<&str> = scene.dependents("vnet").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(dependents, vec!["subnet", "nic"]);
        assert_eq!(scene.resources().len(), 3);
    }
}
