//! Handlers driven purely by configuration, usable for any resource type.

use std::collections::HashSet;

use super::{Blacklist, HandlerRegistry, ResourceHandler, Scene};
use crate::config::{Config, HandlerConfig, HandlerShape};
use crate::error::ConvertError;
use crate::ir::Resource;
use crate::layout::{
    Arrow, Corner, Diagram, LayoutError, NodeId, NodeKind, Rect, fill_resources_in_box,
    group_icons_and_set_position,
};
use crate::theme::Theme;

pub const DEFAULT_ICON_SIZE: f32 = 64.0;

/// A fixed-size icon labelled with the resource name.
#[derive(Debug, Clone)]
pub struct IconHandler {
    pub image: Option<String>,
    pub width: f32,
    pub height: f32,
    /// Make the `attachedTo` resource depend on this one.
    pub link_attached: bool,
}

impl Default for IconHandler {
    fn default() -> Self {
        Self {
            image: None,
            width: DEFAULT_ICON_SIZE,
            height: DEFAULT_ICON_SIZE,
            link_attached: false,
        }
    }
}

impl IconHandler {
    pub fn with_image(image: &str) -> Self {
        Self {
            image: Some(image.to_string()),
            ..Self::default()
        }
    }

    fn label(resource: &Resource) -> String {
        match resource.properties.size.as_deref() {
            Some(size) if !size.trim().is_empty() => {
                format!("{}\n{}", resource.display_name(), size.trim())
            }
            _ => resource.display_name().to_string(),
        }
    }
}

impl ResourceHandler for IconHandler {
    fn draw(&self, resource: &Resource, diagram: &mut Diagram, theme: &Theme) -> NodeId {
        diagram.ensure_node(
            &resource.id,
            &Self::label(resource),
            NodeKind::Icon,
            Rect::new(0.0, 0.0, self.width, self.height),
            theme.icon_style(self.image.as_deref()),
        )
    }

    fn back_references(&self, resource: &Resource) -> Vec<String> {
        if !self.link_attached {
            return Vec::new();
        }
        resource.properties.attached_to.iter().cloned().collect()
    }

    fn arrows(
        &self,
        resource: &Resource,
        dependencies: &[&Resource],
        scene: &Scene<'_>,
    ) -> Vec<Arrow> {
        let mut arrows: Vec<Arrow> = dependencies
            .iter()
            .map(|dep| Arrow::new(&resource.id, &dep.id))
            .collect();
        if let Some(subnet) = resource.properties.outbound_subnet.as_deref() {
            if scene.resource(subnet).is_some() {
                arrows.push(Arrow::new(&resource.id, subnet).dashed());
            }
        }
        if let Some(account) = resource.properties.storage_account_name.as_deref() {
            if let Some(storage) = scene.find_by_name(account) {
                arrows.push(Arrow::new(&resource.id, &storage.id).dashed());
            }
        }
        arrows
    }
}

/// An icon merged as a badge onto the shape of its `attachedTo` resource.
#[derive(Debug, Clone)]
pub struct OverlayHandler {
    pub icon: IconHandler,
    pub corner: Corner,
}

impl ResourceHandler for OverlayHandler {
    fn draw(&self, resource: &Resource, diagram: &mut Diagram, theme: &Theme) -> NodeId {
        self.icon.draw(resource, diagram, theme)
    }

    fn back_references(&self, resource: &Resource) -> Vec<String> {
        self.icon.back_references(resource)
    }

    fn post_process(
        &self,
        resource: &Resource,
        node: NodeId,
        scene: &Scene<'_>,
        diagram: &mut Diagram,
    ) -> Result<Option<NodeId>, LayoutError> {
        let Some(target) = resource.properties.attached_to.as_deref() else {
            return Ok(None);
        };
        let Some(target_node) = scene.node(target) else {
            tracing::debug!(id = %resource.id, target, "overlay target was not drawn");
            return Ok(None);
        };
        let center = diagram.parent_or_this(target_node);
        if center == diagram.parent_or_this(node) {
            return Ok(None);
        }
        group_icons_and_set_position(diagram, center, node, self.corner).map(Some)
    }

    fn arrows(
        &self,
        resource: &Resource,
        dependencies: &[&Resource],
        scene: &Scene<'_>,
    ) -> Vec<Arrow> {
        self.icon.arrows(resource, dependencies, scene)
    }
}

/// A box that packs the shapes of every resource depending on it.
#[derive(Debug, Clone)]
pub struct ContainerHandler {
    pub padding: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl Default for ContainerHandler {
    fn default() -> Self {
        Self {
            padding: 20.0,
            min_width: 120.0,
            min_height: 80.0,
        }
    }
}

impl ResourceHandler for ContainerHandler {
    fn draw(&self, resource: &Resource, diagram: &mut Diagram, theme: &Theme) -> NodeId {
        diagram.ensure_node(
            &resource.id,
            resource.display_name(),
            NodeKind::Container,
            Rect::new(0.0, 0.0, self.min_width, self.min_height),
            theme.container_style(),
        )
    }

    fn containers(
        &self,
        resource: &Resource,
        node: NodeId,
        scene: &Scene<'_>,
        diagram: &mut Diagram,
        _theme: &Theme,
    ) -> Result<Vec<NodeId>, LayoutError> {
        let own_root = diagram.parent_or_this(node);
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for dependent in scene.dependents(&resource.id) {
            let Some(member) = scene.node(&dependent.id) else {
                continue;
            };
            let root = diagram.parent_or_this(member);
            if root == own_root || !seen.insert(root) {
                continue;
            }
            members.push(root);
        }
        if members.is_empty() {
            return Ok(vec![node]);
        }
        fill_resources_in_box(diagram, node, &members, self.padding, true)?;
        let rect = diagram.node(node).rect;
        diagram.set_dimensions(
            node,
            rect.width.max(self.min_width),
            rect.height.max(self.min_height),
        );
        Ok(vec![node])
    }
}

fn handler_from_config(
    config: &HandlerConfig,
    defaults: &Config,
) -> Result<Box<dyn ResourceHandler>, LayoutError> {
    let icon = IconHandler {
        image: config.image.clone(),
        width: config.width.unwrap_or(defaults.layout.icon_width),
        height: config.height.unwrap_or(defaults.layout.icon_height),
        link_attached: config.link_attached,
    };
    Ok(match config.shape {
        HandlerShape::Icon => Box::new(icon),
        HandlerShape::Overlay => {
            let corner = match config.corner.as_deref() {
                Some(token) => Corner::from_token(token)?,
                None => Corner::TopRight,
            };
            Box::new(OverlayHandler { icon, corner })
        }
        HandlerShape::Container => Box::new(ContainerHandler {
            padding: config.padding.unwrap_or(defaults.layout.container_padding),
            min_width: config.width.unwrap_or(defaults.layout.container_min_width),
            min_height: config.height.unwrap_or(defaults.layout.container_min_height),
        }),
    })
}

/// Builds the handler table described by `config`: one handler per
/// configured type, plain icons for everything else, blacklist applied.
pub fn default_registry(config: &Config) -> Result<HandlerRegistry, ConvertError> {
    let mut registry = HandlerRegistry::new().with_fallback(IconHandler {
        width: config.layout.icon_width,
        height: config.layout.icon_height,
        ..IconHandler::default()
    });
    for (kind, handler) in &config.handlers {
        registry.register_boxed(kind, handler_from_config(handler, config)?);
    }
    let blacklist = Blacklist::new(&config.blacklist)?;
    Ok(registry.without_blacklisted(&blacklist))
}
