//! The conversion run: resources in, positioned nodes and arrows out.
//!
//! Phases, each over the input-ordered resource list:
//!
//! 1. normalize records and drop the ones no handler draws;
//! 2. collect back-references dependents-first and merge them into the
//!    dependency lists;
//! 3. draw one node per resource, dependencies first;
//! 4. post-process (overlay merges);
//! 5. fill containers, dependents first, so inner boxes are final before an
//!    outer box packs them;
//! 6. connect arrows;
//! 7. arrange the top-level shapes on the page.
//!
//! Every phase that needs an order builds a fresh [`Graph`].

use std::cell::RefCell;
use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::error::ConvertError;
use crate::graph::{Graph, Task};
use crate::handlers::{HandlerRegistry, ResourceHandler, Scene};
use crate::ir::{Resource, filter_dangling_dependencies, normalize_id, normalize_resources};
use crate::layout::{Arrow, ArrowStyle, Diagram, LayoutError, NodeId, NodeKind};
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct Converted {
    /// The resources that made it into the diagram, with injected
    /// back-references.
    pub resources: Vec<Resource>,
    pub diagram: Diagram,
    pub width: f32,
    pub height: f32,
    /// Page fill taken from the theme.
    pub background: String,
}

pub fn convert(
    resources: Vec<Resource>,
    registry: &HandlerRegistry,
    theme: &Theme,
    config: &LayoutConfig,
) -> Result<Converted, ConvertError> {
    let mut resources = normalize_resources(resources);
    let total = resources.len();
    resources.retain(|resource| {
        let handled = registry.get(&resource.kind).is_some();
        if !handled {
            tracing::debug!(id = %resource.id, kind = %resource.kind, "no handler, leaving out");
        }
        handled
    });
    if resources.len() != total {
        tracing::info!(skipped = total - resources.len(), "resources without a handler were left out");
        filter_dangling_dependencies(&mut resources);
    }

    inject_back_references(&mut resources, registry)?;

    tracing::info!(resources = resources.len(), "drawing resources");
    let mut diagram = draw_resources(&resources, registry, theme)?;

    let (width, height) = {
        let scene = Scene::new(&resources, &diagram);
        post_process(&resources, registry, &scene, &mut diagram)?;
        diagram = fill_containers(&resources, registry, &scene, diagram, theme)?;
        connect(&resources, registry, &scene, &mut diagram, theme)?;
        diagram.arrange_roots(config.page_padding)
    };
    tracing::info!(
        nodes = diagram.len(),
        arrows = diagram.arrows().len(),
        width,
        height,
        "conversion finished"
    );

    Ok(Converted {
        resources,
        diagram,
        width,
        height,
        background: theme.background.clone(),
    })
}

fn handled<'r, 'h>(
    resources: &'r [Resource],
    registry: &'h HandlerRegistry,
) -> Vec<(&'r Resource, &'h dyn ResourceHandler)> {
    resources
        .iter()
        .filter_map(|resource| registry.get(&resource.kind).map(|handler| (resource, handler)))
        .collect()
}

fn inject_back_references(
    resources: &mut [Resource],
    registry: &HandlerRegistry,
) -> Result<(), ConvertError> {
    let injected: RefCell<Vec<(String, String)>> = RefCell::new(Vec::new());
    {
        let tasks: Vec<Task<'_>> = handled(resources, registry)
            .into_iter()
            .map(|(resource, handler)| {
                let injected = &injected;
                Task::new(resource.id.clone(), resource.depends_on.clone(), move || {
                    for target in handler.back_references(resource) {
                        injected
                            .borrow_mut()
                            .push((normalize_id(&target), resource.id.clone()));
                    }
                })
            })
            .collect();
        let mut graph = Graph::new(tasks)?;
        graph.resolve_inverse_all();
    }

    let injected = injected.into_inner();
    if injected.is_empty() {
        return Ok(());
    }
    let positions: HashMap<String, usize> = resources
        .iter()
        .enumerate()
        .map(|(idx, resource)| (resource.id.clone(), idx))
        .collect();
    for (target, dependency) in injected {
        let (Some(&target_idx), Some(&dependency_idx)) =
            (positions.get(&target), positions.get(&dependency))
        else {
            tracing::debug!(%target, %dependency, "back-reference to a resource outside the diagram");
            continue;
        };
        if target_idx == dependency_idx
            || resources[target_idx].depends_on.contains(&dependency)
            || resources[dependency_idx].depends_on.contains(&target)
        {
            continue;
        }
        tracing::debug!(%target, %dependency, "injecting back-reference");
        resources[target_idx].depends_on.push(dependency);
    }
    Ok(())
}

fn draw_resources(
    resources: &[Resource],
    registry: &HandlerRegistry,
    theme: &Theme,
) -> Result<Diagram, ConvertError> {
    let diagram = RefCell::new(Diagram::new());
    {
        let tasks: Vec<Task<'_>> = handled(resources, registry)
            .into_iter()
            .map(|(resource, handler)| {
                let diagram = &diagram;
                Task::new(resource.id.clone(), resource.depends_on.clone(), move || {
                    handler.draw(resource, &mut diagram.borrow_mut(), theme);
                })
            })
            .collect();
        let mut graph = Graph::new(tasks)?;
        graph.resolve_all();
    }
    Ok(diagram.into_inner())
}

fn post_process(
    resources: &[Resource],
    registry: &HandlerRegistry,
    scene: &Scene<'_>,
    diagram: &mut Diagram,
) -> Result<(), ConvertError> {
    for (resource, handler) in handled(resources, registry) {
        let Some(node) = scene.node(&resource.id) else {
            continue;
        };
        if let Some(merged) = handler.post_process(resource, node, scene, diagram)? {
            tracing::debug!(id = %resource.id, merged = %diagram.node(merged).id, "post-processed");
        }
    }
    Ok(())
}

fn fill_containers(
    resources: &[Resource],
    registry: &HandlerRegistry,
    scene: &Scene<'_>,
    diagram: Diagram,
    theme: &Theme,
) -> Result<Diagram, ConvertError> {
    let diagram = RefCell::new(diagram);
    let failure: RefCell<Option<LayoutError>> = RefCell::new(None);
    {
        let tasks: Vec<Task<'_>> = handled(resources, registry)
            .into_iter()
            .map(|(resource, handler)| {
                let diagram = &diagram;
                let failure = &failure;
                Task::new(resource.id.clone(), resource.depends_on.clone(), move || {
                    if failure.borrow().is_some() {
                        return;
                    }
                    let Some(node) = scene.node(&resource.id) else {
                        return;
                    };
                    match handler.containers(resource, node, scene, &mut diagram.borrow_mut(), theme) {
                        Ok(boxes) if !boxes.is_empty() => {
                            tracing::debug!(id = %resource.id, boxes = boxes.len(), "filled containers");
                        }
                        Ok(_) => {}
                        Err(err) => *failure.borrow_mut() = Some(err),
                    }
                })
            })
            .collect();
        let mut graph = Graph::new(tasks)?;
        graph.resolve_inverse_all();
    }
    if let Some(err) = failure.into_inner() {
        return Err(err.into());
    }
    Ok(diagram.into_inner())
}

fn connect(
    resources: &[Resource],
    registry: &HandlerRegistry,
    scene: &Scene<'_>,
    diagram: &mut Diagram,
    theme: &Theme,
) -> Result<(), ConvertError> {
    for (resource, handler) in handled(resources, registry) {
        let dependencies: Vec<&Resource> = resource
            .depends_on
            .iter()
            .filter_map(|dep| scene.resource(dep))
            .collect();
        for arrow in handler.arrows(resource, &dependencies, scene) {
            let (Some(from), Some(to)) = (diagram.lookup(&arrow.from), diagram.lookup(&arrow.to))
            else {
                tracing::debug!(from = %arrow.from, to = %arrow.to, "arrow endpoint was not drawn");
                continue;
            };
            if drawn_together(diagram, from, to) {
                continue;
            }
            diagram.add_arrow(themed(arrow, theme))?;
        }
    }
    Ok(())
}

/// Fills stroke attributes the handler left unset from the theme.
fn themed(mut arrow: Arrow, theme: &Theme) -> Arrow {
    let defaults = theme.arrow_style();
    let style = arrow.style.get_or_insert_with(ArrowStyle::default);
    if style.stroke.is_none() {
        style.stroke = defaults.stroke;
    }
    if style.stroke_width.is_none() {
        style.stroke_width = defaults.stroke_width;
    }
    arrow
}

/// True when one node encloses the other, or both are parts of the same
/// icon group; an arrow between them would add nothing.
fn drawn_together(diagram: &Diagram, a: NodeId, b: NodeId) -> bool {
    a == b
        || encloses(diagram, a, b)
        || encloses(diagram, b, a)
        || compound(diagram, a) == compound(diagram, b)
}

/// Outermost group `id` belongs to, or `id` itself.
fn compound(diagram: &Diagram, id: NodeId) -> NodeId {
    let mut current = id;
    while let Some(parent) = diagram.node(current).contained_in {
        if diagram.node(parent).kind != NodeKind::Group {
            break;
        }
        current = parent;
    }
    current
}

fn encloses(diagram: &Diagram, outer: NodeId, inner: NodeId) -> bool {
    let mut current = diagram.node(inner).contained_in;
    while let Some(parent) = current {
        if parent == outer {
            return true;
        }
        current = diagram.node(parent).contained_in;
    }
    false
}
