use super::*;

/// Moves `node` so that its center sits on `corner` of `reference`.
/// Both nodes are expected to share a coordinate space (same container).
pub fn set_icon_relative_to(diagram: &mut Diagram, node: NodeId, reference: NodeId, corner: Corner) {
    let (anchor_x, anchor_y) = diagram.node(reference).rect.corner(corner);
    let rect = diagram.node(node).rect;
    diagram.set_position(
        node,
        anchor_x - rect.width / 2.0,
        anchor_y - rect.height / 2.0,
    );
}

/// Merges `icon` onto `center` as a half-size, unlabelled badge.
///
/// A borderless container takes over `center`'s rectangle and place in the
/// tree; `center` moves to the container's origin and both nodes become its
/// children. Later resizes of `center` carry over to the container and the
/// badge. Returns the new container.
pub fn group_icons_and_set_position(
    diagram: &mut Diagram,
    center: NodeId,
    icon: NodeId,
    corner: Corner,
) -> Result<NodeId, LayoutError> {
    if center == icon {
        let id = diagram.node(center).id.clone();
        return Err(LayoutError::ContainmentCycle {
            node: id.clone(),
            container: id,
        });
    }

    let center_rect = diagram.node(center).rect;
    let outer = diagram.node(center).contained_in;
    let base = format!("{}-group", diagram.node(center).id);
    let style = NodeStyle {
        fill: Some("none".to_string()),
        stroke: Some("none".to_string()),
        ..NodeStyle::default()
    };
    let group = diagram.insert_derived(&base, "", NodeKind::Group, center_rect, style);

    diagram.set_contained_in(group, outer)?;
    diagram.set_contained_in(center, Some(group))?;
    diagram.set_contained_in(icon, Some(group))?;
    diagram.set_position(center, 0.0, 0.0);

    let icon_rect = diagram.node(icon).rect;
    diagram.set_dimensions(icon, icon_rect.width / 2.0, icon_rect.height / 2.0);
    diagram.node_mut(icon).label.clear();
    set_icon_relative_to(diagram, icon, center, corner);
    diagram.record_badge(Badge {
        group,
        center,
        badge: icon,
        corner,
    });

    tracing::debug!(
        group = %diagram.node(group).id,
        center = %diagram.node(center).id,
        icon = %diagram.node(icon).id,
        ?corner,
        "merged overlay icon"
    );
    Ok(group)
}
