use super::*;

/// Result of [`pack_rects`]: one position per input size, in input order,
/// plus the extent of the packed area including padding.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedRects {
    pub positions: Vec<(f32, f32)>,
    pub width: f32,
    pub height: f32,
}

/// Banded packing of `sizes` (width, height).
///
/// Shapes are taken in descending `width + height` order (ties keep input
/// order) and laid out left to right in bands of `ceil(sqrt(n))` shapes.
/// From the second band on, a band keeps accepting shapes while the next left
/// edge is still inside the widest band so far. Each band is as tall as its
/// tallest shape; bands and shapes are separated by `padding`, which is also
/// kept around the outside.
pub fn pack_rects(sizes: &[(f32, f32)], padding: f32) -> PackedRects {
    let count = sizes.len();
    let mut positions = vec![(0.0, 0.0); count];
    if count == 0 {
        return PackedRects {
            positions,
            width: 0.0,
            height: 0.0,
        };
    }

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| {
        let fa = sizes[a].0 + sizes[a].1;
        let fb = sizes[b].0 + sizes[b].1;
        fb.total_cmp(&fa)
    });
    let columns = (count as f64).sqrt().ceil() as usize;

    let mut width: f32 = 0.0;
    let mut y = padding;
    let mut next = 0;
    let mut band = 0;
    while next < count {
        let mut x = padding;
        let mut tallest: f32 = 0.0;
        let mut placed = 0;
        while next < count {
            let idx = order[next];
            let (w, h) = sizes[idx];
            let fits_widest = band > 0 && x < width;
            if placed >= columns && !fits_widest {
                break;
            }
            positions[idx] = (x, y);
            x += w + padding;
            width = width.max(x);
            tallest = tallest.max(h);
            placed += 1;
            next += 1;
        }
        y += tallest + padding;
        band += 1;
    }

    PackedRects {
        positions,
        width,
        height: y,
    }
}

/// Packs `children` inside `container` with [`pack_rects`] and resizes the
/// container to the packed extent. Child positions become relative to the
/// container; with `reparent` the children are also nested inside it.
///
/// An empty `children` slice leaves the container untouched.
pub fn fill_resources_in_box(
    diagram: &mut Diagram,
    container: NodeId,
    children: &[NodeId],
    padding: f32,
    reparent: bool,
) -> Result<(), LayoutError> {
    if children.is_empty() {
        tracing::debug!(container = %diagram.node(container).id, "nothing to pack");
        return Ok(());
    }

    let sizes: Vec<(f32, f32)> = children
        .iter()
        .map(|id| {
            let rect = diagram.node(*id).rect;
            (rect.width, rect.height)
        })
        .collect();
    let packed = pack_rects(&sizes, padding);

    for (child, (x, y)) in children.iter().zip(packed.positions) {
        if reparent {
            diagram.set_contained_in(*child, Some(container))?;
        }
        diagram.set_position(*child, x, y);
    }
    diagram.set_dimensions(container, packed.width, packed.height);
    tracing::debug!(
        container = %diagram.node(container).id,
        children = children.len(),
        width = packed.width,
        height = packed.height,
        "packed container"
    );
    Ok(())
}
