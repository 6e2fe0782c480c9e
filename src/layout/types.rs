use std::collections::BTreeMap;

use serde::Serialize;

use super::error::LayoutError;

/// Index of a node in its [`super::Diagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn corner(&self, corner: Corner) -> (f32, f32) {
        match corner {
            Corner::TopLeft => (self.x, self.y),
            Corner::TopRight => (self.right(), self.y),
            Corner::BottomLeft => (self.x, self.bottom()),
            Corner::BottomRight => (self.right(), self.bottom()),
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn from_token(token: &str) -> Result<Self, LayoutError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "tl" | "top-left" | "topleft" => Ok(Self::TopLeft),
            "tr" | "top-right" | "topright" => Ok(Self::TopRight),
            "bl" | "bottom-left" | "bottomleft" => Ok(Self::BottomLeft),
            "br" | "bottom-right" | "bottomright" => Ok(Self::BottomRight),
            _ => Err(LayoutError::UndefinedCorner(token.to_string())),
        }
    }
}

impl TryFrom<u8> for Corner {
    type Error = LayoutError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::TopLeft),
            1 => Ok(Self::TopRight),
            2 => Ok(Self::BottomLeft),
            3 => Ok(Self::BottomRight),
            other => Err(LayoutError::UndefinedCorner(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// A single resource shape.
    Icon,
    /// A box enclosing other nodes.
    Container,
    /// Borderless compound of an icon and its badges.
    Group,
}

/// Style attributes for a node. Unset fields fall back to the serializer's
/// defaults; `extra` carries format-specific keys verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeStyle {
    pub image: Option<String>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub stroke_dasharray: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Relative to the container's origin when `contained_in` is set.
    pub rect: Rect,
    pub style: NodeStyle,
    pub contained_in: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArrowStyle {
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    pub style: Option<ArrowStyle>,
}

impl Arrow {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            style: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.style.get_or_insert_with(ArrowStyle::default).dashed = true;
        self
    }
}
