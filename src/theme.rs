use serde::{Deserialize, Serialize};

use crate::layout::{ArrowStyle, NodeStyle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub icon_fill: String,
    pub container_fill: String,
    pub container_border: String,
    pub container_border_width: f32,
    pub container_dasharray: Option<String>,
    pub line_color: String,
    pub line_width: f32,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#000000".to_string(),
            icon_fill: "none".to_string(),
            container_fill: "#FFFFFF".to_string(),
            container_border: "#0078D4".to_string(),
            container_border_width: 1.0,
            container_dasharray: None,
            line_color: "#333333".to_string(),
            line_width: 1.0,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            icon_fill: "none".to_string(),
            container_fill: "#F7FAFF".to_string(),
            container_border: "#C7D2E5".to_string(),
            container_border_width: 1.5,
            container_dasharray: Some("8 4".to_string()),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.2,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn icon_style(&self, image: Option<&str>) -> NodeStyle {
        NodeStyle {
            image: image.map(str::to_string),
            fill: Some(self.icon_fill.clone()),
            text_color: Some(self.text_color.clone()),
            font_family: Some(self.font_family.clone()),
            font_size: Some(self.font_size),
            ..NodeStyle::default()
        }
    }

    pub fn container_style(&self) -> NodeStyle {
        NodeStyle {
            fill: Some(self.container_fill.clone()),
            stroke: Some(self.container_border.clone()),
            stroke_width: Some(self.container_border_width),
            stroke_dasharray: self.container_dasharray.clone(),
            text_color: Some(self.text_color.clone()),
            font_family: Some(self.font_family.clone()),
            font_size: Some(self.font_size),
            ..NodeStyle::default()
        }
    }

    pub fn arrow_style(&self) -> ArrowStyle {
        ArrowStyle {
            stroke: Some(self.line_color.clone()),
            stroke_width: Some(self.line_width),
            dashed: false,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
