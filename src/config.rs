use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const AZURE_IMAGE_ROOT: &str = "img/lib/azure2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Gap around and between top-level shapes on the page.
    pub page_padding: f32,
    pub container_padding: f32,
    pub container_min_width: f32,
    pub container_min_height: f32,
    pub icon_width: f32,
    pub icon_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_padding: 40.0,
            container_padding: 20.0,
            container_min_width: 120.0,
            container_min_height: 80.0,
            icon_width: 64.0,
            icon_height: 64.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerShape {
    #[default]
    Icon,
    Overlay,
    Container,
}

/// How one resource type is drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    #[serde(default)]
    pub shape: HandlerShape,
    pub image: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Overlay corner: tl, tr, bl or br.
    pub corner: Option<String>,
    #[serde(default)]
    pub link_attached: bool,
    pub padding: Option<f32>,
}

fn icon(path: &str) -> HandlerConfig {
    HandlerConfig {
        image: Some(format!("{AZURE_IMAGE_ROOT}/{path}")),
        ..HandlerConfig::default()
    }
}

fn overlay(path: &str, corner: &str) -> HandlerConfig {
    HandlerConfig {
        shape: HandlerShape::Overlay,
        corner: Some(corner.to_string()),
        ..icon(path)
    }
}

fn container() -> HandlerConfig {
    HandlerConfig {
        shape: HandlerShape::Container,
        ..HandlerConfig::default()
    }
}

pub fn default_handlers() -> BTreeMap<String, HandlerConfig> {
    let entries = [
        ("microsoft.network/virtualnetworks", container()),
        ("microsoft.network/virtualnetworks/subnets", container()),
        (
            "microsoft.network/publicipaddresses",
            overlay("networking/Public_IP_Addresses.svg", "tr"),
        ),
        (
            "microsoft.network/networksecuritygroups",
            overlay("networking/Network_Security_Groups.svg", "bl"),
        ),
        (
            "microsoft.network/networkinterfaces",
            icon("networking/Network_Interfaces.svg"),
        ),
        (
            "microsoft.network/privateendpoints",
            HandlerConfig {
                link_attached: true,
                ..icon("networking/Private_Endpoint.svg")
            },
        ),
        (
            "microsoft.compute/virtualmachines",
            icon("compute/Virtual_Machine.svg"),
        ),
        (
            "microsoft.storage/storageaccounts",
            icon("storage/Storage_Accounts.svg"),
        ),
        ("microsoft.web/sites", icon("app_services/App_Services.svg")),
        ("microsoft.web/serverfarms", icon("app_services/App_Service_Plans.svg")),
    ];
    entries
        .into_iter()
        .map(|(kind, handler)| (kind.to_string(), handler))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub handlers: BTreeMap<String, HandlerConfig>,
    /// Regular expressions over type tags that are left out of the diagram.
    pub blacklist: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            handlers: default_handlers(),
            blacklist: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    icon_fill: Option<String>,
    container_fill: Option<String>,
    container_border: Option<String>,
    container_border_width: Option<f32>,
    container_dasharray: Option<String>,
    line_color: Option<String>,
    line_width: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    page_padding: Option<f32>,
    container_padding: Option<f32>,
    container_min_width: Option<f32>,
    container_min_height: Option<f32>,
    icon_width: Option<f32>,
    icon_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    handlers: Option<BTreeMap<String, HandlerConfig>>,
    #[serde(default)]
    replace_default_handlers: bool,
    blacklist: Option<Vec<String>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.icon_fill {
            config.theme.icon_fill = v;
        }
        if let Some(v) = vars.container_fill {
            config.theme.container_fill = v;
        }
        if let Some(v) = vars.container_border {
            config.theme.container_border = v;
        }
        if let Some(v) = vars.container_border_width {
            config.theme.container_border_width = v;
        }
        if let Some(v) = vars.container_dasharray {
            config.theme.container_dasharray = Some(v);
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.page_padding {
            config.layout.page_padding = v;
        }
        if let Some(v) = layout.container_padding {
            config.layout.container_padding = v;
        }
        if let Some(v) = layout.container_min_width {
            config.layout.container_min_width = v;
        }
        if let Some(v) = layout.container_min_height {
            config.layout.container_min_height = v;
        }
        if let Some(v) = layout.icon_width {
            config.layout.icon_width = v;
        }
        if let Some(v) = layout.icon_height {
            config.layout.icon_height = v;
        }
    }

    if parsed.replace_default_handlers {
        config.handlers.clear();
    }
    if let Some(handlers) = parsed.handlers {
        for (kind, handler) in handlers {
            config.handlers.insert(kind.trim().to_lowercase(), handler);
        }
    }
    if let Some(blacklist) = parsed.blacklist {
        config.blacklist = blacklist;
    }

    Ok(config)
}
