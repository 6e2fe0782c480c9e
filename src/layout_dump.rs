use crate::convert::Converted;
use crate::layout::{ArrowStyle, NodeStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct DiagramDump {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub nodes: Vec<NodeDump>,
    pub arrows: Vec<ArrowDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub kind: String,
    /// Relative to `container`, or to the page for top-level nodes.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub absolute_x: f32,
    pub absolute_y: f32,
    pub container: Option<String>,
    pub depth: usize,
    pub style: NodeStyle,
}

#[derive(Debug, Serialize)]
pub struct ArrowDump {
    pub from: String,
    pub to: String,
    pub style: Option<ArrowStyle>,
}

impl DiagramDump {
    pub fn from_converted(converted: &Converted) -> Self {
        let diagram = &converted.diagram;
        let nodes = diagram
            .nodes()
            .map(|(id, node)| {
                let absolute = diagram.absolute_rect(id);
                NodeDump {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    kind: format!("{:?}", node.kind),
                    x: node.rect.x,
                    y: node.rect.y,
                    width: node.rect.width,
                    height: node.rect.height,
                    absolute_x: absolute.x,
                    absolute_y: absolute.y,
                    container: node.contained_in.map(|parent| diagram.node(parent).id.clone()),
                    depth: diagram.depth(id),
                    style: node.style.clone(),
                }
            })
            .collect();

        let arrows = diagram
            .arrows()
            .iter()
            .map(|arrow| ArrowDump {
                from: arrow.from.clone(),
                to: arrow.to.clone(),
                style: arrow.style.clone(),
            })
            .collect();

        DiagramDump {
            width: converted.width,
            height: converted.height,
            background: converted.background.clone(),
            nodes,
            arrows,
        }
    }
}

/// Writes the pretty-printed dump to `path`, or to stdout when no path is
/// given.
pub fn write_layout_dump(path: Option<&Path>, converted: &Converted) -> anyhow::Result<()> {
    let dump = DiagramDump::from_converted(converted);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::convert::convert;
    use crate::handlers::HandlerRegistry;
    use crate::handlers::builtin::{ContainerHandler, IconHandler};
    use crate::ir::Resource;
    use crate::theme::Theme;

    #[test]
    fn dump_reports_containment_and_absolute_positions() {
        let registry = HandlerRegistry::new()
            .with("box", ContainerHandler::default())
            .with_fallback(IconHandler::default());
        let converted = convert(
            vec![
                Resource::new("subnet", "box"),
                Resource::new("vm", "icon").depends_on("subnet"),
            ],
            &registry,
            &Theme::default(),
            &LayoutConfig::default(),
        )
        .unwrap();
        let dump = DiagramDump::from_converted(&converted);

        let vm = dump.nodes.iter().find(|n| n.id == "vm").unwrap();
        let subnet = dump.nodes.iter().find(|n| n.id == "subnet").unwrap();
        assert_eq!(vm.container.as_deref(), Some("subnet"));
        assert_eq!(vm.depth, 1);
        assert_eq!(vm.kind, "Icon");
        assert_eq!(vm.absolute_x, subnet.x + vm.x);
        assert_eq!(subnet.container, None);
        assert!(dump.arrows.is_empty());

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(json["width"], serde_json::json!(converted.width));
        assert_eq!(json["background"], "#FFFFFF");
        assert_eq!(
            json["nodes"][0]["style"]["font_family"],
            Theme::default().font_family.as_str()
        );
    }

    #[test]
    fn dump_writes_to_file() {
        let converted = convert(
            vec![Resource::new("solo", "icon")],
            &HandlerRegistry::new().with_fallback(IconHandler::default()),
            &Theme::default(),
            &LayoutConfig::default(),
        )
        .unwrap();
        let path = std::env::temp_dir().join(format!("cdr-dump-{}.json", std::process::id()));
        write_layout_dump(Some(&path), &converted).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written["nodes"][0]["id"], "solo");
    }
}
