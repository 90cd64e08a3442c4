use dnseye_domain::{EdgeKind, GraphData, NodeKind, NodeStatus};
use std::fmt::Write;

/// Graphviz rendering, one cluster per layer.
pub fn render_dot(graph: &GraphData) -> String {
    let mut out = String::new();
    out.push_str("digraph delegation {\n");
    let _ = writeln!(out, "  label=\"{}\";", escape(&graph.title));
    out.push_str("  rankdir=TB;\n  node [fontname=\"Helvetica\"];\n");

    let layers = graph.nodes.iter().map(|n| n.layer).max().map_or(0, |m| m + 1);
    for layer in 0..layers {
        let _ = writeln!(out, "  subgraph cluster_{} {{", layer);
        out.push_str("    style=dotted;\n");
        for node in graph.nodes_in_layer(layer) {
            let shape = match node.kind {
                NodeKind::Layer => "box",
                NodeKind::Nameserver => "ellipse",
                NodeKind::More => "plaintext",
            };
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\", shape={}, color={}];",
                escape(&node.id),
                escape(&node.label),
                shape,
                color(node.status)
            );
        }
        out.push_str("  }\n");
    }

    for edge in &graph.edges {
        let style = match edge.kind {
            EdgeKind::DelegatesTo => "bold",
            EdgeKind::Serves => "dashed",
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [style={}];",
            escape(&edge.from),
            escape(&edge.to),
            style
        );
    }
    out.push_str("}\n");
    out
}

fn color(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Ok => "darkgreen",
        NodeStatus::Slow => "orange",
        NodeStatus::Broken => "red",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
