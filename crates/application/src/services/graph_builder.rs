use dnseye_domain::graph::VISIBLE_NAMESERVERS;
use dnseye_domain::{
    DelegationLayer, EdgeKind, GraphData, GraphEdge, GraphNode, LayerStatus, NodeKind,
    NodeStatus, QueryPhase, QueryStatus, TraceResult,
};

/// Lays a trace out as layer nodes, nameserver nodes and edges for an
/// external renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphDataBuilder;

impl GraphDataBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, trace: &TraceResult) -> GraphData {
        let mut graph = GraphData {
            title: format!("Delegation of {} ({})", trace.domain, trace.status.as_str()),
            nodes: Vec::new(),
            edges: Vec::new(),
        };

        for (index, layer) in trace.layers.iter().enumerate() {
            let layer_id = layer_node_id(index);
            graph.nodes.push(GraphNode {
                id: layer_id.clone(),
                label: format!("{} [{}]", layer.zone, layer.status.as_str()),
                kind: NodeKind::Layer,
                status: layer_status(layer),
                layer: index,
                hidden: None,
            });

            if index > 0 {
                graph.edges.push(GraphEdge {
                    from: layer_node_id(index - 1),
                    to: layer_id.clone(),
                    kind: EdgeKind::DelegatesTo,
                });
            }

            let statuses: Vec<NodeStatus> = layer
                .nameservers
                .iter()
                .map(|ns| nameserver_status(layer, &ns.hostname))
                .collect();
            let condensed = layer.nameservers.len() > VISIBLE_NAMESERVERS;
            let visible = if condensed {
                VISIBLE_NAMESERVERS
            } else {
                layer.nameservers.len()
            };

            for (position, ns) in layer.nameservers.iter().take(visible).enumerate() {
                let id = format!("{}-ns-{}", layer_id, position);
                graph.nodes.push(GraphNode {
                    id: id.clone(),
                    label: ns.hostname.clone(),
                    kind: NodeKind::Nameserver,
                    status: statuses[position],
                    layer: index,
                    hidden: None,
                });
                graph.edges.push(GraphEdge {
                    from: layer_id.clone(),
                    to: id,
                    kind: EdgeKind::Serves,
                });
            }

            if condensed {
                let hidden = layer.nameservers.len() - VISIBLE_NAMESERVERS;
                let id = format!("{}-more", layer_id);
                graph.nodes.push(GraphNode {
                    id: id.clone(),
                    label: format!("+{} more", hidden),
                    kind: NodeKind::More,
                    status: worst(&statuses[VISIBLE_NAMESERVERS..]),
                    layer: index,
                    hidden: Some(hidden),
                });
                graph.edges.push(GraphEdge {
                    from: layer_id.clone(),
                    to: id,
                    kind: EdgeKind::Serves,
                });
            }
        }

        graph
    }
}

fn layer_node_id(index: usize) -> String {
    format!("layer-{}", index)
}

fn layer_status(layer: &DelegationLayer) -> NodeStatus {
    match layer.status {
        LayerStatus::Ok if layer.has_slow_responses() => NodeStatus::Slow,
        LayerStatus::Ok => NodeStatus::Ok,
        LayerStatus::Partial => NodeStatus::Slow,
        _ => NodeStatus::Broken,
    }
}

fn nameserver_status(layer: &DelegationLayer, hostname: &str) -> NodeStatus {
    let Some(outcome) = layer.outcomes.iter().find(|o| o.nameserver == hostname) else {
        return NodeStatus::Ok;
    };
    if outcome.phase == QueryPhase::Resolve {
        return NodeStatus::Broken;
    }
    match outcome.status {
        QueryStatus::Success | QueryStatus::Nxdomain if outcome.slow => NodeStatus::Slow,
        QueryStatus::Success | QueryStatus::Nxdomain => NodeStatus::Ok,
        QueryStatus::Cancelled => NodeStatus::Slow,
        _ => NodeStatus::Broken,
    }
}

fn worst(statuses: &[NodeStatus]) -> NodeStatus {
    if statuses.contains(&NodeStatus::Broken) {
        NodeStatus::Broken
    } else if statuses.contains(&NodeStatus::Slow) {
        NodeStatus::Slow
    } else {
        NodeStatus::Ok
    }
}
