use dnseye_application::use_cases::ComparisonReport;
use dnseye_domain::{DelegationLayer, GlueFinding, ReferenceReport, TraceResult};
use std::fmt::Write;

use super::label;

pub fn render_trace(trace: &TraceResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) via {}",
        trace.domain,
        trace.status.as_str(),
        trace.resolver
    );
    let _ = writeln!(out, "Chain:  {}", trace.chain_display());
    let _ = writeln!(
        out,
        "Health: {}/{} ({:.1}%)",
        trace.health.score, trace.health.max_score, trace.health.percentage
    );
    if let Some(error) = &trace.termination {
        let _ = writeln!(out, "Stopped: {}", error);
    }
    let _ = writeln!(
        out,
        "Timing: {} queries, max {} ms, mean {:.1} ms, {} slow, {} ms total",
        trace.timing.query_count,
        trace.timing.max_ms,
        trace.timing.mean_ms,
        trace.timing.slow_count,
        trace.elapsed_ms
    );

    for (index, layer) in trace.layers.iter().enumerate() {
        out.push('\n');
        render_layer(&mut out, index, layer);
    }

    if !trace.glue_findings.is_empty() {
        out.push_str("\nGlue:\n");
        for finding in &trace.glue_findings {
            render_finding(&mut out, finding);
        }
    }

    if !trace.health.breakdown.is_empty() {
        out.push_str("\nScore:\n");
        for line in &trace.health.breakdown {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}

fn render_layer(out: &mut String, index: usize, layer: &DelegationLayer) {
    let answer = match &layer.delegated_zone {
        Some(zone) if zone != &layer.zone => format!("{} -> {}", label(&layer.answer_kind), zone),
        _ => label(&layer.answer_kind),
    };
    let response = layer
        .response_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "[{}] {} asked for {}: {} ({}, {})",
        index,
        layer.zone,
        layer.query_name,
        layer.status.as_str(),
        answer,
        response
    );

    for outcome in &layer.outcomes {
        let addr = outcome
            .address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "    {:<28} {:<40} {:<11} {:>5} ms",
            outcome.nameserver,
            addr,
            label(&outcome.status),
            outcome.elapsed_ms
        );
        if outcome.attempts > 1 {
            let _ = write!(line, "  x{}", outcome.attempts);
        }
        if outcome.slow {
            line.push_str("  slow");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let hosts = layer.ns_hosts();
    if !hosts.is_empty() {
        let _ = writeln!(out, "    NS: {}", hosts.join(", "));
    }
    for glue in &layer.glue_records {
        let _ = writeln!(out, "    glue {} {}", glue.host, glue.addr);
    }
    for divergent in &layer.divergent_answers {
        let _ = writeln!(
            out,
            "    {} disagrees: {}",
            divergent.nameserver,
            divergent.hosts.join(", ")
        );
    }
}

fn render_finding(out: &mut String, finding: &GlueFinding) {
    let _ = write!(
        out,
        "  [{}] {} {} for {}",
        label(&finding.severity),
        finding.nameserver,
        label(&finding.verdict),
        finding.delegated_zone
    );
    if let Some(detail) = &finding.detail {
        let _ = write!(out, ": {}", detail);
    }
    out.push('\n');
}

pub fn render_comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    for (index, summary) in report.summaries.iter().enumerate() {
        let _ = writeln!(
            out,
            "#{} {} via {}: {} ({}/{}), {} ms, {} slow, {} nameservers",
            index,
            summary.domain,
            summary.resolver,
            summary.status.as_str(),
            summary.health.score,
            summary.health.max_score,
            summary.total_response_ms,
            summary.slow_responses,
            summary.nameserver_count
        );
        let _ = writeln!(out, "   {}", summary.chain);
    }

    let cross = &report.cross_reference;
    out.push('\n');
    if cross.is_consistent() {
        out.push_str("Final nameserver sets agree.\n");
    }
    for pair in &cross.divergences {
        let _ = writeln!(
            out,
            "{} vs {}: divergent",
            cross.subjects[pair.left].label(),
            cross.subjects[pair.right].label()
        );
        for host in &pair.only_in_left {
            let _ = writeln!(out, "  < {}", host);
        }
        for host in &pair.only_in_right {
            let _ = writeln!(out, "  > {}", host);
        }
    }
    for layer in &cross.layer_divergences {
        let _ = writeln!(
            out,
            "{} at {}: answered {}",
            cross.subjects[layer.subject].label(),
            layer.zone,
            layer.winning_hosts.join(", ")
        );
        for divergent in &layer.divergent {
            let _ = writeln!(
                out,
                "  {} said {}",
                divergent.nameserver,
                divergent.hosts.join(", ")
            );
        }
    }
    out
}

pub fn render_references(report: &ReferenceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NS references for {}", report.domain);
    for entry in &report.nameservers {
        if let Some(error) = &entry.error {
            let _ = writeln!(out, "  {}: {}", entry.nameserver, error);
            continue;
        }
        let own = if entry.self_reference { "lists itself" } else { "does not list itself" };
        let _ = writeln!(out, "  {} ({})", entry.nameserver, own);
        let _ = writeln!(out, "    references: {}", entry.references.join(", "));
        if !entry.mutual_references.is_empty() {
            let _ = writeln!(out, "    mutual:     {}", entry.mutual_references.join(", "));
        }
    }
    out
}
