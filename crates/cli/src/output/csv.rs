use csv::WriterBuilder;
use dnseye_domain::{ReferenceReport, TraceResult};

use super::label;

/// Whole analysis of one trace as CSV sections: summary, delegation layers,
/// glue findings, NS references and the score breakdown. Rows differ in
/// width, so the writer is flexible.
pub fn render_trace_csv(
    trace: &TraceResult,
    references: Option<&ReferenceReport>,
) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record(["Delegation report", trace.domain.name()])?;
    writer.write_record(["Chain", trace.chain_display().as_str()])?;
    writer.write_record(["Resolver", trace.resolver.to_string().as_str()])?;
    writer.write_record(["Status", trace.status.as_str()])?;
    if let Some(error) = &trace.termination {
        writer.write_record(["Stopped", error.to_string().as_str()])?;
    }

    writer.write_record(["Delegation trace"])?;
    writer.write_record(["Zone", "Nameservers", "Response Time (ms)", "Is Slow", "Status"])?;
    for layer in &trace.layers {
        let hosts: Vec<&str> = layer.nameservers.iter().map(|ns| ns.hostname.as_str()).collect();
        let response = layer.response_ms.map(|ms| ms.to_string()).unwrap_or_default();
        writer.write_record([
            layer.zone.as_str(),
            hosts.join("; ").as_str(),
            response.as_str(),
            yes_no(layer.has_slow_responses()),
            layer.status.as_str(),
        ])?;
    }

    writer.write_record(["Glue records"])?;
    writer.write_record(["Zone", "Delegated Zone", "Nameserver", "Verdict", "Severity", "Detail"])?;
    for finding in &trace.glue_findings {
        writer.write_record([
            finding.zone.as_str(),
            finding.delegated_zone.as_str(),
            finding.nameserver.as_str(),
            label(&finding.verdict).as_str(),
            label(&finding.severity).as_str(),
            finding.detail.as_deref().unwrap_or_default(),
        ])?;
    }

    if let Some(report) = references {
        writer.write_record(["NS references"])?;
        writer.write_record([
            "Nameserver",
            "References",
            "Self Reference",
            "Mutual References",
            "Error",
        ])?;
        for entry in &report.nameservers {
            writer.write_record([
                entry.nameserver.as_str(),
                entry.references.join("; ").as_str(),
                yes_no(entry.self_reference),
                entry.mutual_references.join("; ").as_str(),
                entry.error.as_deref().unwrap_or_default(),
            ])?;
        }
    }

    let health = &trace.health;
    writer.write_record(["Health score"])?;
    writer.write_record([
        "Score",
        format!("{}/{}", health.score, health.max_score).as_str(),
    ])?;
    writer.write_record(["Percentage", format!("{:.1}%", health.percentage).as_str()])?;
    for line in &health.breakdown {
        writer.write_record(["Breakdown", line.as_str()])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}
