//! Prometheus text exposition format.
//!
//! Renders the analytics summary into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use appforge_core::AnalyticsSummary;

/// Render the analytics summary into Prometheus text format.
///
/// Produces COUNTER metrics, with `provider` and `method` labels on the
/// breakdowns.
pub fn render_prometheus(summary: &AnalyticsSummary) -> String {
    let mut out = String::new();

    out.push_str("# HELP appforge_deployments_total Deployments created.\n");
    out.push_str("# TYPE appforge_deployments_total counter\n");
    let _ = writeln!(out, "appforge_deployments_total {}", summary.total_deployments);

    out.push_str("# HELP appforge_generation_time_ms_total Total generation time in milliseconds.\n");
    out.push_str("# TYPE appforge_generation_time_ms_total counter\n");
    let _ = writeln!(
        out,
        "appforge_generation_time_ms_total {}",
        summary.total_generation_time_ms
    );

    out.push_str("# HELP appforge_deployments_by_provider_total Deployments by provider.\n");
    out.push_str("# TYPE appforge_deployments_by_provider_total counter\n");
    for (provider, count) in &summary.counts_by_provider {
        let _ = writeln!(
            out,
            "appforge_deployments_by_provider_total{{provider=\"{}\"}} {count}",
            escape_label(provider)
        );
    }

    out.push_str("# HELP appforge_deployments_by_method_total Deployments by generation method.\n");
    out.push_str("# TYPE appforge_deployments_by_method_total counter\n");
    for (method, count) in &summary.counts_by_method {
        let _ = writeln!(
            out,
            "appforge_deployments_by_method_total{{method=\"{}\"}} {count}",
            escape_label(method)
        );
    }

    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
