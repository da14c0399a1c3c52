use std::fmt::Write;

use promstore_core::{MetricFamily, Sample};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

/// Render families in Prometheus text exposition format.
pub fn render(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    for family in families {
        let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help));
        let _ = writeln!(out, "# TYPE {} {}", family.name, family.metric_type.as_str());
        for sample in &family.samples {
            write_sample(&mut out, family, sample);
        }
    }
    out
}

/// Family label names come first, then the sample's own (`le`).
fn write_sample(out: &mut String, family: &MetricFamily, sample: &Sample) {
    let label_str = family
        .label_names
        .iter()
        .chain(sample.label_names.iter())
        .zip(sample.label_values.iter())
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");

    if label_str.is_empty() {
        let _ = writeln!(out, "{} {}", sample.name, format_value(sample.value));
    } else {
        let _ = writeln!(out, "{}{{{}}} {}", sample.name, label_str, format_value(sample.value));
    }
}
