use std::cmp::Ordering;

use super::histogram;
use super::table::{Entry, Tables};
use crate::model::{MetricFamily, Sample};

/// Counters, then gauges, then histograms; families by name within each group.
pub(crate) fn collect(tables: &Tables) -> Vec<MetricFamily> {
    let mut out: Vec<MetricFamily> = tables.counters.entries().map(plain_family).collect();
    out.extend(tables.gauges.entries().map(plain_family));
    out.extend(
        tables
            .histograms
            .entries()
            .map(|e| MetricFamily::new(&e.meta, histogram::aggregate(&e.meta, &e.samples))),
    );
    out
}

fn plain_family(entry: &Entry) -> MetricFamily {
    let mut samples: Vec<Sample> = entry
        .samples
        .iter()
        .map(|(key, value)| Sample {
            name: entry.meta.name.clone(),
            label_names: Vec::new(),
            label_values: key.label_values.clone(),
            value: *value,
        })
        .collect();
    samples.sort_by(|a, b| compare_label_values(&a.label_values, &b.label_values));
    MetricFamily::new(&entry.meta, samples)
}

/// Orders by the concatenated label values; equal concatenations
/// (`["a","bc"]` vs `["ab","c"]`) fall back to tuple order.
pub fn compare_label_values(a: &[String], b: &[String]) -> Ordering {
    a.concat().cmp(&b.concat()).then_with(|| a.cmp(b))
}
