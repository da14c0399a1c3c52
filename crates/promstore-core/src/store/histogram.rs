//! Read-time expansion of raw histogram state.
//!
//! Updates only record raw per-bucket increments and a running sum. Cumulative
//! bucket values are rebuilt here on every collection: O(buckets x label
//! combinations) per histogram, leaving each observation at O(buckets).

use std::collections::BTreeMap;

use crate::key::{BucketBound, KeyEncoder, SampleKey, SubKey};
use crate::model::{MetricMeta, Sample};

const LE_LABEL: &str = "le";

#[derive(Default)]
struct Group {
    label_values: Vec<String>,
    raw: BTreeMap<BucketBound, f64>,
    sum: f64,
}

/// Expands one histogram entry into `_bucket`, `_count` and `_sum` samples.
///
/// Label tuples are emitted in the order of their encoded key; within a tuple,
/// buckets ascend and end with `+Inf`.
pub(crate) fn aggregate(meta: &MetricMeta, samples: &BTreeMap<SampleKey, f64>) -> Vec<Sample> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for (key, value) in samples {
        let group = groups
            .entry(KeyEncoder::encode_labels(&key.label_values))
            .or_insert_with(|| Group {
                label_values: key.label_values.clone(),
                ..Group::default()
            });
        match key.sub {
            SubKey::Sum => group.sum += value,
            SubKey::Bucket(bound) => *group.raw.entry(bound).or_insert(0.0) += value,
            SubKey::Value => {}
        }
    }

    let bounds: Vec<BucketBound> = meta
        .buckets
        .iter()
        .flatten()
        .map(|b| BucketBound::Finite(*b))
        .chain(std::iter::once(BucketBound::PosInf))
        .collect();

    let bucket_name = format!("{}_bucket", meta.name);
    let mut out = Vec::with_capacity(groups.len() * (bounds.len() + 2));
    for group in groups.into_values() {
        let mut acc = 0.0;
        for bound in &bounds {
            acc += group.raw.get(bound).copied().unwrap_or(0.0);
            let mut label_values = group.label_values.clone();
            label_values.push(bound.to_string());
            out.push(Sample {
                name: bucket_name.clone(),
                label_names: vec![LE_LABEL.to_string()],
                label_values,
                value: acc,
            });
        }

        out.push(Sample {
            name: format!("{}_count", meta.name),
            label_names: Vec::new(),
            label_values: group.label_values.clone(),
            value: acc,
        });
        out.push(Sample {
            name: format!("{}_sum", meta.name),
            label_names: Vec::new(),
            label_values: group.label_values,
            value: group.sum,
        });
    }
    out
}
