use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::key::{BucketBound, KeyEncoder, SampleKey, SubKey};
use crate::model::{Command, MetricIdentity, MetricMeta, MetricType, UpdatePayload};
use crate::persist::{StateDocument, StoredEntry};

/// One metric: metadata fixed at creation plus its accumulated samples.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub meta: MetricMeta,
    pub samples: BTreeMap<SampleKey, f64>,
}

/// `identity -> entry` for a single metric type.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    entries: BTreeMap<MetricIdentity, Entry>,
}

impl Table {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Rejects a payload whose label count disagrees with the stored metadata.
    fn check_stored(&self, id: &MetricIdentity, payload: &UpdatePayload) -> Result<()> {
        let Some(entry) = self.entries.get(id) else {
            return Ok(());
        };
        let expected = entry.meta.label_names.len();
        if payload.label_values.len() != expected {
            return Err(StoreError::invalid(format!(
                "{}: {} label values, metric was registered with {} labels",
                id.name,
                payload.label_values.len(),
                expected
            )));
        }
        Ok(())
    }

    /// Stored value of one sample, 0 when it does not exist yet.
    fn current(&self, id: &MetricIdentity, key: &SampleKey) -> f64 {
        self.entries
            .get(id)
            .and_then(|entry| entry.samples.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    fn entry_mut(&mut self, id: MetricIdentity, payload: &UpdatePayload) -> &mut Entry {
        self.entries.entry(id).or_insert_with_key(|id| {
            debug!(metric = %id.name, kind = id.metric_type.as_str(), "table entry created");
            Entry {
                meta: payload.meta(),
                samples: BTreeMap::new(),
            }
        })
    }

    fn to_stored(&self) -> BTreeMap<String, StoredEntry> {
        self.entries
            .iter()
            .map(|(id, entry)| {
                let samples = entry
                    .samples
                    .iter()
                    .map(|(key, value)| (KeyEncoder::encode_sample(id, key), *value))
                    .collect();
                (
                    KeyEncoder::encode_identity(id),
                    StoredEntry {
                        meta: entry.meta.clone(),
                        samples,
                    },
                )
            })
            .collect()
    }

    fn from_stored(metric_type: MetricType, stored: &BTreeMap<String, StoredEntry>) -> Result<Self> {
        let mut table = Table::default();
        for (id_key, stored_entry) in stored {
            let id = KeyEncoder::decode_identity(id_key)?;
            let meta = &stored_entry.meta;
            if id.metric_type != metric_type || meta.identity() != id {
                return Err(StoreError::invalid(format!(
                    "entry {id_key} does not belong in the {} table",
                    metric_type.as_str()
                )));
            }
            meta.validate()?;

            let mut samples = BTreeMap::new();
            for (sample_key, value) in &stored_entry.samples {
                let (sample_id, key) = KeyEncoder::decode_sample(sample_key)?;
                if sample_id != id {
                    return Err(StoreError::invalid(format!(
                        "sample {sample_key} stored under {id_key}"
                    )));
                }
                if key.label_values.len() != meta.label_names.len() {
                    return Err(StoreError::invalid(format!(
                        "sample {sample_key} has wrong label count"
                    )));
                }
                if !sub_key_allowed(meta, &key.sub) {
                    return Err(StoreError::invalid(format!(
                        "sample {sample_key} has an unexpected sub-key"
                    )));
                }
                if !value.is_finite() {
                    return Err(StoreError::invalid(format!("sample {sample_key} is not finite")));
                }
                if samples.insert(key, *value).is_some() {
                    return Err(StoreError::invalid(format!(
                        "sample {sample_key} duplicates another key of {id_key}"
                    )));
                }
            }

            let entry = Entry {
                meta: meta.clone(),
                samples,
            };
            if table.entries.insert(id, entry).is_some() {
                return Err(StoreError::invalid(format!(
                    "entry {id_key} duplicates another {} entry",
                    metric_type.as_str()
                )));
            }
        }
        Ok(table)
    }
}

fn sub_key_allowed(meta: &MetricMeta, sub: &SubKey) -> bool {
    match (meta.metric_type, sub) {
        (MetricType::Histogram, SubKey::Sum) => true,
        (MetricType::Histogram, SubKey::Bucket(BucketBound::PosInf)) => true,
        (MetricType::Histogram, SubKey::Bucket(BucketBound::Finite(b))) => meta
            .buckets
            .iter()
            .flatten()
            .any(|declared| declared.total_cmp(b).is_eq()),
        (MetricType::Histogram, SubKey::Value) => false,
        (_, SubKey::Value) => true,
        (_, _) => false,
    }
}

/// The three tables. Every method validates fully before it mutates.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub counters: Table,
    pub gauges: Table,
    pub histograms: Table,
}

impl Tables {
    pub fn update_counter(&mut self, payload: &UpdatePayload) -> Result<()> {
        payload.validate(MetricType::Counter)?;
        let id = payload.identity();
        self.counters.check_stored(&id, payload)?;

        let key = SampleKey::value(payload.label_values.clone());
        let next = match payload.command {
            Command::Inc => accumulate(&id, self.counters.current(&id, &key), payload.value)?,
            // Set on a counter resets it to zero; the supplied value is ignored.
            Command::Set => 0.0,
        };
        self.counters.entry_mut(id, payload).samples.insert(key, next);
        Ok(())
    }

    pub fn update_gauge(&mut self, payload: &UpdatePayload) -> Result<()> {
        payload.validate(MetricType::Gauge)?;
        let id = payload.identity();
        self.gauges.check_stored(&id, payload)?;

        let key = SampleKey::value(payload.label_values.clone());
        let next = match payload.command {
            Command::Inc => accumulate(&id, self.gauges.current(&id, &key), payload.value)?,
            Command::Set => payload.value,
        };
        self.gauges.entry_mut(id, payload).samples.insert(key, next);
        Ok(())
    }

    /// Records one observation as a raw bucket increment plus the running sum.
    /// Placement uses the stored bounds, so a payload cannot move buckets.
    pub fn update_histogram(&mut self, payload: &UpdatePayload) -> Result<()> {
        payload.validate(MetricType::Histogram)?;
        let id = payload.identity();
        self.histograms.check_stored(&id, payload)?;

        let sum_key = SampleKey::sum(payload.label_values.clone());
        let sum = accumulate(&id, self.histograms.current(&id, &sum_key), payload.value)?;

        let Entry { meta, samples } = self.histograms.entry_mut(id, payload);
        let bounds = meta.buckets.as_deref().unwrap_or_default();
        let bound = BucketBound::for_value(bounds, payload.value);

        samples.insert(sum_key, sum);
        *samples
            .entry(SampleKey::bucket(payload.label_values.clone(), bound))
            .or_insert(0.0) += 1.0;
        Ok(())
    }

    pub fn to_document(&self) -> StateDocument {
        StateDocument {
            counters: self.counters.to_stored(),
            gauges: self.gauges.to_stored(),
            histograms: self.histograms.to_stored(),
        }
    }

    pub fn from_document(doc: &StateDocument) -> Result<Self> {
        Ok(Self {
            counters: Table::from_stored(MetricType::Counter, &doc.counters)?,
            gauges: Table::from_stored(MetricType::Gauge, &doc.gauges)?,
            histograms: Table::from_stored(MetricType::Histogram, &doc.histograms)?,
        })
    }
}

/// The state document stores plain JSON numbers, so an accumulated sample
/// must stay finite.
fn accumulate(id: &MetricIdentity, current: f64, delta: f64) -> Result<f64> {
    let next = current + delta;
    if !next.is_finite() {
        return Err(StoreError::invalid(format!(
            "{}: adding {delta} to {current} overflows",
            id.name
        )));
    }
    Ok(next)
}
