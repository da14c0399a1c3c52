//! Metric data model.
//!
//! Update payloads arrive as JSON (camelCase field names) from metric wrappers;
//! `MetricMeta` is what a table entry keeps for its lifetime; `MetricFamily`
//! is the read-side unit handed to renderers.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Kind of metric. Each kind lives in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(MetricType::Counter),
            "gauge" => Some(MetricType::Gauge),
            "histogram" => Some(MetricType::Histogram),
            _ => None,
        }
    }
}

/// Update command for counters and gauges. Ignored by histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    #[default]
    Inc,
    Set,
}

/// (type, name) pair selecting one table entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricIdentity {
    pub metric_type: MetricType,
    pub name: String,
}

impl MetricIdentity {
    pub fn new(metric_type: MetricType, name: impl Into<String>) -> Self {
        Self {
            metric_type,
            name: name.into(),
        }
    }
}

/// Metadata fixed by the first update of an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetricMeta {
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub label_names: Vec<String>,
    /// Finite, strictly increasing upper bounds. Histograms only; `+Inf` is never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,
}

impl MetricMeta {
    pub fn identity(&self) -> MetricIdentity {
        MetricIdentity::new(self.metric_type, self.name.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(StoreError::invalid("metric name must not be empty"));
        }
        match (self.metric_type, self.buckets.as_deref()) {
            (MetricType::Histogram, Some(buckets)) => validate_buckets(buckets),
            (MetricType::Histogram, None) => Err(StoreError::invalid(format!(
                "histogram {} has no buckets",
                self.name
            ))),
            (_, Some(_)) => Err(StoreError::invalid(format!(
                "buckets are only valid for histograms ({})",
                self.name
            ))),
            (_, None) => Ok(()),
        }
    }
}

/// Bucket bounds must be non-empty, finite and strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(StoreError::invalid("histogram must declare at least one bucket"));
    }
    if let Some(b) = buckets.iter().find(|b| !b.is_finite()) {
        return Err(StoreError::invalid(format!("bucket bound {b} is not finite")));
    }
    if let Some(w) = buckets.windows(2).find(|w| w[0] >= w[1]) {
        return Err(StoreError::invalid(format!(
            "bucket bounds must be strictly increasing ({} >= {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Structured update record sent by metric wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePayload {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub label_names: Vec<String>,
    #[serde(default)]
    pub label_values: Vec<String>,
    pub value: f64,
    #[serde(default)]
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,
}

impl UpdatePayload {
    pub fn new(metric_type: MetricType, name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            metric_type,
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            label_values: Vec::new(),
            value: 0.0,
            command: Command::Inc,
            buckets: None,
        }
    }

    pub fn labels<N, V>(mut self, names: N, values: V) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.label_names = names.into_iter().map(Into::into).collect();
        self.label_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.command = command;
        self
    }

    pub fn buckets(mut self, buckets: impl Into<Vec<f64>>) -> Self {
        self.buckets = Some(buckets.into());
        self
    }

    pub fn identity(&self) -> MetricIdentity {
        MetricIdentity::new(self.metric_type, self.name.clone())
    }

    /// Metadata this payload would fix if it creates the entry.
    pub fn meta(&self) -> MetricMeta {
        MetricMeta {
            name: self.name.clone(),
            help: self.help.clone(),
            metric_type: self.metric_type,
            label_names: self.label_names.clone(),
            buckets: self.buckets.clone(),
        }
    }

    /// Checks that do not depend on stored state.
    pub(crate) fn validate(&self, expected: MetricType) -> Result<()> {
        if self.metric_type != expected {
            return Err(StoreError::invalid(format!(
                "{} payload sent to {} table",
                self.metric_type.as_str(),
                expected.as_str()
            )));
        }
        if self.label_values.len() != self.label_names.len() {
            return Err(StoreError::invalid(format!(
                "{}: {} label values for {} label names",
                self.name,
                self.label_values.len(),
                self.label_names.len()
            )));
        }
        if !self.value.is_finite() {
            return Err(StoreError::invalid(format!("{}: value must be finite", self.name)));
        }
        self.meta().validate()
    }
}

/// One rendered sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// `<name>`, or `<name>_bucket` / `_count` / `_sum` for histograms.
    pub name: String,
    /// Label names beyond the family's own (`["le"]` on bucket samples).
    pub label_names: Vec<String>,
    pub label_values: Vec<String>,
    pub value: f64,
}

/// A metric's metadata plus all of its current samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub label_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<f64>>,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(meta: &MetricMeta, samples: Vec<Sample>) -> Self {
        Self {
            name: meta.name.clone(),
            help: meta.help.clone(),
            metric_type: meta.metric_type,
            label_names: meta.label_names.clone(),
            buckets: meta.buckets.clone(),
            samples,
        }
    }
}
