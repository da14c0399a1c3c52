//! Composite keys and their string encoding.
//!
//! In memory, samples are keyed by structured values (`SampleKey`) so no
//! delimiter can collide. The string form is only needed at the persistence
//! boundary and to order histogram label tuples; it is a JSON array, so label
//! values are quoted and can never be mistaken for a type, name or sub-key.
//!
//! - identity: `["counter","http_requests"]`
//! - sample:   `["histogram","latency",["GET","/"],"0.5"]`
//! - labels:   `["GET","/"]`

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::model::{MetricIdentity, MetricType};

const VALUE_TOKEN: &str = "value";
const SUM_TOKEN: &str = "sum";
const INF_TOKEN: &str = "+Inf";

/// Histogram bucket upper bound, including the implicit `+Inf`.
#[derive(Debug, Clone, Copy)]
pub enum BucketBound {
    Finite(f64),
    PosInf,
}

impl BucketBound {
    /// Bucket an observation falls into: the first bound `>= value`, else `+Inf`.
    pub fn for_value(bounds: &[f64], value: f64) -> Self {
        bounds
            .iter()
            .find(|b| value <= **b)
            .map(|b| BucketBound::Finite(*b))
            .unwrap_or(BucketBound::PosInf)
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s == INF_TOKEN {
            return Some(BucketBound::PosInf);
        }
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(BucketBound::Finite)
    }
}

impl PartialEq for BucketBound {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BucketBound {}

impl PartialOrd for BucketBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BucketBound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BucketBound::Finite(a), BucketBound::Finite(b)) => a.total_cmp(b),
            (BucketBound::Finite(_), BucketBound::PosInf) => Ordering::Less,
            (BucketBound::PosInf, BucketBound::Finite(_)) => Ordering::Greater,
            (BucketBound::PosInf, BucketBound::PosInf) => Ordering::Equal,
        }
    }
}

/// Renders as the `le` label value: shortest round-trip float, or `+Inf`.
impl fmt::Display for BucketBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketBound::Finite(v) => write!(f, "{v}"),
            BucketBound::PosInf => f.write_str(INF_TOKEN),
        }
    }
}

/// Discriminates samples sharing a label-value tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubKey {
    /// Counter or gauge value.
    Value,
    /// Histogram running sum.
    Sum,
    /// Histogram raw (non-cumulative) bucket count.
    Bucket(BucketBound),
}

impl SubKey {
    fn token(&self) -> String {
        match self {
            SubKey::Value => VALUE_TOKEN.to_string(),
            SubKey::Sum => SUM_TOKEN.to_string(),
            SubKey::Bucket(b) => b.to_string(),
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        match s {
            VALUE_TOKEN => Some(SubKey::Value),
            SUM_TOKEN => Some(SubKey::Sum),
            other => BucketBound::parse(other).map(SubKey::Bucket),
        }
    }
}

/// Key of one stored number within a table entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleKey {
    pub label_values: Vec<String>,
    pub sub: SubKey,
}

impl SampleKey {
    pub fn value(label_values: Vec<String>) -> Self {
        Self {
            label_values,
            sub: SubKey::Value,
        }
    }

    pub fn sum(label_values: Vec<String>) -> Self {
        Self {
            label_values,
            sub: SubKey::Sum,
        }
    }

    pub fn bucket(label_values: Vec<String>, bound: BucketBound) -> Self {
        Self {
            label_values,
            sub: SubKey::Bucket(bound),
        }
    }
}

/// Encodes and decodes composite keys.
pub struct KeyEncoder;

impl KeyEncoder {
    pub fn encode_identity(id: &MetricIdentity) -> String {
        Value::Array(vec![
            Value::from(id.metric_type.as_str()),
            Value::from(id.name.as_str()),
        ])
        .to_string()
    }

    pub fn decode_identity(key: &str) -> Result<MetricIdentity> {
        let (ty, name): (String, String) = serde_json::from_str(key)
            .map_err(|e| StoreError::invalid(format!("bad identity key {key:?}: {e}")))?;
        Ok(MetricIdentity::new(parse_type(&ty)?, name))
    }

    pub fn encode_sample(id: &MetricIdentity, key: &SampleKey) -> String {
        Value::Array(vec![
            Value::from(id.metric_type.as_str()),
            Value::from(id.name.as_str()),
            labels_value(&key.label_values),
            Value::from(key.sub.token()),
        ])
        .to_string()
    }

    pub fn decode_sample(key: &str) -> Result<(MetricIdentity, SampleKey)> {
        let (ty, name, label_values, sub): (String, String, Vec<String>, String) =
            serde_json::from_str(key)
                .map_err(|e| StoreError::invalid(format!("bad sample key {key:?}: {e}")))?;
        let sub = SubKey::from_token(&sub)
            .ok_or_else(|| StoreError::invalid(format!("bad sub-key {sub:?} in {key:?}")))?;
        Ok((
            MetricIdentity::new(parse_type(&ty)?, name),
            SampleKey { label_values, sub },
        ))
    }

    /// Canonical form of a label-value tuple; histogram tuples are ordered by it.
    pub fn encode_labels(label_values: &[String]) -> String {
        labels_value(label_values).to_string()
    }
}

fn labels_value(label_values: &[String]) -> Value {
    Value::Array(label_values.iter().map(|v| Value::from(v.as_str())).collect())
}

fn parse_type(s: &str) -> Result<MetricType> {
    MetricType::parse(s).ok_or_else(|| StoreError::invalid(format!("unknown metric type {s:?}")))
}
