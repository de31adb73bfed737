//! Poll and mutation payloads.
//!
//! Wire structs mirror the server JSON exactly; [`ChartResponse::parse`]
//! converts them into domain records with closed enums for the visual kind
//! and declared type. A record that cannot be placed on screen is rejected
//! on its own without failing the rest of the response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DashError, Result, TransportError};

/// Number of fixed display regions.
pub const SLOT_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Slot / kind / type enums
// ---------------------------------------------------------------------------

/// One of the four display regions, stored 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    pub const ALL: [SlotId; SLOT_COUNT] = [SlotId(0), SlotId(1), SlotId(2), SlotId(3)];

    /// Map a 1-based wire `screenLocation` to a slot.
    pub fn from_screen_location(location: i64) -> Result<Self> {
        if (1..=SLOT_COUNT as i64).contains(&location) {
            Ok(SlotId((location - 1) as u8))
        } else {
            Err(DashError::InvalidSlot(location))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn screen_location(self) -> i64 {
        i64::from(self.0) + 1
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.screen_location())
    }
}

/// How the server wants a metric drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualKind {
    Text,
    Image,
    Pie,
    Line,
    Bar,
    /// Pre-rendered `text` field shown as-is (`data-text` on the wire).
    LiteralText,
    /// A tag this build does not know how to draw.
    Unsupported(String),
}

impl VisualKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" => Self::Text,
            "image" => Self::Image,
            "pie" => Self::Pie,
            "line" => Self::Line,
            "bar" => Self::Bar,
            "data-text" => Self::LiteralText,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Pie => "pie",
            Self::Line => "line",
            Self::Bar => "bar",
            Self::LiteralText => "data-text",
            Self::Unsupported(tag) => tag,
        }
    }
}

/// Declared element type of a metric's `values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    Integer,
    Real,
    /// Strings, and the fallback for any unrecognized tag.
    #[default]
    Text,
}

impl DataType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "integer" => Self::Integer,
            "float" => Self::Real,
            _ => Self::Text,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "float",
            Self::Text => "string",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    #[serde(default)]
    pub horizontal: String,
    #[serde(default)]
    pub vertical: String,
}

/// A metric exactly as it appears in the poll response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMetric {
    pub name: String,
    pub visual: String,
    pub screen_location: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modifiable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<AxisLabels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Poll endpoint response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<WireMetric>,
}

/// Poll body with each metric left undecoded, so one malformed entry can be
/// rejected on its own.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollEnvelope {
    success: bool,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    data: Vec<Value>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Mutate endpoint request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub name: String,
    pub operation: String,
    pub value: f64,
    pub index: i32,
}

/// Mutate endpoint response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl MutationResponse {
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

// ---------------------------------------------------------------------------
// Domain records
// ---------------------------------------------------------------------------

/// One server-declared metric, ready for interpretation.
#[derive(Debug, Clone)]
pub struct MetricRecord {
    pub name: String,
    pub visual: VisualKind,
    pub slot: SlotId,
    pub data_type: DataType,
    pub modifiable: bool,
    pub values: Vec<Value>,
    pub labels: Option<AxisLabels>,
    pub text: Option<String>,
}

impl TryFrom<WireMetric> for MetricRecord {
    type Error = DashError;

    fn try_from(wire: WireMetric) -> Result<Self> {
        Ok(Self {
            slot: SlotId::from_screen_location(wire.screen_location)?,
            visual: VisualKind::from_tag(&wire.visual),
            data_type: DataType::from_tag(&wire.data_type),
            name: wire.name,
            modifiable: wire.modifiable,
            values: wire.values,
            labels: wire.labels,
            text: wire.text,
        })
    }
}

/// A wire record dropped during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMetric {
    pub name: String,
    pub reason: String,
}

/// The outcome of one fetch. Replaces the previous response wholesale.
#[derive(Debug, Clone, Default)]
pub struct ChartResponse {
    pub success: bool,
    pub error_msg: Option<String>,
    pub data: Vec<MetricRecord>,
    pub rejected: Vec<RejectedMetric>,
}

impl ChartResponse {
    /// Parse a poll response body.
    ///
    /// Only a body that is not a poll envelope at all is an error. Entries of
    /// `data` that fail to decode land in `rejected` next to the good ones.
    pub fn parse(body: &str) -> Result<Self> {
        let envelope: PollEnvelope = serde_json::from_str(body)?;
        let mut response = Self {
            success: envelope.success,
            error_msg: envelope.error_msg,
            ..Self::default()
        };
        for (i, entry) in envelope.data.into_iter().enumerate() {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map_or_else(|| format!("#{}", i + 1), str::to_string);
            match serde_json::from_value::<WireMetric>(entry) {
                Ok(metric) => response.accept(metric),
                Err(e) => response.reject(name, &DashError::from(e)),
            }
        }
        Ok(response)
    }

    pub fn from_wire(wire: WireResponse) -> Self {
        let mut response = Self {
            success: wire.success,
            error_msg: wire.error_msg,
            ..Self::default()
        };
        for metric in wire.data {
            response.accept(metric);
        }
        response
    }

    fn accept(&mut self, metric: WireMetric) {
        let name = metric.name.clone();
        match MetricRecord::try_from(metric) {
            Ok(record) => self.data.push(record),
            Err(e) => self.reject(name, &e),
        }
    }

    fn reject(&mut self, name: String, err: &DashError) {
        log::warn!("dropping metric '{name}': {err}");
        self.rejected.push(RejectedMetric {
            name,
            reason: err.to_string(),
        });
    }

    /// Synthesized response for a fetch that never produced a payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_msg: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn transport_failure(err: &TransportError) -> Self {
        Self::failure(err.to_string())
    }

    /// Records eligible for mutation, in response order.
    pub fn modifiable(&self) -> impl Iterator<Item = &MetricRecord> {
        self.data.iter().filter(|r| r.modifiable)
    }
}
