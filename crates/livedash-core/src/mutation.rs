//! Building mutation requests from the modifiable-metric dropdown.

use crate::error::{DashError, Result};
use crate::model::{ChartResponse, DataType, MetricRecord, MutationRequest};

/// Dropdown entry for one modifiable metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub label: String,
    pub name: String,
}

/// How the value entry field should constrain typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputHint {
    Decimal,
    Integer,
    Standard,
}

impl InputHint {
    /// Whether `c` may be typed into a field with this hint.
    pub fn accepts(self, c: char) -> bool {
        match self {
            Self::Decimal => c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'),
            Self::Integer => c.is_ascii_digit() || matches!(c, '-' | '+'),
            Self::Standard => !c.is_control(),
        }
    }
}

pub fn input_hint(data_type: DataType) -> InputHint {
    match data_type {
        DataType::Real => InputHint::Decimal,
        DataType::Integer => InputHint::Integer,
        DataType::Text => InputHint::Standard,
    }
}

/// `cpuTempMax` -> `Cpu Temp Max`.
pub fn display_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() && !label.is_empty() {
            label.push(' ');
        }
        label.push(c);
    }
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => label,
    }
}

/// Dropdown entries, one per modifiable record, in response order.
pub fn modifiable_options(response: &ChartResponse) -> Vec<DropdownOption> {
    response
        .modifiable()
        .map(|r| DropdownOption {
            label: display_label(&r.name),
            name: r.name.clone(),
        })
        .collect()
}

/// The record behind dropdown position `selected`.
pub fn resolve(response: &ChartResponse, selected: usize) -> Result<&MetricRecord> {
    response
        .modifiable()
        .nth(selected)
        .ok_or(DashError::NoSelection(selected))
}

/// Submit is only offered for non-blank input.
pub fn can_submit(raw_input: &str) -> bool {
    !raw_input.trim().is_empty()
}

pub fn build_request(
    response: &ChartResponse,
    selected: usize,
    raw_input: &str,
    operation: &str,
) -> Result<MutationRequest> {
    let record = resolve(response, selected)?;
    let trimmed = raw_input.trim();
    let value = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DashError::InvalidInput(raw_input.to_string()))?;

    Ok(MutationRequest {
        name: record.name.clone(),
        operation: operation.to_string(),
        value,
        index: 0,
    })
}
