//! Introspection and debugging tools for statepack frames.
//!
//! This crate provides utilities for inspecting and understanding captured frames:
//!
//! - Load entity layouts from JSON
//! - Explain frame size by serializer record
//! - Decode frames into named, structured output
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what was replicated.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codec::{decode_frame, CodecResult, DecodedFrame, ParamUpdate, Record};
use schema::{layout_fingerprint, EntityLayout, ParamKind, SerializerDef, SerializerKind};
use serde::Serialize;
use wire::Limits;

/// Reads and validates a layout JSON file.
pub fn load_layout(path: &Path) -> Result<EntityLayout> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read layout {}", path.display()))?;
    parse_layout(&contents)
}

/// Parses and validates layout JSON.
pub fn parse_layout(json: &str) -> Result<EntityLayout> {
    let layout: EntityLayout = serde_json::from_str(json).context("parse layout json")?;
    layout.validate().context("layout validation failed")?;
    Ok(layout)
}

/// Size breakdown of one frame.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub frame_bytes: usize,
    pub fingerprint: u64,
    pub records: Vec<RecordSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub index: u8,
    pub kind: SerializerKind,
    /// Bytes including the index byte.
    pub byte_len: usize,
    /// Parameter updates carried, for parameter records.
    pub updates: Option<usize>,
}

/// Breaks a frame down by record.
pub fn inspect_frame(
    bytes: &[u8],
    layout: &EntityLayout,
    limits: &Limits,
) -> CodecResult<InspectReport> {
    let frame = decode_frame(layout, bytes, limits)?;
    let records = frame
        .records
        .iter()
        .map(|decoded| RecordSummary {
            index: decoded.index.raw(),
            kind: layout.serializers[decoded.index.as_usize()].kind(),
            byte_len: 1 + record_len(&decoded.record),
            updates: match &decoded.record {
                Record::Params { updates } => Some(updates.len()),
                _ => None,
            },
        })
        .collect();
    Ok(InspectReport {
        frame_bytes: bytes.len(),
        fingerprint: layout_fingerprint(layout),
        records,
    })
}

fn record_len(record: &Record) -> usize {
    match record {
        Record::Flags { .. } => 1,
        Record::State { .. } => 5,
        Record::Params { updates } => {
            let tags: usize = updates
                .iter()
                .map(|u| match u {
                    ParamUpdate::Number { .. } => 3,
                    _ => 1,
                })
                .sum();
            tags + 1
        }
    }
}

/// A decoded frame with names resolved against its layout.
#[derive(Debug, Clone, Serialize)]
pub struct DecodeOutput {
    pub layout: String,
    pub fingerprint: String,
    pub records: Vec<RecordOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordOutput {
    pub index: u8,
    #[serde(flatten)]
    pub view: RecordView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordView {
    Flags { bits: u8, flags: Vec<FlagView> },
    AnimatorParams { updates: Vec<ParamView> },
    AnimatorState { state_hash: i32, normalized_time: f32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagView {
    pub name: String,
    pub value: bool,
    /// `false` for flags a receiver keeps locally simulated.
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamView {
    pub index: usize,
    pub name: String,
    pub kind: ParamKind,
    /// `null` for triggers.
    pub value: serde_json::Value,
}

/// Decodes a frame into named output.
pub fn decode_frame_json(
    bytes: &[u8],
    layout: &EntityLayout,
    limits: &Limits,
) -> CodecResult<DecodeOutput> {
    let frame = decode_frame(layout, bytes, limits)?;
    Ok(describe_frame(&frame, layout))
}

/// Resolves names for an already decoded frame.
#[must_use]
pub fn describe_frame(frame: &DecodedFrame, layout: &EntityLayout) -> DecodeOutput {
    let records = frame
        .records
        .iter()
        .map(|decoded| RecordOutput {
            index: decoded.index.raw(),
            view: describe_record(&layout.serializers[decoded.index.as_usize()], &decoded.record),
        })
        .collect();
    DecodeOutput {
        layout: layout.name.clone(),
        fingerprint: format!("0x{:016x}", layout_fingerprint(layout)),
        records,
    }
}

fn describe_record(def: &SerializerDef, record: &Record) -> RecordView {
    match (def, record) {
        (SerializerDef::Flags { flags }, Record::Flags { bits }) => RecordView::Flags {
            bits: *bits,
            flags: flags
                .iter()
                .enumerate()
                .map(|(i, flag)| FlagView {
                    name: flag.name.clone(),
                    value: bits & (1 << i) != 0,
                    applied: flag.apply_remote,
                })
                .collect(),
        },
        (SerializerDef::AnimatorParams { params }, Record::Params { updates }) => {
            RecordView::AnimatorParams {
                updates: updates
                    .iter()
                    .map(|update| {
                        let index = update.index();
                        let def = &params[index];
                        ParamView {
                            index,
                            name: def.name.clone(),
                            kind: def.kind,
                            value: match *update {
                                ParamUpdate::Trigger { .. } => serde_json::Value::Null,
                                ParamUpdate::Bool { value, .. } => value.into(),
                                ParamUpdate::Number { value, .. } if def.kind == ParamKind::Int => {
                                    (value.round() as i64).into()
                                }
                                ParamUpdate::Number { value, .. } => f64::from(value).into(),
                            },
                        }
                    })
                    .collect(),
            }
        }
        (_, Record::State { state }) => RecordView::AnimatorState {
            state_hash: state.state_hash,
            normalized_time: state.normalized_time,
        },
        // decode_frame pairs every record with its own definition
        (_, Record::Flags { bits }) => RecordView::Flags {
            bits: *bits,
            flags: Vec::new(),
        },
        (_, Record::Params { .. }) => RecordView::AnimatorParams {
            updates: Vec::new(),
        },
    }
}

/// Formats a decoded frame as indented text.
#[must_use]
pub fn format_decode_pretty(output: &DecodeOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "layout: {} ({})", output.layout, output.fingerprint);
    for record in &output.records {
        match &record.view {
            RecordView::Flags { bits, flags } => {
                let _ = writeln!(out, "[{}] flags 0b{bits:08b}", record.index);
                for flag in flags {
                    let note = if flag.applied { "" } else { " (local only)" };
                    let _ = writeln!(out, "    {}: {}{note}", flag.name, flag.value);
                }
            }
            RecordView::AnimatorParams { updates } => {
                let _ = writeln!(
                    out,
                    "[{}] animator params ({} updates)",
                    record.index,
                    updates.len()
                );
                for update in updates {
                    let _ = writeln!(
                        out,
                        "    #{} {} ({}): {}",
                        update.index,
                        update.name,
                        update.kind.as_str(),
                        update.value
                    );
                }
            }
            RecordView::AnimatorState {
                state_hash,
                normalized_time,
            } => {
                let _ = writeln!(
                    out,
                    "[{}] animator state hash={state_hash} time={normalized_time:.3}",
                    record.index
                );
            }
        }
    }
    out
}

/// Formats an inspect report as text.
#[must_use]
pub fn format_inspect(report: &InspectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "frame: {} bytes, {} records, layout fingerprint 0x{:016x}",
        report.frame_bytes,
        report.records.len(),
        report.fingerprint
    );
    for record in &report.records {
        let updates = record
            .updates
            .map(|n| format!(", {n} updates"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  [{}] {}: {} bytes{updates}",
            record.index,
            record.kind.as_str(),
            record.byte_len
        );
    }
    out
}
