#![forbid(unsafe_code)]

//! JSON input parser for events forwarded by the page script.
//!
//! The script serializes DOM `touch*`, `mouse*`, and `wheel` events into a
//! flat object and hands the string to [`parse_host_input`]:
//!
//! ```json
//! {"kind":"pointer","phase":"down","source":"touch","x":120,"y":300,
//!  "touches":2,"t":1234.5,
//!  "target":{"handle":7,"path":[{"tag":"A","cursor":true}]}}
//! {"kind":"wheel","dy":120,"mods":0,"t":1250.0}
//! ```
//!
//! `t` is the event timestamp in milliseconds. `path` lists the press target
//! first, then its ancestors nearest-first.

use core::time::Duration;

use kinescroll_core::event::{Modifiers, PointerEvent, PointerPhase, PointerSource, WheelEvent};
use kinescroll_core::interactive::{
    ElementFlags, ElementInfo, ElementTag, ElementTarget, is_button_like_role,
};
use serde::Deserialize;

/// Errors from parsing host input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// `kind` is neither `pointer` nor `wheel`.
    UnknownKind(String),
    /// A field holds a value outside its domain.
    InvalidValue { field: &'static str, value: String },
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownKind(kind) => write!(f, "unknown input kind: {kind}"),
            Self::InvalidValue { field, value } => write!(f, "invalid {field}: {value}"),
        }
    }
}

impl std::error::Error for InputParseError {}

/// A decoded host input.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
}

#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    touches: Option<u32>,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    target: Option<RawTarget>,
    #[serde(default)]
    dy: Option<f64>,
    #[serde(default)]
    mods: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    #[serde(default)]
    handle: u64,
    #[serde(default)]
    path: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(default)]
    tag: String,
    #[serde(default)]
    cursor: bool,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    editable: bool,
}

/// Parse one JSON-encoded pointer or wheel event.
pub fn parse_host_input(json: &str) -> Result<HostInput, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    match raw.kind.as_str() {
        "pointer" => parse_pointer(&raw).map(HostInput::Pointer),
        "wheel" => parse_wheel(&raw).map(HostInput::Wheel),
        other => Err(InputParseError::UnknownKind(other.to_owned())),
    }
}

fn parse_timestamp(t: Option<f64>) -> Result<Duration, InputParseError> {
    let ms = t.ok_or(InputParseError::MissingField("t"))?;
    if ms < 0.0 {
        return Err(InputParseError::InvalidValue {
            field: "t",
            value: ms.to_string(),
        });
    }
    Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| InputParseError::InvalidValue {
        field: "t",
        value: ms.to_string(),
    })
}

fn parse_phase(phase: Option<&str>) -> Result<PointerPhase, InputParseError> {
    match phase.ok_or(InputParseError::MissingField("phase"))? {
        "down" | "start" => Ok(PointerPhase::Down),
        "move" => Ok(PointerPhase::Move),
        "up" | "end" => Ok(PointerPhase::Up),
        "cancel" => Ok(PointerPhase::Cancel),
        other => Err(InputParseError::InvalidValue {
            field: "phase",
            value: other.to_owned(),
        }),
    }
}

fn parse_source(source: Option<&str>) -> Result<PointerSource, InputParseError> {
    match source {
        None | Some("touch") => Ok(PointerSource::Touch),
        Some("mouse") => Ok(PointerSource::Mouse),
        Some(other) => Err(InputParseError::InvalidValue {
            field: "source",
            value: other.to_owned(),
        }),
    }
}

fn parse_target(raw: &RawTarget) -> ElementTarget {
    let path = raw
        .path
        .iter()
        .map(|el| {
            let mut flags = ElementFlags::empty();
            if el.cursor {
                flags |= ElementFlags::POINTER_CURSOR;
            }
            if el.role.as_deref().is_some_and(is_button_like_role) {
                flags |= ElementFlags::BUTTON_ROLE;
            }
            if el.editable {
                flags |= ElementFlags::CONTENT_EDITABLE;
            }
            ElementInfo::tagged(ElementTag::from_tag_name(&el.tag)).with_flags(flags)
        })
        .collect();
    ElementTarget::new(raw.handle, path)
}

fn parse_pointer(raw: &RawInput) -> Result<PointerEvent, InputParseError> {
    let phase = parse_phase(raw.phase.as_deref())?;
    let source = parse_source(raw.source.as_deref())?;
    let x = raw.x.ok_or(InputParseError::MissingField("x"))?;
    let y = raw.y.ok_or(InputParseError::MissingField("y"))?;
    let timestamp = parse_timestamp(raw.t)?;

    let mut event = match source {
        PointerSource::Touch => {
            let default_touches = match phase {
                PointerPhase::Down | PointerPhase::Move => 1,
                PointerPhase::Up | PointerPhase::Cancel => 0,
            };
            let touches = raw
                .touches
                .map_or(default_touches, |n| n.min(u32::from(u8::MAX)) as u8);
            PointerEvent::touch(phase, x, y, touches, timestamp)
        }
        PointerSource::Mouse => PointerEvent::mouse(phase, x, y, timestamp),
    };
    if let Some(target) = &raw.target {
        event = event.with_target(parse_target(target));
    }
    Ok(event)
}

fn parse_wheel(raw: &RawInput) -> Result<WheelEvent, InputParseError> {
    let dy = raw.dy.ok_or(InputParseError::MissingField("dy"))?;
    let timestamp = parse_timestamp(raw.t)?;
    let bits = raw.mods.unwrap_or(0).clamp(0, i32::from(u8::MAX)) as u8;
    Ok(WheelEvent::new(dy, timestamp).with_modifiers(Modifiers::from_bits_truncate(bits)))
}
