//! JSON command frames.
//!
//! One JSON object per frame, keyed by a numeric `code`.  Field names
//! follow the backend's wire format, so they are mixed-case:
//!
//! ```text
//!  {"code":100,"Iter":2,"Floors":["F03","B07"],"OrdersPerFloor":[1,2],
//!   "transaction_id":"9f3ac2e1"}
//!  {"code":200,"transaction_id":"9f3ac2e1"}
//! ```
//!
//! Decoding is two steps: [`decode`] turns bytes into a loosely typed
//! [`RequestFrame`], then [`interpret`] validates it into an
//! [`AppCommand`].  Location strings are parsed here, so a bad
//! location never reaches the motion core.

use core::fmt;

use heapless::{String, Vec};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::app::commands::AppCommand;
use crate::config::MotionConfig;
use crate::error::{Error, RequestError};
use crate::identifier::Identifier;
use crate::location::BayLocation;
use crate::orchestrator::{CycleRequest, FloorList, MAX_REQUEST_FLOORS, ReorderRequest};

/// Capacity of one encoded response.
pub const RESPONSE_CAP: usize = 512;

pub type LocationText = String<8>;
pub type OperatorId = String<32>;
pub type ResponseBytes = Vec<u8, RESPONSE_CAP>;

/// Request and response codes.
pub mod codes {
    pub const CYCLE: u16 = 100;
    pub const RESTOCK: u16 = 101;
    pub const REORDER: u16 = 102;
    pub const CALIBRATE: u16 = 103;
    pub const MANUAL_VERTICAL: u16 = 104;
    pub const MANUAL_HORIZONTAL: u16 = 105;
    pub const OPERATOR_IN: u16 = 110;
    pub const OPERATOR_OUT: u16 = 120;

    pub const OK: u16 = 200;
    pub const UNKNOWN: u16 = 404;
    pub const NOT_ACCEPTABLE: u16 = 406;
    pub const MOTION_FAULT: u16 = 500;
}

// ── Transaction id ────────────────────────────────────────────

/// Opaque correlation id.  The backend sends short hex strings; some
/// clients send plain integers.  Echoed back in whichever form arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionId {
    Text(String<16>),
    Number(u64),
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(t) => s.serialize_str(t),
            Self::Number(n) => s.serialize_u64(*n),
        }
    }
}

struct TransactionIdVisitor;

impl Visitor<'_> for TransactionIdVisitor {
    type Value = TransactionId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string of at most 16 bytes or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        String::try_from(v)
            .map(TransactionId::Text)
            .map_err(|()| E::invalid_length(v.len(), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(TransactionId::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(TransactionId::Number)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(TransactionIdVisitor)
    }
}

// ── Frames ────────────────────────────────────────────────────

/// Every field any request code may carry.  Absent fields default.
#[derive(Debug, Default, Deserialize)]
pub struct RequestFrame {
    pub code: u16,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,

    #[serde(rename = "Iter", default)]
    pub iter: Option<usize>,
    #[serde(rename = "Floors", default)]
    pub floors: Vec<LocationText, MAX_REQUEST_FLOORS>,
    #[serde(rename = "OrdersPerFloor", default)]
    pub orders_per_floor: Vec<u8, MAX_REQUEST_FLOORS>,
    #[serde(rename = "CaptureUids", default)]
    pub capture_uids: bool,
    #[serde(rename = "MaxUids", default)]
    pub max_uids: Option<u8>,

    #[serde(rename = "Floor", default)]
    pub floor: Option<LocationText>,

    #[serde(default)]
    pub move_from: Vec<LocationText, MAX_REQUEST_FLOORS>,
    #[serde(default)]
    pub move_to: Vec<LocationText, MAX_REQUEST_FLOORS>,

    #[serde(rename = "Steps", default)]
    pub steps: Option<u32>,
    #[serde(rename = "Up", default)]
    pub up: bool,
    #[serde(rename = "DurationMs", default)]
    pub duration_ms: Option<u32>,
    #[serde(rename = "Left", default)]
    pub left: Option<u16>,
    #[serde(rename = "Right", default)]
    pub right: Option<u16>,

    #[serde(default)]
    pub operator_id: Option<OperatorId>,
}

#[derive(Debug, Serialize)]
pub struct ResponseFrame<'a> {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<&'a TransactionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uids: Option<&'a [Identifier]>,
}

pub fn decode(frame: &[u8]) -> Result<RequestFrame, serde_json::Error> {
    serde_json::from_slice(frame)
}

/// Serialise `resp`.  `None` if it does not fit [`RESPONSE_CAP`].
pub fn encode(resp: &ResponseFrame<'_>) -> Option<ResponseBytes> {
    let bytes = serde_json::to_vec(resp).ok()?;
    Vec::from_slice(&bytes).ok()
}

// ── Interpretation ────────────────────────────────────────────

/// What a well-formed frame asks for.
#[derive(Debug, Clone)]
pub enum Request {
    Command(AppCommand),
    OperatorAuthenticated(OperatorId),
    OperatorDeauthenticated,
}

/// Why a decoded frame was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownCode(u16),
    /// Required field absent or `Iter` larger than a list.
    Missing(&'static str),
    Invalid(Error),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCode(c) => write!(f, "unknown code {c}"),
            Self::Missing(what) => write!(f, "missing {what}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl From<Error> for Rejection {
    fn from(e: Error) -> Self {
        Self::Invalid(e)
    }
}

impl From<RequestError> for Rejection {
    fn from(e: RequestError) -> Self {
        Self::Invalid(e.into())
    }
}

/// First `iter` entries of `list`, or all of it when `iter` is absent.
fn take<'a, T>(
    list: &'a [T],
    iter: Option<usize>,
    what: &'static str,
) -> Result<&'a [T], Rejection> {
    let n = iter.unwrap_or(list.len());
    list.get(..n).ok_or(Rejection::Missing(what))
}

fn parse_location(text: &str) -> Result<BayLocation, Rejection> {
    text.parse::<BayLocation>()
        .map_err(|e| Rejection::Invalid(e.into()))
}

fn parse_locations(texts: &[LocationText]) -> Result<FloorList, Rejection> {
    let mut out = FloorList::new();
    for text in texts {
        out.push(parse_location(text)?)
            .map_err(|_| Rejection::from(RequestError::TooLong))?;
    }
    Ok(out)
}

/// Validate a decoded frame into a request.  `cfg` supplies defaults
/// for optional fields.
pub fn interpret(frame: &RequestFrame, cfg: &MotionConfig) -> Result<Request, Rejection> {
    let cmd = match frame.code {
        codes::CYCLE => {
            let floors = parse_locations(take(&frame.floors, frame.iter, "Floors")?)?;
            let orders = take(&frame.orders_per_floor, frame.iter, "OrdersPerFloor")?;
            let mut req = CycleRequest::new(&floors, orders)?;
            req.max_ids = frame.max_uids.unwrap_or(cfg.max_ids);
            req.capture_ids = frame.capture_uids;
            AppCommand::Cycle(req)
        }
        codes::RESTOCK => {
            let text = frame.floor.as_ref().ok_or(Rejection::Missing("Floor"))?;
            AppCommand::Restock(parse_location(text)?)
        }
        codes::REORDER => {
            let from = parse_locations(take(&frame.move_from, frame.iter, "move_from")?)?;
            let to = parse_locations(take(&frame.move_to, frame.iter, "move_to")?)?;
            AppCommand::Reorder(ReorderRequest::new(&from, &to)?)
        }
        codes::CALIBRATE => AppCommand::Calibrate,
        codes::MANUAL_VERTICAL => AppCommand::ManualVertical {
            steps: frame.steps.ok_or(Rejection::Missing("Steps"))?,
            upward: frame.up,
        },
        codes::MANUAL_HORIZONTAL => AppCommand::ManualHorizontal {
            duration_ms: frame.duration_ms.ok_or(Rejection::Missing("DurationMs"))?,
            left: frame.left.unwrap_or(cfg.bay_neutral),
            right: frame.right.unwrap_or(cfg.bay_neutral),
        },
        codes::OPERATOR_IN => {
            let id = frame.operator_id.clone().unwrap_or_default();
            return Ok(Request::OperatorAuthenticated(id));
        }
        codes::OPERATOR_OUT => return Ok(Request::OperatorDeauthenticated),
        other => return Err(Rejection::UnknownCode(other)),
    };
    Ok(Request::Command(cmd))
}
