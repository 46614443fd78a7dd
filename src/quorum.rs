// Copyright 2020 TiKV Project Authors. Licensed under Apache-2.0.

pub mod majority;
pub mod tag_rule;

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::membership::ReplSetConfig;
use crate::tracker::ProgressState;
use crate::LogPosition;

const MAJORITY: &str = "majority";

/// WriteConcern is the durability a caller asks of a write.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WriteConcern {
    /// Acknowledged by this many members, the primary included.
    Threshold(i64),
    /// Acknowledged by a majority of the voting members.
    Majority,
    /// Acknowledged according to the named tag rule of the configuration.
    Tagged(String),
}

impl Default for WriteConcern {
    fn default() -> WriteConcern {
        WriteConcern::Threshold(1)
    }
}

impl WriteConcern {
    /// Parses the loosely typed `w` field of a request.
    pub fn parse(w: &Value) -> Result<WriteConcern> {
        match w {
            Value::Number(n) => {
                let n = n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .unwrap_or(i64::MAX);
                Ok(WriteConcern::Threshold(n))
            }
            Value::String(s) if s == MAJORITY => Ok(WriteConcern::Majority),
            Value::String(s) => Ok(WriteConcern::Tagged(s.clone())),
            _ => Err(Error::InvalidArgument(
                "w has to be a string or a number".to_owned(),
            )),
        }
    }
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WriteConcern::Threshold(n) => write!(f, "{}", n),
            WriteConcern::Majority => write!(f, "{}", MAJORITY),
            WriteConcern::Tagged(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for WriteConcern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            WriteConcern::Threshold(n) => serializer.serialize_i64(*n),
            WriteConcern::Majority => serializer.serialize_str(MAJORITY),
            WriteConcern::Tagged(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for WriteConcern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let w = Value::deserialize(deserializer)?;
        WriteConcern::parse(&w).map_err(de::Error::custom)
    }
}

/// The write concern part of a request, `{ w: <n|string>, wtimeout: <ms> }`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteConcernOptions {
    pub w: WriteConcern,
    /// `None` when the request has no deadline of its own.
    pub wtimeout: Option<Duration>,
}

impl WriteConcernOptions {
    pub fn new(w: WriteConcern, wtimeout: Option<Duration>) -> WriteConcernOptions {
        WriteConcernOptions { w, wtimeout }
    }

    /// Reads the options from a request document. A missing `w` is 1, a
    /// missing or zero `wtimeout` is no deadline.
    pub fn from_json(doc: &Value) -> Result<WriteConcernOptions> {
        let doc = doc.as_object().ok_or_else(|| {
            Error::InvalidArgument("write concern must be a document".to_owned())
        })?;

        let w = match doc.get("w") {
            None | Some(Value::Null) => WriteConcern::default(),
            Some(w) => WriteConcern::parse(w)?,
        };

        let wtimeout = match doc.get("wtimeout") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                let ms = n
                    .as_u64()
                    .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!("wtimeout must be non-negative: {}", n))
                    })?;
                if ms == 0 {
                    None
                } else {
                    Some(Duration::from_millis(ms))
                }
            }
            Some(other) => {
                return Err(Error::InvalidArgument(format!(
                    "wtimeout must be a number: {}",
                    other
                )))
            }
        };

        Ok(WriteConcernOptions { w, wtimeout })
    }
}

/// Returns true if `position` is replicated as `wc` requires.
///
/// Only reads its inputs. The caller checks the node's role first and holds
/// the tracker lock for `state`. With `use_cache`, a tag rule whose
/// watermark is at or beyond `position` is answered without counting.
pub fn satisfied(
    position: LogPosition,
    wc: &WriteConcern,
    state: &ProgressState,
    config: &ReplSetConfig,
    use_cache: bool,
) -> Result<bool> {
    match wc {
        WriteConcern::Threshold(w) => Ok(majority::replicated_to(state, position, *w)),
        WriteConcern::Majority => Ok(majority::replicated_to_majority(state, position, config)),
        WriteConcern::Tagged(name) => {
            let rule = config
                .rule(name)
                .ok_or_else(|| Error::UnknownWriteConcern(name.clone()))?;
            if use_cache {
                if let Some(mark) = state.watermark(name) {
                    if position <= mark {
                        return Ok(true);
                    }
                }
            }
            Ok(tag_rule::holds(rule, position, state, config))
        }
    }
}
