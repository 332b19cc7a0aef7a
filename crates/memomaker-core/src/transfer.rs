//! Transfer method selection for outbound audio payloads.
//!
//! Small payloads are embedded directly in the generation request; large
//! ones are uploaded out-of-band first and referenced by handle, because the
//! remote endpoint degrades on oversized inline payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payloads at or above this size are uploaded instead of embedded (20 MiB)
pub const INLINE_THRESHOLD: u64 = 20 * 1024 * 1024;

/// User-facing transfer method hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMethod {
    #[default]
    Auto,
    Inline,
    Upload,
}

impl TransferMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMethod::Auto => "auto",
            TransferMethod::Inline => "inline",
            TransferMethod::Upload => "upload",
        }
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransferMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(TransferMethod::Auto),
            "inline" => Ok(TransferMethod::Inline),
            "upload" => Ok(TransferMethod::Upload),
            _ => Err(format!(
                "unknown transfer method: {s}. Available: auto, inline, upload"
            )),
        }
    }
}

/// The concrete transfer chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTransfer {
    Inline,
    Upload,
}

impl ResolvedTransfer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedTransfer::Inline => "inline",
            ResolvedTransfer::Upload => "upload",
        }
    }
}

/// Decide how an audio payload of `payload_size` bytes travels.
///
/// Explicit hints always win; `auto` uploads at and above [`INLINE_THRESHOLD`].
/// Pure decision function, no I/O.
pub fn select_method(hint: TransferMethod, payload_size: u64) -> ResolvedTransfer {
    match hint {
        TransferMethod::Inline => ResolvedTransfer::Inline,
        TransferMethod::Upload => ResolvedTransfer::Upload,
        TransferMethod::Auto => {
            if payload_size >= INLINE_THRESHOLD {
                ResolvedTransfer::Upload
            } else {
                ResolvedTransfer::Inline
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_hints_ignore_size() {
        assert_eq!(
            select_method(TransferMethod::Inline, u64::MAX),
            ResolvedTransfer::Inline
        );
        assert_eq!(select_method(TransferMethod::Upload, 0), ResolvedTransfer::Upload);
    }

    #[test]
    fn auto_switches_exactly_at_threshold() {
        assert_eq!(
            select_method(TransferMethod::Auto, INLINE_THRESHOLD - 1),
            ResolvedTransfer::Inline
        );
        assert_eq!(
            select_method(TransferMethod::Auto, INLINE_THRESHOLD),
            ResolvedTransfer::Upload
        );
    }

    #[test]
    fn method_round_trips_through_strings() {
        for method in [TransferMethod::Auto, TransferMethod::Inline, TransferMethod::Upload] {
            assert_eq!(method.as_str().parse::<TransferMethod>().unwrap(), method);
        }
        assert!("carrier-pigeon".parse::<TransferMethod>().is_err());
    }
}
