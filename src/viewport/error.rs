use std::fmt;

use super::observer::MarkerKey;

/// Viewport failures. None of them are fatal: each one degrades a single
/// batch or the observation capability, never the controller.
#[derive(Debug)]
pub enum ViewportError {
    /// The host has no way to observe marker visibility.
    CapabilityAbsent,
    /// A marker's index attribute is missing, unparseable or outside the list.
    MalformedMarker {
        target: MarkerKey,
        raw: Option<String>,
    },
    /// A consumer callback returned an error.
    CallbackFailed {
        callback: &'static str,
        source: anyhow::Error,
    },
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityAbsent => write!(f, "visibility observation is not available"),
            Self::MalformedMarker { target, raw: Some(raw) } => {
                write!(f, "marker {} has an invalid index attribute {raw:?}", target.0)
            }
            Self::MalformedMarker { target, raw: None } => {
                write!(f, "marker {} has no index attribute", target.0)
            }
            Self::CallbackFailed { callback, source } => {
                write!(f, "{callback} callback failed: {source:#}")
            }
        }
    }
}

impl std::error::Error for ViewportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CallbackFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
