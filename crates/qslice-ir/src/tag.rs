//! Operation tags carrying hardware directives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arg::Arg;

/// A tag outside the closed set, identified by name and namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalTag {
    /// Tag name.
    pub name: String,
    /// Namespace the tag lives in.
    pub namespace: String,
    /// Typed arguments.
    pub args: BTreeMap<String, Arg>,
}

/// Metadata attached to an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    /// Suppress synchronisation for a number of moments around the operation.
    NoSync {
        /// Moments after the operation.
        forward: u32,
        /// Moments before the operation.
        backward: u32,
    },
    /// Override the calibration used for the operation.
    Calibration {
        /// Calibration token.
        token: String,
    },
    /// Marks a Z rotation as physical rather than virtual.
    PhysicalZ,
    /// Translate the FSim gate through the device model.
    FSimViaModel,
    /// Dynamical decoupling protocol to apply.
    DynamicalDecoupling {
        /// Protocol name.
        protocol: String,
    },
    /// Extension tag.
    Internal(InternalTag),
}

impl Tag {
    /// Short name for logging.
    pub fn name(&self) -> &str {
        match self {
            Tag::NoSync { .. } => "no_sync",
            Tag::Calibration { .. } => "calibration",
            Tag::PhysicalZ => "physical_z",
            Tag::FSimViaModel => "fsim_via_model",
            Tag::DynamicalDecoupling { .. } => "dynamical_decoupling",
            Tag::Internal(t) => &t.name,
        }
    }
}
