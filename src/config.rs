//! Deployment configuration
//!
//! Protocol values live in [`crate::constants`]. The only tunable here is how
//! much a transaction builder may hold, which depends on the target device.

use serde::Deserialize;

use crate::constants::*;
use crate::error::{Error, Result};

/// Upper bounds on every transaction collection held by a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderLimits {
    pub max_cell_deps: usize,
    pub max_header_deps: usize,
    pub max_inputs: usize,
    pub max_outputs: usize,
    pub max_witnesses: usize,
}

impl Default for BuilderLimits {
    fn default() -> Self {
        Self {
            max_cell_deps: DEFAULT_MAX_CELL_DEPS,
            max_header_deps: DEFAULT_MAX_HEADER_DEPS,
            max_inputs: DEFAULT_MAX_INPUTS,
            max_outputs: DEFAULT_MAX_OUTPUTS,
            max_witnesses: DEFAULT_MAX_WITNESSES,
        }
    }
}

impl BuilderLimits {
    /// Same bound for every collection
    pub fn uniform(max: usize) -> Result<Self> {
        Self {
            max_cell_deps: max,
            max_header_deps: max,
            max_inputs: max,
            max_outputs: max,
            max_witnesses: max,
        }
        .validated()
    }

    /// Parse limits from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let limits: BuilderLimits = serde_json::from_str(json)
            .map_err(|_| Error::InvalidParameter("malformed builder limits"))?;
        limits.validated()
    }

    /// Reject limits that would make a signable transaction impossible.
    /// Every collection needs room for one item; witness 0 carries the
    /// signature.
    pub fn validated(self) -> Result<Self> {
        if self.max_cell_deps == 0
            || self.max_header_deps == 0
            || self.max_inputs == 0
            || self.max_outputs == 0
            || self.max_witnesses == 0
        {
            return Err(Error::InvalidParameter("builder limits must be non-zero"));
        }
        Ok(self)
    }
}
