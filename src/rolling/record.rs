// ABOUTME: Reportable outcome of one rolling swap.
// ABOUTME: Records the phase reached, the colors involved, and any warnings.

use serde::Serialize;

use crate::process_state::RollingGroupKey;
use crate::report::DomainFailure;
use crate::types::Color;

use super::error::RollingError;

/// Phases of a swap, including its two failure exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapPhase {
    Start,
    StartingInactive,
    WaitingRunning,
    SwitchPointer,
    StoppingOld,
    Done,
    AbortedBeforeSwitch,
    AbortedAfterSwitch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRecord {
    pub group: RollingGroupKey,
    pub from: Color,
    pub to: Color,
    pub phase: SwapPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DomainFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SwapRecord {
    pub fn new(group: RollingGroupKey, from: Color, to: Color) -> Self {
        Self {
            group,
            from,
            to,
            phase: SwapPhase::Start,
            error: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.phase == SwapPhase::Done
    }

    pub(super) fn abort(mut self, phase: SwapPhase, error: &RollingError) -> Self {
        self.phase = phase;
        self.error = Some(DomainFailure {
            kind: error.kind(),
            message: error.to_string(),
        });
        self
    }
}
