use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a pass currently is
///
/// `Idle -> Reading -> Prompting -> AwaitingModel -> Validating -> Writing -> Idle | Failed`.
/// Any state except `Idle` and `Failed` means a pass is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Reading,
    Prompting,
    AwaitingModel,
    Validating,
    Writing,
    Failed,
}

impl AgentState {
    /// A pass is in flight and new requests must be refused
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle | Self::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Prompting => "prompting",
            Self::AwaitingModel => "awaiting model",
            Self::Validating => "validating",
            Self::Writing => "writing",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
