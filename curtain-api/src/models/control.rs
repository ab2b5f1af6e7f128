use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CURTAIN: &str = "curtain1";

fn default_target() -> String {
    DEFAULT_CURTAIN.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurtainAction {
    Open,
    Close,
}

impl CurtainAction {
    /// State the curtain ends up in once the action completes.
    pub fn resulting_state(self) -> CurtainState {
        match self {
            CurtainAction::Open => CurtainState::Open,
            CurtainAction::Close => CurtainState::Closed,
        }
    }
}

impl fmt::Display for CurtainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurtainAction::Open => write!(f, "OPEN"),
            CurtainAction::Close => write!(f, "CLOSE"),
        }
    }
}

/// Command published on `curtain/cmd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurtainCommand {
    /// Requested movement
    pub action: CurtainAction,
    /// Curtain identifier
    #[serde(default = "default_target")]
    pub target: String,
}

impl CurtainCommand {
    pub fn new(action: CurtainAction) -> Self {
        Self {
            action,
            target: default_target(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurtainState {
    Open,
    #[default]
    Closed,
}

impl fmt::Display for CurtainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurtainState::Open => write!(f, "open"),
            CurtainState::Closed => write!(f, "closed"),
        }
    }
}
