use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Screen a visitor is currently on. Only moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Start,
    IdentityCollected,
    SimulationActive { identity: String },
}

impl Screen {
    /// Page that renders this screen.
    pub fn path(&self) -> &'static str {
        match self {
            Screen::Start => "/",
            Screen::IdentityCollected => "/identity",
            Screen::SimulationActive { .. } => "/simulation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub screen: Screen,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            screen: Screen::Start,
        }
    }

    pub fn begin(&mut self) -> Result<(), AppError> {
        match self.screen {
            Screen::Start => {
                self.screen = Screen::IdentityCollected;
                Ok(())
            }
            _ => Err(AppError::InvalidTransition),
        }
    }

    pub fn submit_identity(&mut self, identity: &str) -> Result<(), AppError> {
        if self.screen != Screen::IdentityCollected {
            return Err(AppError::InvalidTransition);
        }
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::InvalidInput(
                "Please enter a valid email address.".into(),
            ));
        }
        self.screen = Screen::SimulationActive {
            identity: identity.to_string(),
        };
        Ok(())
    }

    /// Identity of a session that reached the simulation screen.
    pub fn require_simulation(&self) -> Result<&str, AppError> {
        match &self.screen {
            Screen::SimulationActive { identity } => Ok(identity),
            _ => Err(AppError::InvalidTransition),
        }
    }
}
