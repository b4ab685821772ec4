use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::condition::{Condition, ConditionKey};
use crate::domain::value_objects::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Raise,
    Resolve,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raise => write!(f, "RAISE"),
            Self::Resolve => write!(f, "RESOLVE"),
        }
    }
}

/// Notification emitted by the alert lifecycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub room: String,
    pub condition: Condition,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    #[must_use]
    pub fn raise(
        key: &ConditionKey,
        severity: Severity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EventKind::Raise,
            room: key.room.clone(),
            condition: key.condition,
            severity,
            message: message.into(),
            timestamp,
        }
    }

    /// Resolution events carry the last severity the key held while active.
    #[must_use]
    pub fn resolve(key: &ConditionKey, severity: Severity, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Resolve,
            room: key.room.clone(),
            condition: key.condition,
            severity,
            message: format!("{} cleared in room {}", key.condition, key.room),
            timestamp,
        }
    }

    #[must_use]
    pub fn key(&self) -> ConditionKey {
        ConditionKey::new(self.room.clone(), self.condition)
    }

    #[must_use]
    pub const fn is_raise(&self) -> bool {
        matches!(self.kind, EventKind::Raise)
    }
}
