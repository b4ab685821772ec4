use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::domain::entities::reading::SensorField;

/// Closed set of problems a room can be flagged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    EnergyWastage,
    StuckSensor(SensorField),
    DyingEquipment,
    FireHazard,
    GasLeak,
    PoorLighting,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnergyWastage => f.write_str("EnergyWastage"),
            Self::StuckSensor(field) => write!(f, "StuckSensor:{field}"),
            Self::DyingEquipment => f.write_str("DyingEquipment"),
            Self::FireHazard => f.write_str("FireHazard"),
            Self::GasLeak => f.write_str("GasLeak"),
            Self::PoorLighting => f.write_str("PoorLighting"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown condition name: {0}")]
pub struct ConditionParseError(pub String);

impl FromStr for Condition {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EnergyWastage" => Ok(Self::EnergyWastage),
            "DyingEquipment" => Ok(Self::DyingEquipment),
            "FireHazard" => Ok(Self::FireHazard),
            "GasLeak" => Ok(Self::GasLeak),
            "PoorLighting" => Ok(Self::PoorLighting),
            other => other
                .strip_prefix("StuckSensor:")
                .and_then(|field| field.parse::<SensorField>().ok())
                .map(Self::StuckSensor)
                .ok_or_else(|| ConditionParseError(other.to_string())),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of one monitored problem instance: a condition in a room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConditionKey {
    pub room: String,
    pub condition: Condition,
}

impl ConditionKey {
    #[must_use]
    pub fn new(room: impl Into<String>, condition: Condition) -> Self {
        Self {
            room: room.into(),
            condition,
        }
    }
}

impl std::fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.room, self.condition)
    }
}
