use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Measured quantity carried by a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorField {
    Temperature,
    Humidity,
    Power,
    Occupancy,
    Light,
    Gas,
}

impl SensorField {
    pub const ALL: [Self; 6] = [
        Self::Temperature,
        Self::Humidity,
        Self::Power,
        Self::Occupancy,
        Self::Light,
        Self::Gas,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Power => "power",
            Self::Occupancy => "occupancy",
            Self::Light => "light",
            Self::Gas => "gas",
        }
    }

    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "\u{b0}C",
            Self::Humidity => "%",
            Self::Power => "W",
            Self::Occupancy => "people",
            Self::Light => "lux",
            Self::Gas => "ppm",
        }
    }
}

impl std::fmt::Display for SensorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sensor field: {0}")]
pub struct UnknownFieldError(pub String);

impl FromStr for SensorField {
    type Err = UnknownFieldError;

    /// Accepts canonical names plus the short aliases used by field devices
    /// (`temp`, `PIR`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Self::Temperature),
            "humidity" => Ok(Self::Humidity),
            "power" => Ok(Self::Power),
            "occupancy" | "pir" => Ok(Self::Occupancy),
            "light" => Ok(Self::Light),
            "gas" => Ok(Self::Gas),
            _ => Err(UnknownFieldError(s.to_string())),
        }
    }
}

/// Reasons a reading is dropped before it reaches a window.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestionError {
    #[error("reading has no room identifier")]
    MissingRoom,
    #[error("reading for room {room} has no timestamp")]
    MissingTimestamp { room: String },
    #[error("reading for room {room} has a non-finite {field} value")]
    NonFiniteValue { room: String, field: SensorField },
    #[error("reading for room {room} has an invalid occupancy: {value}")]
    InvalidOccupancy { room: String, value: f64 },
    #[error("malformed reading payload: {0}")]
    Malformed(String),
}

/// Reading as delivered by a telemetry source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default, deserialize_with = "de_room")]
    pub room: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "temp")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default, alias = "PIR", deserialize_with = "de_occupancy")]
    pub occupancy: Option<f64>,
    #[serde(default)]
    pub light: Option<f64>,
    #[serde(default)]
    pub gas: Option<f64>,
}

impl RawReading {
    pub fn set(&mut self, field: SensorField, value: f64) {
        let slot = match field {
            SensorField::Temperature => &mut self.temperature,
            SensorField::Humidity => &mut self.humidity,
            SensorField::Power => &mut self.power,
            SensorField::Occupancy => &mut self.occupancy,
            SensorField::Light => &mut self.light,
            SensorField::Gas => &mut self.gas,
        };
        *slot = Some(value);
    }

    #[must_use]
    pub const fn get(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
            SensorField::Power => self.power,
            SensorField::Occupancy => self.occupancy,
            SensorField::Light => self.light,
            SensorField::Gas => self.gas,
        }
    }
}

/// Room ids are opaque strings; numeric ids from older devices are kept verbatim.
fn de_room<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RoomId {
        Text(String),
        Int(i64),
        UInt(u64),
    }

    Ok(match RoomId::deserialize(deserializer)? {
        RoomId::Text(s) => s,
        RoomId::Int(n) => n.to_string(),
        RoomId::UInt(n) => n.to_string(),
    })
}

/// Occupancy arrives either as a head count or as a PIR presence flag.
fn de_occupancy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Presence {
        Flag(bool),
        Count(f64),
    }

    Ok(
        Option::<Presence>::deserialize(deserializer)?.map(|p| match p {
            Presence::Flag(true) => 1.0,
            Presence::Flag(false) => 0.0,
            Presence::Count(n) => n,
        }),
    )
}

/// Validated sensor observation. Only these enter a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub room: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
}

impl Reading {
    /// Empty reading for `room` at `timestamp`; fields are added with [`Reading::with`].
    #[must_use]
    pub fn new(room: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            room: room.into(),
            timestamp,
            temperature: None,
            humidity: None,
            power: None,
            occupancy: None,
            light: None,
            gas: None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with(mut self, field: SensorField, value: f64) -> Self {
        match field {
            SensorField::Temperature => self.temperature = Some(value),
            SensorField::Humidity => self.humidity = Some(value),
            SensorField::Power => self.power = Some(value),
            SensorField::Occupancy => self.occupancy = Some(value.max(0.0) as u32),
            SensorField::Light => self.light = Some(value),
            SensorField::Gas => self.gas = Some(value),
        }
        self
    }

    #[must_use]
    pub fn value(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
            SensorField::Power => self.power,
            SensorField::Occupancy => self.occupancy.map(f64::from),
            SensorField::Light => self.light,
            SensorField::Gas => self.gas,
        }
    }
}

impl TryFrom<RawReading> for Reading {
    type Error = IngestionError;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        let room = raw.room.trim().to_string();
        if room.is_empty() {
            return Err(IngestionError::MissingRoom);
        }
        let Some(timestamp) = raw.timestamp else {
            return Err(IngestionError::MissingTimestamp { room });
        };

        for field in SensorField::ALL {
            if raw.get(field).is_some_and(|v| !v.is_finite()) {
                return Err(IngestionError::NonFiniteValue { room, field });
            }
        }

        let occupancy = match raw.occupancy {
            None => None,
            Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => Some(v as u32),
            Some(value) => return Err(IngestionError::InvalidOccupancy { room, value }),
        };

        Ok(Self {
            room,
            timestamp,
            temperature: raw.temperature,
            humidity: raw.humidity,
            power: raw.power,
            occupancy,
            light: raw.light,
            gas: raw.gas,
        })
    }
}
