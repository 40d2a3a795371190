//! The beaver record.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::BeaverId;
use crate::palette::{Color, ColorPicker};

/// A beaver display name, validated to be non-empty after trimming.
///
/// The original input is kept as typed; only the check looks at the trimmed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BeaverName(String);

impl BeaverName {
    pub fn parse(input: impl Into<String>) -> DomainResult<Self> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(DomainError::validation("beaver name cannot be blank"));
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BeaverName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BeaverName> for String {
    fn from(value: BeaverName) -> Self {
        value.0
    }
}

impl core::fmt::Display for BeaverName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record of the shared `beavers` collection.
///
/// Records are immutable once created: there is no update path, only deletion.
/// `created_at` travels as milliseconds since the epoch under `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beaver {
    id: BeaverId,
    name: String,
    color: Color,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl Beaver {
    /// Rehydrate a record as stored by the service.
    pub fn new(id: BeaverId, name: impl Into<String>, color: Color, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            created_at,
        }
    }

    /// Build a brand new record: fresh id, picked color, `now` truncated to milliseconds.
    pub fn create(name: BeaverName, picker: &dyn ColorPicker, now: DateTime<Utc>) -> Self {
        Self {
            id: BeaverId::new(),
            name: name.into(),
            color: picker.pick(),
            created_at: now.trunc_subsecs(3),
        }
    }

    pub fn id(&self) -> BeaverId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}
