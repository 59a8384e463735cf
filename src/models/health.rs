//! Health profiles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Health attributes used as read-only scoring input.
///
/// Tag sets are unique and unordered; a `BTreeSet` keeps serialization stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    /// Age in years, if known.
    #[serde(default)]
    pub age: Option<u32>,
    /// Chronic conditions, e.g. "Asthma".
    #[serde(default)]
    pub comorbidities: BTreeSet<String>,
    /// Known allergies.
    #[serde(default)]
    pub allergies: BTreeSet<String>,
    /// Current medications.
    #[serde(default)]
    pub medications: BTreeSet<String>,
}

impl HealthProfile {
    /// Creates an empty profile.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            age: None,
            comorbidities: BTreeSet::new(),
            allergies: BTreeSet::new(),
            medications: BTreeSet::new(),
        }
    }

    /// Sets the age.
    #[must_use]
    pub const fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Adds a comorbidity tag. Blank tags are ignored.
    #[must_use]
    pub fn with_comorbidity(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() {
            self.comorbidities.insert(tag.to_string());
        }
        self
    }

    /// Returns the comma-separated conditions, or "None reported".
    #[must_use]
    pub fn conditions_summary(&self) -> String {
        if self.comorbidities.is_empty() {
            "None reported".to_string()
        } else {
            self.comorbidities
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    /// Returns the age as display text, or "Not specified".
    #[must_use]
    pub fn age_summary(&self) -> String {
        self.age
            .map_or_else(|| "Not specified".to_string(), |age| age.to_string())
    }
}

/// The subset of a user record the prediction core reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user identifier, used in prediction cache keys.
    pub id: String,
    /// Health attributes.
    #[serde(default)]
    pub health: HealthProfile,
    /// Home city, used for assistant context.
    #[serde(default)]
    pub city: Option<String>,
}

impl UserProfile {
    /// Creates a profile for a user id.
    #[must_use]
    pub fn new(id: impl Into<String>, health: HealthProfile) -> Self {
        Self {
            id: id.into(),
            health,
            city: None,
        }
    }

    /// A profile with no health attributes, keyed as `anonymous`.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("anonymous", HealthProfile::new())
    }

    /// Sets the home city.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}
