//! Breach taxonomy and notification trigger reference data.
//!
//! Taxonomy items are the canonical vocabulary of data categories an
//! analysis can surface. Triggers map sets of those categories to the
//! notification obligations they create under specific regulations.
//! Both are reference data: loaded once, read-only at runtime, and
//! maintained by the regulatory content team rather than by this
//! service.

use crate::obligation::{Audience, ObligationCondition};
use serde::{Deserialize, Serialize};

/// A canonical data-category phrase in the breach taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachTaxonomyItem {
    pub id: String,
    /// Canonical phrase, e.g. "social security number".
    pub canonical_phrase: String,
    /// Grouping category, e.g. "government_identifier".
    pub category: String,
    /// Relative sensitivity, 1 (low) to 5 (high).
    pub sensitivity_level: u8,
    /// Alternate phrasings that normalize to the canonical phrase.
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Jurisdiction the item is scoped to, if not global.
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

/// Review state of a trigger against its source regulations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Verified against the current regulation text.
    Current,
    /// The source regulation changed; content review pending.
    NeedsReview,
    /// Known stale; obligations from it carry a review note.
    Outdated,
}

/// Citation into the regulation a trigger was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationSnapshot {
    /// Human-readable citation, e.g. "GDPR Art. 33(1)".
    pub citation: String,
    /// ISO 3166-style jurisdiction code, e.g. "eu" or "us-ca".
    pub jurisdiction_code: String,
    /// Hash of the regulation text revision the trigger was validated
    /// against.
    pub revision_hash: String,
}

/// One obligation a trigger creates when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerObligation {
    /// Who must be notified.
    pub audience: Audience,
    /// Notification window as an ISO-8601 duration, e.g. "PT72H".
    pub sla: String,
    /// Conditions gating the obligation; all must hold for it to be
    /// marked satisfied.
    #[serde(default)]
    pub conditions: Vec<ObligationCondition>,
    /// Free-text waiver rule, surfaced to reviewers but never evaluated.
    #[serde(default)]
    pub waivable_if: Option<String>,
}

/// A notification trigger: categories in, obligations out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachTrigger {
    pub id: String,
    pub name: String,
    /// Taxonomy category names that activate this trigger. A single
    /// match suffices.
    pub category_ids: Vec<String>,
    /// Obligations created when the trigger fires.
    pub obligations: Vec<TriggerObligation>,
    /// Regulations the trigger derives from; one obligation instance is
    /// produced per regulation jurisdiction.
    #[serde(default)]
    pub regulations: Vec<RegulationSnapshot>,
    #[serde(default = "default_validation")]
    pub validation: ValidationStatus,
}

fn default_validation() -> ValidationStatus {
    ValidationStatus::Current
}

/// Read-only store of taxonomy items and triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerStore {
    #[serde(default)]
    pub taxonomy: Vec<BreachTaxonomyItem>,
    #[serde(default)]
    pub triggers: Vec<BreachTrigger>,
}

impl TriggerStore {
    /// Loads the store from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the triggers activated by any of the given category
    /// names. Matching is exact on category id, order-preserving over
    /// the store's trigger list.
    pub fn match_categories(&self, categories: &[String]) -> Vec<&BreachTrigger> {
        self.triggers
            .iter()
            .filter(|t| t.category_ids.iter().any(|c| categories.contains(c)))
            .collect()
    }

    /// Resolves a taxonomy phrase (canonical or synonym) to its item.
    pub fn resolve_phrase(&self, phrase: &str) -> Option<&BreachTaxonomyItem> {
        let needle = phrase.trim().to_lowercase();
        self.taxonomy.iter().find(|item| {
            item.canonical_phrase.to_lowercase() == needle
                || item.synonyms.iter().any(|s| s.to_lowercase() == needle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TriggerStore {
        let json = r#"{
            "taxonomy": [
                {
                    "id": "tax-ssn",
                    "canonical_phrase": "social security number",
                    "category": "government_identifier",
                    "sensitivity_level": 5,
                    "synonyms": ["ssn", "social security no."]
                }
            ],
            "triggers": [
                {
                    "id": "trig-gov-id",
                    "name": "Government identifier exposure",
                    "category_ids": ["government_identifier"],
                    "obligations": [
                        {"audience": "regulator", "sla": "PT72H"}
                    ],
                    "regulations": [
                        {
                            "citation": "GDPR Art. 33(1)",
                            "jurisdiction_code": "eu",
                            "revision_hash": "a1b2c3"
                        }
                    ],
                    "validation": "current"
                },
                {
                    "id": "trig-health",
                    "name": "Health data exposure",
                    "category_ids": ["health"],
                    "obligations": [
                        {"audience": "individual", "sla": "P3D"}
                    ]
                }
            ]
        }"#;
        TriggerStore::from_json(json).unwrap()
    }

    #[test]
    fn test_match_categories() {
        let store = store();
        let matched = store.match_categories(&["government_identifier".to_string()]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "trig-gov-id");

        let both = store.match_categories(&[
            "government_identifier".to_string(),
            "health".to_string(),
        ]);
        assert_eq!(both.len(), 2);

        assert!(store.match_categories(&["biometric".to_string()]).is_empty());
    }

    #[test]
    fn test_resolve_phrase_canonical_and_synonym() {
        let store = store();
        assert_eq!(
            store.resolve_phrase("Social Security Number").map(|i| i.id.as_str()),
            Some("tax-ssn")
        );
        assert_eq!(
            store.resolve_phrase("SSN").map(|i| i.id.as_str()),
            Some("tax-ssn")
        );
        assert!(store.resolve_phrase("passport").is_none());
    }

    #[test]
    fn test_defaults_applied_on_load() {
        let store = store();
        let health = &store.triggers[1];
        assert_eq!(health.validation, ValidationStatus::Current);
        assert!(health.regulations.is_empty());
        assert!(health.obligations[0].conditions.is_empty());
    }
}
