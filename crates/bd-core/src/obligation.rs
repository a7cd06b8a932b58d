//! Regulatory notification obligation engine.
//!
//! Given the triggers matched for an incident, the discovery timestamp
//! (T0), and the incident's data scope, this module produces the
//! concrete notification schedule: who must be told, under which
//! jurisdiction, by when. Deadlines are plain calendar arithmetic on T0;
//! business-day qualifiers in regulations are carried as review notes
//! rather than silently adjusted.

use crate::incident::DataScope;
use crate::taxonomy::{BreachTrigger, ValidationStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from obligation computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObligationError {
    #[error("invalid SLA duration {value:?} on trigger {trigger_id}: {reason}")]
    InvalidSla {
        trigger_id: String,
        value: String,
        reason: String,
    },
}

/// Who must be notified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Supervisory authority or regulator.
    Regulator,
    /// Affected individuals.
    Individual,
    /// Media or public notice.
    Media,
    /// Internal stakeholders (board, DPO).
    Internal,
    /// Processors, vendors, or other contractual partners.
    Partner,
}

impl Audience {
    /// Ordering weight when deadlines tie. Regulators come first; a
    /// missed regulator window is the costliest failure.
    pub fn priority(&self) -> u8 {
        match self {
            Audience::Regulator => 0,
            Audience::Individual => 1,
            Audience::Media => 2,
            Audience::Internal => 3,
            Audience::Partner => 4,
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Audience::Regulator => "regulator",
            Audience::Individual => "individual",
            Audience::Media => "media",
            Audience::Internal => "internal",
            Audience::Partner => "partner",
        };
        f.write_str(s)
    }
}

/// A condition gating an obligation.
///
/// Predicates evaluate against the incident's [`DataScope`]; `Note`
/// carries qualifiers that cannot be evaluated mechanically (business
/// days, "without undue delay") through to the reviewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObligationCondition {
    /// At least this many records affected (evaluated against the
    /// bucket's upper bound).
    MinRecordsAffected { threshold: u64 },
    /// A specific taxonomy category must be present in the scope.
    CategoryPresent { category: String },
    /// The incident must span jurisdictions.
    CrossBorder,
    /// Opaque qualifier for human review; always treated as satisfied.
    Note { text: String },
}

impl ObligationCondition {
    /// Whether the condition holds for the given scope. `Note` is not a
    /// predicate and always holds.
    pub fn is_satisfied(&self, scope: &DataScope) -> bool {
        match self {
            ObligationCondition::MinRecordsAffected { threshold } => {
                scope.estimated_records_affected.upper_bound() >= *threshold
            }
            ObligationCondition::CategoryPresent { category } => {
                scope.category_phrases.iter().any(|c| c == category)
            }
            ObligationCondition::CrossBorder => scope.cross_border,
            ObligationCondition::Note { .. } => true,
        }
    }
}

/// One concrete notification deadline for an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationObligation {
    pub audience: Audience,
    /// Jurisdiction the deadline applies under; "global" when the
    /// source trigger cites no regulation.
    pub jurisdiction_code: String,
    /// Hard calendar deadline: T0 plus the trigger's SLA.
    pub due_at: DateTime<Utc>,
    /// Whether every evaluable condition held for this incident's
    /// scope. Unsatisfied obligations are still listed so reviewers see
    /// what was considered.
    pub conditions_satisfied: bool,
    /// Trigger this obligation came from.
    pub source_trigger_id: String,
    /// Regulation citation, when the trigger carries one.
    pub citation: Option<String>,
    /// Human-review qualifiers: condition notes, waiver rules, stale
    /// trigger warnings.
    pub review_notes: Vec<String>,
}

/// Parses the subset of ISO-8601 durations used for notification SLAs.
///
/// Supported designators: weeks (`P2W`), days (`P3D`), and the time
/// components hours, minutes, seconds after `T` (`PT72H`, `P1DT12H`).
/// Years and months are rejected; a month is not a fixed span of
/// calendar time and no regulation in the trigger set uses one.
pub fn parse_iso8601_duration(input: &str) -> Result<Duration, String> {
    let rest = input
        .strip_prefix('P')
        .ok_or_else(|| format!("{input:?} does not start with 'P'"))?;
    if rest.is_empty() {
        return Err("duration has no components".to_string());
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => {
            if t.is_empty() {
                return Err("'T' present but no time components follow".to_string());
            }
            (d, Some(t))
        }
        None => (rest, None),
    };

    let mut total = Duration::zero();
    let mut saw_component = false;

    let mut parse_components = |part: &str, in_time: bool| -> Result<(), String> {
        let mut digits = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            if digits.is_empty() {
                return Err(format!("designator '{ch}' has no value"));
            }
            let value: i64 = digits
                .parse()
                .map_err(|_| format!("value {digits:?} out of range"))?;
            digits.clear();
            let span = match (ch, in_time) {
                ('W', false) => Duration::try_weeks(value),
                ('D', false) => Duration::try_days(value),
                ('H', true) => Duration::try_hours(value),
                ('M', true) => Duration::try_minutes(value),
                ('S', true) => Duration::try_seconds(value),
                ('Y', false) | ('M', false) => {
                    return Err(format!(
                        "calendar designator '{ch}' is not supported for SLAs"
                    ));
                }
                _ => return Err(format!("unexpected designator '{ch}'")),
            }
            .ok_or_else(|| format!("component {value}{ch} is out of range"))?;
            total = total
                .checked_add(&span)
                .ok_or_else(|| "duration is out of range".to_string())?;
            saw_component = true;
        }
        if !digits.is_empty() {
            return Err(format!("trailing digits {digits:?} without a designator"));
        }
        Ok(())
    };

    parse_components(date_part, false)?;
    if let Some(t) = time_part {
        parse_components(t, true)?;
    }

    if !saw_component {
        return Err("duration has no components".to_string());
    }
    Ok(total)
}

/// Computes the notification schedule for an incident.
///
/// One obligation instance is produced per (trigger, obligation,
/// regulation jurisdiction); triggers without regulations fall back to
/// a single "global" instance. The result is sorted by deadline, then
/// audience priority, then jurisdiction code so the schedule is stable.
pub fn compute_obligations(
    triggers: &[&BreachTrigger],
    t0: DateTime<Utc>,
    scope: &DataScope,
) -> Result<Vec<NotificationObligation>, ObligationError> {
    let mut schedule = Vec::new();

    for trigger in triggers {
        for obligation in &trigger.obligations {
            let sla = parse_iso8601_duration(&obligation.sla).map_err(|reason| {
                ObligationError::InvalidSla {
                    trigger_id: trigger.id.clone(),
                    value: obligation.sla.clone(),
                    reason,
                }
            })?;
            let due_at = t0.checked_add_signed(sla).ok_or_else(|| {
                ObligationError::InvalidSla {
                    trigger_id: trigger.id.clone(),
                    value: obligation.sla.clone(),
                    reason: "deadline is outside the representable time range".to_string(),
                }
            })?;

            let conditions_satisfied = obligation
                .conditions
                .iter()
                .all(|c| c.is_satisfied(scope));

            let mut review_notes = Vec::new();
            for condition in &obligation.conditions {
                if let ObligationCondition::Note { text } = condition {
                    review_notes.push(text.clone());
                }
            }
            if let Some(waiver) = &obligation.waivable_if {
                review_notes.push(format!("waivable if: {waiver}"));
            }
            if trigger.validation == ValidationStatus::Outdated {
                review_notes.push(format!(
                    "trigger {} is outdated against its source regulation",
                    trigger.id
                ));
            }

            let jurisdictions: Vec<(String, Option<String>)> = if trigger.regulations.is_empty() {
                vec![("global".to_string(), None)]
            } else {
                trigger
                    .regulations
                    .iter()
                    .map(|r| (r.jurisdiction_code.clone(), Some(r.citation.clone())))
                    .collect()
            };

            for (jurisdiction_code, citation) in jurisdictions {
                schedule.push(NotificationObligation {
                    audience: obligation.audience,
                    jurisdiction_code,
                    due_at,
                    conditions_satisfied,
                    source_trigger_id: trigger.id.clone(),
                    citation,
                    review_notes: review_notes.clone(),
                });
            }
        }
    }

    schedule.sort_by(|a, b| {
        a.due_at
            .cmp(&b.due_at)
            .then(a.audience.priority().cmp(&b.audience.priority()))
            .then(a.jurisdiction_code.cmp(&b.jurisdiction_code))
    });
    Ok(schedule)
}

/// The earliest obligation whose conditions are satisfied, if any.
pub fn most_urgent(schedule: &[NotificationObligation]) -> Option<&NotificationObligation> {
    schedule.iter().find(|o| o.conditions_satisfied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::RecordsBucket;
    use crate::taxonomy::{RegulationSnapshot, TriggerObligation};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    fn trigger(id: &str, obligations: Vec<TriggerObligation>) -> BreachTrigger {
        BreachTrigger {
            id: id.to_string(),
            name: id.to_string(),
            category_ids: vec!["any".to_string()],
            obligations,
            regulations: Vec::new(),
            validation: ValidationStatus::Current,
        }
    }

    fn obligation(audience: Audience, sla: &str) -> TriggerObligation {
        TriggerObligation {
            audience,
            sla: sla.to_string(),
            conditions: Vec::new(),
            waivable_if: None,
        }
    }

    #[test]
    fn test_parse_hours_days_weeks() {
        assert_eq!(parse_iso8601_duration("PT72H").unwrap(), Duration::hours(72));
        assert_eq!(parse_iso8601_duration("P3D").unwrap(), Duration::days(3));
        assert_eq!(parse_iso8601_duration("P2W").unwrap(), Duration::weeks(2));
        assert_eq!(
            parse_iso8601_duration("P1DT12H").unwrap(),
            Duration::hours(36)
        );
        assert_eq!(
            parse_iso8601_duration("PT1H30M").unwrap(),
            Duration::minutes(90)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "P", "PT", "3D", "P3X", "PD", "P3", "P1Y", "P1M", "72H"] {
            assert!(parse_iso8601_duration(bad).is_err(), "accepted {bad:?}");
        }
        // 'M' after T is minutes, before T it would be months.
        assert!(parse_iso8601_duration("PT5M").is_ok());
        assert!(parse_iso8601_duration("P5M").is_err());
    }

    #[test]
    fn test_oversized_components_are_errors() {
        // Each of these overflows a chrono Duration somewhere in the
        // component or the running total.
        for huge in [
            "P9999999999999999W",
            "PT9223372036854775807H",
            "P106751991167DT24H",
        ] {
            assert!(parse_iso8601_duration(huge).is_err(), "accepted {huge:?}");
        }
    }

    #[test]
    fn test_unrepresentable_deadline_is_an_error() {
        // Parses to a valid Duration, but t0 plus it leaves the
        // representable DateTime range.
        let t = trigger("t1", vec![obligation(Audience::Regulator, "P1000000000W")]);
        let err = compute_obligations(&[&t], t0(), &DataScope::default()).unwrap_err();
        assert!(matches!(err, ObligationError::InvalidSla { .. }));
    }

    #[test]
    fn test_deadline_arithmetic_is_calendar_time() {
        let t = trigger("t1", vec![obligation(Audience::Regulator, "PT72H")]);
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert_eq!(
            schedule[0].due_at,
            Utc.with_ymd_and_hms(2024, 3, 18, 12, 30, 0).unwrap()
        );

        let t = trigger("t2", vec![obligation(Audience::Individual, "P30D")]);
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert_eq!(
            schedule[0].due_at,
            Utc.with_ymd_and_hms(2024, 4, 14, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_sort_due_at_then_audience_priority() {
        let t = trigger(
            "t1",
            vec![
                obligation(Audience::Media, "PT72H"),
                obligation(Audience::Regulator, "PT72H"),
                obligation(Audience::Individual, "PT72H"),
                obligation(Audience::Regulator, "PT24H"),
            ],
        );
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        let order: Vec<Audience> = schedule.iter().map(|o| o.audience).collect();
        assert_eq!(
            order,
            vec![
                Audience::Regulator,
                Audience::Regulator,
                Audience::Individual,
                Audience::Media,
            ]
        );
        // The PT24H regulator deadline leads.
        assert_eq!(schedule[0].due_at, t0() + Duration::hours(24));
    }

    #[test]
    fn test_fan_out_per_regulation_jurisdiction() {
        let mut t = trigger("t1", vec![obligation(Audience::Regulator, "PT72H")]);
        t.regulations = vec![
            RegulationSnapshot {
                citation: "GDPR Art. 33(1)".to_string(),
                jurisdiction_code: "eu".to_string(),
                revision_hash: "h1".to_string(),
            },
            RegulationSnapshot {
                citation: "UK GDPR Art. 33".to_string(),
                jurisdiction_code: "uk".to_string(),
                revision_hash: "h2".to_string(),
            },
        ];
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].jurisdiction_code, "eu");
        assert_eq!(schedule[1].jurisdiction_code, "uk");
        assert_eq!(schedule[0].citation.as_deref(), Some("GDPR Art. 33(1)"));
    }

    #[test]
    fn test_no_regulations_falls_back_to_global() {
        let t = trigger("t1", vec![obligation(Audience::Internal, "P1D")]);
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].jurisdiction_code, "global");
        assert!(schedule[0].citation.is_none());
    }

    #[test]
    fn test_conditions_evaluated_against_scope() {
        let mut ob = obligation(Audience::Regulator, "PT72H");
        ob.conditions = vec![
            ObligationCondition::MinRecordsAffected { threshold: 500 },
            ObligationCondition::CrossBorder,
        ];
        let t = trigger("t1", vec![ob]);

        let mut scope = DataScope::default();
        scope.estimated_records_affected = RecordsBucket::UpTo10K;
        scope.cross_border = true;
        let schedule = compute_obligations(&[&t], t0(), &scope).unwrap();
        assert!(schedule[0].conditions_satisfied);

        scope.cross_border = false;
        let schedule = compute_obligations(&[&t], t0(), &scope).unwrap();
        assert!(!schedule[0].conditions_satisfied);
        // Unsatisfied obligations stay listed.
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_note_conditions_become_review_notes() {
        let mut ob = obligation(Audience::Regulator, "PT72H");
        ob.conditions = vec![ObligationCondition::Note {
            text: "72h window counts business days in this jurisdiction".to_string(),
        }];
        ob.waivable_if = Some("data was encrypted at rest".to_string());
        let t = trigger("t1", vec![ob]);

        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert!(schedule[0].conditions_satisfied);
        assert_eq!(schedule[0].review_notes.len(), 2);
        assert!(schedule[0].review_notes[1].contains("encrypted at rest"));
    }

    #[test]
    fn test_outdated_trigger_flagged_for_review() {
        let mut t = trigger("t-old", vec![obligation(Audience::Regulator, "PT72H")]);
        t.validation = ValidationStatus::Outdated;
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        assert!(schedule[0].review_notes[0].contains("outdated"));
    }

    #[test]
    fn test_malformed_sla_is_an_error() {
        let t = trigger("t1", vec![obligation(Audience::Regulator, "72 hours")]);
        let err = compute_obligations(&[&t], t0(), &DataScope::default()).unwrap_err();
        match err {
            ObligationError::InvalidSla { trigger_id, value, .. } => {
                assert_eq!(trigger_id, "t1");
                assert_eq!(value, "72 hours");
            }
        }
    }

    #[test]
    fn test_most_urgent_skips_unsatisfied() {
        let mut gated = obligation(Audience::Regulator, "PT24H");
        gated.conditions = vec![ObligationCondition::CrossBorder];
        let t = trigger(
            "t1",
            vec![gated, obligation(Audience::Individual, "PT72H")],
        );
        let schedule =
            compute_obligations(&[&t], t0(), &DataScope::default()).unwrap();
        let urgent = most_urgent(&schedule).unwrap();
        assert_eq!(urgent.audience, Audience::Individual);
    }
}
