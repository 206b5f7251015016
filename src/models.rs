// Core data structures for the vigia monitor

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed applicant identification data submitted at the entry form step.
///
/// Loaded once from configuration and never mutated; the portal asks for the
/// same four values on every navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Passport number (document type is always "Pasaporte")
    pub passport_number: String,
    /// Full name as printed in the passport
    pub full_name: String,
    /// Four-digit birth year
    pub birth_year: String,
    /// Nationality as listed in the portal's country dropdown
    pub nationality: String,
}

impl Applicant {
    /// Check that all fields are present and the birth year is a plausible year
    pub fn is_complete(&self) -> bool {
        !self.passport_number.is_empty()
            && !self.full_name.is_empty()
            && !self.nationality.is_empty()
            && self.birth_year.len() == 4
            && self.birth_year.chars().all(|c| c.is_ascii_digit())
    }
}

/// One monitored province/workflow instance.
///
/// Immutable for the process lifetime; constructed at startup from
/// configuration and passed explicitly into the navigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Province name exactly as it appears in the portal's dropdown
    pub province: String,
    /// Applicant data submitted for this province
    pub applicant: Applicant,
}

impl Target {
    pub fn new(province: impl Into<String>, applicant: Applicant) -> Self {
        Self {
            province: province.into(),
            applicant,
        }
    }
}

/// A single available appointment slot extracted from the portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Appointment date, ISO `YYYY-MM-DD` when the portal value parses
    pub date: String,
    /// Appointment time, as rendered by the portal (e.g. "10:00")
    pub time: String,
    /// Office/location offering the slot
    pub location: String,
}

impl Slot {
    /// Create a slot, normalizing `dd/mm/yyyy` portal dates to ISO.
    ///
    /// Unparseable dates are carried through verbatim so a format drift on the
    /// portal side degrades the display rather than dropping the slot.
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            date: normalize_date(&date.into()),
            time: time.into(),
            location: location.into(),
        }
    }

    /// Format as a single display line
    pub fn display(&self) -> String {
        format!("{} {} — {}", self.date, self.time, self.location)
    }
}

/// Normalize a portal date string to ISO `YYYY-MM-DD`
fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    for fmt in ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

/// Classified result of checking one target's availability in a tick.
///
/// Exactly one outcome is produced per target per tick; only `SlotsFound`
/// triggers the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityOutcome {
    /// The portal showed a recognized "no appointments available" marker
    NoSlots,
    /// One or more slots were extracted from the final payload
    SlotsFound(Vec<Slot>),
    /// The response shape matched neither expected template, or a submission
    /// was rejected; the site contract likely changed
    WorkflowError(String),
    /// A network step exhausted its retries; the next tick starts over
    TransientFailure(String),
}

impl AvailabilityOutcome {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoSlots => "no-slots",
            Self::SlotsFound(_) => "slots-found",
            Self::WorkflowError(_) => "workflow-error",
            Self::TransientFailure(_) => "transient-failure",
        }
    }

    pub fn is_slots_found(&self) -> bool {
        matches!(self, Self::SlotsFound(_))
    }

    /// Slots carried by this outcome, if any
    pub fn slots(&self) -> Option<&[Slot]> {
        match self {
            Self::SlotsFound(slots) => Some(slots),
            _ => None,
        }
    }
}

impl std::fmt::Display for AvailabilityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSlots => write!(f, "no slots available"),
            Self::SlotsFound(slots) => write!(f, "{} slot(s) found", slots.len()),
            Self::WorkflowError(reason) => write!(f, "workflow error: {reason}"),
            Self::TransientFailure(reason) => write!(f, "transient failure: {reason}"),
        }
    }
}
