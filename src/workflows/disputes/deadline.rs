//! Statutory deadline arithmetic.
//!
//! Every timestamp in the engine is `DateTime<Utc>`; inputs arriving with an
//! offset are normalized at the serde boundary, so a filing from any regional
//! office lands on the same reference zone and day arithmetic cannot drift.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Response windows opened by the dispute processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineWindow {
    Defense,
    Evidence,
    FinalAllegations,
    Appeal,
    Allegations,
    Recourse,
    CounterAllegations,
}

impl DeadlineWindow {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Defense => "defense",
            Self::Evidence => "evidence production",
            Self::FinalAllegations => "final allegations",
            Self::Appeal => "appeal",
            Self::Allegations => "allegations",
            Self::Recourse => "recourse",
            Self::CounterAllegations => "counter-allegations",
        }
    }
}

/// Day counts per response window. Statutory terms change between election
/// cycles, so they are data loaded from configuration, never constants in the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineRules {
    pub defense_days: i64,
    pub evidence_days: i64,
    pub final_allegations_days: i64,
    pub appeal_days: i64,
    pub allegations_days: i64,
    pub recourse_days: i64,
    pub counter_allegations_days: i64,
}

impl DeadlineRules {
    /// Terms of the current electoral regulation, used when configuration
    /// supplies no override.
    pub const fn statutory() -> Self {
        Self {
            defense_days: 15,
            evidence_days: 10,
            final_allegations_days: 7,
            appeal_days: 15,
            allegations_days: 5,
            recourse_days: 15,
            counter_allegations_days: 10,
        }
    }

    pub const fn days_for(&self, window: DeadlineWindow) -> i64 {
        match window {
            DeadlineWindow::Defense => self.defense_days,
            DeadlineWindow::Evidence => self.evidence_days,
            DeadlineWindow::FinalAllegations => self.final_allegations_days,
            DeadlineWindow::Appeal => self.appeal_days,
            DeadlineWindow::Allegations => self.allegations_days,
            DeadlineWindow::Recourse => self.recourse_days,
            DeadlineWindow::CounterAllegations => self.counter_allegations_days,
        }
    }

    /// Due instant for a window counted from `reference`.
    pub fn due_date(&self, window: DeadlineWindow, reference: DateTime<Utc>) -> DateTime<Utc> {
        reference + Duration::days(self.days_for(window))
    }
}

impl Default for DeadlineRules {
    fn default() -> Self {
        Self::statutory()
    }
}

/// A window a case has not entered yet (`None`) is never overdue, and the due
/// instant itself still counts as inside the window.
pub fn is_overdue(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(due, Some(due) if now > due)
}
