//! Decision records: admissibility, first-instance judgment, appeal, and the
//! collegiate vote tally with its quorum invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::DisputeError;

/// Committee vote counts for a collegiate decision. Constructed only through
/// [`VoteTally::new`], so a stored tally never records more votes than members
/// present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    favor: u8,
    against: u8,
    abstention: u8,
    recused: u8,
    quorum_present: u8,
}

impl VoteTally {
    pub fn new(
        favor: u8,
        against: u8,
        abstention: u8,
        recused: u8,
        quorum_present: u8,
    ) -> Result<Self, DisputeError> {
        if quorum_present == 0 {
            return Err(DisputeError::InvalidInput(
                "a collegiate decision requires at least one member present".to_string(),
            ));
        }

        let recorded =
            u16::from(favor) + u16::from(against) + u16::from(abstention) + u16::from(recused);
        if recorded > u16::from(quorum_present) {
            return Err(DisputeError::InvalidInput(format!(
                "{recorded} votes recorded but only {quorum_present} members present"
            )));
        }

        Ok(Self {
            favor,
            against,
            abstention,
            recused,
            quorum_present,
        })
    }

    pub const fn favor(&self) -> u8 {
        self.favor
    }

    pub const fn against(&self) -> u8 {
        self.against
    }

    pub const fn abstention(&self) -> u8 {
        self.abstention
    }

    pub const fn recused(&self) -> u8 {
        self.recused
    }

    pub const fn quorum_present(&self) -> u8 {
        self.quorum_present
    }

    pub fn recorded_votes(&self) -> u16 {
        u16::from(self.favor)
            + u16::from(self.against)
            + u16::from(self.abstention)
            + u16::from(self.recused)
    }

    pub const fn unanimous(&self) -> bool {
        self.against == 0 && self.abstention == 0
    }

    /// Favor votes form a simple majority of the members present.
    pub fn approved(&self) -> bool {
        u16::from(self.favor) * 2 > u16::from(self.quorum_present)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissibilityOutcome {
    Admitted,
    NotAdmitted,
}

impl AdmissibilityOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::NotAdmitted => "not admitted",
        }
    }
}

/// Gate decision on whether a filed case meets the formal requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissibilityDecision {
    pub outcome: AdmissibilityOutcome,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
}

impl AdmissibilityDecision {
    pub fn summary(&self) -> String {
        format!("complaint {}: {}", self.outcome.label(), self.rationale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeritsDecision {
    Upheld,
    PartiallyUpheld,
    Dismissed,
}

impl MeritsDecision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upheld => "upheld",
            Self::PartiallyUpheld => "partially upheld",
            Self::Dismissed => "dismissed",
        }
    }
}

/// First-instance judgment. Holding the decision and its date in one record
/// keeps them set together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgment {
    pub decision: MeritsDecision,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
    pub tally: Option<VoteTally>,
    pub allows_appeal: bool,
}

impl Judgment {
    pub fn summary(&self) -> String {
        match &self.tally {
            Some(tally) if tally.unanimous() => {
                format!("{} unanimously: {}", self.decision.label(), self.rationale)
            }
            Some(tally) => format!(
                "{} by {} to {}: {}",
                self.decision.label(),
                tally.favor(),
                tally.against(),
                self.rationale
            ),
            None => format!("{}: {}", self.decision.label(), self.rationale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealOutcome {
    Upheld,
    PartiallyUpheld,
    Denied,
}

impl AppealOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upheld => "appeal upheld",
            Self::PartiallyUpheld => "appeal partially upheld",
            Self::Denied => "appeal denied",
        }
    }
}

/// Second-instance decision on a filed appeal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppealJudgment {
    pub outcome: AppealOutcome,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
    pub tally: Option<VoteTally>,
}

impl AppealJudgment {
    pub fn summary(&self) -> String {
        format!("{}: {}", self.outcome.label(), self.rationale)
    }
}

/// Appeal record: the fundamentals filed in first instance plus the eventual
/// second-instance judgment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appeal {
    pub rationale: String,
    pub filed_at: DateTime<Utc>,
    pub judgment: Option<AppealJudgment>,
}
