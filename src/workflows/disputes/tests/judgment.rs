use super::common::ts;
use crate::workflows::disputes::domain::DisputeError;
use crate::workflows::disputes::judgment::{
    AdmissibilityDecision, AdmissibilityOutcome, Judgment, MeritsDecision, VoteTally,
};

#[test]
fn tally_rejects_votes_beyond_quorum() {
    match VoteTally::new(4, 3, 1, 0, 7) {
        Err(DisputeError::InvalidInput(message)) => {
            assert!(message.contains("8 votes"));
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn tally_rejects_empty_quorum() {
    assert!(matches!(
        VoteTally::new(0, 0, 0, 0, 0),
        Err(DisputeError::InvalidInput(_))
    ));
}

#[test]
fn tally_allows_members_who_did_not_vote() {
    let tally = VoteTally::new(3, 1, 0, 1, 7).expect("five votes fit a quorum of seven");
    assert_eq!(tally.recorded_votes(), 5);
}

#[test]
fn unanimity_means_no_dissent_and_no_abstention() {
    let unanimous = VoteTally::new(5, 0, 0, 1, 7).expect("valid tally");
    assert!(unanimous.unanimous());

    let with_abstention = VoteTally::new(5, 0, 1, 0, 7).expect("valid tally");
    assert!(!with_abstention.unanimous());
}

#[test]
fn approval_requires_simple_majority_of_quorum() {
    let approved = VoteTally::new(4, 2, 1, 0, 7).expect("valid tally");
    assert!(approved.approved());

    let short = VoteTally::new(3, 2, 1, 0, 7).expect("valid tally");
    assert!(!short.approved());

    // An even split is not a majority.
    let split = VoteTally::new(3, 3, 0, 0, 6).expect("valid tally");
    assert!(!split.approved());
}

#[test]
fn judgment_summary_reports_tally() {
    let judgment = Judgment {
        decision: MeritsDecision::Upheld,
        rationale: "conduct proven".to_string(),
        decided_at: ts(2026, 6, 1),
        tally: Some(VoteTally::new(4, 2, 0, 0, 7).expect("valid tally")),
        allows_appeal: true,
    };
    let summary = judgment.summary();
    assert!(summary.contains("upheld"));
    assert!(summary.contains("4 to 2"));

    let unanimous = Judgment {
        tally: Some(VoteTally::new(6, 0, 0, 0, 7).expect("valid tally")),
        ..judgment
    };
    assert!(unanimous.summary().contains("unanimously"));
}

#[test]
fn admissibility_summary_carries_outcome() {
    let decision = AdmissibilityDecision {
        outcome: AdmissibilityOutcome::NotAdmitted,
        rationale: "filed outside the electoral calendar".to_string(),
        decided_at: ts(2026, 2, 20),
    };
    assert!(decision.summary().contains("not admitted"));
}
