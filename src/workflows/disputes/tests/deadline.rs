use chrono::Duration;

use super::common::ts;
use crate::workflows::disputes::deadline::{is_overdue, DeadlineRules, DeadlineWindow};

#[test]
fn due_date_adds_configured_days() {
    let rules = DeadlineRules::statutory();
    let reference = ts(2026, 3, 2);

    let due = rules.due_date(DeadlineWindow::Defense, reference);

    assert_eq!(due, reference + Duration::days(rules.defense_days));
}

#[test]
fn each_window_reads_its_own_term() {
    let rules = DeadlineRules {
        defense_days: 1,
        evidence_days: 2,
        final_allegations_days: 3,
        appeal_days: 4,
        allegations_days: 5,
        recourse_days: 6,
        counter_allegations_days: 7,
    };

    assert_eq!(rules.days_for(DeadlineWindow::Defense), 1);
    assert_eq!(rules.days_for(DeadlineWindow::Evidence), 2);
    assert_eq!(rules.days_for(DeadlineWindow::FinalAllegations), 3);
    assert_eq!(rules.days_for(DeadlineWindow::Appeal), 4);
    assert_eq!(rules.days_for(DeadlineWindow::Allegations), 5);
    assert_eq!(rules.days_for(DeadlineWindow::Recourse), 6);
    assert_eq!(rules.days_for(DeadlineWindow::CounterAllegations), 7);
}

#[test]
fn absent_due_date_is_never_overdue() {
    assert!(!is_overdue(None, ts(2026, 5, 1)));
}

#[test]
fn boundary_is_exclusive_at_the_due_instant() {
    let due = ts(2026, 4, 10);

    assert!(!is_overdue(Some(due), due - Duration::seconds(1)));
    assert!(!is_overdue(Some(due), due));
    assert!(is_overdue(Some(due), due + Duration::seconds(1)));
}
