use saphyr_json::budget::{Budget, BudgetBreach};
use saphyr_json::{BudgetReport, Error, Options, check_yaml_budget, from_multiple_with_options, from_str_with_options};
use std::sync::Mutex;

fn document_storm_yaml(count: usize) -> String {
    let mut yaml = String::new();
    for idx in 0..count {
        yaml.push_str("--- \"");
        yaml.push_str(&format!("doc{idx}"));
        yaml.push_str("\"\n");
    }
    yaml
}

#[test]
fn excessive_document_storm_is_rejected() {
    let limit = Budget::default().max_documents;
    let yaml = document_storm_yaml(limit + 1);
    let report = check_yaml_budget(&yaml, &Budget::default()).unwrap();
    assert!(
        matches!(report.breached, Some(BudgetBreach::Documents { .. })),
        "expected document limit breach, got {:?}",
        report.breached
    );
}

#[test]
fn deep_nesting_is_rejected_before_conversion() {
    let depth = 50;
    let yaml = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let options = Options {
        budget: Some(saphyr_json::budget! { max_depth: 10 }),
        ..Options::default()
    };
    let err = from_str_with_options(&yaml, options).unwrap_err();
    assert!(
        matches!(err.inner(), Error::Budget { breach: BudgetBreach::Depth { depth: 11 }, .. }),
        "{err:?}"
    );
}

#[test]
fn scalar_bytes_are_limited() {
    let budget = Budget {
        max_total_scalar_bytes: 16,
        ..Budget::default()
    };
    let report = check_yaml_budget("a: 0123456789\nb: 0123456789\n", &budget).unwrap();
    assert!(
        matches!(report.breached, Some(BudgetBreach::ScalarBytes { .. })),
        "{:?}",
        report.breached
    );
}

#[test]
fn within_budget_report_counts_everything() {
    let yaml = "a: &x [1, 2]\nb: *x\nc:\n  <<: {k: v}\n";
    let report = check_yaml_budget(yaml, &Budget::default()).unwrap();
    assert!(report.breached.is_none());
    assert_eq!(report.documents, 1);
    assert_eq!(report.aliases, 1);
    assert_eq!(report.anchors, 1);
    assert_eq!(report.merge_keys, 1);
    assert_eq!(report.max_depth, 2);
}

#[test]
fn budget_can_be_disabled() {
    let options = Options {
        budget: None,
        ..Options::default()
    };
    let yaml = document_storm_yaml(Budget::default().max_documents + 1);
    let values = from_multiple_with_options(&yaml, options).unwrap();
    assert_eq!(values.len(), Budget::default().max_documents + 1);
}

static REPORTS: Mutex<Vec<BudgetReport>> = Mutex::new(Vec::new());

fn record(report: &BudgetReport) {
    REPORTS.lock().unwrap().push(report.clone());
}

#[test]
fn budget_report_callback_sees_the_breach() {
    let options = Options {
        budget: Some(Budget {
            max_aliases: 1,
            ..Budget::default()
        }),
        budget_report: Some(record),
        ..Options::default()
    };
    let err = from_str_with_options("a: &x 1\nb: *x\nc: *x\n", options).unwrap_err();
    assert!(matches!(err.inner(), Error::Budget { .. }), "{err:?}");
    let reports = REPORTS.lock().unwrap();
    assert_eq!(
        reports.last().and_then(|r| r.breached.clone()),
        Some(BudgetBreach::Aliases { aliases: 2 })
    );
}
