use suivi_vsx::metrics::{MetricsRow, MetricsTable};
use suivi_vsx::rates::{BASELINE_RATE, Status, ratio, with_rates};

fn row(week: &str, cases: u32, returns: u32) -> MetricsRow {
    MetricsRow {
        week: week.to_string(),
        new_cases_j0: cases,
        returns_j7: returns,
        ..Default::default()
    }
}

#[test]
fn upsert_of_a_new_week_appends() {
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 40, 30));

    let before = table.len();
    let table = table.upsert(row("Semaine 3", 30, 21));

    assert_eq!(table.len(), before + 1);
    assert_eq!(
        table.rows.iter().filter(|r| r.week == "Semaine 3").count(),
        1
    );
    assert_eq!(table.latest().unwrap().week, "Semaine 3");
}

#[test]
fn upsert_of_an_existing_week_replaces_the_row() {
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 40, 30));

    let table = table.upsert(row("Semaine 1", 60, 45));

    assert_eq!(table.len(), 2);
    let replaced = table.get("Semaine 1").unwrap();
    assert_eq!(replaced.new_cases_j0, 60);
    assert_eq!(replaced.returns_j7, 45);
    // The replaced row moves to the end, like a fresh submission.
    assert_eq!(table.latest().unwrap().week, "Semaine 1");
}

#[test]
fn upsert_accepts_a_key_outside_the_fixed_week_list() {
    let table = MetricsTable::new().upsert(row("Semaine 12", 10, 5));
    assert_eq!(table.len(), 1);
    assert!(table.get("Semaine 12").is_some());
}

#[test]
fn zero_denominator_fills_zero() {
    assert_eq!(ratio(0, 0), 0.0);
    assert_eq!(ratio(37, 0), 0.0);

    let rated = with_rates(&MetricsTable::new().upsert(row("Semaine 1", 0, 3)));
    let r = &rated.rows[0];
    assert_eq!(r.return_rate, 0.0);
    assert_eq!(r.doc_rate, 0.0);
    assert_eq!(r.screening_rate, 0.0);
    assert_eq!(r.recall_rate, 0.0);
    assert!(r.return_rate.is_finite());
}

#[test]
fn rates_reproduce_exact_arithmetic() {
    assert_eq!(ratio(26, 50), 52.0);
    assert!((ratio(37, 71) - 52.112_676_056_338_03).abs() < 1e-9);

    let table = MetricsTable::new().upsert(MetricsRow {
        week: "Semaine 1".to_string(),
        new_cases_j0: 40,
        returns_j7: 28,
        med_appointments: 30,
        psy_screenings: 20,
        at_risk_contacted: 5,
        hp_recalls: 10,
    });
    let r = &with_rates(&table).rows[0];
    assert_eq!(r.return_rate, 70.0);
    assert_eq!(r.doc_rate, 75.0);
    assert_eq!(r.screening_rate, 50.0);
    assert_eq!(r.recall_rate, 25.0);
}

#[test]
fn status_thresholds_are_half_open() {
    assert_eq!(Status::classify(59.9), Status::Alert);
    assert_eq!(Status::classify(60.0), Status::Medium);
    assert_eq!(Status::classify(69.9), Status::Medium);
    assert_eq!(Status::classify(70.0), Status::TargetMet);
}

#[test]
fn first_submission_scenario() {
    // Empty table, then one submitted week: 50 new cases, 26 returns.
    let table = MetricsTable::new().upsert(row("Semaine 1", 50, 26));
    let rated = with_rates(&table);

    assert_eq!(rated.rows.len(), 1);
    let rate = rated.latest_return_rate().unwrap();
    assert_eq!(rate, 52.0);
    assert_eq!(rate, BASELINE_RATE);
    // 52 is below the 60% alert threshold.
    assert_eq!(rated.latest_status(), Some(Status::Alert));
}

#[test]
fn mean_rate_is_a_plain_average() {
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 100, 70));
    let rated = with_rates(&table);
    assert_eq!(rated.mean_return_rate(), 61.0);

    assert_eq!(with_rates(&MetricsTable::new()).mean_return_rate(), 0.0);
}
