use suivi_vsx::metrics::{MetricsRow, MetricsTable, Schema};
use suivi_vsx::rates::{Status, with_rates};
use suivi_vsx::{downloader, loader};

// Helper to build a row with only the return-rate counters set
fn row(week: &str, cases: u32, returns: u32) -> MetricsRow {
    MetricsRow {
        week: week.to_string(),
        new_cases_j0: cases,
        returns_j7: returns,
        ..Default::default()
    }
}

fn check_upsert() {
    println!("\n====== Checking upsert ======");
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 40, 30));
    assert_eq!(table.len(), 2);
    println!("✓ Two distinct weeks give two rows");

    let table = table.upsert(row("Semaine 1", 60, 45));
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("Semaine 1").unwrap().new_cases_j0, 60);
    assert_eq!(table.latest().unwrap().week, "Semaine 1");
    println!("✓ Resubmitting a week replaces its row and moves it last");
}

fn check_rates() {
    println!("\n====== Checking derived rates ======");
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 0, 0));
    let rated = with_rates(&table);

    assert_eq!(rated.rows[0].return_rate, 52.0);
    println!("✓ 26/50 computes to 52.0%");
    assert_eq!(rated.rows[1].return_rate, 0.0);
    println!("✓ Zero denominator fills 0.0 instead of dividing");

    assert_eq!(Status::classify(52.0), Status::Alert);
    assert_eq!(rated.latest_status(), Some(Status::Alert));
    println!("✓ Latest week classifies from its own rate");
}

fn check_csv_round_trip() {
    println!("\n====== Checking CSV round trip ======");
    let table = MetricsTable::new()
        .upsert(row("Semaine 1", 50, 26))
        .upsert(row("Semaine 2", 71, 37));

    let csv = downloader::to_csv(&table, Schema::Full);
    let reloaded = loader::from_csv_text(&csv, Schema::Full).unwrap();
    assert_eq!(reloaded, table);
    println!("✓ to_csv then from_csv_text restores the table");
}

fn main() {
    check_upsert();
    check_rates();
    check_csv_round_trip();
    println!("\nAll model checks passed.");
}
