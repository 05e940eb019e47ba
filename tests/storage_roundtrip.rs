use suivi_vsx::downloader::to_csv;
use suivi_vsx::loader::from_csv_text;
use suivi_vsx::metrics::{MetricsRow, MetricsTable, Schema};
use suivi_vsx::storage::{Backend, CsvFile, MemoryStore};

fn sample_row(week: &str) -> MetricsRow {
    MetricsRow {
        week: week.to_string(),
        new_cases_j0: 50,
        returns_j7: 26,
        med_appointments: 40,
        psy_screenings: 30,
        at_risk_contacted: 12,
        hp_recalls: 8,
    }
}

#[tokio::test]
async fn missing_file_bootstraps_an_empty_table() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let backend = Backend::Csv(CsvFile::new(dir.path().join("data_vsx_suivi.csv")));

    let table = backend.load().await.expect("load should not fail");
    assert!(table.is_empty());
}

#[tokio::test]
async fn csv_file_round_trips_the_full_layout() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let backend = Backend::Csv(CsvFile::new(dir.path().join("data_vsx_suivi.csv")));

    let table = MetricsTable::new()
        .upsert(sample_row("Semaine 1"))
        .upsert(sample_row("Semaine 2"));
    backend.save(&table).await.expect("save");

    let reloaded = backend.load().await.expect("load");
    assert_eq!(reloaded, table);
    assert_eq!(reloaded.rows[0].at_risk_contacted, 12);
    assert_eq!(reloaded.rows[0].hp_recalls, 8);
}

#[tokio::test]
async fn double_submission_keeps_one_row_with_the_second_counters() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let backend = Backend::Csv(CsvFile::new(dir.path().join("data_vsx_suivi.csv")));

    // First submission.
    let table = backend.load().await.unwrap().upsert(sample_row("Semaine 1"));
    backend.save(&table).await.unwrap();

    // Second submission for the same week, different counters.
    let mut second = sample_row("Semaine 1");
    second.new_cases_j0 = 61;
    second.returns_j7 = 44;
    let table = backend.load().await.unwrap().upsert(second);
    backend.save(&table).await.unwrap();

    let stored = backend.load().await.unwrap();
    assert_eq!(stored.len(), 1);
    let row = stored.get("Semaine 1").unwrap();
    assert_eq!(row.new_cases_j0, 61);
    assert_eq!(row.returns_j7, 44);
}

#[tokio::test]
async fn memory_backend_runs_the_same_submit_flow() {
    let backend = Backend::Memory(MemoryStore::new(Schema::Full));

    let table = backend.load().await.unwrap();
    assert!(table.is_empty());

    let table = table.upsert(sample_row("Semaine 1"));
    backend.save(&table).await.unwrap();

    let reloaded = backend.load().await.unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get("Semaine 1").unwrap().returns_j7, 26);
}

#[test]
fn core_layout_writes_five_columns_and_reads_them_back() {
    let table = MetricsTable::new().upsert(sample_row("Semaine 1"));

    let csv = to_csv(&table, Schema::Core);
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "Semaine,Nouveaux_Cas_J0,Retours_J7,RDV_Doc_Med,Screening_Psy"
    );

    let reloaded = from_csv_text(&csv, Schema::Core).unwrap();
    let row = reloaded.get("Semaine 1").unwrap();
    assert_eq!(row.psy_screenings, 30);
    // The two full-layout counters are not part of the remote sheet.
    assert_eq!(row.at_risk_contacted, 0);
    assert_eq!(row.hp_recalls, 0);
}

#[test]
fn loader_rejects_a_foreign_header() {
    let text = "Week,Cases\nSemaine 1,50\n";
    assert!(from_csv_text(text, Schema::Core).is_err());
}

#[test]
fn loader_coerces_spreadsheet_float_exports() {
    let text = "Semaine,Nouveaux_Cas_J0,Retours_J7,RDV_Doc_Med,Screening_Psy\n\
                Semaine 1,50.0,26.0,,oops\n";
    let table = from_csv_text(text, Schema::Core).unwrap();
    let row = table.get("Semaine 1").unwrap();
    assert_eq!(row.new_cases_j0, 50);
    assert_eq!(row.returns_j7, 26);
    assert_eq!(row.med_appointments, 0);
    assert_eq!(row.psy_screenings, 0);
}

#[test]
fn quoted_week_names_survive_the_round_trip() {
    let mut row = sample_row("Semaine 1, rattrapage");
    row.hp_recalls = 3;
    let table = MetricsTable::new().upsert(row);

    let csv = to_csv(&table, Schema::Full);
    assert!(csv.contains("\"Semaine 1, rattrapage\""));

    let reloaded = from_csv_text(&csv, Schema::Full).unwrap();
    assert_eq!(reloaded, table);
}
