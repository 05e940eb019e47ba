use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum::Form;
use log::info;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Args;
use crate::downloader;
use crate::graph::{self, ChartOptions};
use crate::metrics::{MetricsRow, MetricsTable, Schema, WEEKS};
use crate::rates::{self, BASELINE_RATE, RatedTable, Status, with_rates};
use crate::storage::{Backend, StorageError};

/// Shared application state: the storage backend, passed explicitly to every
/// handler rather than living in a global.
pub struct AppState {
    pub backend: Backend,
}

/// Weekly entry form payload.
///
/// Counters are `u32`, so the numeric widget's `min=0 step=1` constraint is
/// mirrored at deserialization: a negative or fractional submission is
/// rejected with a 422 before it reaches the table. The two trailing fields
/// are absent from the core-layout form and default to 0.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub semaine: String,
    pub nouveaux_cas_j0: u32,
    pub retours_j7: u32,
    pub rdv_doc_med: u32,
    pub screening_psy: u32,
    #[serde(default)]
    pub risque_contactees: u32,
    #[serde(default)]
    pub rappels_hp: u32,
}

impl EntryForm {
    fn into_row(self) -> MetricsRow {
        MetricsRow {
            week: self.semaine,
            new_cases_j0: self.nouveaux_cas_j0,
            returns_j7: self.retours_j7,
            med_appointments: self.rdv_doc_med,
            psy_screenings: self.screening_psy,
            at_risk_contacted: self.risque_contactees,
            hp_recalls: self.rappels_hp,
        }
    }
}

/// Start the web application on the configured address.
pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let backend = args.build_backend()?;
    info!(
        "storage backend: {} ({} layout)",
        backend.describe(),
        backend.schema().as_str()
    );

    let app_state = Arc::new(AppState { backend });

    let app = Router::new()
        .route("/", get(dashboard))
        .route("/saisie", get(entry_page).post(submit_entry))
        .route("/medical", get(medical_page))
        .route("/psy", get(psy_page))
        .route("/chart/retour.png", get(chart_retour))
        .route("/chart/medical.png", get(chart_medical))
        .route("/chart/psy.png", get(chart_psy))
        .route("/export.csv", get(export_csv))
        .route("/export.xlsx", get(export_xlsx))
        .route("/api/table", get(api_table))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    let listener = TcpListener::bind(&args.bind).await?;
    println!("Suivi VSX en écoute sur http://{}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Pages ---

async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };

    if table.is_empty() {
        let body = r#"<div class="notice">Aucune donnée disponible. Allez dans « Saisie des Données ».</div>"#;
        return page(&state, "dash", "Tableau de Bord de Performance VSX", body.to_string());
    }

    let rated = with_rates(&table);
    let latest = rated.latest_return_rate().unwrap_or(0.0);
    let status = Status::classify(latest);
    let mean = rated.mean_return_rate();
    let delta = latest - BASELINE_RATE;

    let body = format!(
        r#"<div class="cards">
  <div class="card"><div class="card-label">Taux de Retour Actuel</div>
    <div class="card-value">{latest:.1}%</div>
    <div class="card-sub">{delta:+.1}% vs baseline</div></div>
  <div class="card"><div class="card-label">Statut Performance</div>
    <div class="card-value status-{status_class}">{status_label}</div></div>
  <div class="card"><div class="card-label">Taux de Retour Moyen</div>
    <div class="card-value">{mean:.1}%</div></div>
  <div class="card"><div class="card-label">Baseline Initiale</div>
    <div class="card-value">{baseline:.0}%</div></div>
</div>
<h2>Évolution du Taux de Retour (%)</h2>
<img class="chart" src="/chart/retour.png" alt="Évolution du taux de retour">
<h2>Données brutes</h2>
{table}"#,
        status_class = status.as_str(),
        status_label = status.label(),
        baseline = BASELINE_RATE,
        table = table_html(&rated, state.backend.schema()),
    );

    page(&state, "dash", "Tableau de Bord de Performance VSX", body)
}

async fn entry_page(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };
    entry_page_with(&state, &table, None)
}

async fn submit_entry(
    State(state): State<Arc<AppState>>,
    Form(form): Form<EntryForm>,
) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };

    let week = form.semaine.clone();
    let updated = table.upsert(form.into_row());

    match state.backend.save(&updated).await {
        Ok(()) => {
            info!("saved metrics for {}", week);
            let flash = format!(
                r#"<div class="flash-ok">Données de la {} enregistrées !</div>"#,
                escape_html(&week)
            );
            entry_page_with(&state, &updated, Some(flash))
        }
        Err(e) => {
            let flash = format!(
                r#"<div class="flash-err">Échec de l'enregistrement : {}</div>"#,
                escape_html(&e.to_string())
            );
            entry_page_with(&state, &updated, Some(flash))
        }
    }
}

fn entry_page_with(state: &AppState, table: &MetricsTable, flash: Option<String>) -> Response {
    let schema = state.backend.schema();
    let week_options: String = WEEKS
        .iter()
        .map(|w| format!(r#"<option value="{w}">{w}</option>"#))
        .collect();

    let extra_fields = if schema == Schema::Full {
        r#"    <label>Patientes à risque contactées
      <input type="number" name="risque_contactees" min="0" step="1" value="0" required></label>
    <label>Patientes rappelées par HP
      <input type="number" name="rappels_hp" min="0" step="1" value="0" required></label>
"#
    } else {
        ""
    };

    let rated = with_rates(table);
    let body = format!(
        r#"{flash}
<form method="post" action="/saisie" class="entry-form">
  <label>Semaine
    <select name="semaine">{week_options}</select></label>
  <label>Nouveaux Cas J0
    <input type="number" name="nouveaux_cas_j0" min="0" step="1" value="0" required></label>
  <label>Patientes revenues à J7
    <input type="number" name="retours_j7" min="0" step="1" value="0" required></label>
  <label>Fiches avec RDV bien documenté
    <input type="number" name="rdv_doc_med" min="0" step="1" value="0" required></label>
  <label>Dossiers avec screening Psy
    <input type="number" name="screening_psy" min="0" step="1" value="0" required></label>
{extra_fields}  <button type="submit">Enregistrer les données</button>
</form>
<h2>Données brutes</h2>
{table}"#,
        flash = flash.unwrap_or_default(),
        table = table_html(&rated, schema),
    );

    page(state, "saisie", "Saisie des indicateurs hebdomadaires", body)
}

async fn medical_page(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };
    if table.is_empty() {
        let body = r#"<div class="notice">Aucune donnée disponible.</div>"#;
        return page(&state, "medical", "Analyse : Axe Médical", body.to_string());
    }

    let body = r#"<p>Indicateur : % de fiches avec rendez-vous documenté correctement.</p>
<img class="chart" src="/chart/medical.png" alt="Taux de RDV documentés">"#;
    page(&state, "medical", "Analyse : Axe Médical", body.to_string())
}

async fn psy_page(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };
    if table.is_empty() {
        let body = r#"<div class="notice">Aucune donnée disponible.</div>"#;
        return page(&state, "psy", "Analyse : Axe Psy/HP", body.to_string());
    }

    let intro = if state.backend.schema() == Schema::Full {
        "Performance Screening Psychosocial et Rappels HP."
    } else {
        "Performance Screening Psychosocial."
    };
    let body = format!(
        r#"<p>{intro}</p>
<img class="chart" src="/chart/psy.png" alt="Screening psychosocial">"#
    );
    page(&state, "psy", "Analyse : Axe Psy/HP", body)
}

// --- Charts ---

async fn chart_retour(State(state): State<Arc<AppState>>) -> Response {
    let rated = match load_rated(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let weeks = week_labels(&rated);
    let values: Vec<f64> = rated.rows.iter().map(|r| r.return_rate).collect();
    png_response(graph::rate_line_chart(
        &weeks,
        &[("Taux de retour", values)],
        Some(rates::TARGET_RATE),
        &graph::return_rate_options(),
    ))
}

async fn chart_medical(State(state): State<Arc<AppState>>) -> Response {
    let rated = match load_rated(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let weeks = week_labels(&rated);
    let values: Vec<f64> = rated.rows.iter().map(|r| r.doc_rate).collect();
    let options = ChartOptions {
        title: "% fiches avec RDV documenté".to_string(),
        y_label: "RDV documentés (%)".to_string(),
        ..Default::default()
    };
    png_response(graph::rate_bar_chart(&weeks, &values, &options))
}

async fn chart_psy(State(state): State<Arc<AppState>>) -> Response {
    let rated = match load_rated(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let weeks = week_labels(&rated);
    let screening: Vec<f64> = rated.rows.iter().map(|r| r.screening_rate).collect();
    let options = ChartOptions {
        title: "Screening Psy et Rappels HP".to_string(),
        y_label: "%".to_string(),
        ..Default::default()
    };

    let mut series: Vec<(&str, Vec<f64>)> = vec![("% Screening Psy", screening)];
    if state.backend.schema() == Schema::Full {
        let recalls: Vec<f64> = rated.rows.iter().map(|r| r.recall_rate).collect();
        series.push(("% Rappels HP", recalls));
    }
    png_response(graph::rate_line_chart(&weeks, &series, None, &options))
}

// --- Exports and JSON view ---

async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };
    let csv = downloader::to_csv(&table, state.backend.schema());
    attachment_response(csv.into_bytes(), "text/csv; charset=utf-8", "Export_VSX.csv")
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Response {
    let table = match state.backend.load().await {
        Ok(t) => t,
        Err(e) => return storage_error_page(&state, &e),
    };
    match downloader::to_xlsx(&table, state.backend.schema()) {
        Ok(bytes) => attachment_response(
            bytes,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "Export_VSX.xlsx",
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("export impossible : {e}"),
        )
            .into_response(),
    }
}

async fn api_table(State(state): State<Arc<AppState>>) -> Response {
    match state.backend.load().await {
        Ok(table) => Json(with_rates(&table)).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// --- Helpers ---

async fn load_rated(state: &AppState) -> Result<RatedTable, Response> {
    match state.backend.load().await {
        Ok(table) if table.is_empty() => {
            Err((StatusCode::NOT_FOUND, "aucune donnée").into_response())
        }
        Ok(table) => Ok(with_rates(&table)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, e.to_string()).into_response()),
    }
}

fn week_labels(rated: &RatedTable) -> Vec<String> {
    rated.rows.iter().map(|r| r.raw.week.clone()).collect()
}

fn png_response(result: Result<Vec<u8>, Box<dyn std::error::Error>>) -> Response {
    match result {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/png")
            .body(axum::body::Body::from(bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn attachment_response(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Render the raw table with its derived rate columns as an HTML table.
fn table_html(rated: &RatedTable, schema: Schema) -> String {
    let mut headers: Vec<&str> = schema.headers().to_vec();
    headers.push("Taux_Retour");
    headers.push("Taux_RDV_Doc");
    headers.push("Taux_Screening_Psy");
    if schema == Schema::Full {
        headers.push("Taux_Rappels_HP");
    }

    let head: String = headers
        .iter()
        .map(|h| format!("<th>{h}</th>"))
        .collect();

    let rows: String = rated
        .rows
        .iter()
        .map(|r| {
            let mut cells = vec![escape_html(&r.raw.week)];
            cells.extend(r.raw.counters(schema).iter().map(|v| v.to_string()));
            cells.push(format!("{:.1}", r.return_rate));
            cells.push(format!("{:.1}", r.doc_rate));
            cells.push(format!("{:.1}", r.screening_rate));
            if schema == Schema::Full {
                cells.push(format!("{:.1}", r.recall_rate));
            }
            let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
            format!("<tr>{tds}</tr>")
        })
        .collect();

    format!(r#"<table class="data"><thead><tr>{head}</tr></thead><tbody>{rows}</tbody></table>"#)
}

fn storage_error_page(state: &AppState, error: &StorageError) -> Response {
    let body = format!(
        r#"<div class="flash-err">Stockage inaccessible : {}</div>
<p>Vérifiez la connexion au service de feuille de calcul puis rechargez la page.</p>"#,
        escape_html(&error.to_string())
    );
    let html = page_html(state, "", "Stockage indisponible", &body);
    (StatusCode::BAD_GATEWAY, Html(html)).into_response()
}

fn page(state: &AppState, active: &str, title: &str, body: String) -> Response {
    Html(page_html(state, active, title, &body)).into_response()
}

/// Shared page shell: header, navigation, content, footer.
fn page_html(state: &AppState, active: &str, title: &str, body: &str) -> String {
    let nav_items = [
        ("dash", "/", "Tableau de Bord"),
        ("saisie", "/saisie", "Saisie des Données"),
        ("medical", "/medical", "Axe Médical"),
        ("psy", "/psy", "Axe Psy/HP"),
    ];
    let nav: String = nav_items
        .iter()
        .map(|(key, href, label)| {
            let class = if *key == active { " class=\"active\"" } else { "" };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect();

    let generated = chrono::Local::now().format("%d/%m/%Y %H:%M");

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Suivi VSX — {title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header>
  <h1>🩺 Suivi VSX</h1>
  <nav>{nav}
    <a href="/export.csv">Export CSV</a>
    <a href="/export.xlsx">Export Excel</a></nav>
</header>
<main>
<h1>{title}</h1>
{body}
</main>
<footer>Source : {backend} — généré le {generated}</footer>
</body>
</html>"#,
        backend = escape_html(&state.backend.describe()),
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
