/*!
# Suivi VSX

Weekly follow-up metrics dashboard for the VSX medical outreach program,
built in Rust.

## Overview

The program tracks a handful of weekly counters (new cases at day 0, returns
at day 7, documented medical appointments, psychosocial screenings, at-risk
contacts, HP recalls), derives percentage rates from them, and renders the
result as a small web dashboard with KPI cards and charts. Data is entered
through a weekly form and persisted as one flat table.

## Architecture

The application follows a load → compute → render cycle on every page view:

### Storage Layer
- **Backends**: local CSV file (full 7-column layout), remote spreadsheet
  service over HTTP (core 5-column layout, TTL-cached reads), in-memory
  store for tests
- One `load`/`save` contract; the whole table is read and replaced as a
  single blob, with no partial updates

### Computation Layer
- **Upsert** - insert-or-replace of a week's row, keyed by the week name
- **Derived rates** - four percentage columns recomputed from the raw
  counters on every read, zero-filled on a zero denominator
- **Status classification** - alert / medium / target-met against fixed
  thresholds (60% and 70%), with a 52% display baseline

### Presentation Layer
- **Technologies**: axum, plotters, rust_xlsxwriter
- Server-rendered pages: dashboard, data entry, medical axis, psy/HP axis
- PNG chart endpoints (line chart with the 70% target line, color-scaled
  bar chart) and CSV/XLSX export downloads

## Modules

- **metrics**: table model, column layouts and the upsert operation
- **rates**: derived-rate arithmetic and status classification
- **loader**: CSV parsing into the table model
- **downloader**: CSV and XLSX export
- **storage**: the storage adapter and its error type
- **sheets**: remote spreadsheet client with the bounded read cache
- **graph**: chart rendering
- **app**: routing and request handlers
- **config**: command-line configuration

## HTTP Endpoints

- `/` - dashboard (KPI cards, trend chart, raw table)
- `/saisie` - weekly entry form (GET form, POST submit)
- `/medical`, `/psy` - per-axis analysis pages
- `/chart/{retour,medical,psy}.png` - chart renders
- `/export.csv`, `/export.xlsx` - table downloads
- `/api/table` - the rated table as JSON
*/

pub mod app;
pub mod config;
pub mod downloader;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod rates;
pub mod sheets;
pub mod storage;

/// Re-export the core model so callers can use the crate root directly
pub use metrics::{MetricsRow, MetricsTable, Schema};
pub use rates::{RatedRow, RatedTable, Status, with_rates};
pub use storage::{Backend, StorageError};
