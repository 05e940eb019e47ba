use serde::{Deserialize, Serialize};

/// The fixed set of reporting periods offered by the entry form.
///
/// The upsert logic itself does not check membership: any string can act as
/// a row key (see [`MetricsTable::upsert`]). This list only drives the week
/// selector rendered on the data-entry page.
pub const WEEKS: [&str; 4] = ["Semaine 1", "Semaine 2", "Semaine 3", "Semaine 4"];

/// Column headers of the full (local file) layout, in storage order.
pub const FULL_HEADERS: [&str; 7] = [
    "Semaine",
    "Nouveaux_Cas_J0",
    "Retours_J7",
    "RDV_Doc_Med",
    "Screening_Psy",
    "Risque_Contactees",
    "Rappels_HP",
];

/// Column headers of the core (remote spreadsheet) layout.
pub const CORE_HEADERS: [&str; 5] = [
    "Semaine",
    "Nouveaux_Cas_J0",
    "Retours_J7",
    "RDV_Doc_Med",
    "Screening_Psy",
];

/// Column layout of a storage backend.
///
/// The local file keeps all seven columns; the remote spreadsheet only keeps
/// the five core ones. The schema decides which headers are written and
/// expected, how many counters the entry form shows, and which columns the
/// XLSX export contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schema {
    /// Seven columns: core counters plus at-risk contacts and HP recalls.
    #[default]
    Full,
    /// Five columns: week key and the four core counters.
    Core,
}

impl Schema {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Core => "core",
        }
    }

    /// Headers of this layout, in storage order.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Full => &FULL_HEADERS,
            Self::Core => &CORE_HEADERS,
        }
    }
}

/// One week of raw follow-up counters.
///
/// The serde names match the storage column headers, so the JSON view of a
/// row uses the same vocabulary as the CSV file and the remote sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Reporting period; unique key of the row.
    #[serde(rename = "Semaine")]
    pub week: String,

    /// New cases seen at day 0.
    #[serde(rename = "Nouveaux_Cas_J0")]
    pub new_cases_j0: u32,

    /// Patients who came back at day 7.
    #[serde(rename = "Retours_J7")]
    pub returns_j7: u32,

    /// Files with a properly documented medical appointment.
    #[serde(rename = "RDV_Doc_Med")]
    pub med_appointments: u32,

    /// Files with a psychosocial screening.
    #[serde(rename = "Screening_Psy")]
    pub psy_screenings: u32,

    /// At-risk patients contacted (full layout only).
    #[serde(rename = "Risque_Contactees", default)]
    pub at_risk_contacted: u32,

    /// Patients recalled by the HP team (full layout only).
    #[serde(rename = "Rappels_HP", default)]
    pub hp_recalls: u32,
}

impl MetricsRow {
    /// Counter values in storage order for the given layout.
    pub fn counters(&self, schema: Schema) -> Vec<u32> {
        match schema {
            Schema::Full => vec![
                self.new_cases_j0,
                self.returns_j7,
                self.med_appointments,
                self.psy_screenings,
                self.at_risk_contacted,
                self.hp_recalls,
            ],
            Schema::Core => vec![
                self.new_cases_j0,
                self.returns_j7,
                self.med_appointments,
                self.psy_screenings,
            ],
        }
    }
}

/// The whole metrics dataset: an ordered sequence of rows keyed by week.
///
/// Insertion order is the display order. At most one row exists per week
/// value; [`MetricsTable::upsert`] maintains that invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsTable {
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    /// An empty table (what a missing storage file bootstraps to).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row for the given week, if present.
    pub fn get(&self, week: &str) -> Option<&MetricsRow> {
        self.rows.iter().find(|r| r.week == week)
    }

    /// The most recently inserted row.
    pub fn latest(&self) -> Option<&MetricsRow> {
        self.rows.last()
    }

    /// Insert-or-replace by week key.
    ///
    /// Any existing row with the same `week` is removed, then `row` is
    /// appended at the end. The input table is consumed and a new table is
    /// returned; callers persist the result through the storage backend.
    ///
    /// # Examples
    /// ```
    /// use suivi_vsx::metrics::{MetricsRow, MetricsTable};
    ///
    /// let table = MetricsTable::new().upsert(MetricsRow {
    ///     week: "Semaine 1".to_string(),
    ///     new_cases_j0: 50,
    ///     returns_j7: 26,
    ///     ..Default::default()
    /// });
    /// assert_eq!(table.len(), 1);
    ///
    /// // Submitting the same week again replaces the row.
    /// let table = table.upsert(MetricsRow {
    ///     week: "Semaine 1".to_string(),
    ///     new_cases_j0: 60,
    ///     returns_j7: 45,
    ///     ..Default::default()
    /// });
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.get("Semaine 1").unwrap().new_cases_j0, 60);
    /// ```
    pub fn upsert(self, row: MetricsRow) -> Self {
        let mut rows: Vec<MetricsRow> = self
            .rows
            .into_iter()
            .filter(|r| r.week != row.week)
            .collect();
        rows.push(row);
        Self { rows }
    }
}
