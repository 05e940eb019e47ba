use serde::{Deserialize, Serialize};

use crate::metrics::{MetricsRow, MetricsTable};

/// Reference rate of the program before the follow-up plan started.
/// Displayed next to the current rate; never used in a computation.
pub const BASELINE_RATE: f64 = 52.0;

/// Weekly return-rate target. Also drawn as the dashed reference line on the
/// dashboard chart.
pub const TARGET_RATE: f64 = 70.0;

/// Below this rate the latest week is flagged as an alert.
pub const ALERT_THRESHOLD: f64 = 60.0;

/// A raw counter pair expressed as a percentage.
///
/// A zero denominator yields 0.0 rather than an undefined value, so rows
/// entered before any case was seen chart as a flat zero.
///
/// # Examples
/// ```
/// use suivi_vsx::rates::ratio;
///
/// assert_eq!(ratio(26, 50), 52.0);
/// assert_eq!(ratio(3, 0), 0.0);
/// ```
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Performance classification of a return rate against the fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Alert,
    Medium,
    TargetMet,
}

impl Status {
    /// Classify a rate: below 60 is an alert, below 70 is medium, 70 and
    /// above meets the target.
    pub fn classify(rate: f64) -> Self {
        if rate < ALERT_THRESHOLD {
            Self::Alert
        } else if rate < TARGET_RATE {
            Self::Medium
        } else {
            Self::TargetMet
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Medium => "medium",
            Self::TargetMet => "target-met",
        }
    }

    /// Label shown on the dashboard status card.
    pub fn label(self) -> &'static str {
        match self {
            Self::Alert => "🔴 Alerte",
            Self::Medium => "🟠 Moyen",
            Self::TargetMet => "🟢 Objectif Atteint",
        }
    }
}

/// A metrics row augmented with its four percentage columns.
///
/// Rates are derived values: they are recomputed from the raw counters on
/// every read and never written back to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedRow {
    #[serde(flatten)]
    pub raw: MetricsRow,

    /// `Retours_J7 / Nouveaux_Cas_J0`, as a percentage.
    #[serde(rename = "Taux_Retour")]
    pub return_rate: f64,

    /// `RDV_Doc_Med / Nouveaux_Cas_J0`, as a percentage.
    #[serde(rename = "Taux_RDV_Doc")]
    pub doc_rate: f64,

    /// `Screening_Psy / Nouveaux_Cas_J0`, as a percentage.
    #[serde(rename = "Taux_Screening_Psy")]
    pub screening_rate: f64,

    /// `Rappels_HP / Nouveaux_Cas_J0`, as a percentage.
    #[serde(rename = "Taux_Rappels_HP")]
    pub recall_rate: f64,
}

/// The metrics table with all derived columns filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatedTable {
    pub rows: Vec<RatedRow>,
}

impl RatedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return rate of the most recently inserted week.
    pub fn latest_return_rate(&self) -> Option<f64> {
        self.rows.last().map(|r| r.return_rate)
    }

    /// Status of the most recently inserted week.
    pub fn latest_status(&self) -> Option<Status> {
        self.latest_return_rate().map(Status::classify)
    }

    /// Arithmetic mean of the return rates across all weeks (0.0 if the
    /// table is empty). Used once, for the summary card.
    pub fn mean_return_rate(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(|r| r.return_rate).sum::<f64>() / self.rows.len() as f64
    }
}

/// Compute the derived percentage columns for every row.
///
/// Row-wise and independent: no smoothing or cross-row aggregation happens
/// here. All four denominators are `Nouveaux_Cas_J0`.
pub fn with_rates(table: &MetricsTable) -> RatedTable {
    let rows = table
        .rows
        .iter()
        .map(|raw| RatedRow {
            return_rate: ratio(raw.returns_j7, raw.new_cases_j0),
            doc_rate: ratio(raw.med_appointments, raw.new_cases_j0),
            screening_rate: ratio(raw.psy_screenings, raw.new_cases_j0),
            recall_rate: ratio(raw.hp_recalls, raw.new_cases_j0),
            raw: raw.clone(),
        })
        .collect();
    RatedTable { rows }
}
