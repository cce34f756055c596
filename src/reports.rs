//! Reports: today's counters and the monthly series.
//!
//! When the monthly endpoint is unavailable a fixed placeholder series is
//! shown instead and flagged as such.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DashboardResult;
use crate::models::{MonthlyReport, ReportSummary};

#[async_trait]
pub trait ReportApi: Send + Sync {
    async fn summary_today(&self) -> DashboardResult<ReportSummary>;
    async fn monthly(&self) -> DashboardResult<MonthlyReport>;
}

const PLACEHOLDER_REVENUES: [f64; 12] = [
    5_245_000.0,
    6_120_000.0,
    5_890_000.0,
    7_255_000.0,
    6_912_000.0,
    7_830_000.0,
    8_150_000.0,
    7_620_000.0,
    6_415_000.0,
    7_180_000.0,
    8_560_000.0,
    9_245_000.0,
];

const PLACEHOLDER_ORDERS: [u64; 12] = [124, 138, 129, 165, 158, 175, 189, 172, 148, 162, 189, 210];

pub fn placeholder_monthly() -> MonthlyReport {
    MonthlyReport {
        months: (1..=12).map(|m| format!("T{m}")).collect(),
        revenues: PLACEHOLDER_REVENUES.to_vec(),
        orders: PLACEHOLDER_ORDERS.to_vec(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportsView {
    pub summary: ReportSummary,
    pub monthly: MonthlyReport,
    /// True when `monthly` is the placeholder series.
    pub placeholder: bool,
}

/// Load both reports. A summary failure fails the page; a monthly failure
/// falls back to the placeholder series.
pub async fn load_reports<A: ReportApi + ?Sized>(api: &A) -> DashboardResult<ReportsView> {
    let summary = api.summary_today().await?;
    let (monthly, placeholder) = match api.monthly().await {
        Ok(m) => (m, false),
        Err(e) => {
            warn!(error = %e, "monthly report unavailable, showing placeholder series");
            (placeholder_monthly(), true)
        }
    };
    info!(
        total_orders = summary.total_orders,
        months = monthly.months.len(),
        placeholder,
        "reports loaded"
    );
    Ok(ReportsView {
        summary,
        monthly,
        placeholder,
    })
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Group an integer's digits in threes with `sep`.
pub(crate) fn group_digits(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Vietnamese dong, rounded to whole units: `1.250.000 ₫`.
pub fn format_vnd(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let rounded = amount.abs().round() as u64;
    let sign = if amount < 0.0 && rounded > 0 { "-" } else { "" };
    format!("{sign}{} ₫", group_digits(rounded, '.'))
}

/// Short axis label: millions as `7.5M`, smaller values grouped.
pub fn compact_amount(value: f64) -> String {
    if value >= 1_000_000.0 {
        let millions = value / 1_000_000.0;
        let text = format!("{millions:.2}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        format!("{text}M")
    } else {
        group_digits(value.max(0.0).round() as u64, '.')
    }
}

const BAR_WIDTH: usize = 40;

/// Horizontal text bar chart, one line per label.
pub fn bar_chart(labels: &[String], values: &[f64], render: impl Fn(f64) -> String) -> Vec<String> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    labels
        .iter()
        .zip(values)
        .map(|(label, value)| {
            let len = if max > 0.0 {
                ((value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!(
                "{label:<label_width$} | {:<BAR_WIDTH$} {}",
                "#".repeat(len),
                render(*value)
            )
        })
        .collect()
}

impl ReportsView {
    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> Vec<String> {
        let s = &self.summary;
        let mut lines = vec![
            format!("Orders today:  {}", s.total_orders),
            format!("Revenue today: {}", format_vnd(s.revenue)),
            format!("In progress:   {}", s.in_progress),
            format!("Completed:     {}", s.completed),
            String::new(),
        ];
        lines.push(if self.placeholder {
            "Monthly revenue (placeholder data)".to_string()
        } else {
            "Monthly revenue".to_string()
        });
        lines.extend(bar_chart(&self.monthly.months, &self.monthly.revenues, compact_amount));
        lines.push(String::new());
        lines.push("Monthly orders".to_string());
        let orders: Vec<f64> = self.monthly.orders.iter().map(|o| *o as f64).collect();
        lines.extend(bar_chart(&self.monthly.months, &orders, |v| format!("{v}")));
        lines
    }
}
