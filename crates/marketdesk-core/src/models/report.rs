//! Dashboard overview figures and the chart series built from the
//! time-bucketed reports.
//!
//! The API answers with sparse point lists, one per series, keyed by a bucket
//! number (hour of day, weekday, day of month or month). The `normalize_*`
//! functions pivot them into one row per bucket, ordered by bucket number and
//! labelled for the selected period.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// "Day", "Week", ... as shown in the "This …" / "Last …" legend.
    pub fn title(&self) -> &'static str {
        match self {
            Period::Day => "Day",
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Year => "Year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(format!("unknown period '{}' (expected day, week, month or year)", other)),
        }
    }
}

/// Label for bucket `value` of `period`.
pub fn format_label(period: Period, value: i64) -> String {
    let named = |labels: &[&str]| {
        usize::try_from(value - 1)
            .ok()
            .and_then(|i| labels.get(i))
            .map(|s| s.to_string())
            .unwrap_or_else(|| value.to_string())
    };

    match period {
        Period::Day => format!("{:02}:00", value),
        Period::Week => named(&WEEKDAY_LABELS),
        Period::Year => named(&MONTH_LABELS),
        Period::Month => value.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_revenue: f64,
    pub total_sellers: u64,
    pub total_users: u64,
}

/// `overview` block of the dashboard endpoint; every figure defaults to 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OverviewResponse {
    #[serde(rename = "totalRevenue", default)]
    pub total_revenue: Option<f64>,
    #[serde(rename = "totalSeller", default)]
    pub total_seller: Option<u64>,
    #[serde(rename = "totalUser", default)]
    pub total_user: Option<u64>,
}

impl From<OverviewResponse> for Overview {
    fn from(r: OverviewResponse) -> Self {
        Self {
            total_revenue: r.total_revenue.unwrap_or(0.0),
            total_sellers: r.total_seller.unwrap_or(0),
            total_users: r.total_user.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenuePoint {
    #[serde(rename = "_id")]
    pub bucket: i64,
    #[serde(default)]
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueReport {
    #[serde(rename = "thisMonth", default)]
    pub current: Option<Vec<RevenuePoint>>,
    #[serde(rename = "lastMonth", default)]
    pub previous: Option<Vec<RevenuePoint>>,
    #[serde(default)]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub label: String,
    pub current: Option<f64>,
    pub previous: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoiningPoint {
    pub period: i64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoiningReport {
    #[serde(default)]
    pub users: Option<Vec<JoiningPoint>>,
    #[serde(default)]
    pub sellers: Option<Vec<JoiningPoint>>,
    #[serde(default)]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoiningRow {
    pub label: String,
    pub users: Option<u64>,
    pub sellers: Option<u64>,
}

pub fn normalize_revenue(report: &RevenueReport) -> Vec<RevenueRow> {
    let period = report.period.unwrap_or_default();
    let mut rows: BTreeMap<i64, RevenueRow> = BTreeMap::new();

    for point in report.current.iter().flatten() {
        revenue_row(&mut rows, period, point.bucket).current = Some(point.revenue);
    }
    for point in report.previous.iter().flatten() {
        revenue_row(&mut rows, period, point.bucket).previous = Some(point.revenue);
    }

    rows.into_values().collect()
}

fn revenue_row(rows: &mut BTreeMap<i64, RevenueRow>, period: Period, bucket: i64) -> &mut RevenueRow {
    rows.entry(bucket).or_insert_with(|| RevenueRow {
        label: format_label(period, bucket),
        current: None,
        previous: None,
    })
}

pub fn normalize_joining(report: &JoiningReport) -> Vec<JoiningRow> {
    let period = report.period.unwrap_or_default();
    let mut rows: BTreeMap<i64, JoiningRow> = BTreeMap::new();

    for point in report.users.iter().flatten() {
        joining_row(&mut rows, period, point.period).users = Some(point.count);
    }
    for point in report.sellers.iter().flatten() {
        joining_row(&mut rows, period, point.period).sellers = Some(point.count);
    }

    rows.into_values().collect()
}

fn joining_row(rows: &mut BTreeMap<i64, JoiningRow>, period: Period, bucket: i64) -> &mut JoiningRow {
    rows.entry(bucket).or_insert_with(|| JoiningRow {
        label: format_label(period, bucket),
        users: None,
        sellers: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(Period::Day, 7), "07:00");
        assert_eq!(format_label(Period::Day, 13), "13:00");
        assert_eq!(format_label(Period::Week, 1), "Sun");
        assert_eq!(format_label(Period::Week, 7), "Sat");
        assert_eq!(format_label(Period::Week, 8), "8");
        assert_eq!(format_label(Period::Week, 0), "0");
        assert_eq!(format_label(Period::Year, 12), "Dec");
        assert_eq!(format_label(Period::Month, 31), "31");
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Week".parse::<Period>(), Ok(Period::Week));
        assert!("fortnight".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::Month);
    }

    #[test]
    fn test_normalize_revenue_pivots_and_sorts() {
        let json = r#"{
            "thisMonth": [{"_id": 3, "revenue": 30.5}, {"_id": 1, "revenue": 10}],
            "lastMonth": [{"_id": 2, "revenue": 20}, {"_id": 3, "revenue": 25}],
            "period": "year"
        }"#;
        let report: RevenueReport = serde_json::from_str(json).expect("parse revenue report");
        let rows = normalize_revenue(&report);

        assert_eq!(
            rows,
            vec![
                RevenueRow { label: "Jan".into(), current: Some(10.0), previous: None },
                RevenueRow { label: "Feb".into(), current: None, previous: Some(20.0) },
                RevenueRow { label: "Mar".into(), current: Some(30.5), previous: Some(25.0) },
            ]
        );
    }

    #[test]
    fn test_normalize_revenue_defaults_to_month() {
        let report: RevenueReport =
            serde_json::from_str(r#"{"thisMonth": [{"_id": 15, "revenue": 1}]}"#).expect("parse");
        let rows = normalize_revenue(&report);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "15");
        assert!(normalize_revenue(&RevenueReport::default()).is_empty());
    }

    #[test]
    fn test_normalize_joining_later_point_wins() {
        let json = r#"{
            "users": [{"period": 2, "count": 4}, {"period": 2, "count": 9}],
            "sellers": [{"period": 1, "count": 1}],
            "period": "week"
        }"#;
        let report: JoiningReport = serde_json::from_str(json).expect("parse joining report");
        let rows = normalize_joining(&report);

        assert_eq!(
            rows,
            vec![
                JoiningRow { label: "Sun".into(), users: None, sellers: Some(1) },
                JoiningRow { label: "Mon".into(), users: Some(9), sellers: None },
            ]
        );
    }

    #[test]
    fn test_overview_defaults_to_zero() {
        let raw: OverviewResponse = serde_json::from_str(r#"{"totalSeller": 4}"#).expect("parse");
        let overview = Overview::from(raw);
        assert_eq!(overview.total_sellers, 4);
        assert_eq!(overview.total_users, 0);
        assert_eq!(overview.total_revenue, 0.0);
    }
}
