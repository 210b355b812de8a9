use super::de;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 4] = [
        ReportPeriod::Day,
        ReportPeriod::Week,
        ReportPeriod::Month,
        ReportPeriod::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Day => "day",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::Year => "year",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportPeriod::Day => "Day",
            ReportPeriod::Week => "Week",
            ReportPeriod::Month => "Month",
            ReportPeriod::Year => "Year",
        }
    }

    /// Axis label for bucket `value` of a sell report.
    pub fn label(&self, value: i64) -> String {
        const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        let indexed = |names: &[&str]| {
            usize::try_from(value - 1)
                .ok()
                .and_then(|i| names.get(i))
                .map(|name| name.to_string())
                .unwrap_or_else(|| value.to_string())
        };

        match self {
            ReportPeriod::Day => format!("{value:02}:00"),
            ReportPeriod::Week => indexed(&DAYS),
            ReportPeriod::Year => indexed(&MONTHS),
            ReportPeriod::Month => value.to_string(),
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown period: {s}"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverviewTotals {
    #[serde(deserialize_with = "de::number")]
    pub total_sell: f64,
    #[serde(deserialize_with = "de::integer")]
    pub live_product_count: i64,
}

/// One backend aggregate bucket: `_id` is the hour, weekday, day or month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SellBucket {
    #[serde(rename = "_id", deserialize_with = "de::integer")]
    pub key: i64,
    #[serde(deserialize_with = "de::number")]
    pub sales: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellReport {
    pub this_month: Vec<SellBucket>,
    pub last_month: Vec<SellBucket>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProductsReport {
    #[serde(deserialize_with = "de::integer")]
    pub this_day: i64,
    #[serde(deserialize_with = "de::integer")]
    pub this_week: i64,
    #[serde(deserialize_with = "de::integer")]
    pub this_month: i64,
}

/// `GET /seller/dashboard/overview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overview {
    pub overview: OverviewTotals,
    pub sell_report: SellReport,
    pub new_products_report: NewProductsReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellChartPoint {
    pub label: String,
    pub this_period: f64,
    pub last_period: f64,
}

impl Overview {
    /// Merge this and last period's buckets by key, ascending, missing sides
    /// as zero. Labels follow the period the backend reports, falling back
    /// to the one requested.
    pub fn sell_chart(&self, requested: ReportPeriod) -> Vec<SellChartPoint> {
        let period = self
            .sell_report
            .period
            .as_deref()
            .and_then(|p| p.parse::<ReportPeriod>().ok())
            .unwrap_or(requested);
        let mut merged: BTreeMap<i64, (f64, f64)> = BTreeMap::new();

        for bucket in &self.sell_report.this_month {
            merged.entry(bucket.key).or_default().0 = bucket.sales;
        }
        for bucket in &self.sell_report.last_month {
            merged.entry(bucket.key).or_default().1 = bucket.sales;
        }

        merged
            .into_iter()
            .map(|(key, (this_period, last_period))| SellChartPoint {
                label: period.label(key),
                this_period,
                last_period,
            })
            .collect()
    }

    pub fn total_sell_label(&self) -> String {
        de::money(self.overview.total_sell)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sale {
    #[serde(deserialize_with = "de::opt_string")]
    pub order_id: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub customer: Option<String>,
    #[serde(deserialize_with = "de::number")]
    pub total_sell_amount: f64,
    #[serde(deserialize_with = "de::number")]
    pub admin_charge: f64,
    #[serde(deserialize_with = "de::number")]
    pub my_revenue: f64,
    pub date: Option<String>,
}

impl Sale {
    pub fn customer_label(&self) -> &str {
        self.customer.as_deref().unwrap_or("N/A")
    }

    pub fn date_label(&self) -> String {
        self.date.as_deref().map(de::date_only).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    #[serde(deserialize_with = "de::integer")]
    pub page: i64,
    #[serde(deserialize_with = "de::integer")]
    pub total_pages: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }
}

/// `GET /seller/dashboard/sales`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesPage {
    pub sales: Vec<Sale>,
    pub pagination: Pagination,
    #[serde(deserialize_with = "de::opt_string")]
    pub total_sales: Option<String>,
}

impl SalesPage {
    pub fn total_label(&self) -> &str {
        self.total_sales.as_deref().unwrap_or("0.00")
    }

    pub fn has_next(&self) -> bool {
        self.pagination.page.max(1) < self.pagination.total_pages.max(1)
    }
}
