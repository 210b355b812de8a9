use super::forms::PageQuery;
use super::{loaded, seller_api, session_expired, Layout};
use crate::models::report::SellChartPoint;
use crate::models::{AuthUser, Overview, ReportPeriod, SalesPage};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

pub const SALES_PAGE_SIZE: u32 = 10;

#[derive(Template)]
#[template(path = "dashboard/overview.html")]
pub struct OverviewTemplate {
    pub layout: Layout,
    pub overview: Overview,
    pub period: ReportPeriod,
    pub periods: [ReportPeriod; 4],
    pub chart: Vec<ChartBar>,
}

#[derive(Template)]
#[template(path = "dashboard/sales.html")]
pub struct SalesTemplate {
    pub layout: Layout,
    pub sales: SalesPage,
    pub page: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub period: Option<String>,
}

/// One bucket of the sell chart, scaled against the largest value shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub this_period: f64,
    pub last_period: f64,
    pub this_percent: u32,
    pub last_percent: u32,
}

pub fn chart_bars(points: Vec<SellChartPoint>) -> Vec<ChartBar> {
    let peak = points
        .iter()
        .flat_map(|p| [p.this_period, p.last_period])
        .fold(0.0_f64, f64::max);

    let percent = |value: f64| {
        if peak <= 0.0 {
            0
        } else {
            ((value.max(0.0) / peak) * 100.0).round() as u32
        }
    };

    points
        .into_iter()
        .map(|p| ChartBar {
            this_percent: percent(p.this_period),
            last_percent: percent(p.last_period),
            label: p.label,
            this_period: p.this_period,
            last_period: p.last_period,
        })
        .collect()
}

pub async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<OverviewQuery>,
) -> Response {
    let mut layout = Layout::new(&user, "dashboard").await;
    let period = query
        .period
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or_default();

    let Some(overview) = loaded(
        seller_api(&state, &user).overview(period).await,
        "Failed to load dashboard",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    OverviewTemplate {
        layout,
        chart: chart_bars(overview.sell_chart(period)),
        overview,
        period,
        periods: ReportPeriod::ALL,
    }
    .into_response()
}

pub async fn sales(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let mut layout = Layout::new(&user, "sales").await;
    let page = query.page();

    let Some(sales) = loaded(
        seller_api(&state, &user)
            .sales_history(page, SALES_PAGE_SIZE)
            .await,
        "Failed to load sales history",
        &mut layout,
    ) else {
        return session_expired(user.session.store(), &headers).await;
    };

    SalesTemplate {
        layout,
        sales,
        page,
    }
    .into_response()
}
