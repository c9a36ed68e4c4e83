//! Server-rendered pages
//!
//! - `/` - landing
//! - `/dashboard?creator=0x...` - invoices and stats for a creator
//! - `/dashboard/create` - invoice form
//! - `/dashboard/share/{short_id}` - payment link and share buttons
//! - `/p/{short_id}` - agreement and swipe-to-pay
//! - `/receipt/{short_id}` - payment receipt

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::error;

use super::slids::{dashboard, load_slid, share};
use crate::links::{format_amount, truncate_middle};
use crate::models::{AppState, DashboardStats, ShareLinks, Slid};
use crate::payment::chain::explorer_tx_url;
use crate::payment::flow::{SWIPE_END_PX, SWIPE_THRESHOLD_PX};
use crate::payment::view::SWIPE_LABEL;
use crate::payment::PaymentPanel;
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard_page))
        .route("/dashboard/create", get(create_page))
        .route("/dashboard/share/{short_id}", get(share_page))
        .route("/p/{short_id}", get(pay_page))
        .route("/receipt/{short_id}", get(receipt_page))
        .with_state(state)
}

/// Display-ready invoice fields; empty strings stand for absent values
pub struct SlidView {
    pub short_id: String,
    pub creator_address: String,
    pub creator_short: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub description: String,
    pub scope: String,
    pub terms: String,
    pub amount: String,
    pub currency: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub tx_hash: String,
    pub tx_short: String,
    pub explorer_url: String,
    pub paid_at: String,
    pub created_at: String,
}

impl From<&Slid> for SlidView {
    fn from(slid: &Slid) -> Self {
        let tx_hash = slid.tx_hash.clone().unwrap_or_default();
        Self {
            short_id: slid.short_id.clone(),
            creator_address: slid.creator_address.clone(),
            creator_short: truncate_middle(&slid.creator_address, 6, 4),
            client_name: slid.client_name.clone(),
            client_email: slid.client_email.clone().unwrap_or_default(),
            client_address: slid.client_address.clone().unwrap_or_default(),
            description: slid.description.clone(),
            scope: slid.scope.clone().unwrap_or_default(),
            terms: slid.terms.clone().unwrap_or_default(),
            amount: format_amount(slid.amount),
            currency: slid.currency.clone(),
            status: slid.status.as_str(),
            status_label: slid.status.label(),
            tx_short: truncate_middle(&tx_hash, 12, 8),
            explorer_url: if tx_hash.is_empty() { String::new() } else { explorer_tx_url(&tx_hash) },
            tx_hash,
            paid_at: slid
                .paid_at
                .map(|t| t.format("%d %B %Y, %H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            created_at: slid.created_at.format("%d %B %Y, %H:%M").to_string(),
        }
    }
}

pub struct StatsView {
    pub total: usize,
    pub pending: usize,
    pub paid: usize,
    pub revenue: String,
}

impl From<&DashboardStats> for StatsView {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            total: stats.total,
            pending: stats.pending,
            paid: stats.paid,
            revenue: format_amount(stats.revenue),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    creator: String,
    error: String,
    stats: StatsView,
    slids: Vec<SlidView>,
}

#[derive(Template)]
#[template(path = "create.html")]
struct CreateTemplate {
    creator: String,
}

#[derive(Template)]
#[template(path = "share.html")]
struct ShareTemplate {
    slid: SlidView,
    pay_url: String,
    links: ShareLinks,
}

#[derive(Template)]
#[template(path = "pay.html")]
struct PayTemplate {
    slid: SlidView,
    /// paid | unavailable | processing | agreement | swipe
    panel: &'static str,
    requires_agreement: bool,
    swipe_label: &'static str,
    threshold_px: f64,
    end_px: f64,
    chain_id_hex: String,
}

#[derive(Template)]
#[template(path = "receipt.html")]
struct ReceiptTemplate {
    slid: SlidView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    title: String,
    message: String,
}

fn render<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Template error: {}", e))).into_response()
        }
    }
}

/// Lookup failures render as a page rather than JSON
fn error_page(err: AppError) -> Response {
    let (title, message) = match &err {
        AppError::NotFound(_) => ("Invoice not found", "This link may be expired or invalid".to_string()),
        AppError::InvalidRequest(msg) => ("Invalid request", msg.clone()),
        _ => {
            error!("Page failed: {}", err);
            ("Something went wrong", "Please try again later".to_string())
        }
    };
    let template = NotFoundTemplate { title: title.to_string(), message };
    render(err.status_code(), &template)
}

async fn index() -> Response {
    render(StatusCode::OK, &IndexTemplate {})
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatorQuery {
    pub creator: Option<String>,
}

async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<CreatorQuery>,
) -> Response {
    let creator = query.creator.unwrap_or_default();
    let empty = DashboardStats::default();

    if creator.trim().is_empty() {
        let template = DashboardTemplate {
            creator,
            error: String::new(),
            stats: StatsView::from(&empty),
            slids: Vec::new(),
        };
        return render(StatusCode::OK, &template);
    }

    match dashboard(&state, &creator).await {
        Ok(response) => {
            let template = DashboardTemplate {
                creator: response.creator_address,
                error: String::new(),
                stats: StatsView::from(&response.stats),
                slids: response.slids.iter().map(SlidView::from).collect(),
            };
            render(StatusCode::OK, &template)
        }
        Err(AppError::InvalidRequest(msg)) => {
            let template = DashboardTemplate {
                creator,
                error: msg,
                stats: StatsView::from(&empty),
                slids: Vec::new(),
            };
            render(StatusCode::BAD_REQUEST, &template)
        }
        Err(e) => error_page(e),
    }
}

async fn create_page(Query(query): Query<CreatorQuery>) -> Response {
    let template = CreateTemplate {
        creator: query.creator.unwrap_or_default(),
    };
    render(StatusCode::OK, &template)
}

async fn share_page(State(state): State<AppState>, Path(short_id): Path<String>) -> Response {
    match load_slid(&state, &short_id).await {
        Ok(slid) => {
            let response = share(&state, slid);
            let template = ShareTemplate {
                slid: SlidView::from(&response.slid),
                pay_url: response.pay_url,
                links: response.links,
            };
            render(StatusCode::OK, &template)
        }
        Err(e) => error_page(e),
    }
}

async fn pay_page(State(state): State<AppState>, Path(short_id): Path<String>) -> Response {
    let view = match state.payments.view(&short_id, false).await {
        Ok(view) => view,
        Err(e) => return error_page(e),
    };

    let panel = match view.panel {
        PaymentPanel::Paid { .. } => "paid",
        PaymentPanel::Unavailable { .. } => "unavailable",
        PaymentPanel::Processing => "processing",
        PaymentPanel::AgreementRequired => "agreement",
        PaymentPanel::Swipe { .. } => "swipe",
    };

    let template = PayTemplate {
        slid: SlidView::from(&view.slid),
        panel,
        requires_agreement: view.slid.requires_agreement(),
        swipe_label: SWIPE_LABEL,
        threshold_px: SWIPE_THRESHOLD_PX,
        end_px: SWIPE_END_PX,
        chain_id_hex: format!("0x{:x}", state.config.chain.chain_id.max(1)),
    };
    render(StatusCode::OK, &template)
}

async fn receipt_page(State(state): State<AppState>, Path(short_id): Path<String>) -> Response {
    match load_slid(&state, &short_id).await {
        Ok(slid) => render(StatusCode::OK, &ReceiptTemplate { slid: SlidView::from(&slid) }),
        Err(e) => error_page(e),
    }
}
