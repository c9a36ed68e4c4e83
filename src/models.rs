use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::config::Config;
use crate::db::SlidStore;
use crate::llm::LLM;
use crate::payment::usdc::parse_address;
use crate::payment::PaymentService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SlidStore>,
    pub payments: Arc<PaymentService>,
    /// `None` when no text-assist provider is configured
    pub llm: Option<Arc<LLM>>,
    pub config: Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlidStatus {
    Draft,
    Pending,
    Paid,
    Expired,
}

impl SlidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlidStatus::Draft => "draft",
            SlidStatus::Pending => "pending",
            SlidStatus::Paid => "paid",
            SlidStatus::Expired => "expired",
        }
    }

    /// Label shown on the share and dashboard views
    pub fn label(&self) -> &'static str {
        match self {
            SlidStatus::Draft => "Draft",
            SlidStatus::Pending => "Awaiting Payment",
            SlidStatus::Paid => "Paid",
            SlidStatus::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for SlidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SlidStatus::Draft),
            "pending" => Ok(SlidStatus::Pending),
            "paid" => Ok(SlidStatus::Paid),
            "expired" => Ok(SlidStatus::Expired),
            other => Err(format!("unknown slid status: {}", other)),
        }
    }
}

/// An invoice ("slid") as stored in the `slids` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slid {
    pub id: uuid::Uuid,
    pub short_id: String,
    pub creator_address: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub scope: Option<String>,
    pub terms: Option<String>,
    pub status: SlidStatus,
    pub tx_hash: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slid {
    /// Scope or terms present means the client has to tick the agreement box
    pub fn requires_agreement(&self) -> bool {
        has_text(&self.scope) || has_text(&self.terms)
    }

    pub fn is_payable(&self) -> bool {
        self.status == SlidStatus::Pending
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Row handed to the store on insert; id and timestamps are store-assigned
#[derive(Debug, Clone)]
pub struct NewSlid {
    pub short_id: String,
    pub creator_address: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub scope: Option<String>,
    pub terms: Option<String>,
    pub status: SlidStatus,
}

/// Fields written together by the `pending -> paid` transition
#[derive(Debug, Clone)]
pub struct PaidUpdate {
    pub tx_hash: String,
    pub client_address: String,
    pub paid_at: DateTime<Utc>,
}

// API Request/Response types

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSlidRequest {
    #[validate(custom(function = "validate_address"))]
    pub creator_address: String,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    #[validate(email)]
    pub client_email: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub scope: Option<String>,
    pub terms: Option<String>,
}

impl CreateSlidRequest {
    /// Trim free text and turn empty optionals into `None`, the way the form submits them
    pub fn normalized(mut self) -> Self {
        self.creator_address = self.creator_address.trim().to_lowercase();
        self.client_name = self.client_name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.client_email = non_empty(self.client_email);
        self.scope = non_empty(self.scope);
        self.terms = non_empty(self.terms);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn validate_address(value: &str) -> Result<(), ValidationError> {
    if is_address(value) {
        Ok(())
    } else {
        Err(ValidationError::new("address")
            .with_message("Expected a 0x-prefixed 20-byte hex address".into()))
    }
}

pub fn is_address(value: &str) -> bool {
    value.starts_with("0x") && parse_address(value).is_ok()
}

/// Amounts are stored as NUMERIC(20,6): at most 6 decimals and 14 integer digits
const AMOUNT_MAX_SCALE: u32 = 6;
const AMOUNT_LIMIT: i64 = 100_000_000_000_000;

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if !amount.is_sign_positive() || amount.is_zero() {
        return Err(ValidationError::new("amount").with_message("Amount must be greater than zero".into()));
    }
    if amount.normalize().scale() > AMOUNT_MAX_SCALE {
        return Err(ValidationError::new("amount").with_message("Amount supports at most 6 decimal places".into()));
    }
    if *amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err(ValidationError::new("amount").with_message("Amount is too large".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CreateSlidResponse {
    pub short_id: String,
    pub share_url: String,
    pub pay_url: String,
    pub slid: Slid,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub creator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub paid: usize,
    pub revenue: Decimal,
}

impl DashboardStats {
    pub fn from_slids(slids: &[Slid]) -> Self {
        let paid: Vec<&Slid> = slids.iter().filter(|s| s.status == SlidStatus::Paid).collect();
        Self {
            total: slids.len(),
            pending: slids.iter().filter(|s| s.status == SlidStatus::Pending).count(),
            paid: paid.len(),
            revenue: paid.iter().map(|s| s.amount).sum(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub creator_address: String,
    pub stats: DashboardStats,
    pub slids: Vec<Slid>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub slid: Slid,
    pub pay_url: String,
    pub links: ShareLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLinks {
    pub telegram: String,
    pub whatsapp: String,
    pub twitter: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub slid: Slid,
    pub receipt_url: String,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request() -> CreateSlidRequest {
        CreateSlidRequest {
            creator_address: " 0xAbCdEf0123456789aBCdef0123456789abcDEF01 ".to_string(),
            client_name: " Acme ".to_string(),
            client_email: Some("".to_string()),
            amount: Decimal::from_str("500.00").unwrap(),
            description: "Edit".to_string(),
            scope: Some("   ".to_string()),
            terms: None,
        }
    }

    #[test]
    fn test_normalized_request_validates() {
        let req = request().normalized();
        assert_eq!(req.creator_address, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(req.client_name, "Acme");
        assert_eq!(req.client_email, None);
        assert_eq!(req.scope, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let mut req = request();
        req.amount = Decimal::ZERO;
        assert!(req.normalized().validate().is_err());

        let mut req = request();
        req.amount = Decimal::from_str("-1").unwrap();
        assert!(req.normalized().validate().is_err());
    }

    #[test]
    fn test_amount_must_fit_storage() {
        let with_amount = |amount: &str| {
            let mut req = request();
            req.amount = Decimal::from_str(amount).unwrap();
            req.normalized().validate()
        };

        assert!(with_amount("0.000001").is_ok());
        assert!(with_amount("12.5000000").is_ok());
        assert!(with_amount("99999999999999.999999").is_ok());

        let err = with_amount("1.0000001").unwrap_err();
        assert!(err.field_errors().contains_key("amount"));
        assert!(with_amount("100000000000000").is_err());
    }

    #[test]
    fn test_rejects_missing_fields() {
        let mut req = request();
        req.client_name = "  ".to_string();
        assert!(req.normalized().validate().is_err());

        let mut req = request();
        req.creator_address = "0x1234".to_string();
        assert!(req.normalized().validate().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(SlidStatus::from_str("paid").unwrap(), SlidStatus::Paid);
        assert!(SlidStatus::from_str("refunded").is_err());
        assert_eq!(serde_json::to_string(&SlidStatus::Pending).unwrap(), "\"pending\"");
    }

    #[test]
    fn test_dashboard_stats() {
        let now = Utc::now();
        let make = |amount: &str, status| Slid {
            id: uuid::Uuid::new_v4(),
            short_id: "abcdefgh".to_string(),
            creator_address: "0x".to_string(),
            client_name: "c".to_string(),
            client_email: None,
            client_address: None,
            amount: Decimal::from_str(amount).unwrap(),
            currency: "USDC".to_string(),
            description: "d".to_string(),
            scope: None,
            terms: None,
            status,
            tx_hash: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        let slids = vec![
            make("10.50", SlidStatus::Paid),
            make("4.50", SlidStatus::Paid),
            make("99", SlidStatus::Pending),
        ];
        let stats = DashboardStats::from_slids(&slids);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.revenue, Decimal::from(15));
    }
}
