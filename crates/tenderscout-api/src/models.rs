use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalogued opportunity as the tender service returns it
///
/// Nothing here is validated or normalized. Fields the service adds later
/// land in `extra` and are written back out untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TenderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// ISO-8601 as sent by the service, usually without an offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tender {
    /// Best-effort parse of `deadline` for display
    ///
    /// The backend writes naive UTC timestamps (`2025-03-01T00:00:00`), but
    /// scraped records sometimes carry an offset or just a date.
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        self.deadline.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Budget as stored: scrapers write digit strings, the seed data numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Amount(f64),
    Text(String),
}

impl Budget {
    /// Numeric value, if the stored text is a plain number
    pub fn amount(&self) -> Option<f64> {
        match self {
            Budget::Amount(amount) => Some(*amount),
            Budget::Text(text) => text.trim().replace(',', "").parse().ok(),
        }
    }
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Budget::Amount(amount) => write!(f, "{}", amount),
            Budget::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Tender lifecycle state
///
/// Values outside the three known ones are kept as `Other` rather than
/// rejected, since scrapers are free to write whatever the source site says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TenderStatus {
    Open,
    Closed,
    Pending,
    Other(String),
}

impl From<String> for TenderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Open" => TenderStatus::Open,
            "Closed" => TenderStatus::Closed,
            "Pending" => TenderStatus::Pending,
            _ => TenderStatus::Other(value),
        }
    }
}

impl From<TenderStatus> for String {
    fn from(value: TenderStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenderStatus::Open => write!(f, "Open"),
            TenderStatus::Closed => write!(f, "Closed"),
            TenderStatus::Pending => write!(f, "Pending"),
            TenderStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Pagination block of a listing response, taken as-is from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            pages: 0,
        }
    }
}

/// One page of the tender listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderPage {
    pub tenders: Vec<Tender>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountriesResponse {
    pub countries: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsResponse {
    pub recommendations: Vec<Tender>,
}

/// Body of a failed request; `error` is optional
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// Response of the service liveness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
