//! Data types that are stored in, and read from, the settlement database.
use std::{fmt::Display, str::FromStr};

pub use amp_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//-------------------------------------   ServiceRequestStatus   -------------------------------------------------------
/// The lifecycle of an artist's service request.
///
/// Transitions only ever move forward through [`ServiceRequestStatus::rank`]. `Cancelled` is terminal and `Paid` can
/// only be reached once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRequestStatus {
    /// Submitted by the artist, nobody has looked at it yet.
    Pending,
    InReview,
    /// Tier and creator are fixed; the artist has been sent to the checkout.
    AwaitingPayment,
    /// Payment confirmed and a project materialized.
    Paid,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceRequestStatus {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InReview => 1,
            Self::AwaitingPayment => 2,
            Self::Paid => 3,
            Self::InProgress => 4,
            Self::Completed => 5,
            Self::Cancelled => 6,
        }
    }

    /// Statuses that settlement may move to `Paid`.
    pub fn payable() -> [Self; 3] {
        [Self::Pending, Self::InReview, Self::AwaitingPayment]
    }

    pub fn is_payable(&self) -> bool {
        self.rank() < Self::Paid.rank()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Status changes are monotonic. A request can be cancelled from any non-terminal state, but nothing leaves
    /// `Cancelled` or `Completed`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        next == Self::Cancelled || next.rank() > self.rank()
    }
}

impl Display for ServiceRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::InReview => "IN_REVIEW",
            Self::AwaitingPayment => "AWAITING_PAYMENT",
            Self::Paid => "PAID",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for ServiceRequestStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_REVIEW" => Ok(Self::InReview),
            "AWAITING_PAYMENT" => Ok(Self::AwaitingPayment),
            "PAID" => Ok(Self::Paid),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError::new("service request status", s)),
        }
    }
}

//-------------------------------------      ServiceCategory      -----------------------------------------------------
/// The kind of service an artist asked for. Request categories are free text in the catalog, so anything unknown is
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceCategory {
    Mixing,
    Mastering,
    Recording,
    Other(String),
}

impl From<&str> for ServiceCategory {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "MIXING" => Self::Mixing,
            "MASTERING" => Self::Mastering,
            "RECORDING" => Self::Recording,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for ServiceCategory {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ServiceCategory> for String {
    fn from(value: ServiceCategory) -> Self {
        value.to_string()
    }
}

impl Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mixing => f.write_str("MIXING"),
            Self::Mastering => f.write_str("MASTERING"),
            Self::Recording => f.write_str("RECORDING"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[cfg(feature = "sqlite")]
mod service_category_sqlite {
    use sqlx::{
        encode::IsNull,
        error::BoxDynError,
        sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
        Decode,
        Encode,
        Sqlite,
        Type,
    };

    use super::ServiceCategory;

    impl Type<Sqlite> for ServiceCategory {
        fn type_info() -> SqliteTypeInfo {
            <str as Type<Sqlite>>::type_info()
        }

        fn compatible(ty: &SqliteTypeInfo) -> bool {
            <str as Type<Sqlite>>::compatible(ty)
        }
    }

    impl<'r> Decode<'r, Sqlite> for ServiceCategory {
        fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
            let s = <&str as Decode<Sqlite>>::decode(value)?;
            Ok(ServiceCategory::from(s))
        }
    }

    impl<'q> Encode<'q, Sqlite> for ServiceCategory {
        fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
            <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
        }
    }
}

//-------------------------------------      ProjectCategory      -----------------------------------------------------
/// The production discipline of a funded project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectCategory {
    Mixing,
    Mastering,
    Production,
}

/// | Request category | Project category |
/// |------------------|------------------|
/// | MIXING           | MIXING           |
/// | MASTERING        | MASTERING        |
/// | RECORDING        | PRODUCTION       |
/// | anything else    | MIXING           |
impl From<&ServiceCategory> for ProjectCategory {
    fn from(value: &ServiceCategory) -> Self {
        match value {
            ServiceCategory::Mixing => Self::Mixing,
            ServiceCategory::Mastering => Self::Mastering,
            ServiceCategory::Recording => Self::Production,
            ServiceCategory::Other(_) => Self::Mixing,
        }
    }
}

impl Display for ProjectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mixing => f.write_str("MIXING"),
            Self::Mastering => f.write_str("MASTERING"),
            Self::Production => f.write_str("PRODUCTION"),
        }
    }
}

//-------------------------------------     TechnicalMetadata     -----------------------------------------------------
/// Technical details of the material the artist supplied. Copied verbatim from the request onto the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TechnicalMetadata {
    pub bpm: Option<i64>,
    pub musical_key: Option<String>,
    pub track_count: Option<i64>,
    pub reference_track_url: Option<String>,
    pub notes: Option<String>,
}

//-------------------------------------       ServiceRequest      -----------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub owner_artist_id: String,
    pub assigned_creator_id: Option<String>,
    pub tier_label: String,
    pub service_category: ServiceCategory,
    pub project_name: String,
    pub artist_name: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub technical: TechnicalMetadata,
    pub status: ServiceRequestStatus,
    pub status_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A service request as submitted through the (external) request form. Used to seed the store.
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub owner_artist_id: String,
    pub assigned_creator_id: Option<String>,
    pub tier_label: String,
    pub service_category: ServiceCategory,
    pub project_name: String,
    pub artist_name: String,
    pub technical: TechnicalMetadata,
    pub status: ServiceRequestStatus,
    pub genre_ids: Vec<i64>,
}

impl NewServiceRequest {
    pub fn new(owner_artist_id: &str, tier_label: &str, service_category: ServiceCategory) -> Self {
        Self {
            owner_artist_id: owner_artist_id.to_string(),
            assigned_creator_id: None,
            tier_label: tier_label.to_string(),
            service_category,
            project_name: "Untitled".to_string(),
            artist_name: owner_artist_id.to_string(),
            technical: TechnicalMetadata::default(),
            status: ServiceRequestStatus::AwaitingPayment,
            genre_ids: Vec::new(),
        }
    }

    pub fn with_names(mut self, project_name: &str, artist_name: &str) -> Self {
        self.project_name = project_name.to_string();
        self.artist_name = artist_name.to_string();
        self
    }

    pub fn with_creator(mut self, creator_id: &str) -> Self {
        self.assigned_creator_id = Some(creator_id.to_string());
        self
    }

    pub fn with_technical(mut self, technical: TechnicalMetadata) -> Self {
        self.technical = technical;
        self
    }

    pub fn with_status(mut self, status: ServiceRequestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_genres(mut self, genre_ids: &[i64]) -> Self {
        self.genre_ids = genre_ids.to_vec();
        self
    }
}

//-------------------------------------         TierPolicy        -----------------------------------------------------
/// Commercial terms of a service tier.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TierPolicy {
    pub label: String,
    pub price: Cents,
    pub number_of_revisions: i64,
    pub stems_allowance: i64,
    pub delivery_days: i64,
    pub commission_percentage: f64,
    pub updated_at: DateTime<Utc>,
}

//-------------------------------------    PaymentLedgerEntry     -----------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryStatus {
    Completed,
    /// Set by the refund workflow, never by settlement.
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    pub id: i64,
    pub service_request_id: i64,
    pub gateway_transaction_id: String,
    pub payment_reference_id: String,
    pub total_amount: Cents,
    pub platform_fee: Cents,
    pub creator_amount: Cents,
    pub currency: String,
    pub status: LedgerEntryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub service_request_id: i64,
    pub gateway_transaction_id: String,
    pub payment_reference_id: String,
    pub total_amount: Cents,
    pub platform_fee: Cents,
    pub creator_amount: Cents,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

//-------------------------------------          Project          -----------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub owner_artist_id: String,
    pub source_service_request_id: i64,
    pub project_name: String,
    pub artist_name: String,
    pub project_type: ProjectCategory,
    pub tier_label: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub technical: TechnicalMetadata,
    pub revision_limit: i64,
    pub delivery_deadline: DateTime<Utc>,
    pub stems_included: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub owner_artist_id: String,
    pub source_service_request_id: i64,
    pub project_name: String,
    pub artist_name: String,
    pub project_type: ProjectCategory,
    pub tier_label: String,
    pub technical: TechnicalMetadata,
    pub revision_limit: i64,
    pub delivery_deadline: DateTime<Utc>,
    pub stems_included: bool,
    pub created_at: DateTime<Utc>,
    pub assignment: NewServiceAssignment,
}

//-------------------------------------     ServiceAssignment     -----------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ServiceAssignment {
    pub id: i64,
    pub project_id: i64,
    pub category: ProjectCategory,
    pub creator_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceAssignment {
    pub category: ProjectCategory,
    pub creator_id: Option<String>,
}

//-------------------------------------           Genre           -----------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}
