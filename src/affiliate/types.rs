use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliateStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationStatus {
    Active,
    Inactive,
    Suspended,
    Trial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndustryType {
    Dental,
    Wellness,
    Hospitality,
    Beauty,
    Fitness,
    Medical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    SetupFee,
    SubscriptionSale,
    MonthlyRecurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Calculated,
    Approved,
    Paid,
    Disputed,
}

impl OrganizationStatus {
    pub const ALL: [OrganizationStatus; 4] = [
        OrganizationStatus::Active,
        OrganizationStatus::Inactive,
        OrganizationStatus::Suspended,
        OrganizationStatus::Trial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "ACTIVE",
            OrganizationStatus::Inactive => "INACTIVE",
            OrganizationStatus::Suspended => "SUSPENDED",
            OrganizationStatus::Trial => "TRIAL",
        }
    }
}

impl IndustryType {
    pub const ALL: [IndustryType; 6] = [
        IndustryType::Dental,
        IndustryType::Wellness,
        IndustryType::Hospitality,
        IndustryType::Beauty,
        IndustryType::Fitness,
        IndustryType::Medical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryType::Dental => "DENTAL",
            IndustryType::Wellness => "WELLNESS",
            IndustryType::Hospitality => "HOSPITALITY",
            IndustryType::Beauty => "BEAUTY",
            IndustryType::Fitness => "FITNESS",
            IndustryType::Medical => "MEDICAL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndustryType::Dental => "Dental",
            IndustryType::Wellness => "Wellness",
            IndustryType::Hospitality => "Hospitality",
            IndustryType::Beauty => "Beauty",
            IndustryType::Fitness => "Fitness",
            IndustryType::Medical => "Medical",
        }
    }
}

impl CommissionType {
    pub const ALL: [CommissionType; 3] = [
        CommissionType::SetupFee,
        CommissionType::SubscriptionSale,
        CommissionType::MonthlyRecurring,
    ];

    /// Wire name, as used in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::SetupFee => "SETUP_FEE",
            CommissionType::SubscriptionSale => "SUBSCRIPTION_SALE",
            CommissionType::MonthlyRecurring => "MONTHLY_RECURRING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommissionType::SetupFee => "Setup Fee",
            CommissionType::SubscriptionSale => "Subscription Sale",
            CommissionType::MonthlyRecurring => "Monthly Recurring",
        }
    }
}

impl CommissionStatus {
    pub const ALL: [CommissionStatus; 4] = [
        CommissionStatus::Calculated,
        CommissionStatus::Approved,
        CommissionStatus::Paid,
        CommissionStatus::Disputed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Calculated => "CALCULATED",
            CommissionStatus::Approved => "APPROVED",
            CommissionStatus::Paid => "PAID",
            CommissionStatus::Disputed => "DISPUTED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommissionStatus::Calculated => "Calculated",
            CommissionStatus::Approved => "Approved",
            CommissionStatus::Paid => "Paid",
            CommissionStatus::Disputed => "Disputed",
        }
    }
}

/// Accepts `PAID`, `paid` or `monthly-recurring` style spellings.
fn parse_variant<T: Copy>(
    s: &str,
    all: &[T],
    name: fn(&T) -> &'static str,
    what: &str,
) -> Result<T, String> {
    let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
    all.iter().copied().find(|v| name(v) == wanted).ok_or_else(|| {
        let valid: Vec<&str> = all.iter().map(name).collect();
        format!("unknown {what} '{s}' (expected one of {})", valid.join(", "))
    })
}

impl FromStr for OrganizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "organization status")
    }
}

impl FromStr for IndustryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "industry")
    }
}

impl FromStr for CommissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "commission type")
    }
}

impl FromStr for CommissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "commission status")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateCounts {
    pub users: u64,
    pub organizations: u64,
    pub commissions: u64,
    pub sold_subscriptions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliate {
    pub id: String,
    pub name: String,
    pub business_name: String,
    pub primary_contact_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_phone: Option<String>,
    pub default_commission_rate: f64,
    pub account_balance: f64,
    pub status: AffiliateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, rename = "_count", skip_serializing_if = "Option::is_none")]
    pub counts: Option<AffiliateCounts>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAffiliateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_contact_phone: Option<String>,
}

impl UpdateAffiliateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.business_name.is_none()
            && self.primary_contact_email.is_none()
            && self.primary_contact_phone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCounts {
    pub users: u64,
    pub subscriptions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub business_name: String,
    pub industry_type: IndustryType,
    pub status: OrganizationStatus,
    pub primary_contact_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_commission_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, rename = "_count", skip_serializing_if = "Option::is_none")]
    pub counts: Option<OrganizationCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionOrganization {
    pub id: String,
    pub name: String,
    pub business_name: String,
    pub industry_type: IndustryType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSubscription {
    pub id: String,
    pub status: String,
    pub billing_cycle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: String,
    pub affiliate_id: String,
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub commission_type: CommissionType,
    pub commission_rate: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub organization_revenue: f64,
    pub commission_amount: f64,
    pub net_commission: f64,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<CommissionOrganization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<CommissionSubscription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommissions {
    pub month: String,
    pub total_commissions: f64,
    pub paid_commissions: f64,
    pub pending_commissions: f64,
}

/// Server-computed totals; the client only displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSummary {
    pub total_commissions_earned: f64,
    pub total_commissions_paid: f64,
    pub total_commissions_pending: f64,
    #[serde(default)]
    pub commissions_by_type: BTreeMap<String, f64>,
    #[serde(default)]
    pub commissions_by_status: BTreeMap<String, f64>,
    #[serde(default)]
    pub monthly_breakdown: Vec<MonthlyCommissions>,
}

/// Filters for the commissions list. `year`, `status` and `commission_type`
/// go to the server; `search` is applied locally to the returned rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommissionQuery {
    pub year: Option<i32>,
    pub status: Option<CommissionStatus>,
    pub commission_type: Option<CommissionType>,
    pub search: Option<String>,
}

impl CommissionQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(kind) = self.commission_type {
            pairs.push(("type", kind.as_str().to_string()));
        }
        pairs
    }

    /// Case-insensitive match on the organization's name or business name.
    /// A commission without an embedded organization never matches a search.
    pub fn matches(&self, commission: &Commission) -> bool {
        let Some(needle) = search_needle(self.search.as_deref()) else {
            return true;
        };
        commission.organization.as_ref().is_some_and(|org| {
            contains_folded(&org.name, &needle) || contains_folded(&org.business_name, &needle)
        })
    }
}

/// Local filters for the referred-organizations list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilter {
    /// Matched case-insensitively against name, business name and contact email.
    pub search: Option<String>,
    pub status: Option<OrganizationStatus>,
    pub industry: Option<IndustryType>,
}

impl OrganizationFilter {
    pub fn matches(&self, org: &Organization) -> bool {
        let search = match search_needle(self.search.as_deref()) {
            Some(needle) => {
                contains_folded(&org.name, &needle)
                    || contains_folded(&org.business_name, &needle)
                    || contains_folded(&org.primary_contact_email, &needle)
            }
            None => true,
        };
        search
            && self.status.is_none_or(|status| org.status == status)
            && self.industry.is_none_or(|industry| org.industry_type == industry)
    }

    pub fn apply(&self, orgs: Vec<Organization>) -> Vec<Organization> {
        orgs.into_iter().filter(|org| self.matches(org)).collect()
    }
}

/// Lowercased search term, or `None` when there is nothing to search for.
fn search_needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Totals over a (possibly filtered) commission list. Anything not yet
/// `PAID` counts as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommissionTotals {
    pub earned: f64,
    pub paid: f64,
    pub pending: f64,
}

impl CommissionTotals {
    pub fn of(commissions: &[Commission]) -> Self {
        commissions.iter().fold(Self::default(), |mut totals, c| {
            totals.earned += c.commission_amount;
            if c.status == CommissionStatus::Paid {
                totals.paid += c.commission_amount;
            } else {
                totals.pending += c.commission_amount;
            }
            totals
        })
    }
}
