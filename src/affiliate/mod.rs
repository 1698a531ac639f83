pub mod service;
pub mod types;

pub use service::AffiliateService;
pub use types::{
    Affiliate, Commission, CommissionQuery, CommissionStatus, CommissionSummary, CommissionTotals,
    CommissionType, IndustryType, Organization, OrganizationFilter, OrganizationStatus,
    UpdateAffiliateRequest,
};
