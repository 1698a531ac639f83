use crate::error::ClientError;
use crate::http::{ApiClient, ApiRequest};

use super::types::{
    Affiliate, Commission, CommissionQuery, CommissionSummary, Organization, UpdateAffiliateRequest,
};

/// Read/update views over the signed-in affiliate's account.
pub struct AffiliateService<'a> {
    client: &'a ApiClient,
}

impl<'a> AffiliateService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_profile(&self) -> Result<Affiliate, ClientError> {
        self.client.get("/affiliates/profile").await
    }

    pub async fn update_profile(
        &self,
        update: &UpdateAffiliateRequest,
    ) -> Result<Affiliate, ClientError> {
        self.client.patch("/affiliates/profile", update).await
    }

    pub async fn organizations(&self) -> Result<Vec<Organization>, ClientError> {
        self.client.get("/affiliates/organizations").await
    }

    pub async fn commissions(&self, query: &CommissionQuery) -> Result<Vec<Commission>, ClientError> {
        let request = query
            .pairs()
            .into_iter()
            .fold(ApiRequest::get("/affiliates/commissions"), |req, (k, v)| {
                req.query(k, v)
            });
        let commissions: Vec<Commission> = self.client.execute(request).await?;
        Ok(commissions.into_iter().filter(|c| query.matches(c)).collect())
    }

    pub async fn commission_summary(&self, year: Option<i32>) -> Result<CommissionSummary, ClientError> {
        let mut request = ApiRequest::get("/affiliates/commission-summary");
        if let Some(year) = year {
            request = request.query("year", year);
        }
        self.client.execute(request).await
    }
}
