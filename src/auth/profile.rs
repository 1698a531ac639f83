use crate::error::ClientError;
use crate::http::ApiClient;

use super::types::{UpdateProfileRequest, User};

/// The signed-in user's own account, kept in sync with the session's cached user.
pub struct ProfileService<'a> {
    client: &'a ApiClient,
}

impl<'a> ProfileService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_profile(&self) -> Result<User, ClientError> {
        let user: User = self.client.get("/auth/profile").await?;
        self.client.store().set_user(user.clone()).await;
        Ok(user)
    }

    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<User, ClientError> {
        let user: User = self.client.patch("/auth/profile", update).await?;
        self.client.store().set_user(user.clone()).await;
        Ok(user)
    }
}
