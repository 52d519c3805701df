use log::{debug, info};
use rds_common::helpers::{random_hex_token, random_id};

use crate::{
    db_types::{
        Chair,
        ChairId,
        NewChair,
        NewOwner,
        NewUser,
        Owner,
        OwnerId,
        User,
        UserId,
        PAYMENT_GATEWAY_URL_SETTING,
    },
    traits::{AccountApiError, AccountManagement, UserRegistration},
};

/// `AccountApi` handles registration and token-based lookup of the three account roles, plus the payment-method
/// and settings storage the dispatch core depends on. All of it is plain CRUD over the backend.
#[derive(Debug, Clone)]
pub struct AccountApi<B> {
    db: B,
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    /// Registers a new user. Generates the user's id, access token and personal invitation code; the backend
    /// grants the campaign coupon and processes `invitation_code` atomically with the insert.
    pub async fn register_user(
        &self,
        username: &str,
        firstname: &str,
        lastname: &str,
        date_of_birth: &str,
        invitation_code: Option<String>,
    ) -> Result<User, AccountApiError> {
        let user = NewUser {
            id: UserId::random(),
            username: username.to_string(),
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            date_of_birth: date_of_birth.to_string(),
            access_token: random_hex_token(32),
            invitation_code: random_id(15),
        };
        let registration = UserRegistration { user, invitation_code_used: invitation_code };
        let user = self.db.register_user(registration).await?;
        info!("👤️ User {} registered as [{}]", user.username, user.id);
        Ok(user)
    }

    pub async fn register_owner(&self, name: &str) -> Result<Owner, AccountApiError> {
        let owner = NewOwner {
            id: OwnerId::random(),
            name: name.to_string(),
            access_token: random_hex_token(32),
            chair_register_token: random_hex_token(32),
        };
        let owner = self.db.register_owner(owner).await?;
        info!("👤️ Owner {} registered as [{}]", owner.name, owner.id);
        Ok(owner)
    }

    /// Registers a chair under the owner holding `chair_register_token`. Chairs start inactive and without a
    /// position; they become candidates for matching once activated and reporting coordinates.
    pub async fn register_chair(
        &self,
        chair_register_token: &str,
        name: &str,
        model: &str,
    ) -> Result<Chair, AccountApiError> {
        let owner = self
            .db
            .fetch_owner_by_chair_register_token(chair_register_token)
            .await?
            .ok_or(AccountApiError::InvalidChairRegisterToken)?;
        let chair = NewChair {
            id: ChairId::random(),
            owner_id: owner.id,
            name: name.to_string(),
            model: model.to_string(),
            access_token: random_hex_token(32),
        };
        let chair = self.db.register_chair(chair).await?;
        info!("👤️ Chair {} ({}) registered as [{}]", chair.name, chair.model, chair.id);
        Ok(chair)
    }

    pub async fn user_by_token(&self, token: &str) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user_by_access_token(token).await
    }

    pub async fn chair_by_token(&self, token: &str) -> Result<Option<Chair>, AccountApiError> {
        self.db.fetch_chair_by_access_token(token).await
    }

    pub async fn owner_by_token(&self, token: &str) -> Result<Option<Owner>, AccountApiError> {
        self.db.fetch_owner_by_access_token(token).await
    }

    pub async fn set_chair_activity(&self, chair: &Chair, is_active: bool) -> Result<(), AccountApiError> {
        debug!("👤️ Chair [{}] is now {}", chair.id, if is_active { "active" } else { "inactive" });
        self.db.set_chair_activity(&chair.id, is_active).await
    }

    pub async fn register_payment_token(&self, user: &User, token: &str) -> Result<(), AccountApiError> {
        self.db.register_payment_token(&user.id, token).await
    }

    pub async fn payment_gateway_url(&self) -> Result<Option<String>, AccountApiError> {
        self.db.fetch_setting(PAYMENT_GATEWAY_URL_SETTING).await
    }

    pub async fn set_payment_gateway_url(&self, url: &str) -> Result<(), AccountApiError> {
        info!("👤️ Payment gateway URL set to {url}");
        self.db.store_setting(PAYMENT_GATEWAY_URL_SETTING, url).await
    }
}
