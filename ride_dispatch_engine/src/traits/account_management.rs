use thiserror::Error;

use crate::db_types::{Chair, ChairId, NewChair, NewOwner, NewUser, Owner, OwnerId, PaymentToken, User, UserId};

/// A new user registration. The row data is fully formed by the caller; `invitation_code_used` is the *inviter's*
/// code supplied at sign-up, if any.
#[derive(Debug, Clone)]
pub struct UserRegistration {
    pub user: NewUser,
    pub invitation_code_used: Option<String>,
}

/// Registration and lookup of the three account roles, plus the handful of key-value settings the server stores.
///
/// Everything here is plain CRUD; the interesting part is [`register_user`](AccountManagement::register_user),
/// which must grant the first-use campaign coupon and process invitation-code redemption atomically with the user
/// insert.
#[allow(async_fn_in_trait)]
pub trait AccountManagement: Clone {
    /// Registers a new user in a single atomic transaction:
    /// * inserts the user row,
    /// * grants the first-use campaign coupon,
    /// * if an invitation code was supplied: verifies it belongs to an existing user and has fewer than the capped
    ///   number of redemptions, then grants the invite coupon to the new user and a uniquified reward coupon to the
    ///   inviter.
    ///
    /// An unknown or exhausted invitation code fails the whole registration with
    /// [`AccountApiError::InvalidInvitation`].
    async fn register_user(&self, registration: UserRegistration) -> Result<User, AccountApiError>;

    async fn register_owner(&self, owner: NewOwner) -> Result<Owner, AccountApiError>;

    /// Registers a new chair under the owner holding the given chair-register token. Chairs start inactive.
    async fn register_chair(&self, chair: NewChair) -> Result<Chair, AccountApiError>;

    async fn fetch_user_by_access_token(&self, token: &str) -> Result<Option<User>, AccountApiError>;

    async fn fetch_owner_by_access_token(&self, token: &str) -> Result<Option<Owner>, AccountApiError>;

    async fn fetch_owner_by_chair_register_token(&self, token: &str) -> Result<Option<Owner>, AccountApiError>;

    async fn fetch_chair_by_access_token(&self, token: &str) -> Result<Option<Chair>, AccountApiError>;

    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, AccountApiError>;

    async fn fetch_chair(&self, id: &ChairId) -> Result<Option<Chair>, AccountApiError>;

    async fn fetch_owner(&self, id: &OwnerId) -> Result<Option<Owner>, AccountApiError>;

    async fn fetch_chairs_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Chair>, AccountApiError>;

    async fn set_chair_activity(&self, chair_id: &ChairId, is_active: bool) -> Result<(), AccountApiError>;

    /// Stores (or replaces) the user's payment token.
    async fn register_payment_token(&self, user_id: &UserId, token: &str) -> Result<(), AccountApiError>;

    async fn fetch_payment_token(&self, user_id: &UserId) -> Result<Option<PaymentToken>, AccountApiError>;

    async fn fetch_setting(&self, name: &str) -> Result<Option<String>, AccountApiError>;

    async fn store_setting(&self, name: &str, value: &str) -> Result<(), AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("This invitation code cannot be used.")]
    InvalidInvitation,
    #[error("The chair register token is not valid.")]
    InvalidChairRegisterToken,
    #[error("The record was not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}
