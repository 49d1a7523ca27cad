use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    #[allow(dead_code)]
    pub user_id: Option<String>, // caller-side reference, unique when set
    pub mobile: String,
    pub status: Option<String>, // 'active' | 'blocked', unset on creation
    #[allow(dead_code)]
    pub active: bool, // false once soft-deleted
    #[allow(dead_code)]
    pub created: OffsetDateTime,
    #[allow(dead_code)]
    pub modified: OffsetDateTime,
}

/// Input for a new account; the id is generated by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: Option<String>,
    pub mobile: String,
}
