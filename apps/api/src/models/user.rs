use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Agency,
}

/// Read-side account record. Account lifecycle (signup, OTP, activation)
/// is handled outside this service; the intake workflow only resolves
/// agencies and enumerates them for notification fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl User {
    pub fn is_agency(&self) -> bool {
        self.role == UserRole::Agency
    }
}
