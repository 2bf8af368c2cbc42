use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// A customer identity record. Created once at registration and never
/// deleted; accounts reference their owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// National identity number, unique across all time.
    pub national_id: String,
    pub phone: String,
    pub address: String,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        national_id: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            national_id: national_id.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }
}
