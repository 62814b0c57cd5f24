//! Customer entity model and DTOs.

use crm_core::entities::customer::CustomerRecord;
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A customer row from the `customers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Column values for an insert or a full-row update. Built from a record
/// that already passed the customer rule table.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&CustomerRecord> for CreateCustomer {
    fn from(record: &CustomerRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

/// DTO for updating a customer. All fields are optional; an empty `phone`
/// clears the stored number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateCustomer {
    /// Merge onto `existing`, producing the record to re-validate.
    pub fn apply_to(&self, existing: &Customer) -> CustomerRecord {
        CustomerRecord::new(
            self.name.as_deref().unwrap_or(&existing.name),
            self.email.as_deref().unwrap_or(&existing.email),
            self.phone.as_deref().or(existing.phone.as_deref()),
        )
    }
}
