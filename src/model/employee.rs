use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "ASH-0042",
        "name": "John Doe",
        "department": "Engineering",
        "position": "Technician",
        "rfid_tag": "0004829137",
        "photo_url": "/photos/ash-0042.jpg",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Badge number printed on the card
    #[schema(example = "ASH-0042")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Technician", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "0004829137")]
    pub rfid_tag: String,

    #[schema(example = "/photos/ash-0042.jpg", nullable = true)]
    pub photo_url: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Resigned,
}

impl Employee {
    /// `None` when the stored value is outside the known set.
    pub fn status(&self) -> Option<EmployeeStatus> {
        self.status.parse().ok()
    }
}

#[cfg(test)]
pub(crate) fn sample(id: u64, name: &str, rfid_tag: &str) -> Employee {
    Employee {
        id,
        employee_code: format!("ASH-{id:04}"),
        name: name.to_string(),
        department: Some("Operations".to_string()),
        position: None,
        rfid_tag: rfid_tag.to_string(),
        photo_url: Some(format!("/photos/{id}.jpg")),
        status: EmployeeStatus::Active.to_string(),
    }
}
