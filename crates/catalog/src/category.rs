use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agristore_core::{CategoryId, DomainError, DomainResult, Entity};

/// A product category. Products reference it by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn into_category(self, now: DateTime<Utc>) -> DomainResult<Category> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("category name is required"));
        }
        Ok(Category {
            id: CategoryId::new(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}
