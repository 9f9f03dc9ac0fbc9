//! Venue and city domain models.

use crate::model::validation::{
    optional_text, require_slug, require_text, ValidationError, MAX_NAME_CHARS, MAX_TEXT_CHARS,
};
use crate::model::RecordId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical venue record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub address: Option<String>,
    pub city_id: Option<RecordId>,
    pub capacity: Option<u32>,
    pub is_deleted: bool,
}

impl Venue {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            address: None,
            city_id: None,
            capacity: None,
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        require_slug(&self.slug)?;
        optional_text("address", self.address.as_deref(), MAX_TEXT_CHARS)?;
        Ok(())
    }
}

/// City lookup record. `state` is a two-letter UF code (`SP`, `RJ`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: RecordId,
    pub name: String,
    pub state: String,
}

impl City {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            state: state.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        let state_ok = self.state.len() == 2 && self.state.chars().all(|c| c.is_ascii_uppercase());
        if !state_ok {
            return Err(ValidationError::InvalidStateCode(self.state.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{City, Venue};
    use crate::model::validation::ValidationError;

    #[test]
    fn city_state_must_be_two_uppercase_letters() {
        assert!(City::new("Recife", "PE").validate().is_ok());
        assert_eq!(
            City::new("Recife", "pe").validate(),
            Err(ValidationError::InvalidStateCode("pe".to_string()))
        );
        assert!(City::new("Recife", "PER").validate().is_err());
    }

    #[test]
    fn venue_requires_name() {
        assert_eq!(
            Venue::new(" ", "teatro").validate(),
            Err(ValidationError::EmptyField("name"))
        );
    }
}
