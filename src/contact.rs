//! Customer Contact

use serde::{Deserialize, Serialize};

use crate::validation::{
    Field, ValidationErrors, checked, normalize_email, normalize_phone, required,
};

/// Validated contact details for the person placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Email address, used to scope order lookups
    pub email: String,

    /// Phone, formatted `(99) 99999-9999`
    pub phone: String,
}

impl Contact {
    /// Full name as shown on the order.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Raw contact fields as entered in the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,

    /// Fields were filled from the signed-in session and cannot be edited
    #[serde(skip)]
    pub read_only: bool,
}

impl ContactForm {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every field that failed.
    pub fn validate(&self) -> Result<Contact, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = required(Field::FirstName, &self.first_name, &mut errors);
        let last_name = required(Field::LastName, &self.last_name, &mut errors);
        let email = checked(Field::Email, &self.email, normalize_email, &mut errors);
        let phone = checked(Field::Phone, &self.phone, normalize_phone, &mut errors);

        match (first_name, last_name, email, phone) {
            (Some(first_name), Some(last_name), Some(email), Some(phone)) if errors.is_empty() => {
                Ok(Contact {
                    first_name,
                    last_name,
                    email,
                    phone,
                })
            }
            _ => Err(errors),
        }
    }
}
