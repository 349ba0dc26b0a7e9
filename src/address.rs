//! Shipping Addresses

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{
    Field, FieldErrorReason, ValidationErrors, checked, normalize_phone, normalize_postal_code,
    optional, required,
};

/// Error parsing a state code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown state code: {0:?}")]
pub struct UnknownStateError(pub String);

macro_rules! states {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Brazilian federative unit, by two-letter code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BrazilianState {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl BrazilianState {
            /// Every state, in code order.
            pub const ALL: &'static [BrazilianState] = &[$(Self::$variant),+];

            /// Two-letter code.
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            /// Full state name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

states! {
    AC => "Acre",
    AL => "Alagoas",
    AM => "Amazonas",
    AP => "Amapá",
    BA => "Bahia",
    CE => "Ceará",
    DF => "Distrito Federal",
    ES => "Espírito Santo",
    GO => "Goiás",
    MA => "Maranhão",
    MG => "Minas Gerais",
    MS => "Mato Grosso do Sul",
    MT => "Mato Grosso",
    PA => "Pará",
    PB => "Paraíba",
    PE => "Pernambuco",
    PI => "Piauí",
    PR => "Paraná",
    RJ => "Rio de Janeiro",
    RN => "Rio Grande do Norte",
    RO => "Rondônia",
    RR => "Roraima",
    RS => "Rio Grande do Sul",
    SC => "Santa Catarina",
    SE => "Sergipe",
    SP => "São Paulo",
    TO => "Tocantins",
}

impl Display for BrazilianState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.code())
    }
}

impl FromStr for BrazilianState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Self::ALL
            .iter()
            .copied()
            .find(|state| state.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownStateError(s.to_string()))
    }
}

/// A validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient first name
    pub first_name: String,

    /// Recipient last name
    pub last_name: String,

    /// Recipient phone, formatted `(99) 99999-9999`
    pub phone: String,

    /// Street name
    pub street: String,

    /// Street number
    pub number: String,

    /// Apartment, block, etc.
    pub complement: Option<String>,

    /// Neighborhood
    pub neighborhood: String,

    /// City
    pub city: String,

    /// State
    pub state: BrazilianState,

    /// Postal code, formatted `99999-999`
    pub postal_code: String,
}

impl ShippingAddress {
    /// Recipient's full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Single-line rendering stored on orders.
    pub fn formatted(&self) -> String {
        let mut line = format!("{}, {}", self.street, self.number);

        if let Some(complement) = &self.complement {
            line.push_str(", ");
            line.push_str(complement);
        }

        format!(
            "{line} - {}, {}/{} - CEP {}",
            self.neighborhood, self.city, self.state, self.postal_code
        )
    }
}

/// Raw, unvalidated address fields as entered in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    /// Recipient first name
    pub first_name: String,

    /// Recipient last name
    pub last_name: String,

    /// Recipient phone
    pub phone: String,

    /// Street name
    pub street: String,

    /// Street number
    pub number: String,

    /// Apartment, block, etc.
    pub complement: Option<String>,

    /// Neighborhood
    pub neighborhood: String,

    /// City
    pub city: String,

    /// Two-letter state code
    pub state: String,

    /// Postal code
    pub postal_code: String,
}

impl AddressForm {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every field that failed.
    pub fn validate(&self) -> Result<ShippingAddress, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = required(Field::FirstName, &self.first_name, &mut errors);
        let last_name = required(Field::LastName, &self.last_name, &mut errors);
        let phone = checked(Field::Phone, &self.phone, normalize_phone, &mut errors);
        let street = required(Field::Street, &self.street, &mut errors);
        let number = required(Field::Number, &self.number, &mut errors);
        let neighborhood = required(Field::Neighborhood, &self.neighborhood, &mut errors);
        let city = required(Field::City, &self.city, &mut errors);

        let state = required(Field::State, &self.state, &mut errors).and_then(|code| {
            code.parse::<BrazilianState>()
                .map_err(|_unknown| errors.push(Field::State, FieldErrorReason::UnknownState))
                .ok()
        });

        let postal_code = checked(
            Field::PostalCode,
            &self.postal_code,
            normalize_postal_code,
            &mut errors,
        );

        match (
            first_name,
            last_name,
            phone,
            street,
            number,
            neighborhood,
            city,
            state,
            postal_code,
        ) {
            (
                Some(first_name),
                Some(last_name),
                Some(phone),
                Some(street),
                Some(number),
                Some(neighborhood),
                Some(city),
                Some(state),
                Some(postal_code),
            ) if errors.is_empty() => Ok(ShippingAddress {
                first_name,
                last_name,
                phone,
                street,
                number,
                complement: optional(self.complement.as_deref()),
                neighborhood,
                city,
                state,
                postal_code,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&ShippingAddress> for AddressForm {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            first_name: address.first_name.clone(),
            last_name: address.last_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            number: address.number.clone(),
            complement: address.complement.clone(),
            neighborhood: address.neighborhood.clone(),
            city: address.city.clone(),
            state: address.state.code().to_string(),
            postal_code: address.postal_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            first_name: "Clarice".to_string(),
            last_name: "Lispector".to_string(),
            phone: "21987654321".to_string(),
            street: "Rua Gustavo Sampaio".to_string(),
            number: "88".to_string(),
            complement: Some("  ".to_string()),
            neighborhood: "Leme".to_string(),
            city: "Rio de Janeiro".to_string(),
            state: "rj".to_string(),
            postal_code: "22010010".to_string(),
        }
    }

    #[test]
    fn valid_form_normalizes_masks() -> TestResult {
        let address = form().validate()?;

        assert_eq!(address.phone, "(21) 98765-4321");
        assert_eq!(address.postal_code, "22010-010");
        assert_eq!(address.state, BrazilianState::RJ);
        assert_eq!(address.complement, None);

        Ok(())
    }

    #[test]
    fn empty_city_is_reported() {
        let result = AddressForm {
            city: String::new(),
            ..form()
        }
        .validate();

        let Err(errors) = result else {
            unreachable!("an empty city must fail validation");
        };

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.reason(Field::City), Some(FieldErrorReason::Required));
    }

    #[test]
    fn every_failure_is_collected() {
        let result = AddressForm {
            phone: "123".to_string(),
            state: "XX".to_string(),
            postal_code: "abc".to_string(),
            ..form()
        }
        .validate();

        let Err(errors) = result else {
            unreachable!("invalid fields must fail validation");
        };

        assert_eq!(errors.reason(Field::Phone), Some(FieldErrorReason::InvalidPhone));
        assert_eq!(errors.reason(Field::State), Some(FieldErrorReason::UnknownState));
        assert_eq!(
            errors.reason(Field::PostalCode),
            Some(FieldErrorReason::InvalidPostalCode)
        );
    }

    #[test]
    fn formatted_includes_complement_when_present() -> TestResult {
        let address = AddressForm {
            complement: Some("Apto 42".to_string()),
            ..form()
        }
        .validate()?;

        assert_eq!(
            address.formatted(),
            "Rua Gustavo Sampaio, 88, Apto 42 - Leme, Rio de Janeiro/RJ - CEP 22010-010"
        );

        Ok(())
    }

    #[test]
    fn there_are_twenty_seven_states() {
        assert_eq!(BrazilianState::ALL.len(), 27);
        assert_eq!(BrazilianState::SP.name(), "São Paulo");
    }

    #[test]
    fn form_round_trips_from_address() -> TestResult {
        let address = form().validate()?;

        assert_eq!(AddressForm::from(&address).validate()?, address);

        Ok(())
    }
}
