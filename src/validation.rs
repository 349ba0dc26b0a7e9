//! Form Validation
//!
//! Field-level checks for the checkout form. Every check collects into [`ValidationErrors`] so a
//! form reports all of its problems at once.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::LazyLock,
};

use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;

#[expect(clippy::expect_used, reason = "literal pattern, exercised by tests")]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

#[expect(clippy::expect_used, reason = "literal pattern, exercised by tests")]
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?(\d{2})\)?\s?(\d{4,5})[-\s]?(\d{4})$").expect("valid phone pattern")
});

#[expect(clippy::expect_used, reason = "literal pattern, exercised by tests")]
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{5})-?(\d{3})$").expect("valid postal code pattern"));

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Contact or recipient first name
    FirstName,
    /// Contact or recipient last name
    LastName,
    /// Contact email
    Email,
    /// Phone number
    Phone,
    /// Street name
    Street,
    /// Street number
    Number,
    /// Neighborhood
    Neighborhood,
    /// City
    City,
    /// Two-letter state code
    State,
    /// Postal code (CEP)
    PostalCode,
    /// Payment method
    PaymentMethod,
    /// Saved address selection
    Address,
    /// Cart contents
    Cart,
}

impl Field {
    /// Snake-case field name, as used by form views.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Street => "street",
            Self::Number => "number",
            Self::Neighborhood => "neighborhood",
            Self::City => "city",
            Self::State => "state",
            Self::PostalCode => "postal_code",
            Self::PaymentMethod => "payment_method",
            Self::Address => "address",
            Self::Cart => "cart",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorReason {
    /// Missing or blank
    Required,
    /// Not an email address
    InvalidEmail,
    /// Not a `(99) 99999-9999` phone number
    InvalidPhone,
    /// Not a `99999-999` postal code
    InvalidPostalCode,
    /// Not one of the 27 state codes
    UnknownState,
    /// Not an accepted payment method
    UnknownPaymentMethod,
    /// Selected record does not exist
    NotFound,
    /// Nothing to check out
    Empty,
}

impl FieldErrorReason {
    fn message(self) -> &'static str {
        match self {
            Self::Required => "is required",
            Self::InvalidEmail => "must be a valid email address",
            Self::InvalidPhone => "must match (99) 99999-9999",
            Self::InvalidPostalCode => "must match 99999-999",
            Self::UnknownState => "must be a valid state code",
            Self::UnknownPaymentMethod => "must be pix, cartao or boleto",
            Self::NotFound => "was not found",
            Self::Empty => "is empty",
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Offending field
    pub field: Field,

    /// Failure reason
    pub reason: FieldErrorReason,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.field, self.reason.message())
    }
}

/// Every field-level failure found in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(SmallVec<[FieldError; 4]>);

impl ValidationErrors {
    /// Record a failure.
    pub fn push(&mut self, field: Field, reason: FieldErrorReason) {
        self.0.push(FieldError { field, reason });
    }

    /// Merge failures found elsewhere.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Whether no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate failures in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First failure reason recorded for `field`.
    pub fn reason(&self, field: Field) -> Option<FieldErrorReason> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.reason)
    }

    /// Whether `field` failed.
    pub fn contains(&self, field: Field) -> bool {
        self.reason(field).is_some()
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one failure was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }

            Display::fmt(error, f)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trimmed value of a required field, or `None` after recording [`FieldErrorReason::Required`].
pub fn required(field: Field, value: &str, errors: &mut ValidationErrors) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        errors.push(field, FieldErrorReason::Required);
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trimmed value of an optional field; blank becomes `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

/// Validate an email address.
///
/// # Errors
///
/// Returns [`FieldErrorReason::InvalidEmail`] when `value` is not an address.
pub fn normalize_email(value: &str) -> Result<String, FieldErrorReason> {
    let trimmed = value.trim();

    if EMAIL.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(FieldErrorReason::InvalidEmail)
    }
}

/// Validate a phone number and format it as `(99) 99999-9999` (or `(99) 9999-9999` for
/// landlines).
///
/// # Errors
///
/// Returns [`FieldErrorReason::InvalidPhone`] when `value` is not a phone number.
pub fn normalize_phone(value: &str) -> Result<String, FieldErrorReason> {
    let captures = PHONE
        .captures(value.trim())
        .ok_or(FieldErrorReason::InvalidPhone)?;

    match (captures.get(1), captures.get(2), captures.get(3)) {
        (Some(area), Some(prefix), Some(line)) => Ok(format!(
            "({}) {}-{}",
            area.as_str(),
            prefix.as_str(),
            line.as_str()
        )),
        _ => Err(FieldErrorReason::InvalidPhone),
    }
}

/// Validate a postal code and format it as `99999-999`.
///
/// # Errors
///
/// Returns [`FieldErrorReason::InvalidPostalCode`] when `value` is not a postal code.
pub fn normalize_postal_code(value: &str) -> Result<String, FieldErrorReason> {
    let captures = POSTAL_CODE
        .captures(value.trim())
        .ok_or(FieldErrorReason::InvalidPostalCode)?;

    match (captures.get(1), captures.get(2)) {
        (Some(head), Some(tail)) => Ok(format!("{}-{}", head.as_str(), tail.as_str())),
        _ => Err(FieldErrorReason::InvalidPostalCode),
    }
}

/// Run a normalizer on a required field, recording any failure.
pub fn checked(
    field: Field,
    value: &str,
    normalize: impl FnOnce(&str) -> Result<String, FieldErrorReason>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = required(field, value, errors)?;

    match normalize(&value) {
        Ok(normalized) => Some(normalized),
        Err(reason) => {
            errors.push(field, reason);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    impl Display for FieldErrorReason {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            f.write_str(self.message())
        }
    }

    #[test]
    fn accepts_plain_email_addresses() -> TestResult {
        assert_eq!(normalize_email(" leitor@estante.com.br ")?, "leitor@estante.com.br");

        Ok(())
    }

    #[test]
    fn rejects_malformed_email_addresses() {
        for value in ["", "leitor", "leitor@", "leitor@estante", "a b@estante.com"] {
            assert_eq!(
                normalize_email(value),
                Err(FieldErrorReason::InvalidEmail),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_phone_numbers_with_mask() -> TestResult {
        assert_eq!(normalize_phone("11987654321")?, "(11) 98765-4321");
        assert_eq!(normalize_phone("(11) 98765-4321")?, "(11) 98765-4321");
        assert_eq!(normalize_phone("(21) 3456-7890")?, "(21) 3456-7890");

        Ok(())
    }

    #[test]
    fn rejects_short_phone_numbers() {
        assert_eq!(normalize_phone("98765-4321"), Err(FieldErrorReason::InvalidPhone));
        assert_eq!(normalize_phone("(11) 9876-54"), Err(FieldErrorReason::InvalidPhone));
    }

    #[test]
    fn formats_postal_codes_with_mask() -> TestResult {
        assert_eq!(normalize_postal_code("01310100")?, "01310-100");
        assert_eq!(normalize_postal_code("01310-100")?, "01310-100");

        Ok(())
    }

    #[test]
    fn rejects_malformed_postal_codes() {
        assert_eq!(
            normalize_postal_code("0131-0100"),
            Err(FieldErrorReason::InvalidPostalCode)
        );
        assert_eq!(
            normalize_postal_code("1234567"),
            Err(FieldErrorReason::InvalidPostalCode)
        );
    }

    #[test]
    fn blank_required_fields_are_recorded() {
        let mut errors = ValidationErrors::default();

        assert_eq!(required(Field::City, "   ", &mut errors), None);
        assert_eq!(
            required(Field::Street, " Rua Augusta ", &mut errors),
            Some("Rua Augusta".to_string())
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.reason(Field::City), Some(FieldErrorReason::Required));
    }

    #[test]
    fn checked_records_required_before_format() {
        let mut errors = ValidationErrors::default();

        checked(Field::Email, "", normalize_email, &mut errors);
        checked(Field::Phone, "123", normalize_phone, &mut errors);

        assert_eq!(errors.reason(Field::Email), Some(FieldErrorReason::Required));
        assert_eq!(errors.reason(Field::Phone), Some(FieldErrorReason::InvalidPhone));
    }

    #[test]
    fn display_lists_every_failure() {
        let mut errors = ValidationErrors::default();

        errors.push(Field::City, FieldErrorReason::Required);
        errors.push(Field::PostalCode, FieldErrorReason::InvalidPostalCode);

        assert_eq!(
            errors.to_string(),
            "city is required; postal_code must match 99999-999"
        );
    }

    #[test]
    fn into_result_passes_value_through_when_empty() {
        assert_eq!(ValidationErrors::default().into_result(7), Ok(7));
    }
}
