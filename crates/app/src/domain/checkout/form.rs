//! Checkout form and its validation.

use estante::{
    address::{AddressForm, ShippingAddress},
    cart::Cart,
    contact::{Contact, ContactForm},
    payment::PaymentMethod,
    validation::{Field, FieldErrorReason, ValidationErrors},
};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{AddressUuid, Session},
    domain::session::prefill_contact,
};

/// Which shipping address the customer picked.
///
/// Serialized untagged: a map with a `uuid` picks a saved address, anything else is read as a
/// freshly typed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressChoice {
    /// A saved address, optionally edited in place.
    Saved {
        uuid: AddressUuid,

        #[serde(default)]
        edits: Option<AddressForm>,
    },

    /// A freshly typed address.
    New(AddressForm),
}

/// Everything the customer typed on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub contact: ContactForm,
    pub address: AddressChoice,
    pub payment_method: String,

    /// Keep a fresh address in the customer's address book.
    #[serde(default)]
    pub save_address: bool,

    /// Make the chosen address the customer's default.
    #[serde(default)]
    pub make_default: bool,
}

/// Resolved shipping address, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValidatedAddress {
    New(ShippingAddress),
    Saved {
        uuid: AddressUuid,
        edits: Option<ShippingAddress>,
    },
}

/// A checkout form that passed every field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedCheckout {
    pub(crate) contact: Contact,
    pub(crate) address: ValidatedAddress,
    pub(crate) payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Validate the form against the cart it would check out.
    ///
    /// Signed-in customers check out with their session's contact details. Saved addresses are
    /// only available to signed-in customers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every field that failed.
    pub(crate) fn validate(
        &self,
        cart: &Cart,
        session: Option<&Session>,
    ) -> Result<ValidatedCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let contact_form = match session {
            Some(session) => merge_session_contact(&self.contact, session),
            None => self.contact.clone(),
        };

        let contact = contact_form
            .validate()
            .map_err(|failures| errors.extend(failures))
            .ok();

        let address = match &self.address {
            AddressChoice::New(form) => form
                .validate()
                .map(ValidatedAddress::New)
                .map_err(|failures| errors.extend(failures))
                .ok(),
            AddressChoice::Saved { .. } if session.is_none() => {
                errors.push(Field::Address, FieldErrorReason::NotFound);
                None
            }
            AddressChoice::Saved { uuid, edits } => match edits.as_ref().map(AddressForm::validate)
            {
                None => Some(ValidatedAddress::Saved {
                    uuid: *uuid,
                    edits: None,
                }),
                Some(Ok(address)) => Some(ValidatedAddress::Saved {
                    uuid: *uuid,
                    edits: Some(address),
                }),
                Some(Err(failures)) => {
                    errors.extend(failures);
                    None
                }
            },
        };

        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_err| {
                errors.push(Field::PaymentMethod, FieldErrorReason::UnknownPaymentMethod);
            })
            .ok();

        if cart.is_empty() {
            errors.push(Field::Cart, FieldErrorReason::Empty);
        }

        match (contact, address, payment_method) {
            (Some(contact), Some(address), Some(payment_method)) if errors.is_empty() => {
                Ok(ValidatedCheckout {
                    contact,
                    address,
                    payment_method,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Session values win over typed ones; blanks in the session fall back to the form.
fn merge_session_contact(form: &ContactForm, session: &Session) -> ContactForm {
    let prefilled = prefill_contact(Some(session));

    let pick = |session_value: String, typed: &str| {
        if session_value.trim().is_empty() {
            typed.to_string()
        } else {
            session_value
        }
    };

    ContactForm {
        first_name: pick(prefilled.first_name, &form.first_name),
        last_name: pick(prefilled.last_name, &form.last_name),
        email: pick(prefilled.email, &form.email),
        phone: pick(prefilled.phone, &form.phone),
        read_only: prefilled.read_only,
    }
}
