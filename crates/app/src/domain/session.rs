//! Session prefill for the checkout contact fields.

use estante::contact::ContactForm;

use crate::backend::Session;

/// Contact fields for the checkout form.
///
/// A signed-in customer gets their profile filled in and locked; anonymous visitors get an empty,
/// editable form.
pub fn prefill_contact(session: Option<&Session>) -> ContactForm {
    let Some(session) = session else {
        return ContactForm::default();
    };

    let customer = &session.customer;

    ContactForm {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        read_only: true,
    }
}
