//! Test Helpers

use estante::{
    address::{AddressForm, BrazilianState, ShippingAddress},
    books::{Book, BookId},
    cart::Cart,
    contact::ContactForm,
};
use rusty_money::{Money, iso::BRL};

use crate::{
    backend::{CustomerRecord, CustomerUuid},
    domain::checkout::{AddressChoice, CheckoutForm},
};

pub(crate) fn customer() -> CustomerRecord {
    CustomerRecord {
        uuid: CustomerUuid::new(),
        email: "clarice@estante.com.br".to_string(),
        first_name: "Clarice".to_string(),
        last_name: "Lispector".to_string(),
        phone: "(21) 98765-4321".to_string(),
    }
}

pub(crate) fn address(street: &str) -> ShippingAddress {
    ShippingAddress {
        first_name: "Clarice".to_string(),
        last_name: "Lispector".to_string(),
        phone: "(21) 98765-4321".to_string(),
        street: street.to_string(),
        number: "88".to_string(),
        complement: None,
        neighborhood: "Leme".to_string(),
        city: "Rio de Janeiro".to_string(),
        state: BrazilianState::RJ,
        postal_code: "22010-010".to_string(),
    }
}

pub(crate) fn address_form(street: &str) -> AddressForm {
    AddressForm::from(&address(street))
}

pub(crate) fn contact_form() -> ContactForm {
    ContactForm {
        first_name: "Clarice".to_string(),
        last_name: "Lispector".to_string(),
        email: "clarice@estante.com.br".to_string(),
        phone: "21987654321".to_string(),
        read_only: false,
    }
}

pub(crate) fn book(title: &str, price_minor: i64) -> Book {
    Book::new(
        BookId::new(),
        title,
        "Machado de Assis",
        Money::from_minor(price_minor, BRL),
    )
}

/// Cart holding two copies of a 49.90 book.
pub(crate) fn cart() -> Cart {
    let mut cart = Cart::new(BRL);
    let book = book("Dom Casmurro", 49_90);

    for _ in 0..2 {
        if let Err(error) = cart.add_item(&book) {
            unreachable!("adding a BRL book to a BRL cart failed: {error}");
        }
    }

    cart
}

pub(crate) fn checkout_form(payment_method: &str) -> CheckoutForm {
    CheckoutForm {
        contact: contact_form(),
        address: AddressChoice::New(address_form("Rua Gustavo Sampaio")),
        payment_method: payment_method.to_string(),
        save_address: false,
        make_default: false,
    }
}
