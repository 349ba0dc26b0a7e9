//! Estante prelude.
//!
//! Convenience exports for storefront and checkout code.

pub use crate::{
    address::{AddressForm, BrazilianState, ShippingAddress},
    books::{Book, BookId},
    cart::{Cart, CartError, CartEvent, CartItem, CartNotification, SubscriptionKey},
    catalog::{Catalog, CatalogError},
    contact::{Contact, ContactForm},
    discounts::{DiscountError, PaymentDiscounts, discount_percent, payment_adjusted_total},
    legacy::{LegacyCart, LegacyCartError},
    order::{OrderDraft, OrderDraftError, OrderLine, OrderReference, OrderStatus},
    payment::PaymentMethod,
    pricing::{cart_subtotal, line_subtotal},
    receipt::Receipt,
    upsell::{BundleThreshold, Recommendation, Shortfall, recommend},
    validation::{Field, FieldError, FieldErrorReason, ValidationErrors},
};
