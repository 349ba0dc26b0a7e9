//! Checkout service: validates the form, persists the address and places the order.

use std::sync::Arc;

use estante::{
    address::ShippingAddress,
    cart::Cart,
    discounts::PaymentDiscounts,
    order::{OrderDraft, OrderReference},
    receipt::Receipt,
    validation::{Field, FieldErrorReason, ValidationErrors},
};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    backend::{CustomerUuid, OrderRecord, Session},
    domain::{
        addresses::AddressesService,
        checkout::{
            errors::CheckoutError,
            form::{CheckoutForm, ValidatedAddress, ValidatedCheckout},
        },
        orders::{OrdersService, OrdersServiceError, RecordedOrder},
    },
};

/// Where a checkout attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Waiting for the customer, with the failures of the last validation.
    Collecting { errors: ValidationErrors },

    /// The form is being checked.
    Validating,

    /// Collaborator calls are in flight.
    Submitting,

    /// The order was placed. Terminal.
    Succeeded { reference: OrderReference },

    /// The order could not be placed.
    Failed { message: String },
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self::Collecting {
            errors: ValidationErrors::default(),
        }
    }
}

impl CheckoutState {
    /// Move into [`CheckoutState::Validating`]. A failed attempt may be submitted again.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadySubmitting`]: an attempt is in flight.
    /// - [`CheckoutError::AlreadySucceeded`]: the order was already placed.
    fn begin(&mut self) -> Result<(), CheckoutError> {
        match self {
            Self::Collecting { .. } | Self::Failed { .. } => {
                *self = Self::Validating;

                Ok(())
            }
            Self::Validating | Self::Submitting => Err(CheckoutError::AlreadySubmitting),
            Self::Succeeded { .. } => Err(CheckoutError::AlreadySucceeded),
        }
    }

    /// Move a failed attempt back to [`CheckoutState::Collecting`].
    fn retry(&mut self) -> Result<(), CheckoutError> {
        match self {
            Self::Failed { .. } => {
                *self = Self::default();

                Ok(())
            }
            Self::Succeeded { .. } => Err(CheckoutError::AlreadySucceeded),
            Self::Validating | Self::Submitting => Err(CheckoutError::AlreadySubmitting),
            Self::Collecting { .. } => Err(CheckoutError::NotFailed),
        }
    }

    /// Whether collaborator calls are in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// Order header as stored
    pub order: OrderRecord,

    /// Short reference shown to the customer
    pub reference: OrderReference,

    /// Printable summary
    pub receipt: Receipt,

    /// Whether the order lines were stored alongside the header
    pub items_written: bool,

    /// Whether the order was stored without the customer reference after a policy rejection
    pub anonymous_fallback: bool,
}

/// One checkout attempt.
///
/// Holds its [`CheckoutState`] so that a second submit while one is in flight is rejected.
pub struct Checkout {
    addresses: Arc<dyn AddressesService>,
    orders: Arc<dyn OrdersService>,
    discounts: PaymentDiscounts,
    state: Mutex<CheckoutState>,
}

impl Checkout {
    /// Start an attempt in [`CheckoutState::Collecting`].
    #[must_use]
    pub fn new(
        addresses: Arc<dyn AddressesService>,
        orders: Arc<dyn OrdersService>,
        discounts: PaymentDiscounts,
    ) -> Self {
        Self {
            addresses,
            orders,
            discounts,
            state: Mutex::new(CheckoutState::default()),
        }
    }

    /// Current state of the attempt.
    pub async fn state(&self) -> CheckoutState {
        self.state.lock().await.clone()
    }

    /// Go back to collecting input after a failure.
    ///
    /// # Errors
    ///
    /// Returns an error when the attempt has not failed.
    pub async fn retry(&self) -> Result<(), CheckoutError> {
        self.state.lock().await.retry()
    }

    /// Validate `form` and place the order for `cart`.
    ///
    /// Invalid forms return to collecting without touching the collaborator. When the order
    /// header is rejected by an access policy, the order is retried once without the customer
    /// reference. The cart is cleared as soon as an order header is stored.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`]: one or more fields failed; nothing was sent.
    /// - [`CheckoutError::AlreadySubmitting`] / [`CheckoutError::AlreadySucceeded`]: the attempt
    ///   cannot be submitted now.
    /// - [`CheckoutError::Address`], [`CheckoutError::Order`], [`CheckoutError::Draft`]: placing
    ///   the order failed; the attempt is left failed.
    #[instrument(skip_all, fields(signed_in = session.is_some()))]
    pub async fn submit(
        &self,
        cart: &mut Cart,
        form: &CheckoutForm,
        session: Option<&Session>,
    ) -> Result<Confirmation, CheckoutError> {
        self.state.lock().await.begin()?;

        let checkout = match form.validate(cart, session) {
            Ok(checkout) => checkout,
            Err(errors) => {
                self.transition(CheckoutState::Collecting {
                    errors: errors.clone(),
                })
                .await;

                return Err(CheckoutError::Validation(errors));
            }
        };

        self.transition(CheckoutState::Submitting).await;

        match self.place(cart, form, checkout, session).await {
            Ok(confirmation) => {
                self.transition(CheckoutState::Succeeded {
                    reference: confirmation.reference.clone(),
                })
                .await;

                Ok(confirmation)
            }
            Err(error) => {
                warn!(%error, "checkout failed");

                self.transition(CheckoutState::Failed {
                    message: error.to_string(),
                })
                .await;

                Err(error)
            }
        }
    }

    async fn transition(&self, state: CheckoutState) {
        *self.state.lock().await = state;
    }

    async fn place(
        &self,
        cart: &mut Cart,
        form: &CheckoutForm,
        checkout: ValidatedCheckout,
        session: Option<&Session>,
    ) -> Result<Confirmation, CheckoutError> {
        let customer = session.map(|session| session.customer.uuid);

        let address = self
            .resolve_address(customer, checkout.address, form)
            .await?;

        let mut draft = OrderDraft::from_cart(
            cart,
            checkout.contact,
            address,
            checkout.payment_method,
            &self.discounts,
        )?;

        if let Some(customer) = customer {
            draft = draft.with_customer(customer.into_uuid());
        }

        let (recorded, draft, anonymous_fallback) = self.record(cart, draft).await?;

        cart.clear();

        let reference = recorded.order.reference();

        info!(
            order = %recorded.order.uuid,
            %reference,
            total = %recorded.order.total,
            anonymous_fallback,
            "order placed"
        );

        Ok(Confirmation {
            receipt: Receipt::from_draft(&draft).with_reference(reference.clone()),
            reference,
            order: recorded.order,
            items_written: recorded.items_written,
            anonymous_fallback,
        })
    }

    /// Record `draft`, retrying once as an anonymous order when the header is rejected by policy.
    async fn record(
        &self,
        cart: &mut Cart,
        draft: OrderDraft,
    ) -> Result<(RecordedOrder, OrderDraft, bool), CheckoutError> {
        let result = self.orders.record_order(&draft).await;

        match result {
            Ok(recorded) => Ok((recorded, draft, false)),
            Err(error) if error.is_permission_denied() && draft.customer.is_some() => {
                warn!(%error, "order rejected by access policy, retrying without the customer");

                let anonymous = draft.anonymous();
                let result = self.orders.record_order(&anonymous).await;

                match result {
                    Ok(recorded) => Ok((recorded, anonymous, true)),
                    Err(error) => Err(order_failed(cart, error)),
                }
            }
            Err(error) => Err(order_failed(cart, error)),
        }
    }

    async fn resolve_address(
        &self,
        customer: Option<CustomerUuid>,
        address: ValidatedAddress,
        form: &CheckoutForm,
    ) -> Result<ShippingAddress, CheckoutError> {
        match (address, customer) {
            (ValidatedAddress::New(address), Some(customer))
                if form.save_address || form.make_default =>
            {
                let saved = self
                    .addresses
                    .save_address(customer, address, form.make_default)
                    .await?;

                Ok(saved.address)
            }
            (ValidatedAddress::New(address), _) => Ok(address),
            (ValidatedAddress::Saved { uuid, edits }, Some(customer)) => {
                let record = match edits {
                    Some(edits) => {
                        self.addresses
                            .update_address(customer, uuid, edits)
                            .await?
                    }
                    None => self.addresses.get_address(customer, uuid).await?,
                };

                if form.make_default && !record.is_default {
                    self.addresses.set_default(customer, uuid).await?;
                }

                Ok(record.address)
            }
            (ValidatedAddress::Saved { .. }, None) => {
                let mut errors = ValidationErrors::default();

                errors.push(Field::Address, FieldErrorReason::NotFound);

                Err(CheckoutError::Validation(errors))
            }
        }
    }
}

/// An order whose header was stored empties the cart even if its items were not.
fn order_failed(cart: &mut Cart, error: OrdersServiceError) -> CheckoutError {
    if let OrdersServiceError::Items { order, .. } = &error {
        warn!(%order, "order header stored without items, clearing cart");

        cart.clear();
    }

    CheckoutError::Order(error)
}

#[cfg(test)]
mod tests {
    use estante::payment::PaymentMethod;
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use super::*;
    use crate::{
        backend::{AddressUuid, Fault, MemoryBackend, Operation},
        domain::{
            addresses::{BackendAddressesService, MockAddressesService},
            checkout::form::AddressChoice,
            orders::{BackendOrdersService, ItemFailurePolicy, MockOrdersService},
        },
        test::helpers::{address_form, cart, checkout_form, customer},
    };

    fn checkout(backend: &MemoryBackend, policy: ItemFailurePolicy) -> Checkout {
        Checkout::new(
            Arc::new(BackendAddressesService::new(Arc::new(backend.clone()))),
            Arc::new(BackendOrdersService::new(Arc::new(backend.clone()), policy)),
            PaymentDiscounts::default(),
        )
    }

    #[tokio::test]
    async fn pix_order_is_placed_with_discount_and_cart_cleared() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let mut cart = cart();

        let confirmation = checkout
            .submit(&mut cart, &checkout_form("pix"), None)
            .await?;

        assert_eq!(confirmation.order.subtotal, Money::from_minor(99_80, BRL));
        assert_eq!(confirmation.order.total, Money::from_minor(94_81, BRL));
        assert_eq!(confirmation.order.payment_method, PaymentMethod::Pix);
        assert_eq!(confirmation.order.customer_uuid, None);
        assert_eq!(confirmation.receipt.reference(), Some(&confirmation.reference));
        assert!(confirmation.items_written, "items should be written");
        assert!(cart.is_empty(), "cart should be cleared");
        assert_eq!(
            checkout.state().await,
            CheckoutState::Succeeded {
                reference: confirmation.reference
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_city_is_rejected_without_collaborator_calls() {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let mut cart = cart();
        let mut form = checkout_form("pix");

        form.address = AddressChoice::New(estante::address::AddressForm {
            city: String::new(),
            ..address_form("Rua Gustavo Sampaio")
        });

        let result = checkout.submit(&mut cart, &form, None).await;

        let Err(CheckoutError::Validation(errors)) = result else {
            unreachable!("expected a validation error, got {result:?}");
        };

        assert_eq!(errors.reason(Field::City), Some(FieldErrorReason::Required));
        assert_eq!(backend.total_calls(), 0);
        assert_eq!(cart.len(), 1);
        assert_eq!(checkout.state().await, CheckoutState::Collecting { errors });
    }

    #[tokio::test]
    async fn empty_cart_is_a_validation_error() {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);

        let result = checkout
            .submit(&mut Cart::new(BRL), &checkout_form("boleto"), None)
            .await;

        assert!(
            matches!(&result, Err(CheckoutError::Validation(errors)) if errors.contains(Field::Cart)),
            "expected a cart validation error, got {result:?}"
        );
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn fail_soft_item_failure_still_confirms_and_clears_cart() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let mut cart = cart();

        backend.fail(Operation::InsertOrderItems, Fault::Unavailable);

        let confirmation = checkout
            .submit(&mut cart, &checkout_form("cartao"), None)
            .await?;

        assert!(!confirmation.items_written, "items should not be written");
        assert_eq!(
            backend.orders().first().map(|order| order.uuid),
            Some(confirmation.order.uuid)
        );
        assert!(cart.is_empty(), "cart should be cleared");

        Ok(())
    }

    #[tokio::test]
    async fn fail_hard_item_failure_fails_but_clears_cart() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailHard);
        let mut cart = cart();

        backend.fail(Operation::InsertOrderItems, Fault::Unavailable);

        let result = checkout
            .submit(&mut cart, &checkout_form("boleto"), None)
            .await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Order(OrdersServiceError::Items { .. }))
            ),
            "expected an items error, got {result:?}"
        );
        assert!(cart.is_empty(), "cart should be cleared once the header is stored");
        assert!(
            matches!(checkout.state().await, CheckoutState::Failed { .. }),
            "attempt should be failed"
        );

        checkout.retry().await?;

        assert_eq!(checkout.state().await, CheckoutState::default());

        Ok(())
    }

    #[tokio::test]
    async fn policy_rejection_retries_once_as_anonymous() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let session = backend.sign_in(customer());
        let mut cart = cart();

        backend.fail(Operation::InsertOrder, Fault::PermissionDenied);

        let confirmation = checkout
            .submit(&mut cart, &checkout_form("pix"), Some(&session))
            .await?;

        assert!(confirmation.anonymous_fallback, "order should fall back");
        assert_eq!(confirmation.order.customer_uuid, None);
        assert_eq!(backend.calls(Operation::InsertOrder), 2);
        assert!(cart.is_empty(), "cart should be cleared");

        Ok(())
    }

    #[tokio::test]
    async fn second_policy_rejection_is_surfaced() {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let session = backend.sign_in(customer());
        let mut cart = cart();

        backend.fail_times(Operation::InsertOrder, Fault::PermissionDenied, 2);

        let result = checkout
            .submit(&mut cart, &checkout_form("pix"), Some(&session))
            .await;

        assert!(
            matches!(&result, Err(CheckoutError::Order(error)) if error.is_permission_denied()),
            "expected PermissionDenied, got {result:?}"
        );
        assert_eq!(backend.calls(Operation::InsertOrder), 2);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn anonymous_orders_are_not_retried() {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let mut cart = cart();

        backend.fail(Operation::InsertOrder, Fault::PermissionDenied);

        let result = checkout
            .submit(&mut cart, &checkout_form("pix"), None)
            .await;

        assert!(result.is_err(), "expected an error, got {result:?}");
        assert_eq!(backend.calls(Operation::InsertOrder), 1);
    }

    #[tokio::test]
    async fn signed_in_checkout_saves_default_address() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let session = backend.sign_in(customer());
        let mut cart = cart();
        let mut form = checkout_form("pix");

        form.save_address = true;
        form.make_default = true;

        let confirmation = checkout.submit(&mut cart, &form, Some(&session)).await?;

        let addresses = BackendAddressesService::new(Arc::new(backend.clone()))
            .list_addresses(session.customer.uuid)
            .await?;

        assert_eq!(addresses.len(), 1);
        assert!(
            addresses.iter().all(|record| record.is_default),
            "saved address should be default"
        );
        assert_eq!(
            confirmation.order.customer_uuid,
            Some(session.customer.uuid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn saved_address_edits_are_persisted() -> TestResult {
        let backend = MemoryBackend::new();
        let addresses = BackendAddressesService::new(Arc::new(backend.clone()));
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let session = backend.sign_in(customer());
        let mut cart = cart();

        let saved = addresses
            .save_address(
                session.customer.uuid,
                crate::test::helpers::address("Rua Antiga"),
                false,
            )
            .await?;

        let mut form = checkout_form("boleto");

        form.address = AddressChoice::Saved {
            uuid: saved.uuid,
            edits: Some(address_form("Rua Nova")),
        };

        let confirmation = checkout.submit(&mut cart, &form, Some(&session)).await?;

        assert_eq!(confirmation.order.address.street, "Rua Nova");
        assert_eq!(
            addresses
                .get_address(session.customer.uuid, saved.uuid)
                .await?
                .address
                .street,
            "Rua Nova"
        );

        Ok(())
    }

    #[tokio::test]
    async fn choosing_a_saved_address_as_default_leaves_it_the_only_default() -> TestResult {
        let backend = MemoryBackend::new();
        let addresses = BackendAddressesService::new(Arc::new(backend.clone()));
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let session = backend.sign_in(customer());
        let customer = session.customer.uuid;
        let mut cart = cart();

        let a = addresses
            .save_address(customer, crate::test::helpers::address("Rua A"), false)
            .await?;
        let b = addresses
            .save_address(customer, crate::test::helpers::address("Rua B"), true)
            .await?;

        let mut form = checkout_form("pix");

        form.address = AddressChoice::Saved {
            uuid: a.uuid,
            edits: None,
        };
        form.make_default = true;

        let confirmation = checkout.submit(&mut cart, &form, Some(&session)).await?;

        let defaults: Vec<AddressUuid> = addresses
            .list_addresses(customer)
            .await?
            .iter()
            .filter(|record| record.is_default)
            .map(|record| record.uuid)
            .collect();

        assert_eq!(confirmation.order.address.street, "Rua A");
        assert_eq!(defaults, [a.uuid]);
        assert!(
            !addresses.get_address(customer, b.uuid).await?.is_default,
            "B should no longer be the default"
        );
        assert_eq!(backend.calls(Operation::SetDefaultAddress), 2);

        Ok(())
    }

    #[tokio::test]
    async fn placed_orders_cannot_be_resubmitted() -> TestResult {
        let backend = MemoryBackend::new();
        let checkout = checkout(&backend, ItemFailurePolicy::FailSoft);
        let mut cart = cart();

        checkout
            .submit(&mut cart, &checkout_form("pix"), None)
            .await?;

        let mut another = crate::test::helpers::cart();
        let result = checkout
            .submit(&mut another, &checkout_form("pix"), None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::AlreadySucceeded)),
            "expected AlreadySucceeded, got {result:?}"
        );
        assert_eq!(backend.orders().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn backend_outage_fails_the_attempt_and_keeps_the_cart() -> TestResult {
        let mut addresses = MockAddressesService::new();
        let mut orders = MockOrdersService::new();

        addresses.expect_save_address().never();
        orders.expect_record_order().times(1).returning(|_| {
            Err(OrdersServiceError::Backend(
                crate::backend::BackendError::Unavailable("offline".to_string()),
            ))
        });

        let checkout = Checkout::new(
            Arc::new(addresses),
            Arc::new(orders),
            PaymentDiscounts::default(),
        );
        let mut cart = cart();

        let result = checkout
            .submit(&mut cart, &checkout_form("pix"), None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::Order(OrdersServiceError::Backend(_)))),
            "expected a backend error, got {result:?}"
        );
        assert_eq!(cart.len(), 1);
        assert!(
            matches!(checkout.state().await, CheckoutState::Failed { .. }),
            "attempt should be failed"
        );

        checkout.retry().await?;

        assert_eq!(checkout.state().await, CheckoutState::default());

        Ok(())
    }

    #[test]
    fn in_flight_attempts_reject_another_submit() {
        let mut state = CheckoutState::Submitting;

        let result = state.begin();

        assert!(
            matches!(result, Err(CheckoutError::AlreadySubmitting)),
            "expected AlreadySubmitting, got {result:?}"
        );
        assert!(state.is_submitting(), "state should be unchanged");
    }

    #[test]
    fn only_failed_attempts_can_retry() {
        let mut state = CheckoutState::default();

        let result = state.retry();

        assert!(
            matches!(result, Err(CheckoutError::NotFailed)),
            "expected NotFailed, got {result:?}"
        );
    }
}
