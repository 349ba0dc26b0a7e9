//! Orders service: records confirmed orders with the collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use estante::order::OrderDraft;
use mockall::automock;
use tracing::{info, instrument, warn};

use crate::{
    backend::{NewOrder, OrderItemRecord, OrderRecord, OrderStore, OrderUuid},
    domain::orders::errors::OrdersServiceError,
};

/// What to do when the order header was written but its items were not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ItemFailurePolicy {
    /// Log the failure and confirm the order anyway.
    #[default]
    FailSoft,

    /// Surface the failure to the caller.
    FailHard,
}

/// An order header accepted by the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOrder {
    /// The stored header, with the items that were sent
    pub order: OrderRecord,

    /// Whether the items were written alongside the header
    pub items_written: bool,
}

/// Orders service backed by an [`OrderStore`].
#[derive(Clone)]
pub struct BackendOrdersService {
    store: Arc<dyn OrderStore>,
    item_failure: ItemFailurePolicy,
}

impl BackendOrdersService {
    /// Records orders in `store`, handling item-write failures per `item_failure`.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, item_failure: ItemFailurePolicy) -> Self {
        Self {
            store,
            item_failure,
        }
    }
}

#[async_trait]
impl OrdersService for BackendOrdersService {
    #[instrument(
        skip(self, draft),
        fields(
            customer = ?draft.customer,
            payment_method = %draft.payment_method,
            items = draft.item_count(),
        )
    )]
    async fn record_order(&self, draft: &OrderDraft) -> Result<RecordedOrder, OrdersServiceError> {
        let mut order = self.store.insert_order(NewOrder::from(draft)).await?;
        let items = OrderItemRecord::from_draft(order.uuid, draft);

        order.items.clone_from(&items);

        match self.store.insert_order_items(items).await {
            Ok(()) => {
                info!(order = %order.uuid, total = %order.total, "order recorded");

                Ok(RecordedOrder {
                    order,
                    items_written: true,
                })
            }
            Err(source) => match self.item_failure {
                ItemFailurePolicy::FailSoft => {
                    warn!(
                        order = %order.uuid,
                        error = %source,
                        "order items were not recorded, keeping the order header"
                    );

                    Ok(RecordedOrder {
                        order,
                        items_written: false,
                    })
                }
                ItemFailurePolicy::FailHard => Err(OrdersServiceError::Items {
                    order: order.uuid,
                    source,
                }),
            },
        }
    }

    async fn get_order(
        &self,
        order: OrderUuid,
        email: String,
    ) -> Result<OrderRecord, OrdersServiceError> {
        Ok(self.store.get_order(order, email).await?)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Writes the order header, then its items keyed by the header's UUID.
    async fn record_order(&self, draft: &OrderDraft) -> Result<RecordedOrder, OrdersServiceError>;

    /// Reads an order and its items, visible only to the email it was placed with.
    async fn get_order(
        &self,
        order: OrderUuid,
        email: String,
    ) -> Result<OrderRecord, OrdersServiceError>;
}
