//! REST collaborator client (PostgREST tables under `/rest/v1`, auth under `/auth/v1`).

use async_trait::async_trait;
use estante::{
    address::ShippingAddress,
    books::BookId,
    contact::Contact,
    order::OrderStatus,
    payment::PaymentMethod,
    pricing::{money_from_decimal, money_to_decimal},
};
use jiff::Timestamp;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    AddressRecord, AddressStore, AddressUuid, BackendError, CustomerRecord, CustomerUuid,
    NewAddress, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, OrderStore, OrderUuid,
    Session, SessionStore,
};

/// PostgreSQL `insufficient_privilege`, reported by row-level security rejections.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Configuration for connecting to the hosted collaborator.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `"https://project.example.co"`.
    pub url: String,

    /// Public API key sent with every request.
    pub api_key: Zeroizing<String>,

    /// Access token of the signed-in user, if any.
    pub access_token: Option<Zeroizing<String>>,

    /// Currency amounts are stored in.
    pub currency: &'static Currency,
}

/// HTTP client for the hosted collaborator.
#[derive(Debug, Clone)]
pub struct RestBackend {
    config: RestConfig,
    http: Client,
}

impl RestBackend {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .config
            .access_token
            .as_ref()
            .unwrap_or(&self.config.api_key);

        request
            .header("apikey", self.config.api_key.as_str())
            .bearer_auth(bearer.as_str())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, BackendError> {
        debug!(context, "backend request");

        let response = self.authorize(request).send().await?;
        let response = check_status(response, context).await?;

        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder, context: &str) -> Result<(), BackendError> {
        debug!(context, "backend request");

        let response = self.authorize(request).send().await?;

        check_status(response, context).await?;

        Ok(())
    }

    async fn single<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, BackendError> {
        let rows: Vec<T> = self.send(request, context).await?;

        rows.into_iter().next().ok_or(BackendError::NotFound)
    }
}

async fn check_status(response: Response, context: &str) -> Result<Response, BackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();

    Err(classify_failure(status, &text, context))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn classify_failure(status: StatusCode, text: &str, context: &str) -> BackendError {
    let body: Option<ErrorBody> = serde_json::from_str(text).ok();

    let code = body.as_ref().and_then(|body| body.code.as_deref());
    let message = body
        .as_ref()
        .and_then(|body| body.message.clone())
        .unwrap_or_else(|| text.to_string());

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || code == Some(INSUFFICIENT_PRIVILEGE)
    {
        return BackendError::PermissionDenied(format!("{context}: {message}"));
    }

    if status == StatusCode::NOT_FOUND {
        return BackendError::NotFound;
    }

    if status.is_server_error() {
        return BackendError::Unavailable(format!(
            "{context} failed with status {status}: {message}"
        ));
    }

    BackendError::UnexpectedResponse(format!("{context} failed with status {status}: {message}"))
}

#[derive(Debug, Serialize, Deserialize)]
struct AddressRow {
    uuid: AddressUuid,
    customer_uuid: CustomerUuid,
    #[serde(flatten)]
    address: ShippingAddress,
    is_default: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl From<AddressRow> for AddressRecord {
    fn from(row: AddressRow) -> Self {
        Self {
            uuid: row.uuid,
            customer_uuid: row.customer_uuid,
            address: row.address,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewAddressRow<'a> {
    uuid: AddressUuid,
    customer_uuid: CustomerUuid,
    #[serde(flatten)]
    address: &'a ShippingAddress,
    is_default: bool,
}

#[derive(Debug, Serialize)]
struct SetDefaultArgs {
    p_customer_uuid: CustomerUuid,
    p_address_uuid: AddressUuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderItemRow {
    order_uuid: OrderUuid,
    book_id: BookId,
    title: String,
    quantity: u32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<&OrderItemRecord> for OrderItemRow {
    fn from(item: &OrderItemRecord) -> Self {
        Self {
            order_uuid: item.order_uuid,
            book_id: item.book_id,
            title: item.title.clone(),
            quantity: item.quantity,
            unit_price: money_to_decimal(&item.unit_price),
            subtotal: money_to_decimal(&item.subtotal),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewOrderRow<'a> {
    customer_uuid: Option<CustomerUuid>,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    shipping_address: &'a ShippingAddress,
    address_line: &'a str,
    payment_method: PaymentMethod,
    subtotal: Decimal,
    total: Decimal,
    status: OrderStatus,
}

impl<'a> From<&'a NewOrder> for NewOrderRow<'a> {
    fn from(order: &'a NewOrder) -> Self {
        Self {
            customer_uuid: order.customer_uuid,
            first_name: &order.contact.first_name,
            last_name: &order.contact.last_name,
            email: &order.contact.email,
            phone: &order.contact.phone,
            shipping_address: &order.address,
            address_line: &order.address_line,
            payment_method: order.payment_method,
            subtotal: money_to_decimal(&order.subtotal),
            total: money_to_decimal(&order.total),
            status: order.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    uuid: OrderUuid,
    customer_uuid: Option<CustomerUuid>,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    shipping_address: ShippingAddress,
    address_line: String,
    payment_method: PaymentMethod,
    subtotal: Decimal,
    total: Decimal,
    status: OrderStatus,
    created_at: Timestamp,
    #[serde(default)]
    order_items: Vec<OrderItemRow>,
}

fn money(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, BackendError> {
    money_from_decimal(amount, currency)
        .ok_or_else(|| BackendError::UnexpectedResponse(format!("amount out of range: {amount}")))
}

impl OrderRow {
    fn into_record(self, currency: &'static Currency) -> Result<OrderRecord, BackendError> {
        let items = self
            .order_items
            .into_iter()
            .map(|row| {
                Ok(OrderItemRecord {
                    order_uuid: row.order_uuid,
                    book_id: row.book_id,
                    title: row.title,
                    quantity: row.quantity,
                    unit_price: money(row.unit_price, currency)?,
                    subtotal: money(row.subtotal, currency)?,
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        Ok(OrderRecord {
            uuid: self.uuid,
            customer_uuid: self.customer_uuid,
            contact: Contact {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                phone: self.phone,
            },
            address: self.shipping_address,
            address_line: self.address_line,
            payment_method: self.payment_method,
            subtotal: money(self.subtotal, currency)?,
            total: money(self.total, currency)?,
            status: self.status,
            items,
            created_at: self.created_at,
        })
    }
}

/// Case-insensitive exact match on an email, with `LIKE` wildcards escaped.
fn email_filter(email: &str) -> String {
    let mut escaped = String::with_capacity(email.len());

    for ch in email.trim().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }

        escaped.push(ch);
    }

    format!("ilike.{escaped}")
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: CustomerUuid,
    email: String,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserMetadata {
    first_name: String,
    last_name: String,
    phone: String,
}

#[async_trait]
impl AddressStore for RestBackend {
    async fn list_addresses(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<AddressRecord>, BackendError> {
        let request = self.http.get(self.url("rest/v1/addresses")).query(&[
            ("select", "*".to_string()),
            ("customer_uuid", format!("eq.{customer}")),
            ("order", "is_default.desc,created_at.desc".to_string()),
        ]);

        let rows: Vec<AddressRow> = self.send(request, "list addresses").await?;

        Ok(rows.into_iter().map(AddressRecord::from).collect())
    }

    async fn get_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<AddressRecord, BackendError> {
        let request = self.http.get(self.url("rest/v1/addresses")).query(&[
            ("select", "*".to_string()),
            ("uuid", format!("eq.{uuid}")),
            ("customer_uuid", format!("eq.{customer}")),
        ]);

        let row: AddressRow = self.single(request, "get address").await?;

        Ok(row.into())
    }

    async fn insert_address(&self, address: NewAddress) -> Result<AddressRecord, BackendError> {
        let request = self
            .http
            .post(self.url("rest/v1/addresses"))
            .header("Prefer", "return=representation")
            .json(&NewAddressRow {
                uuid: address.uuid,
                customer_uuid: address.customer_uuid,
                address: &address.address,
                is_default: false,
            });

        let row: AddressRow = self.single(request, "insert address").await?;

        Ok(row.into())
    }

    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: ShippingAddress,
    ) -> Result<AddressRecord, BackendError> {
        let request = self
            .http
            .patch(self.url("rest/v1/addresses"))
            .query(&[
                ("uuid", format!("eq.{uuid}")),
                ("customer_uuid", format!("eq.{customer}")),
            ])
            .header("Prefer", "return=representation")
            .json(&address);

        let row: AddressRow = self.single(request, "update address").await?;

        Ok(row.into())
    }

    async fn set_default_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.url("rest/v1/rpc/set_default_address"))
            .json(&SetDefaultArgs {
                p_customer_uuid: customer,
                p_address_uuid: uuid,
            });

        self.send_empty(request, "set default address").await
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, BackendError> {
        let request = self
            .http
            .post(self.url("rest/v1/orders"))
            .header("Prefer", "return=representation")
            .json(&NewOrderRow::from(&order));

        let row: OrderRow = self.single(request, "insert order").await?;

        row.into_record(self.config.currency)
    }

    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError> {
        let rows: Vec<OrderItemRow> = items.iter().map(OrderItemRow::from).collect();

        let request = self
            .http
            .post(self.url("rest/v1/order_items"))
            .header("Prefer", "return=minimal")
            .json(&rows);

        self.send_empty(request, "insert order items").await
    }

    async fn get_order(
        &self,
        uuid: OrderUuid,
        email: String,
    ) -> Result<OrderRecord, BackendError> {
        let request = self.http.get(self.url("rest/v1/orders")).query(&[
            ("select", "*,order_items(*)".to_string()),
            ("uuid", format!("eq.{uuid}")),
            ("email", email_filter(&email)),
        ]);

        let row: OrderRow = self.single(request, "get order").await?;

        // `*` is a wildcard to the collaborator even when escaped
        if !row.email.eq_ignore_ascii_case(email.trim()) {
            return Err(BackendError::NotFound);
        }

        row.into_record(self.config.currency)
    }
}

#[async_trait]
impl SessionStore for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(access_token) = self.config.access_token.clone() else {
            return Ok(None);
        };

        let request = self.http.get(self.url("auth/v1/user"));

        let user: UserResponse = match self.send(request, "current session").await {
            Ok(user) => user,
            Err(BackendError::PermissionDenied(_)) => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(Some(Session {
            customer: CustomerRecord {
                uuid: user.id,
                email: user.email,
                first_name: user.user_metadata.first_name,
                last_name: user.user_metadata.last_name,
                phone: user.user_metadata.phone,
            },
            access_token,
        }))
    }
}
