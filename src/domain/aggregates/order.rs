//! Order Aggregate

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::domain::aggregates::cart::CartLine;
use crate::domain::value_objects::{Money, ResourceId};

/// Flat shipping charged on every order.
pub const SHIPPING_FLAT_RATE: Money = Money::new(Decimal::from_parts(1000, 0, 0, false, 2));
/// Tax as a fraction of the subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

static ZIP_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip pattern"));
static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").expect("valid phone pattern"));

pub const DEFAULT_COUNTRY: &str = "United States";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Frozen snapshot of a cart line at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ResourceId,
    pub product_name: String,
    #[serde(default)]
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderItem {
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            product_name: line.product.name.clone(),
            image_url: line.product.image_url.clone(),
            quantity: line.quantity,
            unit_price: line.product.price,
            subtotal: line.line_total(),
        }
    }
}

/// Shipping or billing address; also the checkout address form value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Street address is required"))]
    pub street_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(regex(path = "ZIP_CODE", message = "Enter a 5-digit or ZIP+4 code"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(regex(path = "PHONE_NUMBER", message = "Enter a phone number as (555) 123-4567"))]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl Default for Address {
    /// Blank form with only the country pre-filled.
    fn default() -> Self {
        Self {
            full_name: String::new(), street_address: String::new(), apartment: None, city: String::new(),
            state: String::new(), zip_code: String::new(), country: DEFAULT_COUNTRY.to_string(),
            phone_number: String::new(), is_default: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethodType {
    #[default]
    #[serde(rename = "creditCard")]
    CreditCard,
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "applePay")]
    ApplePay,
    #[serde(rename = "googlePay")]
    GooglePay,
}

impl PaymentMethodType {
    pub fn label(&self) -> &'static str {
        match self { Self::CreditCard => "Credit Card", Self::PayPal => "PayPal", Self::ApplePay => "Apple Pay", Self::GooglePay => "Google Pay" }
    }
    /// Only card payments carry fields that are checked before submission.
    pub fn requires_card_validation(&self) -> bool { matches!(self, Self::CreditCard) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentMethod {
    #[serde(rename = "creditCard", rename_all = "camelCase")]
    CreditCard {
        #[serde(default)]
        card_number: String,
        #[serde(default)]
        name_on_card: String,
        #[serde(default)]
        expiration_date: String,
        #[serde(default)]
        cvv: String,
    },
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "applePay")]
    ApplePay,
    #[serde(rename = "googlePay")]
    GooglePay,
}

impl PaymentMethod {
    pub fn method_type(&self) -> PaymentMethodType {
        match self {
            Self::CreditCard { .. } => PaymentMethodType::CreditCard,
            Self::PayPal => PaymentMethodType::PayPal,
            Self::ApplePay => PaymentMethodType::ApplePay,
            Self::GooglePay => PaymentMethodType::GooglePay,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    /// A status string this client does not know about.
    Unknown(String),
}

impl OrderStatus {
    pub const KNOWN: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn color_class(&self) -> &'static str {
        match self {
            Self::Pending => "bg-yellow-100 text-yellow-800",
            Self::Processing => "bg-blue-100 text-blue-800",
            Self::Shipped => "bg-purple-100 text-purple-800",
            Self::Delivered => "bg-green-100 text-green-800",
            Self::Cancelled => "bg-red-100 text-red-800",
            Self::Unknown(_) => "bg-gray-100 text-gray-800",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "clock",
            Self::Processing => "refresh-cw",
            Self::Shipped => "truck",
            Self::Delivered => "check-circle",
            Self::Cancelled => "x-circle",
            Self::Unknown(_) => "help-circle",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.serialize_str(self.as_str()) }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Pricing breakdown for a set of order items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    pub fn from_items(items: &[OrderItem]) -> Self {
        Self::from_subtotal(items.iter().map(|i| i.subtotal).sum())
    }

    pub fn from_subtotal(subtotal: Money) -> Self {
        let shipping = SHIPPING_FLAT_RATE;
        let tax = subtotal.at_rate(TAX_RATE);
        Self { subtotal, shipping, tax, total: subtotal + shipping + tax }
    }
}

/// Caller-supplied part of a new order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderDraft {
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl Order {
    /// Assembles a `pending` order from a checkout snapshot.
    pub fn pending(items: Vec<OrderItem>, draft: OrderDraft, now: DateTime<Utc>) -> Self {
        let summary = OrderSummary::from_items(&items);
        Self {
            id: None, customer_id: None, items,
            shipping_address: draft.shipping_address, billing_address: draft.billing_address,
            payment_method: draft.payment_method,
            subtotal: summary.subtotal, shipping_cost: summary.shipping, tax: summary.tax, total: summary.total,
            status: OrderStatus::Pending, created_at: now, updated_at: now,
            tracking_number: None, notes: draft.notes,
        }
    }

    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
}

/// Partial order sent with `PATCH /orders/:id`; unset fields are left out of the body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderUpdate {
    pub fn status(status: OrderStatus) -> Self { Self { status: Some(status), ..Self::default() } }
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self { self.notes = Some(notes.into()); self }
}

/// Long US date, e.g. `October 19, 2026`.
pub fn format_date<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    ts.format("%B %-d, %Y").to_string()
}

/// Two-digit 12-hour time, e.g. `03:45 PM`.
pub fn format_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    ts.format("%I:%M %p").to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn address() -> Address {
        Address {
            full_name: "Ada Lovelace".into(), street_address: "12 Analytical Way".into(), apartment: None,
            city: "Springfield".into(), state: "IL".into(), zip_code: "62704".into(), country: DEFAULT_COUNTRY.into(),
            phone_number: "(555) 123-4567".into(), is_default: None,
        }
    }
}
