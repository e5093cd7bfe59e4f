//! Checkout Flow
//!
//! Three linear steps: shipping address, billing address, payment. Each step
//! only advances when its form validates, and an order is submitted from the
//! payment step with the line items captured by [`Checkout::begin`].

pub mod mask;
pub mod payment;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument, warn};
use validator::{Validate, ValidationErrors};

use crate::api::ApiError;
use crate::domain::{Address, Order, OrderDraft, OrderItem, OrderStatus, OrderSummary, OrderUpdate, PaymentMethodType};
use crate::services::{CartStore, OrderClient};

pub use payment::PaymentForm;

pub const ORDER_NOTES: &str = "Order placed via web checkout";
pub const UPDATE_NOTES: &str = "Order updated by customer";
pub const PLACE_ORDER_FAILED: &str = "Failed to place order. Please try again.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("form is invalid: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Failed to place order. Please try again.")]
    Placement(#[source] ApiError),
    #[error("no order has been placed yet")]
    NotPlaced,
    #[error("order update failed: {0}")]
    Update(#[source] ApiError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    #[default]
    Shipping = 1,
    Billing = 2,
    Payment = 3,
}

impl CheckoutStep {
    pub fn number(&self) -> u8 { *self as u8 }
    pub fn next(&self) -> Self {
        match self { Self::Shipping => Self::Billing, Self::Billing | Self::Payment => Self::Payment }
    }
    pub fn prev(&self) -> Self {
        match self { Self::Shipping | Self::Billing => Self::Shipping, Self::Payment => Self::Billing }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self { Self::Shipping => "Shipping", Self::Billing => "Billing", Self::Payment => "Payment" };
        write!(f, "{}. {label}", self.number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind { Shipping, Billing }

/// Form state for one checkout session.
pub struct Checkout {
    cart: Arc<CartStore>,
    orders: Arc<OrderClient>,
    step: CheckoutStep,
    shipping: Address,
    billing: Address,
    same_billing_address: bool,
    payment: PaymentForm,
    summary: OrderSummary,
    is_submitting: bool,
    order_complete: bool,
    confirmation: Option<Order>,
    order_error: Option<String>,
}

impl Checkout {
    pub fn new(cart: Arc<CartStore>, orders: Arc<OrderClient>) -> Self {
        Self {
            cart,
            orders,
            step: CheckoutStep::Shipping,
            shipping: Address::default(),
            billing: Address::default(),
            same_billing_address: true,
            payment: PaymentForm::default(),
            summary: OrderSummary::from_items(&[]),
            is_submitting: false,
            order_complete: false,
            confirmation: None,
            order_error: None,
        }
    }

    /// Captures the cart as order items and prices them.
    pub fn begin(&mut self) {
        let items: Vec<OrderItem> = self.cart.cart_items().iter().map(OrderItem::from_line).collect();
        self.orders.set_items(items);
        self.summary = self.orders.summary();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn shipping(&self) -> &Address { &self.shipping }
    pub fn billing(&self) -> &Address { &self.billing }
    pub fn payment(&self) -> &PaymentForm { &self.payment }
    pub fn same_billing_address(&self) -> bool { self.same_billing_address }
    pub fn summary(&self) -> &OrderSummary { &self.summary }
    pub fn items(&self) -> Vec<OrderItem> { self.orders.items() }
    pub fn is_submitting(&self) -> bool { self.is_submitting }
    pub fn order_complete(&self) -> bool { self.order_complete }
    pub fn confirmation(&self) -> Option<&Order> { self.confirmation.as_ref() }
    pub fn order_error(&self) -> Option<&str> { self.order_error.as_deref() }

    pub fn shipping_mut(&mut self) -> &mut Address { &mut self.shipping }
    pub fn billing_mut(&mut self) -> &mut Address { &mut self.billing }
    pub fn payment_mut(&mut self) -> &mut PaymentForm { &mut self.payment }

    // ========================================================================
    // Masked input
    // ========================================================================

    pub fn input_phone(&mut self, kind: AddressKind, raw: &str) {
        let target = match kind { AddressKind::Shipping => &mut self.shipping, AddressKind::Billing => &mut self.billing };
        target.phone_number = mask::phone_number(raw);
    }

    pub fn input_card_number(&mut self, raw: &str) { self.payment.card_number = mask::card_number(raw); }
    pub fn input_expiration_date(&mut self, raw: &str) { self.payment.expiration_date = mask::expiration_date(raw); }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Advances when the current step's form is valid. On failure the step
    /// is unchanged and the field errors are returned.
    pub fn next_step(&mut self) -> Result<CheckoutStep, CheckoutError> {
        match self.step {
            CheckoutStep::Shipping => {
                self.shipping.validate()?;
                if self.same_billing_address {
                    self.billing = self.shipping.clone();
                }
            }
            CheckoutStep::Billing => self.billing.validate()?,
            CheckoutStep::Payment => {}
        }
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn prev_step(&mut self) -> CheckoutStep {
        self.step = self.step.prev();
        self.step
    }

    pub fn toggle_billing_address(&mut self) {
        self.same_billing_address = !self.same_billing_address;
        self.billing = if self.same_billing_address { self.shipping.clone() } else { Address::default() };
    }

    pub fn select_payment_method(&mut self, method: PaymentMethodType) {
        self.payment.method = method;
        if !method.requires_card_validation() {
            self.payment.clear_card();
        }
    }

    /// Whether [`Checkout::place_order`] would send a request.
    pub fn can_place_order(&self) -> bool {
        !self.payment.method.requires_card_validation() || self.payment.validate().is_ok()
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submits the order. On success the cart is emptied and the confirmed
    /// order kept; on failure the form stays as it was so it can be resent.
    #[instrument(skip(self), fields(method = self.payment.method.label()))]
    pub async fn place_order(&mut self) -> Result<Order, CheckoutError> {
        if self.payment.method.requires_card_validation() {
            self.payment.validate()?;
        }

        let draft = OrderDraft {
            shipping_address: self.shipping.clone(),
            billing_address: self.billing.clone(),
            payment_method: self.payment.to_payment_method(),
            notes: Some(ORDER_NOTES.to_string()),
        };

        self.is_submitting = true;
        self.order_error = None;
        let result = self.orders.place_order(draft).await;
        self.is_submitting = false;

        match result {
            Ok(order) => {
                self.order_complete = true;
                self.confirmation = Some(order.clone());
                if let Err(e) = self.cart.clear_cart() {
                    warn!(error = %e, "Order placed but the cart could not be cleared");
                }
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, "Error placing order");
                self.order_error = Some(PLACE_ORDER_FAILED.to_string());
                Err(CheckoutError::Placement(e))
            }
        }
    }

    /// Moves the confirmed order to `processing`.
    #[instrument(skip(self))]
    pub async fn update_existing_order(&mut self) -> Result<Order, CheckoutError> {
        let id = self.confirmation.as_ref().and_then(|o| o.id.clone()).ok_or(CheckoutError::NotPlaced)?;
        let update = OrderUpdate::status(OrderStatus::Processing).with_notes(UPDATE_NOTES);
        match self.orders.update_order(&id, update).await {
            Ok(order) => {
                info!(order_id = %id, "Order moved to processing");
                self.confirmation = Some(order.clone());
                Ok(order)
            }
            Err(e) => {
                error!(order_id = %id, error = %e, "Error updating order");
                Err(CheckoutError::Update(e))
            }
        }
    }
}
