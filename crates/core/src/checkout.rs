//! Checkout totals and the multi-step checkout state machine.
//!
//! Steps run `Cart → Shipping → Payment → Confirmation`. While a payment is
//! being submitted the checkout sits in [`CheckoutStep::Processing`]; the
//! caller reports the outcome with [`Checkout::confirm`] or
//! [`Checkout::fail`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::types::{Email, Order, PaymentMethod, round_cents};

/// Flat shipping fee charged at or below the free-shipping threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

/// Subtotals strictly above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Sales tax rate applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Default country pre-filled on the shipping form.
pub const DEFAULT_COUNTRY: &str = "United States";

/// Derived checkout amounts for a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl CheckoutTotals {
    /// Compute shipping, tax and grand total from a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let tax = round_cents(subtotal * TAX_RATE);
        Self {
            subtotal,
            shipping,
            tax,
            grand_total: subtotal + shipping + tax,
        }
    }

    /// Totals for the current contents of a cart.
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        Self::from_subtotal(cart.total())
    }
}

/// Errors raised by checkout transitions and form validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please log in to continue to checkout")]
    LoginRequired,
    #[error("Please fill in all required fields ({0} is missing)")]
    MissingField(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("cannot {action} during the {step:?} step")]
    InvalidTransition {
        action: &'static str,
        step: CheckoutStep,
    },
}

/// Where the customer is in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Cart,
    Shipping,
    Payment,
    Processing,
    Confirmation,
}

/// Shipping form contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ShippingInfo {
    /// Check that every required field is filled in and the email parses.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, or [`CheckoutError::InvalidEmail`].
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zip code", &self.zip_code),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CheckoutError::MissingField(*name));
        }
        Email::parse(&self.email).map_err(|e| CheckoutError::InvalidEmail(e.to_string()))?;
        Ok(())
    }

    /// Single-line delivery address for confirmation screens.
    #[must_use]
    pub fn delivery_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address, self.city, self.state, self.zip_code
        )
    }
}

/// Payment form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub cardholder_name: String,
}

impl PaymentInfo {
    /// Card methods need every card field; other methods need nothing.
    ///
    /// # Errors
    ///
    /// Returns the first missing card field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if !self.method.requires_card_details() {
            return Ok(());
        }
        let required = [
            ("card number", &self.card_number),
            ("expiry date", &self.expiry_date),
            ("CVV", &self.cvv),
            ("cardholder name", &self.cardholder_name),
        ];
        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(CheckoutError::MissingField(*name)),
            None => Ok(()),
        }
    }
}

/// The checkout state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkout {
    step: CheckoutStep,
    shipping: Option<ShippingInfo>,
    payment: Option<PaymentInfo>,
    placed_order: Option<Order>,
    error: Option<String>,
}

impl Checkout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentInfo> {
        self.payment.as_ref()
    }

    /// The order placed by the last successful payment.
    #[must_use]
    pub const fn placed_order(&self) -> Option<&Order> {
        self.placed_order.as_ref()
    }

    /// Message from the last failed payment attempt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Leave the cart view and start checkout.
    ///
    /// # Errors
    ///
    /// Requires a non-empty cart and a signed-in customer.
    pub fn begin(&mut self, cart: &Cart, authenticated: bool) -> Result<(), CheckoutError> {
        self.require_step(
            &[CheckoutStep::Cart, CheckoutStep::Shipping],
            "begin checkout",
        )?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if !authenticated {
            return Err(CheckoutError::LoginRequired);
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Submit the shipping form and move on to payment.
    ///
    /// # Errors
    ///
    /// Fails on an incomplete form or when not on the shipping step.
    pub fn submit_shipping(&mut self, info: ShippingInfo) -> Result<(), CheckoutError> {
        self.require_step(&[CheckoutStep::Shipping], "submit shipping")?;
        info.validate()?;
        self.shipping = Some(info);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Submit the payment form; the checkout waits in `Processing`.
    ///
    /// # Errors
    ///
    /// Fails on incomplete card details or when not on the payment step.
    pub fn submit_payment(&mut self, info: PaymentInfo) -> Result<(), CheckoutError> {
        self.require_step(&[CheckoutStep::Payment], "submit payment")?;
        info.validate()?;
        self.payment = Some(info);
        self.error = None;
        self.step = CheckoutStep::Processing;
        Ok(())
    }

    /// Record the placed order and show the confirmation.
    ///
    /// # Errors
    ///
    /// Only valid while processing a payment.
    pub fn confirm(&mut self, order: Order) -> Result<(), CheckoutError> {
        self.require_step(&[CheckoutStep::Processing], "confirm an order")?;
        self.placed_order = Some(order);
        self.step = CheckoutStep::Confirmation;
        Ok(())
    }

    /// Return to the payment step with an error message.
    ///
    /// # Errors
    ///
    /// Only valid while processing a payment.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CheckoutError> {
        self.require_step(&[CheckoutStep::Processing], "fail a payment")?;
        self.error = Some(message.into());
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Go back one step: payment → shipping, shipping → cart.
    ///
    /// # Errors
    ///
    /// Not available from the cart, while processing, or after confirmation.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Shipping => CheckoutStep::Cart,
            step => {
                return Err(CheckoutError::InvalidTransition {
                    action: "go back",
                    step,
                });
            }
        };
        Ok(())
    }

    /// Leave the confirmation: empties the cart and resets for the next order.
    ///
    /// # Errors
    ///
    /// Only valid on the confirmation step.
    pub fn finish(&mut self, cart: &mut Cart) -> Result<(), CheckoutError> {
        self.require_step(&[CheckoutStep::Confirmation], "finish checkout")?;
        cart.clear();
        *self = Self {
            step: CheckoutStep::Shipping,
            ..Self::default()
        };
        Ok(())
    }

    fn require_step(
        &self,
        allowed: &[CheckoutStep],
        action: &'static str,
    ) -> Result<(), CheckoutError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                action,
                step: self.step,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{OrderId, OrderStatus, Product, ProductId};

    fn filled_shipping() -> ShippingInfo {
        ShippingInfo {
            first_name: "Amina".to_string(),
            last_name: "Otieno".to_string(),
            email: "amina@linemart.test".to_string(),
            phone: "254712345678".to_string(),
            address: "12 Moi Avenue".to_string(),
            city: "Nairobi".to_string(),
            state: "Nairobi".to_string(),
            zip_code: "00100".to_string(),
            ..ShippingInfo::default()
        }
    }

    fn cart_with_one_item() -> Cart {
        let mut cart = Cart::new();
        cart.add(&Product {
            id: ProductId::new(1),
            name: "Rice 2kg".to_string(),
            price: Decimal::new(1200, 2),
            image: String::new(),
            category: "Groceries".to_string(),
            subcategory: String::new(),
            rating: 4.0,
            description: String::new(),
            stock: 3,
        });
        cart
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(5),
            order_number: Some("ORD-005".to_string()),
            date: None,
            total: Decimal::new(2268, 2),
            status: OrderStatus::Placed,
            item_count: 1,
            payment_method: PaymentMethod::MPesa,
            tracking: None,
        }
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let totals = CheckoutTotals::from_subtotal(Decimal::new(6000, 2));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::new(480, 2));
        assert_eq!(totals.grand_total, Decimal::new(6480, 2));
    }

    #[test]
    fn test_flat_shipping_below_threshold() {
        let totals = CheckoutTotals::from_subtotal(Decimal::new(3000, 2));
        assert_eq!(totals.shipping, Decimal::new(999, 2));
        assert_eq!(totals.tax, Decimal::new(240, 2));
        assert_eq!(totals.grand_total, Decimal::new(4239, 2));
    }

    #[test]
    fn test_threshold_itself_is_charged() {
        let totals = CheckoutTotals::from_subtotal(Decimal::new(50, 0));
        assert_eq!(totals.shipping, SHIPPING_FEE);
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let totals = CheckoutTotals::from_subtotal(Decimal::new(1999, 2));
        // 19.99 * 0.08 = 1.5992
        assert_eq!(totals.tax, Decimal::new(160, 2));
    }

    #[test]
    fn test_begin_requires_items_and_login() {
        let mut checkout = Checkout::new();
        assert_eq!(
            checkout.begin(&Cart::new(), true),
            Err(CheckoutError::EmptyCart)
        );
        assert_eq!(
            checkout.begin(&cart_with_one_item(), false),
            Err(CheckoutError::LoginRequired)
        );
        checkout.begin(&cart_with_one_item(), true).unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_shipping_requires_every_field() {
        let mut checkout = Checkout::new();
        checkout.begin(&cart_with_one_item(), true).unwrap();

        let mut info = filled_shipping();
        info.city = "  ".to_string();
        assert_eq!(
            checkout.submit_shipping(info),
            Err(CheckoutError::MissingField("city"))
        );
        assert_eq!(checkout.step(), CheckoutStep::Shipping);

        let mut info = filled_shipping();
        info.email = "not-an-email".to_string();
        assert!(matches!(
            checkout.submit_shipping(info),
            Err(CheckoutError::InvalidEmail(_))
        ));

        checkout.submit_shipping(filled_shipping()).unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Payment);
    }

    #[test]
    fn test_card_payment_requires_card_fields() {
        let info = PaymentInfo {
            method: PaymentMethod::Card,
            card_number: "4242424242424242".to_string(),
            ..PaymentInfo::default()
        };
        assert_eq!(
            info.validate(),
            Err(CheckoutError::MissingField("expiry date"))
        );

        let mpesa = PaymentInfo {
            method: PaymentMethod::MPesa,
            ..PaymentInfo::default()
        };
        assert!(mpesa.validate().is_ok());
    }

    #[test]
    fn test_full_flow_clears_cart_on_finish() {
        let mut cart = cart_with_one_item();
        let mut checkout = Checkout::new();
        checkout.begin(&cart, true).unwrap();
        checkout.submit_shipping(filled_shipping()).unwrap();
        checkout
            .submit_payment(PaymentInfo {
                method: PaymentMethod::PayPal,
                ..PaymentInfo::default()
            })
            .unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Processing);

        checkout.confirm(order()).unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Confirmation);
        assert_eq!(
            checkout.placed_order().map(Order::reference).as_deref(),
            Some("ORD-005")
        );

        checkout.finish(&mut cart).unwrap();
        assert!(cart.is_empty());
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
        assert!(checkout.placed_order().is_none());
    }

    #[test]
    fn test_failed_payment_returns_to_payment_step() {
        let mut checkout = Checkout::new();
        checkout.begin(&cart_with_one_item(), true).unwrap();
        checkout.submit_shipping(filled_shipping()).unwrap();
        checkout
            .submit_payment(PaymentInfo {
                method: PaymentMethod::MPesa,
                ..PaymentInfo::default()
            })
            .unwrap();
        checkout.fail("Payment declined").unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Payment);
        assert_eq!(checkout.error(), Some("Payment declined"));
    }

    #[test]
    fn test_back_navigation_and_invalid_transitions() {
        let mut checkout = Checkout::new();
        assert!(matches!(
            checkout.back(),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(matches!(
            checkout.confirm(order()),
            Err(CheckoutError::InvalidTransition { .. })
        ));

        checkout.begin(&cart_with_one_item(), true).unwrap();
        checkout.submit_shipping(filled_shipping()).unwrap();
        checkout.back().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
        checkout.back().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Cart);
    }
}
