//! Submitting a checkout to the backend.

use thiserror::Error;
use tracing::{error, info, instrument};

use linemart_core::{Cart, Checkout, CheckoutError, CheckoutStep, Order};

use crate::api::types::NewOrder;
use crate::api::{ApiError, CustomerApi};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("order was not accepted: {0}")]
    Api(#[from] ApiError),
}

/// Places orders for a checkout that has reached the processing step.
#[derive(Clone)]
pub struct CheckoutService {
    api: CustomerApi,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(api: CustomerApi) -> Self {
        Self { api }
    }

    /// Send the order to `POST /customer/orders/`.
    ///
    /// On success the checkout moves to the confirmation step holding the
    /// placed order. On failure it returns to the payment step showing the
    /// backend's message, and the error is returned.
    ///
    /// # Errors
    ///
    /// - `PlaceOrderError::Checkout` if the checkout is not processing a payment
    /// - `PlaceOrderError::Api` if the backend rejects the order
    #[instrument(skip_all, fields(lines = cart.lines().len()))]
    pub async fn place_order(
        &self,
        checkout: &mut Checkout,
        cart: &Cart,
    ) -> Result<Order, PlaceOrderError> {
        let not_ready = || CheckoutError::InvalidTransition {
            action: "place an order",
            step: checkout.step(),
        };
        if checkout.step() != CheckoutStep::Processing || cart.is_empty() {
            return Err(not_ready().into());
        }
        let (Some(shipping), Some(payment)) = (checkout.shipping(), checkout.payment()) else {
            return Err(not_ready().into());
        };

        let order = NewOrder::new(cart, shipping.clone(), payment.method);
        match self.api.create_order(&order).await {
            Ok(placed) => {
                info!(order = %placed.reference(), total = %placed.total, "Order placed");
                checkout.confirm(placed.clone())?;
                Ok(placed)
            }
            Err(e) => {
                error!(error = %e, "Order placement failed");
                checkout.fail(e.user_message())?;
                Err(e.into())
            }
        }
    }
}
