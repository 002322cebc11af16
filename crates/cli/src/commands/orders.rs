//! Order, cart and delivery commands.

use linemart_core::{CheckoutTotals, OrderId};
use linemart_storefront::{AppError, AppShell};

use crate::output;

pub async fn list(shell: &AppShell) -> Result<(), AppError> {
    let orders = shell.customer().orders().await?;
    if orders.is_empty() {
        output::line("No orders yet");
        return Ok(());
    }

    output::heading("Orders");
    for order in &orders {
        let date = order
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let tracking = order.tracking.as_deref().unwrap_or("");
        output::line(format!(
            "{:<10} {:<10} {:>10}  {:<16} {:>3} items  {:<18} {tracking}",
            order.reference(),
            date,
            output::money(order.total),
            order.status.label(),
            order.item_count,
            order.payment_method.label(),
        ));
    }
    Ok(())
}

/// Cancel an order after checking it is still cancellable.
pub async fn cancel(shell: &AppShell, id: OrderId) -> Result<(), AppError> {
    let order = shell.customer().order(id).await?;
    if !order.status.is_cancellable() {
        output::line(format!(
            "Order {} is {} and can no longer be cancelled",
            order.reference(),
            order.status.label()
        ));
        return Ok(());
    }
    shell.customer().cancel_order(id).await?;
    output::line(format!("Order {} cancelled", order.reference()));
    Ok(())
}

/// Show the server-side cart with checkout totals.
pub async fn cart(shell: &AppShell) -> Result<(), AppError> {
    let cart = shell.customer().cart().await?;
    if cart.items.is_empty() {
        output::line("Your cart is empty");
        return Ok(());
    }

    output::heading("Cart");
    for item in &cart.items {
        output::line(format!(
            "{:>3} x {:<32} {:>10}",
            item.quantity,
            item.product_name,
            output::money(item.price)
        ));
    }

    let totals = CheckoutTotals::from_subtotal(cart.total);
    output::line(format!("Subtotal: {:>10}", output::money(totals.subtotal)));
    output::line(format!("Shipping: {:>10}", output::money(totals.shipping)));
    output::line(format!("Tax:      {:>10}", output::money(totals.tax)));
    output::line(format!("Total:    {:>10}", output::money(totals.grand_total)));
    Ok(())
}

pub async fn track(shell: &AppShell, tracking_number: &str, history: bool) -> Result<(), AppError> {
    let delivery = shell.customer().track_delivery(tracking_number).await?;
    output::line(format!("{}: {}", delivery.tracking_number, delivery.status));
    if let Some(eta) = &delivery.estimated_delivery {
        output::line(format!("Estimated delivery: {eta}"));
    }

    if history {
        let events = shell
            .customer()
            .delivery_tracking_history(delivery.id)
            .await?;
        output::heading("History");
        for event in &events {
            output::line(format!(
                "{:<25} {:<16} {}",
                event.timestamp.as_deref().unwrap_or("-"),
                event.status,
                event.location.as_deref().unwrap_or("")
            ));
        }
    }
    Ok(())
}
