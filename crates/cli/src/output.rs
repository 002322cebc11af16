//! Terminal output.
//!
//! Everything the CLI prints for the user goes through here; diagnostics go
//! through `tracing` instead.

use rust_decimal::Decimal;

use linemart_core::{Price, Product};

/// Print one line to stdout.
#[allow(clippy::print_stdout)]
pub fn line(text: impl AsRef<str>) {
    println!("{}", text.as_ref());
}

/// Print a heading followed by a rule of the same width.
pub fn heading(title: &str) {
    line(title);
    line("-".repeat(title.chars().count()));
}

/// Format an amount as US dollars.
#[must_use]
pub fn money(amount: Decimal) -> String {
    Price::usd(amount).to_string()
}

/// One catalog row.
#[must_use]
pub fn product_row(product: &Product) -> String {
    let stock = if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    };
    format!(
        "{:>5}  {:<32} {:>10}  {:<16} {}",
        product.id.as_i64(),
        product.name,
        money(product.price),
        product.category,
        stock
    )
}
