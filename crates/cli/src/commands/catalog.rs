//! Catalog commands.

use linemart_core::CategoryId;
use linemart_storefront::api::ProductQuery;
use linemart_storefront::{AppError, AppShell};

use crate::output;

/// List products, trying the cashier endpoint if the customer one fails.
pub async fn products(
    shell: &AppShell,
    search: Option<String>,
    category: Option<CategoryId>,
) -> Result<(), AppError> {
    let query = ProductQuery { search, category };
    let products = shell.catalog().products(&query).await?;

    if products.is_empty() {
        output::line("No products found");
        return Ok(());
    }
    output::heading(&format!("{} products", products.len()));
    for product in &products {
        output::line(output::product_row(product));
    }
    Ok(())
}

pub async fn categories(shell: &AppShell) -> Result<(), AppError> {
    let categories = shell.catalog().categories().await?;
    output::heading("Categories");
    for category in &categories {
        let id = category.id.as_i64();
        match &category.description {
            Some(description) => {
                output::line(format!("{id:>5}  {}  ({description})", category.name));
            }
            None => output::line(format!("{id:>5}  {}", category.name)),
        }
    }
    Ok(())
}
