//! Follow polled data until Ctrl+C.

use std::time::Duration;

use linemart_storefront::realtime::{DataType, PollData};
use linemart_storefront::{AppError, AppShell};

use crate::output;

/// Parse data type names, rejecting unknown ones before anything starts.
fn parse_data_types(names: &[String]) -> Result<Vec<DataType>, AppError> {
    let mut parsed = Vec::with_capacity(names.len());
    for name in names {
        let data_type: DataType = name.parse()?;
        if !parsed.contains(&data_type) {
            parsed.push(data_type);
        }
    }
    Ok(parsed)
}

fn summarize(data: &PollData) -> String {
    let count = match data {
        PollData::Products(v) => v.len(),
        PollData::Categories(v) => v.len(),
        PollData::Promotions(v) => v.len(),
        PollData::Deals(v) => v.len(),
        PollData::Advertisements(v) => v.len(),
        PollData::Notifications(v) => v.len(),
        PollData::Orders(v) => v.len(),
        PollData::Cart(cart) => {
            return format!(
                "[cart] {} items, {}",
                cart.items.len(),
                output::money(cart.total)
            );
        }
    };
    format!("[{}] {count} records", data.data_type())
}

pub async fn run(
    shell: &AppShell,
    names: &[String],
    interval_secs: Option<u64>,
) -> Result<(), AppError> {
    let data_types = parse_data_types(names)?;
    let polling = shell.polling();

    for data_type in data_types {
        let interval = interval_secs
            .map_or_else(|| polling.interval_for(data_type), Duration::from_secs);
        polling.start(data_type, |data| output::line(summarize(&data)), interval)?;
    }
    output::line("Watching for updates, press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
    polling.stop_all();
    Ok(())
}
