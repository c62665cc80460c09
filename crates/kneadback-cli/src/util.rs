use chrono::{Local, TimeZone};

/// `<category>::<name>`, or just the name when no category is given.
pub fn compose_product_model(category: Option<&str>, product: Option<&str>) -> String {
    let category = category.map(str::trim).filter(|value| !value.is_empty());
    let product = product.map(str::trim).unwrap_or_default();
    match category {
        Some(category) => format!("{category}::{product}"),
        None => product.to_string(),
    }
}

pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}
