//! Column expansion for persisted tables.
//!
//! The reconciled tables keep nested source values (`address`, `name`,
//! `rating`) as single JSON cells. These passes split them into flat, typed
//! columns for spreadsheet consumers. They accept both freshly built tables
//! and tables read back from disk, where nested values arrive as JSON text.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::table::Table;
use crate::types::Cell;

const ADDRESS: &str = "address";
const NAME: &str = "name";
const LAST_LOGIN: &str = "Last Login";
const ID: &str = "id";
const RATING: &str = "rating";
const PRICE: &str = "price";

const LATITUDE: &str = "Address-latitude";
const LONGITUDE: &str = "Address-longitude";
const CITY: &str = "Address-city";
const STREET: &str = "city-street";
const STREET_NUMBER: &str = "street-number";
const ZIPCODE: &str = "Address-zipcode";
const FULL_NAME: &str = "full_name";
const VOTES: &str = "votes";

/// Output format for normalized login timestamps.
const LOGIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct Address {
    city: String,
    street: String,
    number: Value,
    zipcode: String,
    geolocation: Geolocation,
}

#[derive(Debug, Deserialize)]
struct Geolocation {
    lat: Value,
    long: Value,
}

#[derive(Debug, Deserialize)]
struct PersonName {
    firstname: String,
    lastname: String,
}

#[derive(Debug, Deserialize)]
struct Rating {
    rate: f64,
    count: u64,
}

/// Flatten the user table.
///
/// - `address` → `Address-latitude`, `Address-longitude`, `Address-city`,
///   `city-street`, `street-number`, `Address-zipcode` (appended; `address`
///   removed)
/// - `name` → `full_name` (appended; `name` removed)
/// - `Last Login` → `YYYY-MM-DD HH:MM:SS`
/// - `id` → integer where numeric
///
/// Missing columns are skipped; empty cells stay empty in derived columns.
///
/// # Errors
///
/// Returns [`CoreError::Conversion`] if a nested value or timestamp cannot
/// be parsed.
pub fn expand_users(table: &Table) -> Result<Table> {
    let address_idx = table.column_index(ADDRESS);
    let name_idx = table.column_index(NAME);
    let login_idx = table.column_index(LAST_LOGIN);
    let id_idx = table.column_index(ID);

    let mut headers: Vec<String> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != address_idx && Some(*i) != name_idx)
        .map(|(_, h)| h.clone())
        .collect();
    if address_idx.is_some() {
        headers.extend(
            [LATITUDE, LONGITUDE, CITY, STREET, STREET_NUMBER, ZIPCODE].map(str::to_owned),
        );
    }
    if name_idx.is_some() {
        headers.push(FULL_NAME.to_owned());
    }

    let mut out = Table::new(headers);
    for (row_no, row) in table.rows().iter().enumerate() {
        let mut cells = Vec::with_capacity(out.headers().len());
        for (i, cell) in row.iter().enumerate() {
            if Some(i) == address_idx || Some(i) == name_idx {
                continue;
            }
            let cell = if Some(i) == login_idx {
                normalize_login(cell, || format!("user[{row_no}].{LAST_LOGIN}"))?
            } else if Some(i) == id_idx {
                integer_or_keep(cell)
            } else {
                cell.clone()
            };
            cells.push(cell);
        }

        if let Some(idx) = address_idx {
            cells.extend(address_cells(row.get(idx), row_no)?);
        }
        if let Some(idx) = name_idx {
            cells.push(full_name_cell(row.get(idx), row_no)?);
        }
        out.push_row(cells);
    }

    Ok(out)
}

/// Flatten the product table.
///
/// - `rating` `{rate, count}` → `rating` (the rate) and `votes` (appended),
///   unless a `votes` column is already present
/// - `price` → two-decimal string via [`Decimal`]
/// - `id` → integer where numeric
///
/// # Errors
///
/// Returns [`CoreError::Conversion`] if a rating or price cannot be parsed.
pub fn expand_products(table: &Table) -> Result<Table> {
    // A `votes` column means `rating` is already flat.
    let rating_idx = table
        .column_index(VOTES)
        .map_or_else(|| table.column_index(RATING), |_| None);
    let price_idx = table.column_index(PRICE);
    let id_idx = table.column_index(ID);

    let mut headers = table.headers().to_vec();
    if rating_idx.is_some() {
        headers.push(VOTES.to_owned());
    }

    let mut out = Table::new(headers);
    for (row_no, row) in table.rows().iter().enumerate() {
        let mut votes = Cell::Empty;
        let mut cells = Vec::with_capacity(out.headers().len());
        for (i, cell) in row.iter().enumerate() {
            let cell = if Some(i) == rating_idx {
                match parse_nested::<Rating>(cell, || format!("product[{row_no}].{RATING}"))? {
                    Some(rating) => {
                        votes = Cell::from(rating.count);
                        Cell::from(Value::from(rating.rate))
                    }
                    None => Cell::Empty,
                }
            } else if Some(i) == price_idx {
                normalize_price(cell, || format!("product[{row_no}].{PRICE}"))?
            } else if Some(i) == id_idx {
                integer_or_keep(cell)
            } else {
                cell.clone()
            };
            cells.push(cell);
        }
        if rating_idx.is_some() {
            cells.push(votes);
        }
        out.push_row(cells);
    }

    Ok(out)
}

fn parse_nested<T: DeserializeOwned>(
    cell: &Cell,
    context: impl FnOnce() -> String,
) -> Result<Option<T>> {
    let Some(value) = cell.as_structured() else {
        return Ok(None);
    };
    serde_json::from_value::<T>(value.clone())
        .map(Some)
        .map_err(|_| CoreError::conversion(context(), &value, "unexpected nested structure"))
}

fn address_cells(cell: Option<&Cell>, row_no: usize) -> Result<[Cell; 6]> {
    let context = || format!("user[{row_no}].{ADDRESS}");
    let Some(address) = parse_nested::<Address>(cell.unwrap_or(&Cell::Empty), context)? else {
        return Ok(Default::default());
    };

    Ok([
        Cell::from(Value::from(coordinate(&address.geolocation.lat, context)?)),
        Cell::from(Value::from(coordinate(&address.geolocation.long, context)?)),
        Cell::from(address.city),
        Cell::from(address.street),
        Cell::from(address.number),
        Cell::from(address.zipcode),
    ])
}

fn coordinate(value: &Value, context: impl FnOnce() -> String) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CoreError::conversion(context(), value, "coordinate is not a number"))
}

fn full_name_cell(cell: Option<&Cell>, row_no: usize) -> Result<Cell> {
    let name = parse_nested::<PersonName>(cell.unwrap_or(&Cell::Empty), || {
        format!("user[{row_no}].{NAME}")
    })?;
    Ok(name.map_or(Cell::Empty, |n| {
        Cell::from(format!("{} {}", n.firstname, n.lastname))
    }))
}

fn normalize_login(cell: &Cell, context: impl FnOnce() -> String) -> Result<Cell> {
    let Some(value) = cell.as_value() else {
        return Ok(Cell::Empty);
    };
    let Some(text) = value.as_str() else {
        return Err(CoreError::conversion(context(), value, "timestamp is not text"));
    };
    parse_timestamp(text.trim())
        .map(|ts| Cell::from(ts.format(LOGIN_FORMAT).to_string()))
        .ok_or_else(|| CoreError::conversion(context(), value, "unrecognized timestamp format"))
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn normalize_price(cell: &Cell, context: impl FnOnce() -> String) -> Result<Cell> {
    let Some(value) = cell.as_value() else {
        return Ok(Cell::Empty);
    };
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    let mut price = parsed
        .ok_or_else(|| CoreError::conversion(context(), value, "price is not a decimal"))?
        .round_dp(2);
    price.rescale(2);
    Ok(Cell::from(price.to_string()))
}

/// Integers pass through, numeric strings become integers, anything else is
/// left untouched.
fn integer_or_keep(cell: &Cell) -> Cell {
    match cell.as_value() {
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_or_else(|_| cell.clone(), Cell::from),
        _ => cell.clone(),
    }
}
