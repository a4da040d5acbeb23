//! User reconciliation: profiles ⟗ clients, plus per-user cart counts.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::table::Table;
use crate::types::{Cell, JoinKey, Record, RecordSet};

/// Join key column of user profiles; also the single key column kept in the output.
pub const PROFILE_KEY: &str = "id";
/// Join key column of scraped clients. Dropped from the output.
pub const CLIENT_KEY: &str = "ID";
/// Join key column of carts.
pub const CART_USER_KEY: &str = "userId";
/// Derived column holding the number of carts per user.
pub const CART_COUNT: &str = "cart_count";

/// Suffix for client columns whose name is already taken by a profile column.
const CLIENT_SUFFIX: &str = "_client";

/// One row of the profile/client outer join.
struct JoinedRow<'a> {
    key: &'a JoinKey,
    profile: Option<&'a Record>,
    client: Option<&'a Record>,
}

/// Build the denormalized user table.
///
/// Full outer join of `profiles` and `clients` on `id == ID`, then a left
/// join of per-user cart counts on `id`. Users without carts get
/// `cart_count = 0`, never the empty marker. Every profile and every client
/// is represented in the output; duplicate keys produce one row per matching
/// pair.
///
/// Columns: profile headers (with `id` first if the profiles lack one),
/// client headers without `ID`, then `cart_count`. Rows: profiles in input
/// order, each followed by its matching clients in client order, then the
/// unmatched clients in client order. Client-only rows take their `id` from
/// the client's `ID`.
///
/// # Errors
///
/// Returns [`CoreError::MissingField`](crate::CoreError::MissingField) or
/// [`CoreError::Conversion`](crate::CoreError::Conversion) if any profile
/// `id`, client `ID`, or cart `userId` is absent or cannot be canonicalized.
pub fn reconcile_users(
    clients: &RecordSet,
    profiles: &RecordSet,
    carts: &RecordSet,
) -> Result<Table> {
    let profile_keys = keys_of(profiles, PROFILE_KEY, "profile")?;
    let client_keys = keys_of(clients, CLIENT_KEY, "client")?;

    let joined = outer_join(profiles, &profile_keys, clients, &client_keys);
    let counts = cart_counts(carts)?;
    let cart_count = fill_missing_counts(left_join_counts(&joined, &counts));

    let layout = ColumnLayout::new(profiles.headers(), clients.headers());
    let mut table = Table::new(layout.headers());
    for (row, count) in joined.iter().zip(cart_count) {
        table.push_row(layout.cells(row, count));
    }

    debug!(
        profiles = profiles.len(),
        clients = clients.len(),
        carts = carts.len(),
        rows = table.len(),
        "Reconciled users"
    );

    Ok(table)
}

/// Count carts per normalized `userId`.
///
/// # Errors
///
/// Returns an error if any cart lacks a usable `userId`.
pub fn cart_counts(carts: &RecordSet) -> Result<HashMap<JoinKey, u64>> {
    let mut counts: HashMap<JoinKey, u64> = HashMap::new();
    for (i, cart) in carts.iter().enumerate() {
        let user = cart.key(CART_USER_KEY, || format!("cart[{i}]"))?;
        *counts.entry(user).or_insert(0) += 1;
    }
    Ok(counts)
}

fn keys_of(set: &RecordSet, field: &str, kind: &str) -> Result<Vec<JoinKey>> {
    set.iter()
        .enumerate()
        .map(|(i, record)| record.key(field, || format!("{kind}[{i}]")))
        .collect()
}

fn outer_join<'a>(
    profiles: &'a RecordSet,
    profile_keys: &'a [JoinKey],
    clients: &'a RecordSet,
    client_keys: &'a [JoinKey],
) -> Vec<JoinedRow<'a>> {
    let mut clients_by_key: HashMap<&JoinKey, Vec<usize>> = HashMap::new();
    for (i, key) in client_keys.iter().enumerate() {
        clients_by_key.entry(key).or_default().push(i);
    }

    let mut matched = vec![false; client_keys.len()];
    let mut rows = Vec::with_capacity(profile_keys.len().max(client_keys.len()));

    for (profile, key) in profiles.iter().zip(profile_keys) {
        match clients_by_key.get(key) {
            Some(indices) => {
                for &i in indices {
                    if let Some(flag) = matched.get_mut(i) {
                        *flag = true;
                    }
                    rows.push(JoinedRow {
                        key,
                        profile: Some(profile),
                        client: clients.records().get(i),
                    });
                }
            }
            None => rows.push(JoinedRow {
                key,
                profile: Some(profile),
                client: None,
            }),
        }
    }

    for ((client, key), was_matched) in clients.iter().zip(client_keys).zip(matched) {
        if !was_matched {
            rows.push(JoinedRow {
                key,
                profile: None,
                client: Some(client),
            });
        }
    }

    rows
}

/// Left join: `None` where a user has no carts.
fn left_join_counts(rows: &[JoinedRow<'_>], counts: &HashMap<JoinKey, u64>) -> Vec<Option<u64>> {
    rows.iter().map(|row| counts.get(row.key).copied()).collect()
}

/// Users without carts have zero carts.
fn fill_missing_counts(counts: Vec<Option<u64>>) -> Vec<u64> {
    counts.into_iter().map(|c| c.unwrap_or(0)).collect()
}

/// Output column plan: which source each column is read from.
struct ColumnLayout {
    /// (output name, source field) for profile columns.
    profile: Vec<(String, String)>,
    /// (output name, source field) for client columns.
    client: Vec<(String, String)>,
}

impl ColumnLayout {
    fn new(profile_headers: &[String], client_headers: &[String]) -> Self {
        let mut profile: Vec<(String, String)> = profile_headers
            .iter()
            .map(|h| (h.clone(), h.clone()))
            .collect();
        if !profile_headers.iter().any(|h| h == PROFILE_KEY) {
            profile.insert(0, (PROFILE_KEY.to_owned(), PROFILE_KEY.to_owned()));
        }

        let client = client_headers
            .iter()
            .filter(|h| *h != CLIENT_KEY)
            .map(|h| {
                let taken = h == CART_COUNT || profile.iter().any(|(name, _)| name == h);
                let name = if taken {
                    format!("{h}{CLIENT_SUFFIX}")
                } else {
                    h.clone()
                };
                (name, h.clone())
            })
            .collect();

        Self { profile, client }
    }

    fn headers(&self) -> Vec<String> {
        self.profile
            .iter()
            .chain(&self.client)
            .map(|(name, _)| name.clone())
            .chain(std::iter::once(CART_COUNT.to_owned()))
            .collect()
    }

    fn cells(&self, row: &JoinedRow<'_>, cart_count: u64) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.profile.len() + self.client.len() + 1);

        for (_, field) in &self.profile {
            let cell = if field == PROFILE_KEY {
                id_cell(row)
            } else {
                Cell::from(row.profile.and_then(|p| p.get(field)))
            };
            cells.push(cell);
        }
        for (_, field) in &self.client {
            cells.push(Cell::from(row.client.and_then(|c| c.get(field))));
        }
        cells.push(Cell::from(cart_count));

        cells
    }
}

/// The kept `id`: the profile's own id, else the client's `ID`.
fn id_cell(row: &JoinedRow<'_>) -> Cell {
    row.profile
        .and_then(|p| p.get(PROFILE_KEY))
        .or_else(|| row.client.and_then(|c| c.get(CLIENT_KEY)))
        .map_or_else(
            || Cell::Value(Value::String(row.key.to_string())),
            |v| Cell::from(v.clone()),
        )
}
