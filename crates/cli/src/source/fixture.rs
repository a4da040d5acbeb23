//! Offline source reading the four inputs from JSON files.
//!
//! Layout of the fixture directory:
//!
//! - `clients.json` - `{"headers": [...], "rows": [[...], ...]}`, cells as text
//! - `carts.json` - array of carts as returned by `/carts`
//! - `users.json` - array of user profiles
//! - `products.json` - array of catalog products

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shop_ledger_core::{JoinKey, Record, RecordSet};
use tracing::{debug, instrument};

use super::{RecordSource, SourceError, distinct};

const CLIENTS_FILE: &str = "clients.json";
const CARTS_FILE: &str = "carts.json";
const USERS_FILE: &str = "users.json";
const PRODUCTS_FILE: &str = "products.json";
const CART_HEADERS: [&str; 4] = ["id", "userId", "date", "products"];

#[derive(Debug, Deserialize)]
struct ClientsFixture {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Reads inputs from a fixture directory.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, SourceError> {
        let path = self.dir.join(file);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SourceError::Fixture {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| SourceError::FixtureFormat { path, source })
    }

    /// Records from `file` whose `id` is in `ids`, in `ids` order.
    async fn select(
        &self,
        kind: &str,
        file: &str,
        ids: &[JoinKey],
    ) -> Result<RecordSet, SourceError> {
        let all: Vec<Value> = self.read(file).await?;

        let mut by_id = HashMap::with_capacity(all.len());
        for (i, value) in all.into_iter().enumerate() {
            let context = || format!("{kind}[{i}]");
            let id = Record::from_value(value.clone(), context)?.key("id", context)?;
            by_id.entry(id).or_insert(value);
        }

        let selected: Vec<Value> = distinct(ids)
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        debug!(kind, requested = ids.len(), found = selected.len(), "Selected fixture records");
        Ok(RecordSet::from_values(kind, selected)?)
    }
}

impl RecordSource for FixtureSource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn clients(&self) -> Result<RecordSet, SourceError> {
        let fixture: ClientsFixture = self.read(CLIENTS_FILE).await?;
        Ok(RecordSet::from_rows(fixture.headers, fixture.rows)?)
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn carts(&self) -> Result<RecordSet, SourceError> {
        let carts: Vec<Value> = self.read(CARTS_FILE).await?;
        let headers = CART_HEADERS.iter().map(ToString::to_string).collect();
        Ok(RecordSet::with_headers("cart", headers, carts)?)
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn user_profiles(&self, ids: &[JoinKey]) -> Result<RecordSet, SourceError> {
        self.select("user", USERS_FILE, ids).await
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn products(&self, ids: &[JoinKey]) -> Result<RecordSet, SourceError> {
        self.select("product", PRODUCTS_FILE, ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use shop_ledger_core::CoreError;

    fn write(dir: &Path, file: &str, value: &Value) {
        std::fs::write(dir.join(file), value.to_string()).unwrap();
    }

    fn keys(ids: &[i64]) -> Vec<JoinKey> {
        ids.iter().copied().map(JoinKey::from).collect()
    }

    #[tokio::test]
    async fn test_clients_from_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CLIENTS_FILE,
            &json!({"headers": ["ID", "Age"], "rows": [["1", "30"], ["2", "41"]]}),
        );

        let clients = FixtureSource::new(dir.path()).clients().await.unwrap();
        assert_eq!(clients.headers(), ["ID", "Age"]);
        assert_eq!(clients.len(), 2);
        assert_eq!(clients.records()[1].get("Age"), Some(&json!("41")));
    }

    #[tokio::test]
    async fn test_select_filters_and_orders_by_request() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            USERS_FILE,
            &json!([
                {"id": 1, "email": "one@example.com"},
                {"id": 2, "email": "two@example.com"},
                {"id": 3, "email": "three@example.com"}
            ]),
        );

        let users = FixtureSource::new(dir.path())
            .user_profiles(&keys(&[3, 1, 9, 3]))
            .await
            .unwrap();
        let emails: Vec<&Value> = users.iter().filter_map(|r| r.get("email")).collect();
        assert_eq!(emails, [&json!("three@example.com"), &json!("one@example.com")]);
        assert_eq!(users.headers(), ["id", "email"]);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FixtureSource::new(dir.path()).carts().await.unwrap_err();
        assert!(matches!(err, SourceError::Fixture { ref path, .. } if path.ends_with(CARTS_FILE)));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PRODUCTS_FILE), "{not json").unwrap();
        let err = FixtureSource::new(dir.path())
            .products(&keys(&[1]))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::FixtureFormat { .. }));
    }

    #[tokio::test]
    async fn test_record_without_id() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PRODUCTS_FILE, &json!([{"title": "no id"}]));
        let err = FixtureSource::new(dir.path())
            .products(&keys(&[1]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::Core(CoreError::MissingField { ref field, .. }) if field == "id"
        ));
    }

    #[tokio::test]
    async fn test_ragged_client_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            CLIENTS_FILE,
            &json!({"headers": ["ID", "Age"], "rows": [["1"]]}),
        );
        let err = FixtureSource::new(dir.path()).clients().await.unwrap_err();
        assert!(matches!(err, SourceError::Core(CoreError::RowWidth { .. })));
    }
}
