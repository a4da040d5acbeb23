//! Column flattening of written output files.

#![allow(clippy::unwrap_used)]

use shop_ledger_cli::expand_outputs;
use shop_ledger_cli::sink::{CsvSink, read_table};
use shop_ledger_cli::{PipelineError, SinkError};
use shop_ledger_core::{Cell, Table};
use shop_ledger_integration_tests::TestWorkspace;

fn row<'a>(table: &'a Table, id: &str) -> impl Fn(&str) -> String + 'a {
    let cells = table.find_row("id", id).unwrap();
    move |column| cells[table.column_index(column).unwrap()].to_field()
}

#[tokio::test]
async fn test_expand_users_file() {
    let ws = TestWorkspace::new();
    ws.run().await.unwrap();
    expand_outputs(&ws.output()).unwrap();

    let users = read_table(&CsvSink::new(ws.output()).users_path()).unwrap();
    assert_eq!(
        users.headers(),
        [
            "id",
            "email",
            "username",
            "phone",
            "Age",
            "Occupation",
            "Account Status",
            "Last Login",
            "Account Balance",
            "cart_count",
            "Address-latitude",
            "Address-longitude",
            "Address-city",
            "city-street",
            "street-number",
            "Address-zipcode",
            "full_name"
        ]
    );

    let john = row(&users, "1");
    assert_eq!(john("full_name"), "john doe");
    assert_eq!(john("Address-latitude"), "-37.3159");
    assert_eq!(john("city-street"), "new road");
    assert_eq!(john("street-number"), "7682");
    assert_eq!(john("Last Login"), "2024-01-05 08:12:00");
    assert_eq!(john("cart_count"), "2");

    assert_eq!(row(&users, "3")("Last Login"), "2023-11-30 00:00:00");

    let client_only = row(&users, "11");
    assert_eq!(client_only("Last Login"), "2023-09-14 06:00:00");
    assert_eq!(client_only("full_name"), "");
    assert_eq!(client_only("Address-city"), "");
}

#[tokio::test]
async fn test_expand_products_file() {
    let ws = TestWorkspace::new();
    ws.run().await.unwrap();
    expand_outputs(&ws.output()).unwrap();

    let products = read_table(&CsvSink::new(ws.output()).products_path()).unwrap();
    assert_eq!(products.headers().last().map(String::as_str), Some("votes"));

    let backpack = row(&products, "1");
    assert_eq!(backpack("rating"), "3.9");
    assert_eq!(backpack("votes"), "120");
    assert_eq!(backpack("price"), "109.95");
    assert_eq!(backpack("total_sold"), "6");

    assert_eq!(row(&products, "2")("price"), "22.30");
}

#[tokio::test]
async fn test_expand_twice_is_stable() {
    let ws = TestWorkspace::new();
    ws.run().await.unwrap();
    expand_outputs(&ws.output()).unwrap();

    let sink = CsvSink::new(ws.output());
    let first = (
        read_table(&sink.users_path()).unwrap(),
        read_table(&sink.products_path()).unwrap(),
    );
    expand_outputs(&ws.output()).unwrap();
    let second = (
        read_table(&sink.users_path()).unwrap(),
        read_table(&sink.products_path()).unwrap(),
    );

    assert_eq!(first, second);
}

#[test]
fn test_expand_without_outputs() {
    let ws = TestWorkspace::new();
    let err = expand_outputs(&ws.output()).unwrap_err();
    assert!(matches!(err, PipelineError::Sink(SinkError::Csv { .. })));
}

#[test]
fn test_empty_cell_reads_back_empty() {
    let ws = TestWorkspace::new();
    let sink_dir = ws.output();
    std::fs::create_dir_all(&sink_dir).unwrap();
    std::fs::write(sink_dir.join("product_data.csv"), "id,total_sold\n1,\n").unwrap();

    let table = read_table(&sink_dir.join("product_data.csv")).unwrap();
    assert_eq!(table.cell(0, "total_sold"), Some(&Cell::Empty));
}
