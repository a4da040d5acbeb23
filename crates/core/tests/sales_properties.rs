use proptest::prelude::*;
use serde_json::{Value, json};
use shop_ledger_core::aggregate::{TOTAL_SOLD, UNIQUE_BUYERS_COUNT};
use shop_ledger_core::reconcile::CART_COUNT;
use shop_ledger_core::{RecordSet, reconcile_users, summarize_products};

type CartSpec = (u8, Vec<(u8, u8)>);

fn cart_strategy() -> impl Strategy<Value = CartSpec> {
    (0u8..6, proptest::collection::vec((0u8..8, 0u8..10), 0..5))
}

fn carts_json(carts: &[CartSpec]) -> RecordSet {
    let values = carts
        .iter()
        .enumerate()
        .map(|(i, (user, items))| {
            let products: Vec<Value> = items
                .iter()
                .map(|(product, quantity)| json!({"productId": product, "quantity": quantity}))
                .collect();
            json!({"id": i, "userId": user, "date": "2020-01-01", "products": products})
        })
        .collect();
    RecordSet::from_values("cart", values).expect("carts are objects")
}

fn catalog() -> RecordSet {
    RecordSet::from_values(
        "product",
        (0..8).map(|id| json!({"id": id, "title": format!("p{id}")})).collect(),
    )
    .expect("catalog is objects")
}

fn profiles() -> RecordSet {
    RecordSet::from_values("profile", (0..6).map(|id| json!({"id": id})).collect())
        .expect("profiles are objects")
}

proptest! {
    #[test]
    fn product_summary_is_independent_of_cart_order(
        (original, shuffled) in proptest::collection::vec(cart_strategy(), 0..16)
            .prop_flat_map(|carts| (Just(carts.clone()), Just(carts).prop_shuffle()))
    ) {
        let left = summarize_products(&carts_json(&original), &catalog()).expect("left");
        let right = summarize_products(&carts_json(&shuffled), &catalog()).expect("right");

        let left_sold: Vec<_> = left.column(TOTAL_SOLD).expect("column").cloned().collect();
        let right_sold: Vec<_> = right.column(TOTAL_SOLD).expect("column").cloned().collect();
        prop_assert_eq!(left_sold, right_sold);

        let left_buyers: Vec<_> =
            left.column(UNIQUE_BUYERS_COUNT).expect("column").cloned().collect();
        let right_buyers: Vec<_> =
            right.column(UNIQUE_BUYERS_COUNT).expect("column").cloned().collect();
        prop_assert_eq!(left_buyers, right_buyers);
    }

    #[test]
    fn total_sold_matches_line_item_sum(carts in proptest::collection::vec(cart_strategy(), 0..16)) {
        let table = summarize_products(&carts_json(&carts), &catalog()).expect("summary");

        for (row, product) in (0u8..8).enumerate() {
            let lines: Vec<u64> = carts
                .iter()
                .flat_map(|(_, items)| items.iter())
                .filter(|(p, _)| *p == product)
                .map(|(_, q)| u64::from(*q))
                .collect();
            let sold = table.cell(row, TOTAL_SOLD).expect("cell");
            if lines.is_empty() {
                prop_assert!(sold.is_empty());
            } else {
                prop_assert_eq!(sold.as_value().and_then(Value::as_u64), Some(lines.iter().sum()));
            }
        }
    }

    #[test]
    fn cart_count_matches_cart_rows(carts in proptest::collection::vec(cart_strategy(), 0..16)) {
        let clients = RecordSet::default();
        let table = reconcile_users(&clients, &profiles(), &carts_json(&carts)).expect("users");

        prop_assert_eq!(table.len(), 6);
        for (row, user) in (0u8..6).enumerate() {
            let expected = carts.iter().filter(|(u, _)| *u == user).count() as i64;
            let count = table.cell(row, CART_COUNT).and_then(|c| c.as_i64());
            prop_assert_eq!(count, Some(expected));
        }
    }
}
