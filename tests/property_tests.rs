use proptest::prelude::*;
use player_inventory_management::domain::model::{CatalogItemId, DeliveryId, InventoryItem, UserId};

// 在庫集約のプロパティベーステスト
proptest! {
    /// 互いに異なる配送による付与は合計に積み上がる
    #[test]
    fn test_distinct_grants_accumulate(
        initial in 0i64..1_000_000,
        quantities in proptest::collection::vec(0i64..10_000, 0..20),
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), initial);
        for quantity in &quantities {
            item.grant(*quantity, DeliveryId::new());
        }

        let expected: i64 = initial + quantities.iter().sum::<i64>();
        prop_assert_eq!(item.quantity(), expected);
        prop_assert_eq!(item.processed_message_ids().len(), quantities.len());
    }

    /// 同一配送の再適用をコンシューマーと同じ台帳チェックで防ぐと、
    /// N回の再配送は1回の適用と同じ結果になる
    #[test]
    fn test_replayed_delivery_applies_exactly_once(
        initial in 0i64..1_000_000,
        quantity in 0i64..10_000,
        replays in 1usize..10,
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), initial);
        let delivery_id = DeliveryId::new();

        for _ in 0..replays {
            if !item.has_processed(delivery_id) {
                item.grant(quantity, delivery_id);
            }
        }

        prop_assert_eq!(item.quantity(), initial + quantity);
        prop_assert_eq!(item.processed_message_ids().len(), 1);
    }

    /// 減算に下限はなく、最終数量は単純な加減算の結果になる
    #[test]
    fn test_subtract_has_no_floor(
        initial in 0i64..1_000,
        grants in proptest::collection::vec(0i64..1_000, 0..10),
        subtracts in proptest::collection::vec(0i64..1_000, 0..10),
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), initial);
        for quantity in &grants {
            item.grant(*quantity, DeliveryId::new());
        }
        for quantity in &subtracts {
            item.subtract(*quantity, DeliveryId::new());
        }

        let expected: i64 =
            initial + grants.iter().sum::<i64>() - subtracts.iter().sum::<i64>();
        prop_assert_eq!(item.quantity(), expected);
    }

    /// 配送ID台帳は単調に増加し、適用したすべての配送を記憶している
    #[test]
    fn test_ledger_grows_monotonically(
        operations in proptest::collection::vec((0i64..100, any::<bool>()), 0..30),
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), 0);
        let mut recorded = Vec::new();
        let mut previous_len = 0;

        for (quantity, is_grant) in &operations {
            let delivery_id = DeliveryId::new();
            if *is_grant {
                item.grant(*quantity, delivery_id);
            } else {
                item.subtract(*quantity, delivery_id);
            }
            recorded.push(delivery_id);

            // 台帳は縮まない
            prop_assert!(item.processed_message_ids().len() > previous_len);
            previous_len = item.processed_message_ids().len();
        }

        for delivery_id in recorded {
            prop_assert!(item.has_processed(delivery_id));
        }
    }

    /// 取得日時は作成時に固定され、どの操作でも変化しない
    #[test]
    fn test_acquired_date_is_immutable(
        quantities in proptest::collection::vec(0i64..100, 1..10),
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), 0);
        let acquired = item.acquired_date();

        for quantity in &quantities {
            item.grant(*quantity, DeliveryId::new());
            item.subtract(*quantity, DeliveryId::new());
            item.add_quantity(*quantity);
        }

        prop_assert_eq!(item.acquired_date(), acquired);
    }

    /// 直接付与パスには重複排除がなく、再送信はそのまま二重加算になる
    #[test]
    fn test_direct_grant_double_submission_double_counts(
        initial in 0i64..1_000_000,
        quantity in 1i64..10_000,
    ) {
        let mut item = InventoryItem::new(UserId::new(), CatalogItemId::new(), initial);
        item.add_quantity(quantity);
        item.add_quantity(quantity);

        prop_assert_eq!(item.quantity(), initial + quantity * 2);
        prop_assert!(item.processed_message_ids().is_empty());
    }
}
