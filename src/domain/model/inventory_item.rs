use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::model::{CatalogItemId, DeliveryId, UserId};

/// 在庫集約
/// (プレイヤー, カタログアイテム) ごとの保有数量を管理する
///
/// processed_message_ids はこのレコードに適用済みの配送IDの台帳。
/// 単調増加のみで、一度記録された配送IDの再適用を恒久的に防ぐ。
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    user_id: UserId,
    catalog_item_id: CatalogItemId,
    quantity: i64,
    acquired_date: DateTime<Utc>,
    processed_message_ids: HashSet<DeliveryId>,
}

impl InventoryItem {
    /// 新しい在庫レコードを作成
    /// acquired_date は作成時に一度だけ設定され、以後変更されない
    ///
    /// # Arguments
    /// * `user_id` - プレイヤーID
    /// * `catalog_item_id` - カタログアイテムID
    /// * `quantity` - 初期数量
    pub fn new(user_id: UserId, catalog_item_id: CatalogItemId, quantity: i64) -> Self {
        Self {
            user_id,
            catalog_item_id,
            quantity,
            acquired_date: Utc::now(),
            processed_message_ids: HashSet::new(),
        }
    }

    /// 永続化済みの値から在庫レコードを復元
    /// リポジトリ実装がデータベース行から再構築するときに使う
    pub fn restore(
        user_id: UserId,
        catalog_item_id: CatalogItemId,
        quantity: i64,
        acquired_date: DateTime<Utc>,
        processed_message_ids: HashSet<DeliveryId>,
    ) -> Self {
        Self {
            user_id,
            catalog_item_id,
            quantity,
            acquired_date,
            processed_message_ids,
        }
    }

    /// プレイヤーIDを取得
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// カタログアイテムIDを取得
    pub fn catalog_item_id(&self) -> CatalogItemId {
        self.catalog_item_id
    }

    /// 現在の数量を取得
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// 初回取得日時を取得
    pub fn acquired_date(&self) -> DateTime<Utc> {
        self.acquired_date
    }

    /// 適用済み配送IDの台帳を取得
    pub fn processed_message_ids(&self) -> &HashSet<DeliveryId> {
        &self.processed_message_ids
    }

    /// 指定された配送が既に適用済みかチェック
    pub fn has_processed(&self, delivery_id: DeliveryId) -> bool {
        self.processed_message_ids.contains(&delivery_id)
    }

    /// 配送IDを適用済みとして記録する
    /// 台帳は増えるだけで減ることはない
    pub fn mark_delivery_processed(&mut self, delivery_id: DeliveryId) {
        self.processed_message_ids.insert(delivery_id);
    }

    /// 数量を加算し、配送IDを台帳に記録する
    /// 呼び出し側は has_processed で再配送でないことを確認してから呼ぶこと
    pub fn grant(&mut self, quantity: i64, delivery_id: DeliveryId) {
        self.quantity += quantity;
        self.processed_message_ids.insert(delivery_id);
    }

    /// 数量を減算し、配送IDを台帳に記録する
    /// この層では下限を設けない。数量は負になり得る
    pub fn subtract(&mut self, quantity: i64, delivery_id: DeliveryId) {
        self.quantity -= quantity;
        self.processed_message_ids.insert(delivery_id);
    }

    /// 数量を直接加算する（同期APIパス用）
    /// 配送IDの記帳を行わないため、このパスは冪等ではない
    pub fn add_quantity(&mut self, quantity: i64) {
        self.quantity += quantity;
    }
}
