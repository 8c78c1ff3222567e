use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{CatalogItemId, DeliveryId, InventoryItem, UserId};
use crate::domain::port::{InventoryItemRepository, RepositoryError};
use async_trait::async_trait;
use std::collections::HashSet;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL在庫リポジトリ
/// MySQLデータベースを使用して在庫レコードを永続化する
///
/// create / update はオブジェクト全体の置き換えで、楽観ロックや
/// バージョン番号は持たない（last-writer-wins）。
#[derive(Clone)]
pub struct MySqlInventoryItemRepository {
    pool: Pool<MySql>,
}

impl MySqlInventoryItemRepository {
    /// 新しいMySQL在庫リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 配送ID台帳をJSON文字列にシリアライズ
    fn serialize_ledger(item: &InventoryItem) -> Result<String, RepositoryError> {
        let ids: Vec<String> = item
            .processed_message_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        serde_json::to_string(&ids).map_err(|e| {
            RepositoryError::OperationFailed(format!("配送ID台帳のシリアライズに失敗しました: {}", e))
        })
    }

    /// データベース行から在庫レコードを復元
    fn row_to_item(row: &MySqlRow) -> Result<InventoryItem, RepositoryError> {
        let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("プレイヤーIDの解析に失敗しました: {}", e))
        })?;
        let catalog_item_id = CatalogItemId::from_string(row.get("catalog_item_id")).map_err(
            |e| {
                RepositoryError::FetchFailed(format!(
                    "カタログアイテムIDの解析に失敗しました: {}",
                    e
                ))
            },
        )?;

        let acquired_date = row
            .get::<chrono::NaiveDateTime, _>("acquired_date")
            .and_utc();

        let ledger_json: String = row.get("processed_message_ids");
        let ids: Vec<String> = serde_json::from_str(&ledger_json).map_err(|e| {
            RepositoryError::FetchFailed(format!("配送ID台帳の解析に失敗しました: {}", e))
        })?;
        let mut processed_message_ids = HashSet::with_capacity(ids.len());
        for id in ids {
            let delivery_id = DeliveryId::from_string(&id).map_err(|e| {
                RepositoryError::FetchFailed(format!("配送IDの解析に失敗しました: {}", e))
            })?;
            processed_message_ids.insert(delivery_id);
        }

        Ok(InventoryItem::restore(
            user_id,
            catalog_item_id,
            row.get::<i64, _>("quantity"),
            acquired_date,
            processed_message_ids,
        ))
    }
}

#[async_trait]
impl InventoryItemRepository for MySqlInventoryItemRepository {
    async fn create(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let ledger = Self::serialize_ledger(item)?;

        // 新規レコードのINSERT。複合キーが既に存在する場合は失敗し、
        // トランスポートの再配送で既存レコードへの加算パスに入り直す
        sqlx::query(
            r#"
            INSERT INTO inventory_items (user_id, catalog_item_id, quantity, acquired_date, processed_message_ids)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.user_id().to_string())
        .bind(item.catalog_item_id().to_string())
        .bind(item.quantity())
        .bind(item.acquired_date().naive_utc())
        .bind(ledger)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("在庫の作成に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let ledger = Self::serialize_ledger(item)?;

        // acquired_date は作成時に一度だけ設定されるため更新しない
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET quantity = ?, processed_message_ids = ?
            WHERE user_id = ? AND catalog_item_id = ?
            "#,
        )
        .bind(item.quantity())
        .bind(ledger)
        .bind(item.user_id().to_string())
        .bind(item.catalog_item_id().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("在庫の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_user_and_item(
        &self,
        user_id: UserId,
        catalog_item_id: CatalogItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, catalog_item_id, quantity, acquired_date, processed_message_ids
            FROM inventory_items
            WHERE user_id = ? AND catalog_item_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(catalog_item_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("在庫の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_all_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        // 取得日時の昇順で並べる
        let rows = sqlx::query(
            r#"
            SELECT user_id, catalog_item_id, quantity, acquired_date, processed_message_ids
            FROM inventory_items
            WHERE user_id = ?
            ORDER BY acquired_date ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("在庫一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(Self::row_to_item(&row)?);
        }

        Ok(items)
    }
}
