use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{CatalogItem, CatalogItemId};
use crate::domain::port::{CatalogItemRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQLカタログリポジトリ
/// カタログアイテムのローカルコピーを読み取り側として保持する
#[derive(Clone)]
pub struct MySqlCatalogItemRepository {
    pool: Pool<MySql>,
}

impl MySqlCatalogItemRepository {
    /// 新しいMySQLカタログリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &MySqlRow) -> Result<CatalogItem, RepositoryError> {
        let id = CatalogItemId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("カタログアイテムIDの解析に失敗しました: {}", e))
        })?;
        Ok(CatalogItem::new(
            id,
            row.get("name"),
            row.get("description"),
        ))
    }
}

#[async_trait]
impl CatalogItemRepository for MySqlCatalogItemRepository {
    async fn find_by_id(
        &self,
        id: CatalogItemId,
    ) -> Result<Option<CatalogItem>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, description FROM catalog_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カタログアイテムの取得に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_ids(
        &self,
        ids: &[CatalogItemId],
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // IN句のプレースホルダーをIDの数だけ組み立てる
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, description FROM catalog_items WHERE id IN ({}) ORDER BY id ASC",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "カタログアイテム一覧の取得に失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(Self::row_to_item(&row)?);
        }

        Ok(items)
    }

    async fn save(&self, item: &CatalogItem) -> Result<(), RepositoryError> {
        // カタログデータをcatalog_itemsテーブルにUPSERT
        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, name, description)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                description = VALUES(description)
            "#,
        )
        .bind(item.id().to_string())
        .bind(item.name())
        .bind(item.description())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("カタログアイテムの保存に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        Ok(())
    }
}
