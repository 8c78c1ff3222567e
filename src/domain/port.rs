// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::InventoryEvent;
use crate::domain::model::{CatalogItem, CatalogItemId, InventoryItem, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
/// いずれも一時的な失敗としてトランスポートの再配送対象になる
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 在庫リポジトリトレイト
/// 在庫集約の永続化を抽象化する
/// create / update はともにオブジェクト全体の置き換えで、部分更新はない
#[async_trait]
pub trait InventoryItemRepository: Send + Sync {
    /// 新しい在庫レコードを作成する
    ///
    /// # Arguments
    /// * `item` - 作成する在庫レコード
    ///
    /// # Returns
    /// * `Ok(())` - 作成成功
    /// * `Err(RepositoryError)` - 作成失敗（同一キーの既存レコードを含む）
    async fn create(&self, item: &InventoryItem) -> Result<(), RepositoryError>;

    /// 既存の在庫レコードを置き換える
    ///
    /// # Arguments
    /// * `item` - 保存する在庫レコード
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError>;

    /// (プレイヤー, カタログアイテム) の複合キーで在庫を検索する
    ///
    /// # Returns
    /// * `Ok(Some(InventoryItem))` - 在庫が見つかった
    /// * `Ok(None)` - 在庫が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_user_and_item(
        &self,
        user_id: UserId,
        catalog_item_id: CatalogItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    /// 指定されたプレイヤーの在庫をすべて取得する
    /// 取得日時の昇順で並べて返す
    async fn find_all_by_user(&self, user_id: UserId)
        -> Result<Vec<InventoryItem>, RepositoryError>;
}

/// カタログリポジトリトレイト
/// カタログアイテムの存在確認（読み取り側）を抽象化する
#[async_trait]
pub trait CatalogItemRepository: Send + Sync {
    /// IDでカタログアイテムを検索する
    /// 在庫の中核が依存する唯一の事実は、このIDが存在するかどうか
    async fn find_by_id(&self, id: CatalogItemId)
        -> Result<Option<CatalogItem>, RepositoryError>;

    /// 複数のIDでカタログアイテムをまとめて取得する
    async fn find_by_ids(
        &self,
        ids: &[CatalogItemId],
    ) -> Result<Vec<CatalogItem>, RepositoryError>;

    /// カタログアイテムを保存する
    async fn save(&self, item: &CatalogItem) -> Result<(), RepositoryError>;
}

/// イベント発行エラー
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベント発行トレイト
/// fire-and-forgetの発行ポート。配送保証（at-least-once）は下流のブローカーが担い、
/// この層は配送確認を観測しない
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// イベントを発行する
    async fn publish(&self, event: InventoryEvent) -> Result<(), PublisherError>;
}
