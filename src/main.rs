use player_inventory_management::adapter::driven::{
    BusConfig, ConsoleEventPublisher, ConsoleLogger, InMemoryMessageBus,
    MySqlCatalogItemRepository, MySqlInventoryItemRepository,
};
use player_inventory_management::adapter::driver::rest_api::{create_router, AppStateInner};
use player_inventory_management::adapter::{DatabaseConfig, DatabaseMigration};
use player_inventory_management::application::service::{
    InventoryApplicationService, InventoryQueryService,
};
use player_inventory_management::domain::consumer::{GrantItemsConsumer, SubtractItemsConsumer};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== プレイヤーインベントリ管理サービス ===");
    println!("冪等なコマンド消費サンプルプロジェクト");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // MySQLリポジトリを作成
    let inventory_repository = Arc::new(MySqlInventoryItemRepository::new(pool.clone()));
    let catalog_repository = Arc::new(MySqlCatalogItemRepository::new(pool.clone()));

    // ロガーとイベント発行者を作成
    let logger = Arc::new(ConsoleLogger::new());
    let publisher = Arc::new(ConsoleEventPublisher::new());

    // コマンドコンシューマーを作成
    let grant_consumer = GrantItemsConsumer::new(
        inventory_repository.clone(),
        catalog_repository.clone(),
        publisher.clone(),
        logger.clone(),
    );
    let subtract_consumer = SubtractItemsConsumer::new(
        inventory_repository.clone(),
        catalog_repository.clone(),
        publisher.clone(),
        logger.clone(),
    );

    // メッセージバスを作成してコンシューマーを登録
    // インメモリバスがブローカートランスポートの配送契約を代替する
    let message_bus = Arc::new(InMemoryMessageBus::new(BusConfig::default()));
    message_bus
        .register_grant_consumer(Arc::new(grant_consumer))
        .await;
    message_bus
        .register_subtract_consumer(Arc::new(subtract_consumer))
        .await;
    println!("コマンドコンシューマーを登録しました");

    // アプリケーションサービスを作成
    let inventory_service = InventoryApplicationService::new(
        MySqlInventoryItemRepository::new(pool.clone()),
        publisher.clone(),
    );

    // 在庫クエリサービスを作成
    let inventory_query_service = InventoryQueryService::new(
        inventory_repository.clone(),
        catalog_repository.clone(),
    );

    // アプリケーション状態を作成
    let app_state = AppStateInner {
        inventory_service: Arc::new(inventory_service),
        inventory_query_service: Arc::new(inventory_query_service),
        catalog_repository,
        message_bus,
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("REST APIサーバーが起動しました: http://localhost:3000");
    println!("ヘルスチェック: GET http://localhost:3000/health");
    println!("API仕様:");
    println!("  GET  /items?user_id=<uuid> - プレイヤー在庫一覧取得");
    println!("  POST /items - 直接付与（冪等性なし、管理者向け）");
    println!("  POST /catalog-items - カタログアイテム登録（テスト用）");
    println!("  POST /commands/grant-items - 付与コマンド投入（ブローカー代替）");
    println!("  POST /commands/subtract-items - 減算コマンド投入（ブローカー代替）");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
