// 駆動される側アダプター（リポジトリ実装、メッセージバスなど）

mod catalog_item_repository;
mod console_logger;
mod event_publisher;
mod inventory_item_repository;
mod message_bus;

pub use catalog_item_repository::MySqlCatalogItemRepository;
pub use console_logger::ConsoleLogger;
pub use event_publisher::ConsoleEventPublisher;
pub use inventory_item_repository::MySqlInventoryItemRepository;
pub use message_bus::{BusConfig, BusError, DeadLetterEntry, FailedDelivery, InMemoryMessageBus};
