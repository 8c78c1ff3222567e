use crate::domain::command::{Delivery, GrantItems, SubtractItems};
use crate::domain::consumer::CommandConsumer;
use crate::domain::model::DeliveryId;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};

/// 処理に失敗した配送の情報
#[derive(Debug, Clone)]
pub struct FailedDelivery {
    pub delivery_id: DeliveryId,
    pub command_type: String,
    pub error: String,
    pub attempt_count: u32,
    pub first_failed_at: SystemTime,
    pub last_failed_at: SystemTime,
    pub is_retryable: bool,
}

/// デッドレターキューエントリ
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub failed_delivery: FailedDelivery,
    pub added_at: SystemTime,
}

/// メッセージバス設定
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// 最大配送試行回数
    pub max_delivery_attempts: u32,
    /// 再配送までの待機時間
    pub redelivery_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
    /// コンシューマータイムアウト
    pub consume_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_delivery_attempts: 3,
            redelivery_delay: Duration::from_secs(5),
            dead_letter_queue_max_size: 1000,
            consume_timeout: Duration::from_secs(30),
        }
    }
}

/// メッセージバスエラー
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("No consumer registered for {0}")]
    NoConsumerRegistered(String),
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// インメモリメッセージバス実装
/// ブローカートランスポートの配送契約を過程内で再現する。
/// 配送は一意の DeliveryId を割り当てたエンベロープで行い、一時的な失敗は
/// 同一のエンベロープのまま再配送する。恒久的エラー（非再配送）は即座に
/// デッドレターに送り、再試行回数を使い切った配送も同様に送る
pub struct InMemoryMessageBus {
    grant_consumer: Arc<RwLock<Option<Arc<dyn CommandConsumer<GrantItems>>>>>,
    subtract_consumer: Arc<RwLock<Option<Arc<dyn CommandConsumer<SubtractItems>>>>>,
    dead_letter_queue: Arc<Mutex<VecDeque<DeadLetterEntry>>>,
    config: BusConfig,
}

impl InMemoryMessageBus {
    /// 設定を指定してインメモリメッセージバスを作成
    ///
    /// # 例
    /// ```
    /// use player_inventory_management::adapter::driven::{BusConfig, InMemoryMessageBus};
    ///
    /// // デフォルト設定で作成
    /// let bus = InMemoryMessageBus::new(BusConfig::default());
    ///
    /// // カスタム設定で作成
    /// let config = BusConfig {
    ///     max_delivery_attempts: 5,
    ///     redelivery_delay: std::time::Duration::from_millis(100),
    ///     ..BusConfig::default()
    /// };
    /// let bus = InMemoryMessageBus::new(config);
    /// ```
    pub fn new(config: BusConfig) -> Self {
        Self {
            grant_consumer: Arc::new(RwLock::new(None)),
            subtract_consumer: Arc::new(RwLock::new(None)),
            dead_letter_queue: Arc::new(Mutex::new(VecDeque::new())),
            config,
        }
    }

    /// 付与コンシューマーを登録
    pub async fn register_grant_consumer(&self, consumer: Arc<dyn CommandConsumer<GrantItems>>) {
        let mut slot = self.grant_consumer.write().await;
        *slot = Some(consumer);
    }

    /// 減算コンシューマーを登録
    pub async fn register_subtract_consumer(
        &self,
        consumer: Arc<dyn CommandConsumer<SubtractItems>>,
    ) {
        let mut slot = self.subtract_consumer.write().await;
        *slot = Some(consumer);
    }

    /// 付与コマンドを配送する
    /// 新しい DeliveryId を割り当て、処理が完了または断念されるまで待つ
    pub async fn dispatch_grant(&self, command: GrantItems) -> Result<(), BusError> {
        let consumer = {
            let slot = self.grant_consumer.read().await;
            slot.clone()
                .ok_or_else(|| BusError::NoConsumerRegistered("GrantItems".to_string()))?
        };
        let delivery = Delivery::new(DeliveryId::new(), command);
        self.deliver_with_retry("GrantItems", consumer, delivery)
            .await
    }

    /// 減算コマンドを配送する
    pub async fn dispatch_subtract(&self, command: SubtractItems) -> Result<(), BusError> {
        let consumer = {
            let slot = self.subtract_consumer.read().await;
            slot.clone()
                .ok_or_else(|| BusError::NoConsumerRegistered("SubtractItems".to_string()))?
        };
        let delivery = Delivery::new(DeliveryId::new(), command);
        self.deliver_with_retry("SubtractItems", consumer, delivery)
            .await
    }

    /// デッドレターキューの内容を取得（運用・テスト用）
    pub async fn dead_letter_entries(&self) -> Vec<DeadLetterEntry> {
        let dlq = self.dead_letter_queue.lock().await;
        dlq.iter().cloned().collect()
    }

    /// 配送の実行（再配送とデッドレター処理付き）
    async fn deliver_with_retry<C>(
        &self,
        command_type: &str,
        consumer: Arc<dyn CommandConsumer<C>>,
        delivery: Delivery<C>,
    ) -> Result<(), BusError>
    where
        C: Clone + Send + Sync,
    {
        let mut attempts = 0;
        let mut first_failed_at = None;
        let mut last_error: Option<(String, bool)> = None;

        while attempts < self.config.max_delivery_attempts {
            attempts += 1;

            // 再配送でも同一の DeliveryId を保つ。重複排除はコンシューマー側の台帳が担う
            let result = tokio::time::timeout(
                self.config.consume_timeout,
                consumer.consume(delivery.clone()),
            )
            .await;

            let (message, is_retryable) = match result {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(consume_error)) => {
                    (consume_error.to_string(), consume_error.is_retryable())
                }
                Err(_timeout) => ("Consume timeout elapsed".to_string(), true),
            };

            first_failed_at.get_or_insert_with(SystemTime::now);
            last_error = Some((message, is_retryable));

            // 恒久的エラーは再配送しない
            if !is_retryable {
                break;
            }

            // 最後の試行でない場合は待機
            if attempts < self.config.max_delivery_attempts {
                tokio::time::sleep(self.config.redelivery_delay).await;
            }
        }

        let (error, is_retryable) =
            last_error.unwrap_or_else(|| ("Unknown delivery error".to_string(), false));

        self.add_to_dead_letter_queue(FailedDelivery {
            delivery_id: delivery.delivery_id,
            command_type: command_type.to_string(),
            error: error.clone(),
            attempt_count: attempts,
            first_failed_at: first_failed_at.unwrap_or_else(SystemTime::now),
            last_failed_at: SystemTime::now(),
            is_retryable,
        })
        .await;

        Err(BusError::DeliveryFailed(error))
    }

    /// 断念した配送をデッドレターキューに追加
    async fn add_to_dead_letter_queue(&self, failed_delivery: FailedDelivery) {
        let mut dlq = self.dead_letter_queue.lock().await;

        // キューサイズの制限チェック
        if dlq.len() >= self.config.dead_letter_queue_max_size {
            dlq.pop_front(); // 古いエントリを削除
        }

        dlq.push_back(DeadLetterEntry {
            failed_delivery,
            added_at: SystemTime::now(),
        });
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

// Clone実装（Arc使用のため簡単に実装可能）
impl Clone for InMemoryMessageBus {
    fn clone(&self) -> Self {
        Self {
            grant_consumer: self.grant_consumer.clone(),
            subtract_consumer: self.subtract_consumer.clone(),
            dead_letter_queue: self.dead_letter_queue.clone(),
            config: self.config.clone(),
        }
    }
}
