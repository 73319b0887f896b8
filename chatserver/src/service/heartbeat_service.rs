//! 하트비트 서비스
//!
//! 주기적으로 모든 클라이언트에게 생존 확인 라인을 브로드캐스트합니다.
//! 죽은 연결의 탐지와 정리는 브로드캐스트 경로의 쓰기 실패 처리에 전적으로
//! 위임되며, 클라이언트별 응답 추적이나 타임아웃 타이머는 두지 않습니다.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::protocol::HEARTBEAT_LINE;
use crate::service::ConnectionService;

/// 하트비트 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeartbeatStats {
    pub total_heartbeats: u64,
    pub last_delivered: usize,
    /// 마지막 하트비트 시간 (Unix timestamp)
    pub last_heartbeat_timestamp: Option<i64>,
}

/// 하트비트 서비스
pub struct HeartbeatService {
    connection_service: Arc<ConnectionService>,
    is_running: Arc<Mutex<bool>>,
    tick_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
    heartbeat_interval_secs: u64,
    /// 예약된 타임아웃 값. 현재는 어떤 강제 경로에도 연결되어 있지 않으며,
    /// 죽은 연결은 다음 브로드캐스트의 쓰기 실패로만 탐지됩니다.
    connection_timeout_secs: u64,
    heartbeat_stats: Arc<Mutex<HeartbeatStats>>,
}

impl HeartbeatService {
    /// 새로운 하트비트 서비스 생성
    pub fn new(
        connection_service: Arc<ConnectionService>,
        heartbeat_interval_secs: u64,
        connection_timeout_secs: u64,
    ) -> Self {
        Self {
            connection_service,
            is_running: Arc::new(Mutex::new(false)),
            tick_handle: Arc::new(Mutex::new(None)),
            heartbeat_interval_secs,
            connection_timeout_secs,
            heartbeat_stats: Arc::new(Mutex::new(HeartbeatStats::default())),
        }
    }

    /// 기본 설정으로 생성 (5초 간격, 10초 타임아웃)
    pub fn with_default_config(connection_service: Arc<ConnectionService>) -> Self {
        Self::new(connection_service, 5, 10)
    }

    /// 하트비트 시스템 시작
    pub async fn start(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if *is_running {
            warn!("하트비트 시스템이 이미 실행 중입니다");
            return Ok(());
        }

        *is_running = true;
        drop(is_running);

        info!(
            "🔄 하트비트 시스템 시작 ({}초 간격)",
            self.heartbeat_interval_secs
        );

        let connection_service = self.connection_service.clone();
        let is_running_ref = self.is_running.clone();
        let stats_ref = self.heartbeat_stats.clone();
        let interval_secs = self.heartbeat_interval_secs;

        let handle = tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(interval_secs)).await;

                if !*is_running_ref.lock().await {
                    break;
                }

                let delivered = connection_service.broadcast_line(HEARTBEAT_LINE).await;

                let mut stats = stats_ref.lock().await;
                stats.total_heartbeats += 1;
                stats.last_delivered = delivered;
                stats.last_heartbeat_timestamp = Some(chrono::Utc::now().timestamp());
                drop(stats);

                if delivered > 0 {
                    debug!("하트비트 전송 완료: {}개 연결", delivered);
                }
            }

            info!("하트비트 작업 종료");
        });

        *self.tick_handle.lock().await = Some(handle);

        Ok(())
    }

    /// 하트비트 시스템 중지
    pub async fn stop(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if !*is_running {
            warn!("하트비트 시스템이 이미 중지되어 있습니다");
            return Ok(());
        }

        *is_running = false;
        drop(is_running);

        let mut handle_option = self.tick_handle.lock().await;
        if let Some(handle) = handle_option.take() {
            handle.abort();
            debug!("하트비트 작업 핸들 종료됨");
        }

        info!("✅ 하트비트 시스템 중지 완료");
        Ok(())
    }

    /// 하트비트 시스템 실행 상태 확인
    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    /// 하트비트 통계 조회
    pub async fn heartbeat_stats(&self) -> HeartbeatStats {
        self.heartbeat_stats.lock().await.clone()
    }

    /// 하트비트 설정 조회 (간격, 예약된 타임아웃)
    pub fn config(&self) -> (u64, u64) {
        (self.heartbeat_interval_secs, self.connection_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heartbeat_lifecycle() {
        let connection_service = Arc::new(ConnectionService::new());
        let heartbeat_service = HeartbeatService::new(connection_service, 1, 3);

        assert!(!heartbeat_service.is_running().await);

        assert!(heartbeat_service.start().await.is_ok());
        assert!(heartbeat_service.is_running().await);

        // 중복 시작은 no-op
        assert!(heartbeat_service.start().await.is_ok());

        assert!(heartbeat_service.stop().await.is_ok());
        assert!(!heartbeat_service.is_running().await);

        // 중복 중지도 no-op
        assert!(heartbeat_service.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_heartbeat_ticks_on_empty_registry() {
        let connection_service = Arc::new(ConnectionService::new());
        let heartbeat_service = HeartbeatService::new(connection_service, 1, 3);

        heartbeat_service.start().await.unwrap();
        sleep(Duration::from_millis(1500)).await;

        let stats = heartbeat_service.heartbeat_stats().await;
        assert!(stats.total_heartbeats >= 1);
        assert_eq!(stats.last_delivered, 0);

        heartbeat_service.stop().await.unwrap();
    }

    #[test]
    fn test_heartbeat_config() {
        let connection_service = Arc::new(ConnectionService::new());
        let heartbeat_service = HeartbeatService::with_default_config(connection_service);

        let (interval, timeout) = heartbeat_service.config();
        assert_eq!(interval, 5);
        assert_eq!(timeout, 10);
    }
}
