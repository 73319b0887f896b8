//! 채팅 서버 메인 서비스
//!
//! 리스닝 소켓과 수락 루프, 서버 생명주기 전반을 관리합니다.

use anyhow::{Context, Result};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::ChatServerConfig;
use crate::handler::ConnectionHandler;
use crate::protocol::{operator_line, SHUTDOWN_FINAL, SHUTDOWN_NOTICE};
use crate::service::{ConnectionService, HeartbeatService};
use crate::tool::network_utils::{NetworkUtils, UNAVAILABLE_IP};

/// 채팅 서버 서비스
///
/// 수락 루프와 하트비트를 독립 작업으로 띄우고, 중지 시 수락 작업을 중단해
/// 리스닝 소켓을 닫은 뒤 종료 안내를 브로드캐스트합니다. 클라이언트 소켓을
/// 강제로 닫지는 않습니다.
pub struct TcpChatService {
    config: ChatServerConfig,
    connection_service: Arc<ConnectionService>,
    heartbeat_service: Arc<HeartbeatService>,
    connection_handler: Arc<ConnectionHandler>,
    is_running: Arc<Mutex<bool>>,
    accept_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
    bound_addr: Arc<Mutex<Option<SocketAddr>>>,
    server_ip: Arc<Mutex<Option<String>>>,
}

impl TcpChatService {
    /// 새로운 채팅 서버 서비스 생성
    pub fn new(config: ChatServerConfig) -> Self {
        let connection_service = Arc::new(ConnectionService::new());
        let heartbeat_service = Arc::new(HeartbeatService::new(
            connection_service.clone(),
            config.heartbeat_interval_secs,
            config.connection_timeout_secs,
        ));
        let connection_handler = Arc::new(ConnectionHandler::new(connection_service.clone()));

        Self {
            config,
            connection_service,
            heartbeat_service,
            connection_handler,
            is_running: Arc::new(Mutex::new(false)),
            accept_handle: Arc::new(Mutex::new(None)),
            bound_addr: Arc::new(Mutex::new(None)),
            server_ip: Arc::new(Mutex::new(None)),
        }
    }

    /// 기본 설정으로 서비스 생성
    pub fn with_default_config() -> Self {
        Self::new(ChatServerConfig::default())
    }

    /// 서버 시작
    ///
    /// 이미 실행 중이면 no-op으로 기존 바인드 주소를 돌려줍니다.
    /// 바인드 실패는 치명적이며 서버는 중지 상태로 남습니다.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut is_running = self.is_running.lock().await;

        if *is_running {
            warn!("채팅 서버가 이미 실행 중입니다");
            let bound = *self.bound_addr.lock().await;
            return bound
                .ok_or_else(|| anyhow::anyhow!("실행 중인 서버의 바인드 주소가 없습니다"));
        }

        let bind_addr = self.config.bind_address();
        info!("🚀 채팅 서버 시작 중... ({})", bind_addr);

        let listener = TcpListener::bind(&bind_addr)
            .await
            .context("채팅 서버 리스너 바인드 실패")?;
        let local_addr = listener.local_addr().context("바인드 주소 조회 실패")?;

        let server_ip = NetworkUtils::display_ip(&local_addr);
        *self.bound_addr.lock().await = Some(local_addr);
        *self.server_ip.lock().await = Some(server_ip.clone());

        *is_running = true;
        drop(is_running);

        info!(
            "✅ 채팅 서버가 {}에서 실행 중입니다 (서버 IP: {})",
            local_addr, server_ip
        );

        // 하트비트 시스템 시작
        self.heartbeat_service.start().await.context("하트비트 시스템 시작 실패")?;

        // 수락 루프 시작
        let connection_handler = self.connection_handler.clone();
        let is_running_ref = self.is_running.clone();

        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        info!("새 클라이언트 연결: {}", addr);
                        let handler = connection_handler.clone();

                        tokio::spawn(async move {
                            if let Err(e) =
                                handler.handle_new_connection(stream, addr.to_string()).await
                            {
                                // 조기 이탈 등 개별 연결의 실패는 여기서 끝난다
                                warn!("클라이언트 연결 처리 종료: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        // 중지 절차가 이 작업을 중단시키며 소켓을 닫는다.
                        // 실행 중이 아닐 때의 수락 실패는 예상된 결과이므로 조용히 종료한다.
                        if !*is_running_ref.lock().await {
                            break;
                        }
                        error!("클라이언트 연결 수락 실패: {}", e);
                    }
                }
            }

            info!("수락 루프 종료");
        });

        *self.accept_handle.lock().await = Some(handle);

        Ok(local_addr)
    }

    /// 서버 중지
    ///
    /// 실행 중이 아니면 no-op입니다. 수락 작업을 중단해 리스닝 소켓을 닫고,
    /// 남아 있는 모든 연결에 종료 안내 두 줄을 브로드캐스트합니다.
    pub async fn stop(&self) -> Result<()> {
        let mut is_running = self.is_running.lock().await;

        if !*is_running {
            warn!("채팅 서버가 이미 중지되어 있습니다");
            return Ok(());
        }

        info!("🛑 채팅 서버 중지 중...");

        *is_running = false;
        drop(is_running);

        // 하트비트 시스템 중지
        self.heartbeat_service
            .stop()
            .await
            .context("하트비트 시스템 중지 실패")?;

        // 수락 작업 중단 → 리스너 drop → 리스닝 소켓 닫힘
        let mut handle_option = self.accept_handle.lock().await;
        if let Some(handle) = handle_option.take() {
            handle.abort();
        }
        drop(handle_option);
        *self.bound_addr.lock().await = None;
        *self.server_ip.lock().await = None;

        // 남은 연결들에게 종료 안내. 클라이언트 소켓은 강제로 닫지 않으며,
        // 안내를 본 클라이언트가 스스로 끊거나 다음 쓰기 실패로 정리된다.
        self.connection_service.broadcast_line(SHUTDOWN_NOTICE).await;
        self.connection_service.broadcast_line(SHUTDOWN_FINAL).await;

        info!("✅ 채팅 서버가 성공적으로 중지되었습니다");
        Ok(())
    }

    /// 운영자 브로드캐스트
    ///
    /// 운영자가 입력한 라인을 서버 IP와 함께 포맷하여 클라이언트 채팅과
    /// 동일한 브로드캐스트 경로로 전송합니다. 전달된 연결 수를 반환합니다.
    pub async fn operator_broadcast(&self, display_name: &str, text: &str) -> usize {
        let server_ip = self
            .server_ip
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| UNAVAILABLE_IP.to_string());

        let line = operator_line(display_name, &server_ip, text);
        info!("운영자 브로드캐스트: {}", line);
        self.connection_service.broadcast_line(&line).await
    }

    /// 서버 실행 상태 확인
    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    /// 현재 연결 수 조회
    pub async fn connection_count(&self) -> usize {
        self.connection_service.connection_count().await
    }

    /// 표시용 서버 IP 조회 (실행 중이 아니면 None)
    pub async fn server_ip(&self) -> Option<String> {
        self.server_ip.lock().await.clone()
    }

    /// 연결 서비스 접근 (테스트 및 상위 레이어용)
    pub fn connection_service(&self) -> Arc<ConnectionService> {
        self.connection_service.clone()
    }

    /// 설정 조회
    pub fn config(&self) -> &ChatServerConfig {
        &self.config
    }

    /// 서버 통계 조회
    pub async fn server_stats(&self) -> ServerStats {
        ServerStats {
            is_running: self.is_running().await,
            connection_count: self.connection_count().await,
            heartbeat_running: self.heartbeat_service.is_running().await,
            uptime_seconds: self.connection_service.uptime_seconds(),
            bind_address: self.config.bind_address(),
        }
    }
}

/// 서버 통계 정보
#[derive(Debug, Clone, Serialize)]
pub struct ServerStats {
    pub is_running: bool,
    pub connection_count: usize,
    pub heartbeat_running: bool,
    pub uptime_seconds: u64,
    pub bind_address: String,
}
