//! 브로드캐스트 채팅 서버 진입점
//!
//! 환경 설정은 워크스페이스 루트 또는 현재 디렉토리의 .env 파일에서 로드됩니다.
//!
//! 환경변수:
//! - chat_host: 채팅 서버 호스트 (기본값: "0.0.0.0")
//! - chat_port: 채팅 서버 포트 (기본값: "7100")
//! - heartbeat_interval_secs: 하트비트 간격 초 (기본값: "5")
//! - connection_timeout_secs: 예약된 연결 타임아웃 초 (기본값: "10")

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use chatserver::{validate_config, ChatServerConfig, TcpChatService};

#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 설정
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 환경 설정 로드 및 검증
    let config = ChatServerConfig::from_env()?;
    validate_config(&config)?;

    info!("=== 채팅 서버 설정 ===");
    info!("바인드 주소: {}", config.bind_address());
    info!("하트비트 간격: {}초", config.heartbeat_interval_secs);
    info!("======================");

    let service = Arc::new(TcpChatService::new(config));

    let addr = service.start().await?;
    if let Some(server_ip) = service.server_ip().await {
        info!("서버 시작 완료: IP {} 포트 {}", server_ip, addr.port());
    }

    // 종료 시그널 대기
    tokio::signal::ctrl_c().await?;
    info!("종료 시그널 수신, 서버를 중지합니다...");

    if let Err(e) = service.stop().await {
        error!("서버 중지 실패: {}", e);
    }

    Ok(())
}
