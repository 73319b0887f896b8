//! 브로드캐스트 채팅 서버 라이브러리
//!
//! TCP 포트에서 다수의 클라이언트를 수락하고, 각 클라이언트가 보낸 라인을
//! 접속 중인 모든 클라이언트에게 중계하는 라인 기반 채팅 서버입니다.
//!
//! # 주요 기능
//!
//! - **연결 레지스트리**: 단일 락 아래 연결 집합과 표시 이름을 원자적으로 관리
//! - **라인 브로드캐스트**: 쓰기 실패한 연결을 같은 순회에서 즉시 정리
//! - **이름 핸드셰이크**: 접속 직후 이름 안내/수신, 빈 입력은 "Anonymous"
//! - **하트비트 시스템**: 주기적 HEARTBEAT 브로드캐스트로 죽은 연결 노출
//! - **생명주기 관리**: 시작/중지 멱등 처리와 종료 안내 브로드캐스트
//!
//! # 아키텍처
//!
//! ```text
//! Chat Server
//! ├── Service Layer (비즈니스 로직)
//! │   ├── ConnectionService (연결 레지스트리 + 브로드캐스트)
//! │   ├── HeartbeatService (하트비트)
//! │   └── TcpChatService (서버 생명주기)
//! ├── Handler Layer (요청 처리)
//! │   └── ConnectionHandler (핸드셰이크 + 읽기 루프)
//! ├── Tool Layer (유틸리티)
//! │   ├── Error (에러 처리)
//! │   └── NetworkUtils (네트워크 유틸)
//! └── Protocol (라인 프로토콜)
//! ```
//!
//! # 사용 예시
//!
//! ```rust,no_run
//! use chatserver::{ChatServerConfig, TcpChatService};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = TcpChatService::new(ChatServerConfig::from_env()?);
//!
//! // 서버 시작 (바인드 주소 반환)
//! let addr = service.start().await?;
//!
//! // 운영자 브로드캐스트
//! service.operator_broadcast("Server", "공지사항입니다").await;
//!
//! // 서버 중지 (종료 안내 브로드캐스트 포함)
//! service.stop().await?;
//! # Ok(())
//! # }
//! ```

/// 환경 설정 관리
pub mod config;

/// 채팅 라인 프로토콜 정의
pub mod protocol;

/// 비즈니스 로직 서비스 레이어
pub mod service;

/// 요청 처리 핸들러 레이어
pub mod handler;

/// 공통 유틸리티 도구들
pub mod tool;

pub use config::{validate_config, ChatServerConfig};
pub use handler::ConnectionHandler;
pub use protocol::ClientLine;
pub use service::{
    ClientConnection, ConnectionService, ConnectionStats, HeartbeatService, HeartbeatStats,
    ServerStats, TcpChatService,
};
pub use tool::{ChatServerError, ErrorHandler, ErrorSeverity, NetworkUtils};
