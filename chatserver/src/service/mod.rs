//! 채팅 서버 서비스 레이어
//!
//! 핵심 비즈니스 로직을 담당하는 서비스들을 정의합니다.
//!
//! # 서비스 구조
//!
//! ```text
//! Service Layer
//! ├── ConnectionService (연결 레지스트리 + 브로드캐스트)
//! │   ├── 연결 등록/해제 (단일 락, 이름 맵 포함)
//! │   ├── 라인 브로드캐스트 + 죽은 연결 즉시 정리
//! │   └── 연결 통계
//! ├── HeartbeatService (하트비트)
//! │   ├── 주기적 HEARTBEAT 브로드캐스트
//! │   └── 하트비트 통계
//! └── TcpChatService (서버 생명주기)
//!     ├── 리스너 바인드 / 수락 루프
//!     ├── 시작/중지 + 종료 안내 브로드캐스트
//!     └── 운영자 브로드캐스트
//! ```

/// 연결 관리 서비스
///
/// 클라이언트 연결의 레지스트리와 브로드캐스트를 담당하는 핵심 서비스입니다.
pub mod connection_service;

/// 하트비트 관리 서비스
///
/// 주기적 생존 확인 라인을 브로드캐스트하는 서비스입니다.
pub mod heartbeat_service;

/// 채팅 서버 생명주기 서비스
///
/// 리스닝 소켓, 수락 루프, 시작/중지를 담당하는 서비스입니다.
pub mod tcp_service;

pub use connection_service::{ClientConnection, ConnectionService, ConnectionStats};
pub use heartbeat_service::{HeartbeatService, HeartbeatStats};
pub use tcp_service::{ServerStats, TcpChatService};
