//! 채팅 서버 핸들러 레이어
//!
//! 개별 클라이언트 연결의 처리 흐름을 담당합니다.

pub mod connection_handler;

pub use connection_handler::ConnectionHandler;
