//! 공통 에러 처리 시스템
//!
//! 채팅 서버에서 발생하는 에러를 체계적으로 분류하고 중앙에서 로깅합니다.

use thiserror::Error;
use tracing::{error, info, warn};

/// 채팅 서버 에러 타입
#[derive(Debug, Clone, Error)]
pub enum ChatServerError {
    /// 개별 클라이언트 연결 관련 에러
    #[error("연결 에러 [클라이언트 {client_id}] [{addr}]: {message}")]
    Connection {
        client_id: u64,
        addr: String,
        message: String,
    },

    /// 수락 루프, 바인드 등 네트워크 레벨 에러
    #[error("네트워크 에러 [작업: {operation}]: {message}")]
    Network { operation: String, message: String },

    /// 하트비트 관련 에러
    #[error("하트비트 에러 [작업: {operation}]: {message}")]
    Heartbeat { operation: String, message: String },

    /// 설정 관련 에러
    #[error("설정 에러 [키: {key}]: {message}")]
    Configuration { key: String, message: String },

    /// 내부 시스템 에러
    #[error("내부 에러 [컴포넌트: {component}]: {message}")]
    Internal { component: String, message: String },
}

impl ChatServerError {
    /// 연결 에러 생성
    pub fn connection_error(client_id: u64, addr: &str, message: &str) -> Self {
        Self::Connection {
            client_id,
            addr: addr.to_string(),
            message: message.to_string(),
        }
    }

    /// 네트워크 에러 생성
    pub fn network_error(operation: &str, message: &str) -> Self {
        Self::Network {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// 하트비트 에러 생성
    pub fn heartbeat_error(operation: &str, message: &str) -> Self {
        Self::Heartbeat {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// 설정 에러 생성
    pub fn configuration_error(key: &str, message: &str) -> Self {
        Self::Configuration {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 정보성 - 정상 동작 중 발생하는 예상 가능한 상황 (클라이언트 이탈 등)
    Info,
    /// 경고 - 주의가 필요하지만 서비스는 계속 가능
    Warning,
    /// 에러 - 기능에 영향을 주지만 복구 가능
    Error,
}

/// 에러 핸들러
///
/// 모든 에러를 중앙에서 로깅합니다. 개별 연결의 에러는 해당 연결만 종료시키고
/// 서버 전체로 전파되지 않는다는 원칙을 로깅 레벨로 반영합니다.
pub struct ErrorHandler;

impl ErrorHandler {
    /// 에러를 심각도에 맞는 로그 레벨로 출력합니다.
    pub fn handle_error(
        error: &ChatServerError,
        severity: ErrorSeverity,
        component: &str,
        operation: &str,
    ) {
        let log_message = format!("[{}] [{}] {}", component, operation, error);

        match severity {
            ErrorSeverity::Info => info!("{}", log_message),
            ErrorSeverity::Warning => warn!("{}", log_message),
            ErrorSeverity::Error => error!("{}", log_message),
        }
    }
}

impl From<std::io::Error> for ChatServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Network {
            operation: "io_operation".to_string(),
            message: err.to_string(),
        }
    }
}
