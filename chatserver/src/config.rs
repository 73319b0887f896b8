//! 채팅 서버 환경 설정 모듈
//!
//! .env 파일과 시스템 환경변수에서 설정을 로드하고 관리합니다.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

/// 채팅 서버 설정 구조체
#[derive(Debug, Clone)]
pub struct ChatServerConfig {
    /// 채팅 서버 호스트 주소
    pub host: String,
    /// 채팅 서버 포트 번호
    pub port: u16,
    /// 하트비트 브로드캐스트 간격 (초)
    pub heartbeat_interval_secs: u64,
    /// 연결 타임아웃 (초). 예약된 값으로, 현재는 어떤 강제 경로에도
    /// 연결되어 있지 않습니다. 죽은 연결은 쓰기 실패 시점에만 정리됩니다.
    pub connection_timeout_secs: u64,
}

impl Default for ChatServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7100,
            heartbeat_interval_secs: 5,
            connection_timeout_secs: 10,
        }
    }
}

impl ChatServerConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 로드 순서:
    /// 1. 프로젝트 루트의 .env 파일
    /// 2. 현재 디렉토리의 .env 파일
    /// 3. 시스템 환경변수
    /// 4. 기본값
    pub fn from_env() -> Result<Self> {
        Self::load_env_file();

        let defaults = Self::default();
        let config = Self {
            host: std::env::var("chat_host").unwrap_or(defaults.host),
            port: std::env::var("chat_port")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .unwrap_or(defaults.port),
            heartbeat_interval_secs: std::env::var("heartbeat_interval_secs")
                .unwrap_or_else(|_| defaults.heartbeat_interval_secs.to_string())
                .parse()
                .unwrap_or(defaults.heartbeat_interval_secs),
            connection_timeout_secs: std::env::var("connection_timeout_secs")
                .unwrap_or_else(|_| defaults.connection_timeout_secs.to_string())
                .parse()
                .unwrap_or(defaults.connection_timeout_secs),
        };

        info!("채팅 서버 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    /// 채팅 서버 바인딩 주소를 반환합니다.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// .env 파일을 로드합니다.
    fn load_env_file() {
        let env_paths = vec![
            "../.env", // 워크스페이스 루트
            ".env",    // 현재 디렉토리
        ];

        let mut loaded = false;
        for path in env_paths {
            if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
                info!(".env 파일 로드 성공: {}", path);
                loaded = true;
                break;
            }
        }

        if !loaded {
            warn!(".env 파일을 찾을 수 없습니다. 기본값과 시스템 환경변수를 사용합니다.");
        }
    }
}

/// 설정 검증 유틸리티
pub fn validate_config(config: &ChatServerConfig) -> Result<()> {
    if config.port == 0 {
        anyhow::bail!("유효하지 않은 채팅 서버 포트 번호: {}", config.port);
    }

    if config.host.is_empty() {
        anyhow::bail!("채팅 서버 호스트 주소가 비어있습니다");
    }

    if config.heartbeat_interval_secs == 0 {
        anyhow::bail!("하트비트 간격은 0초일 수 없습니다");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7100);
        assert_eq!(config.heartbeat_interval_secs, 5);
        assert_eq!(config.connection_timeout_secs, 10);
    }

    #[test]
    fn test_bind_address() {
        let config = ChatServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:7100");
    }

    #[test]
    fn test_validate_config() {
        let config = ChatServerConfig::default();
        assert!(validate_config(&config).is_ok());

        let bad_port = ChatServerConfig {
            port: 0,
            ..ChatServerConfig::default()
        };
        assert!(validate_config(&bad_port).is_err());

        let bad_host = ChatServerConfig {
            host: String::new(),
            ..ChatServerConfig::default()
        };
        assert!(validate_config(&bad_host).is_err());

        let bad_interval = ChatServerConfig {
            heartbeat_interval_secs: 0,
            ..ChatServerConfig::default()
        };
        assert!(validate_config(&bad_interval).is_err());
    }
}
