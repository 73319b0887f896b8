//! 네트워크 유틸리티
//!
//! 바인드 주소 검증과 서버 IP 조회 기능을 제공합니다.

use anyhow::{anyhow, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use tracing::warn;

/// 서버 IP를 알 수 없을 때 사용하는 표시 값
pub const UNAVAILABLE_IP: &str = "Unavailable";

/// 네트워크 유틸리티
pub struct NetworkUtils;

impl NetworkUtils {
    /// 소켓 주소 파싱
    pub fn parse_socket_addr(addr_str: &str) -> Result<SocketAddr> {
        addr_str
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("소켓 주소 파싱 실패: {} ({})", addr_str, e))
    }

    /// 포트 번호 검증
    pub fn validate_port(port: u16) -> Result<u16> {
        match port {
            0 => Err(anyhow!("포트 0은 사용할 수 없습니다")),
            1..=1023 => {
                warn!("시스템 포트 사용: {} (권한 필요 가능)", port);
                Ok(port)
            }
            _ => Ok(port),
        }
    }

    /// 바인드 주소 검증 및 정규화
    ///
    /// "host:port" 전체 주소 또는 포트 단독 표기를 허용합니다.
    pub fn normalize_bind_address(addr: &str) -> Result<SocketAddr> {
        let socket_addr = if addr.contains(':') {
            Self::parse_socket_addr(addr)?
        } else {
            let port: u16 = addr
                .parse()
                .map_err(|e| anyhow!("포트 파싱 실패: {} ({})", addr, e))?;
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port)
        };

        Self::validate_port(socket_addr.port())?;
        Ok(socket_addr)
    }

    /// 로컬 네트워크에서 보이는 서버 IPv4 주소를 조회합니다.
    ///
    /// 외부 주소로 향하는 UDP 소켓의 로컬 주소를 읽는 방식이며 실제 패킷은
    /// 전송되지 않습니다. 조회에 실패하면 "Unavailable"을 돌려줍니다.
    pub fn local_ip() -> String {
        let probe = || -> std::io::Result<IpAddr> {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket.connect("8.8.8.8:80")?;
            Ok(socket.local_addr()?.ip())
        };

        match probe() {
            Ok(ip) if !ip.is_loopback() => ip.to_string(),
            _ => UNAVAILABLE_IP.to_string(),
        }
    }

    /// 브로드캐스트 라인에 표기할 서버 IP를 결정합니다.
    ///
    /// 특정 인터페이스에 바인드된 경우 그 주소를, 와일드카드 바인드면
    /// 로컬 IP 조회 결과를 사용합니다.
    pub fn display_ip(bound: &SocketAddr) -> String {
        if bound.ip().is_unspecified() {
            Self::local_ip()
        } else {
            bound.ip().to_string()
        }
    }
}
