//! 연결 서비스
//!
//! 클라이언트 연결 레지스트리와 라인 브로드캐스트를 담당합니다.
//!
//! 레지스트리는 연결 집합과 표시 이름을 하나의 맵으로 관리하며, 등록/해제와
//! 브로드캐스트 순회가 전부 동일한 단일 락을 거칩니다. 제거된 연결의 이름을
//! 조회하거나 순회 중인 연결이 제거되는 상황은 구조적으로 발생하지 않습니다.

use serde::Serialize;
use std::collections::HashMap;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::tool::error::{ChatServerError, ErrorHandler, ErrorSeverity};

/// 개별 클라이언트 연결 정보
///
/// 쓰기 절반과 표시 이름을 함께 소유합니다. 생존 여부는 별도 플래그 없이
/// 마지막 쓰기의 성공 여부로 판정됩니다.
#[derive(Debug)]
pub struct ClientConnection {
    pub client_id: u64,
    pub addr: String,
    pub name: String,
    writer: BufWriter<OwnedWriteHalf>,
    pub connected_at: Instant,
}

impl ClientConnection {
    pub fn new(
        client_id: u64,
        addr: String,
        name: String,
        writer: BufWriter<OwnedWriteHalf>,
    ) -> Self {
        Self {
            client_id,
            addr,
            name,
            writer,
            connected_at: Instant::now(),
        }
    }

    /// 라인 하나를 개행과 함께 기록하고 플러시합니다.
    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

/// 연결 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionStats {
    pub total_connections: u64,
    pub current_connections: u32,
    pub peak_connections: u32,
    pub delivered_lines: u64,
    pub pruned_connections: u64,
}

/// 연결 서비스
///
/// "현재 누가 접속해 있는가"의 단일 진실 공급원입니다.
pub struct ConnectionService {
    connections: Mutex<HashMap<u64, ClientConnection>>,
    next_client_id: Mutex<u64>,
    server_start_time: Instant,
    connection_stats: Mutex<ConnectionStats>,
}

impl ConnectionService {
    /// 새로운 연결 서비스 생성
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_client_id: Mutex::new(1),
            server_start_time: Instant::now(),
            connection_stats: Mutex::new(ConnectionStats::default()),
        }
    }

    /// 새 클라이언트 ID 할당
    pub async fn allocate_client_id(&self) -> u64 {
        let mut next_id = self.next_client_id.lock().await;
        let client_id = *next_id;
        *next_id += 1;
        client_id
    }

    /// 연결 등록
    ///
    /// 같은 ID가 이미 등록되어 있으면 기존 항목을 유지하고 조용히 무시합니다.
    pub async fn register(&self, connection: ClientConnection) {
        let client_id = connection.client_id;
        let name = connection.name.clone();

        let mut connections = self.connections.lock().await;
        if connections.contains_key(&client_id) {
            debug!("클라이언트 {}는 이미 등록되어 있습니다", client_id);
            return;
        }
        connections.insert(client_id, connection);
        let current = connections.len();
        drop(connections);

        let mut stats = self.connection_stats.lock().await;
        stats.total_connections += 1;
        stats.current_connections = current as u32;
        stats.peak_connections = stats.peak_connections.max(stats.current_connections);
        drop(stats);

        info!("클라이언트 {} ({}) 등록 완료", client_id, name);
    }

    /// 연결 해제
    ///
    /// 연결과 표시 이름이 같은 락 아래에서 함께 제거됩니다. 미등록 ID는 no-op입니다.
    pub async fn unregister(&self, client_id: u64) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(&client_id);
        let current = connections.len();
        drop(connections);

        match removed {
            Some(connection) => {
                let mut stats = self.connection_stats.lock().await;
                stats.current_connections = current as u32;
                drop(stats);

                debug!(
                    "클라이언트 {} ({}) 레지스트리에서 제거됨",
                    client_id, connection.name
                );
                true
            }
            None => false,
        }
    }

    /// 모든 등록 연결에 라인 브로드캐스트
    ///
    /// 레지스트리 락을 잡은 채 전체를 순회하며, 쓰기에 실패한 연결은 같은
    /// 순회 안에서 즉시 제거됩니다(별도 정리 패스 없음). 죽은 연결을 정리하는
    /// 유일한 경로이며, 여기서의 제거는 퇴장 안내를 내보내지 않습니다.
    /// 퇴장 안내는 해당 연결의 읽기 루프 종료가 담당합니다.
    ///
    /// 전달에 성공한 연결 수를 반환합니다.
    pub async fn broadcast_line(&self, line: &str) -> usize {
        let mut connections = self.connections.lock().await;
        let mut delivered = 0usize;
        let mut dead: Vec<u64> = Vec::new();

        for (client_id, connection) in connections.iter_mut() {
            match connection.write_line(line).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    let error = ChatServerError::connection_error(
                        *client_id,
                        &connection.addr,
                        &format!("브로드캐스트 쓰기 실패: {}", e),
                    );
                    ErrorHandler::handle_error(
                        &error,
                        ErrorSeverity::Info,
                        "ConnectionService",
                        "broadcast_line",
                    );
                    dead.push(*client_id);
                }
            }
        }

        for client_id in &dead {
            if let Some(connection) = connections.remove(client_id) {
                info!(
                    "죽은 연결 정리: 클라이언트 {} ({})",
                    client_id, connection.name
                );
            }
        }
        let current = connections.len();
        drop(connections);

        let mut stats = self.connection_stats.lock().await;
        stats.delivered_lines += delivered as u64;
        stats.pruned_connections += dead.len() as u64;
        stats.current_connections = current as u32;
        drop(stats);

        debug!("브로드캐스트 완료: {} 전달, {} 정리", delivered, dead.len());
        delivered
    }

    /// 특정 클라이언트에게 라인 전송. 실패한 연결은 즉시 정리됩니다.
    pub async fn send_to_client(&self, client_id: u64, line: &str) -> anyhow::Result<()> {
        let mut connections = self.connections.lock().await;

        let connection = connections
            .get_mut(&client_id)
            .ok_or_else(|| anyhow::anyhow!("클라이언트 {}를 찾을 수 없습니다", client_id))?;

        if let Err(e) = connection.write_line(line).await {
            connections.remove(&client_id);
            let current = connections.len();
            drop(connections);

            let mut stats = self.connection_stats.lock().await;
            stats.pruned_connections += 1;
            stats.current_connections = current as u32;
            drop(stats);

            return Err(anyhow::anyhow!("클라이언트 {} 쓰기 실패: {}", client_id, e));
        }

        Ok(())
    }

    /// 연결 수 조회
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// 표시 이름 스냅샷 조회 (복사본만 반환)
    pub async fn client_names(&self) -> Vec<String> {
        let connections = self.connections.lock().await;
        let mut names: Vec<String> = connections.values().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    /// 서버 업타임 (초)
    pub fn uptime_seconds(&self) -> u64 {
        self.server_start_time.elapsed().as_secs()
    }

    /// 연결 통계 조회
    pub async fn connection_stats(&self) -> ConnectionStats {
        self.connection_stats.lock().await.clone()
    }
}

impl Default for ConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    /// 루프백으로 연결된 (서버쪽 쓰기 절반, 클라이언트쪽 스트림) 쌍 생성
    async fn socket_pair() -> (BufWriter<OwnedWriteHalf>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();
        let (_read_half, write_half) = server_side.into_split();
        (BufWriter::new(write_half), client)
    }

    async fn register_client(service: &ConnectionService, name: &str) -> (u64, TcpStream) {
        let (writer, peer) = socket_pair().await;
        let client_id = service.allocate_client_id().await;
        let connection =
            ClientConnection::new(client_id, "127.0.0.1:0".to_string(), name.to_string(), writer);
        service.register(connection).await;
        (client_id, peer)
    }

    #[tokio::test]
    async fn test_register_unregister_counting() {
        let service = ConnectionService::new();
        assert_eq!(service.connection_count().await, 0);

        let (id_a, _peer_a) = register_client(&service, "A").await;
        let (id_b, _peer_b) = register_client(&service, "B").await;
        assert_eq!(service.connection_count().await, 2);
        assert_eq!(service.client_names().await, vec!["A", "B"]);

        assert!(service.unregister(id_a).await);
        assert_eq!(service.connection_count().await, 1);

        // 이미 제거된 ID는 no-op
        assert!(!service.unregister(id_a).await);
        assert_eq!(service.connection_count().await, 1);

        assert!(service.unregister(id_b).await);
        assert_eq!(service.connection_count().await, 0);

        let stats = service.connection_stats().await;
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.peak_connections, 2);
        assert_eq!(stats.current_connections, 0);
    }

    #[tokio::test]
    async fn test_duplicate_register_is_silent() {
        let service = ConnectionService::new();
        let (id, _peer) = register_client(&service, "A").await;

        let (writer, _peer2) = socket_pair().await;
        let duplicate =
            ClientConnection::new(id, "127.0.0.1:0".to_string(), "다른이름".to_string(), writer);
        service.register(duplicate).await;

        assert_eq!(service.connection_count().await, 1);
        assert_eq!(service.client_names().await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_all() {
        let service = ConnectionService::new();
        let (_id_a, peer_a) = register_client(&service, "A").await;
        let (_id_b, peer_b) = register_client(&service, "B").await;

        let delivered = service.broadcast_line("hello").await;
        assert_eq!(delivered, 2);

        for peer in [peer_a, peer_b] {
            let mut reader = BufReader::new(peer);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(line, "hello\n");
        }
    }

    #[tokio::test]
    async fn test_broadcast_prunes_dead_connection() {
        let service = ConnectionService::new();
        let (_id_a, _peer_a) = register_client(&service, "A").await;
        let (_id_b, peer_b) = register_client(&service, "B").await;

        // B의 피어를 닫아 쓰기 실패를 유도한다. FIN 수신 후 첫 쓰기는
        // 성공할 수 있으므로 정리가 관측될 때까지 반복 브로드캐스트한다.
        drop(peer_b);
        let mut pruned = false;
        for _ in 0..20 {
            service.broadcast_line("ping").await;
            if service.connection_count().await == 1 {
                pruned = true;
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
        assert!(pruned, "죽은 연결이 정리되지 않았습니다");

        assert_eq!(service.client_names().await, vec!["A"]);
        let stats = service.connection_stats().await;
        assert_eq!(stats.pruned_connections, 1);

        // 다음 브로드캐스트는 남은 1개만 대상
        assert_eq!(service.broadcast_line("after").await, 1);
    }

    #[tokio::test]
    async fn test_send_to_unknown_client() {
        let service = ConnectionService::new();
        assert!(service.send_to_client(99, "hello").await.is_err());
    }

    #[tokio::test]
    async fn test_send_to_client_prunes_on_write_failure() {
        let service = ConnectionService::new();
        let (client_id, peer) = register_client(&service, "A").await;

        // 피어를 닫아 쓰기 실패를 유도한다. FIN 수신 후 첫 쓰기는 성공할 수
        // 있으므로 실패가 관측될 때까지 반복 전송한다.
        drop(peer);
        let mut failed = false;
        for _ in 0..20 {
            if service.send_to_client(client_id, "ping").await.is_err() {
                failed = true;
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
        assert!(failed, "닫힌 연결에 대한 전송이 실패하지 않았습니다");

        // 실패한 대상은 같은 호출 안에서 정리된다
        assert_eq!(service.connection_count().await, 0);
        let stats = service.connection_stats().await;
        assert_eq!(stats.pruned_connections, 1);

        // 이미 정리된 ID에 대한 전송은 미등록 에러
        assert!(service.send_to_client(client_id, "again").await.is_err());
    }
}
