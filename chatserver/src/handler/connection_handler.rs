//! 연결 핸들러
//!
//! 개별 클라이언트의 핸드셰이크, 읽기 루프, 정리를 담당합니다.
//! 한 연결의 I/O 에러는 그 연결의 작업만 종료시키며 수락 루프, 하트비트,
//! 다른 연결에는 전파되지 않습니다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::protocol::{
    chat_line, join_line, leave_line, normalize_name, parse_client_line, ClientLine, NAME_PROMPT,
};
use crate::service::{ClientConnection, ConnectionService};
use crate::tool::error::{ChatServerError, ErrorHandler, ErrorSeverity};

/// 연결 핸들러
pub struct ConnectionHandler {
    connection_service: Arc<ConnectionService>,
}

impl ConnectionHandler {
    /// 새로운 연결 핸들러 생성
    pub fn new(connection_service: Arc<ConnectionService>) -> Self {
        Self { connection_service }
    }

    /// 새로운 클라이언트 연결 처리
    ///
    /// 이름 안내 전송 → 이름 한 줄 수신 → 등록 → 입장 안내 브로드캐스트 →
    /// 읽기 루프 → 정리의 순서로 진행합니다. 반환 시점에는 연결이 이미
    /// 레지스트리에서 제거되어 있습니다.
    pub async fn handle_new_connection(&self, stream: TcpStream, addr: String) -> Result<u64> {
        debug!("새 클라이언트 연결 처리 시작: {}", addr);

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        // 핸드셰이크. 여기서의 실패는 이름이 정해지기 전의 조기 이탈로 취급하며
        // 아무것도 등록하지 않고 퇴장 안내도 내보내지 않습니다.
        writer
            .write_all(NAME_PROMPT.as_bytes())
            .await
            .context("이름 안내 전송 실패")?;
        writer.write_all(b"\n").await.context("이름 안내 전송 실패")?;
        writer.flush().await.context("이름 안내 전송 실패")?;

        let mut name_line = String::new();
        reader
            .read_line(&mut name_line)
            .await
            .context("이름 수신 실패")?;
        // EOF(0바이트)도 빈 입력과 동일하게 기본 이름으로 진행한다.
        // 이어지는 읽기 루프가 곧바로 종료되면서 정상 정리 경로를 탄다.
        let name = normalize_name(&name_line);

        let client_id = self.connection_service.allocate_client_id().await;
        let connection = ClientConnection::new(client_id, addr.clone(), name.clone(), writer);
        self.connection_service.register(connection).await;

        // 새 클라이언트도 이미 등록된 상태이므로 입장 안내를 함께 수신한다
        info!("{} has joined the chat. ({})", name, addr);
        self.connection_service
            .broadcast_line(&join_line(&name))
            .await;

        let announced = self.read_loop(client_id, &name, &addr, &mut reader).await;

        // 정리: 어떤 종료 경로든 반드시 수행. 레지스트리 제거가 쓰기 절반을
        // drop하여 전송 방향을 닫는다 (이미 닫혔어도 무해).
        self.connection_service.unregister(client_id).await;

        // DISCONNECT 경로에서 이미 안내했다면 중복 안내하지 않는다.
        // 제거 이후 브로드캐스트이므로 남은 연결들만 수신한다.
        if !announced {
            info!("{} has left the chat. ({})", name, addr);
            self.connection_service
                .broadcast_line(&leave_line(&name))
                .await;
        }

        Ok(client_id)
    }

    /// 활성 상태 읽기 루프
    ///
    /// 퇴장 안내가 이미 브로드캐스트되었으면 true를 반환합니다.
    async fn read_loop(
        &self,
        client_id: u64,
        name: &str,
        addr: &str,
        reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    ) -> bool {
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                // 스트림 종료
                Ok(0) => {
                    debug!("클라이언트 {} ({}) 스트림 종료", client_id, name);
                    return false;
                }
                Ok(_) => {
                    let message = line.trim_end_matches(['\r', '\n']);

                    match parse_client_line(message) {
                        ClientLine::Disconnect(leaver) => {
                            // 명시적 퇴장: 페이로드의 이름으로 안내하고 루프 종료
                            info!("{} has left the chat. (정상 퇴장 요청)", leaver);
                            self.connection_service
                                .broadcast_line(&leave_line(&leaver))
                                .await;
                            return true;
                        }
                        ClientLine::Chat(text) => {
                            // 송신자 자신에게도 그대로 되돌아간다 (의도된 동작)
                            self.connection_service
                                .broadcast_line(&chat_line(name, &text))
                                .await;
                        }
                    }
                }
                Err(e) => {
                    let error = ChatServerError::connection_error(
                        client_id,
                        addr,
                        &format!("읽기 실패: {}", e),
                    );
                    ErrorHandler::handle_error(
                        &error,
                        ErrorSeverity::Info,
                        "ConnectionHandler",
                        "read_loop",
                    );
                    return false;
                }
            }
        }
    }
}
