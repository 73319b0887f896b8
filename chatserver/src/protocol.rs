//! 채팅 라인 프로토콜 정의
//!
//! 클라이언트와 서버 간 통신은 UTF-8 텍스트 라인(개행 종료) 기반입니다.
//! 이 모듈은 서버가 송신하는 고정 라인과 브로드캐스트 포맷,
//! 클라이언트 수신 라인의 해석을 정의합니다.
//!
//! # 프로토콜 구조
//!
//! ```text
//! 서버 → 클라이언트 (접속 직후): "Please enter your name:"
//! 클라이언트 → 서버 (1회):       선택한 이름 (빈 줄 → "Anonymous")
//! 서버 → 클라이언트 (브로드캐스트):
//!     입장:     "<name> has joined the chat."
//!     채팅:     "<name>: <message>"
//!     퇴장:     "<name> has left the chat."
//!     하트비트: "HEARTBEAT"
//!     종료:     "Server is shutting down..." → "Server shut down."
//! 클라이언트 → 서버 (상시): 임의 라인 = 채팅, "DISCONNECT <name>" = 정상 퇴장 요청
//! ```

/// 접속 직후 클라이언트에게 보내는 이름 입력 안내 라인
pub const NAME_PROMPT: &str = "Please enter your name:";

/// 주기적 생존 확인 라인
pub const HEARTBEAT_LINE: &str = "HEARTBEAT";

/// 서버 종료 안내 라인 (1/2)
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down...";

/// 서버 종료 안내 라인 (2/2)
pub const SHUTDOWN_FINAL: &str = "Server shut down.";

/// 정상 퇴장 요청 접두어. 뒤따르는 페이로드가 퇴장 이름입니다.
/// 접두어의 마지막 공백까지가 리터럴이며, 공백 없는 "DISCONNECT" 단독 라인은
/// 일반 채팅으로 취급됩니다.
pub const DISCONNECT_PREFIX: &str = "DISCONNECT ";

/// 이름 미입력 시 사용하는 기본 표시 이름
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// 클라이언트가 보낸 한 라인의 해석 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// 일반 채팅 라인
    Chat(String),
    /// 정상 퇴장 요청. 페이로드는 퇴장 안내에 사용할 이름입니다.
    Disconnect(String),
}

/// 클라이언트 수신 라인을 해석합니다.
pub fn parse_client_line(line: &str) -> ClientLine {
    match line.strip_prefix(DISCONNECT_PREFIX) {
        Some(payload) => ClientLine::Disconnect(payload.to_string()),
        None => ClientLine::Chat(line.to_string()),
    }
}

/// 핸드셰이크에서 받은 이름을 정규화합니다. 공백뿐이거나 비어 있으면 기본 이름을 돌려줍니다.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 입장 안내 라인 생성
pub fn join_line(name: &str) -> String {
    format!("{} has joined the chat.", name)
}

/// 퇴장 안내 라인 생성
pub fn leave_line(name: &str) -> String {
    format!("{} has left the chat.", name)
}

/// 채팅 라인 생성
pub fn chat_line(name: &str, message: &str) -> String {
    format!("{}: {}", name, message)
}

/// 운영자 브로드캐스트 라인 생성. 서버 IP를 함께 표기합니다.
pub fn operator_line(name: &str, server_ip: &str, message: &str) -> String {
    format!("{} ({}): {}", name, server_ip, message)
}
