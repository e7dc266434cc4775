//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity, and are validated once
//! at construction so the rest of the crate never sees an invalid id or body.

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

const MAX_ID_LEN: usize = 100;
const MAX_BODY_LEN: usize = 10000;
const PENDING_PREFIX: &str = "tmp-";

/// Participant identifier value object.
///
/// Identifies an end user or a coach/operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a new ParticipantId.
    ///
    /// # Arguments
    ///
    /// * `id` - The participant identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ParticipantId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ParticipantIdEmpty);
        }
        let len = id.chars().count();
        if len > MAX_ID_LEN {
            return Err(ValueObjectError::ParticipantIdTooLong {
                max: MAX_ID_LEN,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room identifier value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Create a new RoomId.
    ///
    /// # Arguments
    ///
    /// * `id` - The room identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the RoomId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        let len = id.chars().count();
        if len > MAX_ID_LEN {
            return Err(ValueObjectError::RoomIdTooLong {
                max: MAX_ID_LEN,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-generated correlation reference for optimistic sends.
///
/// The server echoes it back on the confirmed message so the pending local
/// copy can be matched without guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientRef(Uuid);

impl ClientRef {
    /// Generate a new random reference (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a reference received on the wire.
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::ClientRefInvalidFormat(value.to_string()))
    }
}

impl fmt::Display for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier value object.
///
/// Server-assigned once confirmed; `tmp-<client_ref>` while pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Create a MessageId from a server-assigned identifier.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::MessageIdEmpty);
        }
        Ok(Self(id))
    }

    /// Temporary identifier for an optimistic message.
    pub fn pending(client_ref: ClientRef) -> Self {
        Self(format!("{PENDING_PREFIX}{client_ref}"))
    }

    /// Whether this is a temporary local identifier.
    pub fn is_pending(&self) -> bool {
        self.0.starts_with(PENDING_PREFIX)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message body value object.
///
/// Empty and whitespace-only bodies are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    /// Create a new MessageBody.
    ///
    /// # Arguments
    ///
    /// * `body` - The message text
    ///
    /// # Returns
    ///
    /// A Result containing the MessageBody or an error if validation fails
    pub fn new(body: String) -> Result<Self, ValueObjectError> {
        if body.trim().is_empty() {
            return Err(ValueObjectError::MessageBodyBlank);
        }
        let len = body.chars().count();
        if len > MAX_BODY_LEN {
            return Err(ValueObjectError::MessageBodyTooLong {
                max: MAX_BODY_LEN,
                actual: len,
            });
        }
        Ok(Self(body))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name shown in typing indicators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName.
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.trim().is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        let len = name.chars().count();
        if len > MAX_ID_LEN {
            return Err(ValueObjectError::DisplayNameTooLong {
                max: MAX_ID_LEN,
                actual: len,
            });
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(kaiwa_shared::time::current_timestamp_millis())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_new_success() {
        // テスト項目: 有効な参加者 ID を作成できる
        // given (前提条件):
        let id = "alice".to_string();

        // when (操作):
        let result = ParticipantId::new(id);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_participant_id_new_empty_fails() {
        // テスト項目: 空の参加者 ID は作成できない
        // when (操作):
        let result = ParticipantId::new(String::new());

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::ParticipantIdEmpty);
    }

    #[test]
    fn test_participant_id_new_too_long_fails() {
        // テスト項目: 101 文字以上の参加者 ID は作成できない
        // given (前提条件):
        let id = "a".repeat(101);

        // when (操作):
        let result = ParticipantId::new(id);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::ParticipantIdTooLong {
                max: 100,
                actual: 101
            }
        );
    }

    #[test]
    fn test_room_id_new_empty_fails() {
        // テスト項目: 空のルーム ID は作成できない
        // when (操作):
        let result = RoomId::try_from(String::new());

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::RoomIdEmpty);
    }

    #[test]
    fn test_room_id_equality() {
        // テスト項目: 同じ値を持つ RoomId は等価
        // given (前提条件):
        let a1 = RoomId::new("room-a".to_string()).unwrap();
        let a2 = RoomId::new("room-a".to_string()).unwrap();
        let b = RoomId::new("room-b".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[test]
    fn test_message_body_rejects_whitespace_only() {
        // テスト項目: 空白のみのメッセージ本文は作成できない
        // when (操作):
        let empty = MessageBody::new(String::new());
        let blank = MessageBody::new("   \n\t".to_string());

        // then (期待する結果):
        assert_eq!(empty.unwrap_err(), ValueObjectError::MessageBodyBlank);
        assert_eq!(blank.unwrap_err(), ValueObjectError::MessageBodyBlank);
    }

    #[test]
    fn test_message_body_keeps_inner_whitespace() {
        // テスト項目: 前後の空白を含む本文はそのまま保持される
        // when (操作):
        let body = MessageBody::new("  hi there ".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(body.as_str(), "  hi there ");
    }

    #[test]
    fn test_message_body_too_long_fails() {
        // テスト項目: 10001 文字以上の本文は作成できない
        // when (操作):
        let result = MessageBody::new("a".repeat(10001));

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::MessageBodyTooLong {
                max: 10000,
                actual: 10001
            }
        );
    }

    #[test]
    fn test_pending_message_id() {
        // テスト項目: 楽観的送信用の一時 ID は "tmp-" で始まる
        // given (前提条件):
        let client_ref = ClientRef::generate();

        // when (操作):
        let id = MessageId::pending(client_ref);

        // then (期待する結果):
        assert!(id.is_pending());
        assert_eq!(id.as_str(), format!("tmp-{client_ref}"));
        assert!(!MessageId::new("srv-9".to_string()).unwrap().is_pending());
    }

    #[test]
    fn test_client_ref_parse() {
        // テスト項目: UUID 形式でない ClientRef は拒否される
        // given (前提条件):
        let valid = ClientRef::generate();

        // when (操作):
        let parsed = ClientRef::parse(&valid.to_string());
        let invalid = ClientRef::parse("not-a-uuid");

        // then (期待する結果):
        assert_eq!(parsed, Ok(valid));
        assert!(matches!(
            invalid,
            Err(ValueObjectError::ClientRefInvalidFormat(_))
        ));
    }

    #[test]
    fn test_display_name_empty_fails() {
        // テスト項目: 空の表示名は作成できない
        // when (操作):
        let result = DisplayName::new(" ".to_string());

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::DisplayNameEmpty);
    }

    #[test]
    fn test_timestamp_ordering() {
        // テスト項目: タイムスタンプは順序付けできる
        // given (前提条件):
        let ts1 = Timestamp::new(1000);
        let ts2 = Timestamp::new(2000);

        // then (期待する結果):
        assert!(ts1 < ts2);
        assert_eq!(ts2.value(), 2000);
    }
}
