use std::io::{Cursor, Read};

/// Body-type tag for an opaque byte payload (an array of unsigned bytes).
pub const BODY_TYPE_BINARY: i32 = 768;

/// A queue message: an optional byte body and the tag describing its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    body: Option<Vec<u8>>,
    body_type: i32,
}

impl Message {
    pub fn binary(payload: Vec<u8>) -> Self {
        Self {
            body: Some(payload),
            body_type: BODY_TYPE_BINARY,
        }
    }

    /// A message that carries no body at all (distinct from an empty body).
    pub fn without_body(body_type: i32) -> Self {
        Self {
            body: None,
            body_type,
        }
    }

    pub fn from_parts(body: Option<Vec<u8>>, body_type: i32) -> Self {
        Self { body, body_type }
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_type(&self) -> i32 {
        self.body_type
    }

    pub fn body_stream(&self) -> Option<impl Read + '_> {
        self.body.as_deref().map(Cursor::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_message() {
        let message = Message::binary(b"payload".to_vec());
        assert_eq!(message.body_type(), BODY_TYPE_BINARY);
        assert_eq!(message.body(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_body_stream_reads_everything() {
        let message = Message::binary(vec![7; 1200]);
        let mut out = Vec::new();
        message.body_stream().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), 1200);
    }

    #[test]
    fn test_message_without_body() {
        let message = Message::without_body(0);
        assert!(message.body().is_none());
        assert!(message.body_stream().is_none());
    }
}
