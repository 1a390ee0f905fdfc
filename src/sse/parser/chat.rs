//! Parsing for the chat protocol.

use crate::sse::events::{ChatEvent, ChatFailure, ChatTurn, SseParseError};
use crate::sse::payloads::{ChatErrorPayload, ChatTurnPayload};

use super::decode_payload;

/// Decode one raw event on the chat catalogue.
pub fn parse_chat_event(
    event_type: &str,
    data: &str,
) -> Result<Option<ChatEvent>, SseParseError> {
    match event_type {
        "turn" => {
            let payload: ChatTurnPayload = decode_payload(event_type, data)?;
            Ok(Some(ChatEvent::Turn(ChatTurn {
                conversation_id: payload.conversation_id,
                turn_id: payload.turn_id,
                state: payload.state,
                response: payload.response,
            })))
        }
        "error" => {
            let payload: ChatErrorPayload = decode_payload(event_type, data)?;
            Ok(Some(ChatEvent::Error(ChatFailure {
                error: payload.error,
                conversation_id: payload.conversation_id,
                turn_id: payload.turn_id,
            })))
        }
        _ => Ok(None),
    }
}
