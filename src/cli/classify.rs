//! Classification of raw stream-json documents into [`Message`]s.
//!
//! Unknown document kinds are dropped so newer CLI versions keep working.
//! A known kind with a missing required field is a hard error.
//!
//! Content blocks inside an assistant message follow the same rule as
//! documents: a block whose `type` is unrecognized, missing, or not a string
//! is skipped, while a recognized block missing a required field fails.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::events::{
    AssistantMessage, ContentBlock, Message, ResultMessage, SystemMessage, TextBlock,
    ToolResultBlock, ToolUseBlock, UserMessage,
};

/// A recognized document that does not satisfy its contract.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    /// A required field is absent.
    #[error("{kind} message is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    /// A field is present but has the wrong shape.
    #[error("{kind} message field `{field}` must be {expected}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        expected: &'static str,
    },
    /// Typed deserialization of the document failed.
    #[error("{kind} message is malformed: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Map a decoded document onto the message model.
///
/// Returns `Ok(None)` when the discriminator is missing or not one of
/// `user`, `assistant`, `system`, `result`.
///
/// # Errors
///
/// Returns `ClassifyError` when a recognized document lacks a required field.
pub fn classify(document: Value) -> Result<Option<Message>, ClassifyError> {
    let Value::Object(map) = document else {
        tracing::trace!("Dropping non-object document");
        return Ok(None);
    };

    let Some(kind) = map.get("type").and_then(Value::as_str).map(str::to_owned) else {
        tracing::trace!("Dropping document without a type");
        return Ok(None);
    };

    match kind.as_str() {
        "user" => classify_user(map).map(Some),
        "assistant" => classify_assistant(map).map(Some),
        "system" => classify_system(map).map(Some),
        "result" => typed::<ResultMessage>("result", Value::Object(map))
            .map(|result| Some(Message::Result(result))),
        other => {
            tracing::trace!(kind = other, "Dropping unrecognized document");
            Ok(None)
        }
    }
}

fn classify_user(mut map: Map<String, Value>) -> Result<Message, ClassifyError> {
    let content = take_message_content(&mut map, "user")?;
    Ok(Message::User(UserMessage { content }))
}

fn classify_assistant(mut map: Map<String, Value>) -> Result<Message, ClassifyError> {
    let Value::Array(elements) = take_message_content(&mut map, "assistant")? else {
        return Err(ClassifyError::InvalidField {
            kind: "assistant",
            field: "content",
            expected: "an array",
        });
    };

    let mut content = Vec::with_capacity(elements.len());
    for element in elements {
        if let Some(block) = classify_block(element)? {
            content.push(block);
        }
    }

    Ok(Message::Assistant(AssistantMessage { content }))
}

/// Content blocks are dispatched on their own `type`; blocks without a known
/// `type` are skipped.
fn classify_block(element: Value) -> Result<Option<ContentBlock>, ClassifyError> {
    let kind = element.get("type").and_then(Value::as_str).map(str::to_owned);
    let block = match kind.as_deref() {
        Some("text") => ContentBlock::Text(typed::<TextBlock>("text block", element)?),
        Some("tool_use") => {
            ContentBlock::ToolUse(typed::<ToolUseBlock>("tool_use block", element)?)
        }
        Some("tool_result") => {
            ContentBlock::ToolResult(typed::<ToolResultBlock>("tool_result block", element)?)
        }
        other => {
            tracing::trace!(kind = ?other, "Skipping unrecognized content block");
            return Ok(None);
        }
    };
    Ok(Some(block))
}

fn classify_system(map: Map<String, Value>) -> Result<Message, ClassifyError> {
    let subtype = match map.get("subtype") {
        Some(Value::String(subtype)) => subtype.clone(),
        Some(_) => {
            return Err(ClassifyError::InvalidField {
                kind: "system",
                field: "subtype",
                expected: "a string",
            })
        }
        None => {
            return Err(ClassifyError::MissingField {
                kind: "system",
                field: "subtype",
            })
        }
    };

    Ok(Message::System(SystemMessage { subtype, data: map }))
}

/// Take `message.content` out of a user or assistant document.
fn take_message_content(
    map: &mut Map<String, Value>,
    kind: &'static str,
) -> Result<Value, ClassifyError> {
    let message = map
        .get_mut("message")
        .ok_or(ClassifyError::MissingField {
            kind,
            field: "message",
        })?;

    message
        .as_object_mut()
        .and_then(|m| m.remove("content"))
        .ok_or(ClassifyError::MissingField {
            kind,
            field: "content",
        })
}

fn typed<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, ClassifyError> {
    serde_json::from_value(value).map_err(|source| ClassifyError::Malformed { kind, source })
}
