//! Message builder
//!
//! Normalizes caller prompt input into canonical messages and places the
//! injected context message at the front of the conversation.

use crate::protocol::{Attachment, Message, MessageContent, Prompt, Role};
use crate::providers::error::{ProviderError, ProviderResult};
use serde_json::Value;

/// Normalize a prompt into an ordered list of canonical messages
///
/// Accepted shapes: a string (one user message), well-formed messages, or a
/// JSON array whose elements are `[role, content]` pairs or
/// `{"role": .., "content": ..}` objects. Content is a string or an array of
/// attachments. Anything else is an `InvalidPromptShape` error.
pub fn build_messages(prompt: Prompt) -> ProviderResult<Vec<Message>> {
    match prompt {
        Prompt::Text(text) => Ok(vec![Message::user(text)]),
        Prompt::Messages(messages) if messages.is_empty() => Err(
            ProviderError::InvalidPromptShape("message list is empty".to_string()),
        ),
        Prompt::Messages(messages) => Ok(messages),
        Prompt::Json(Value::String(text)) => Ok(vec![Message::user(text)]),
        Prompt::Json(Value::Array(items)) if items.is_empty() => Err(
            ProviderError::InvalidPromptShape("message list is empty".to_string()),
        ),
        Prompt::Json(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| message_from_value(index, item))
            .collect(),
        Prompt::Json(other) => Err(ProviderError::InvalidPromptShape(format!(
            "expected a string or an array of messages, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Prepend the context message, if any, ahead of every caller turn
pub fn with_context(messages: Vec<Message>, context: Option<Message>) -> Vec<Message> {
    match context {
        Some(context) => std::iter::once(context).chain(messages).collect(),
        None => messages,
    }
}

/// Whether any message carries an image attachment
pub fn has_images(messages: &[Message]) -> bool {
    messages.iter().any(|message| match &message.content {
        MessageContent::Parts(parts) => parts
            .iter()
            .any(|part| matches!(part, Attachment::Image { .. })),
        MessageContent::Text(_) => false,
    })
}

fn message_from_value(index: usize, item: Value) -> ProviderResult<Message> {
    let (role, content) = match item {
        Value::Array(mut pair) if pair.len() == 2 => {
            let content = pair.pop().unwrap_or(Value::Null);
            let role = pair.pop().unwrap_or(Value::Null);
            (role, content)
        }
        Value::Object(mut object) => {
            let role = object.remove("role").unwrap_or(Value::Null);
            let content = object.remove("content").unwrap_or(Value::Null);
            (role, content)
        }
        other => {
            return Err(ProviderError::InvalidPromptShape(format!(
                "message {} must be a [role, content] pair or a {{role, content}} object, got {}",
                index,
                json_type_name(&other)
            )))
        }
    };

    let role = role
        .as_str()
        .and_then(Role::parse)
        .ok_or_else(|| ProviderError::InvalidPromptShape(format!("message {} has an invalid role: {}", index, role)))?;

    let content = content_from_value(content).ok_or_else(|| {
        ProviderError::InvalidPromptShape(format!(
            "message {} content must be a string or a list of attachments",
            index
        ))
    })?;

    Ok(Message::new(role, content))
}

fn content_from_value(content: Value) -> Option<MessageContent> {
    match content {
        Value::String(text) => Some(MessageContent::Text(text)),
        Value::Array(_) => serde_json::from_value::<Vec<Attachment>>(content)
            .ok()
            .filter(|parts| !parts.is_empty())
            .map(MessageContent::Parts),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_becomes_single_user_message() {
        let messages = build_messages("Tell me a joke".into()).unwrap();
        assert_eq!(messages, vec![Message::user("Tell me a joke")]);
    }

    #[test]
    fn test_pairs_and_objects_keep_order() {
        let prompt = json!([
            ["system", "Be terse."],
            {"role": "user", "content": "Hi"},
            ["assistant", "Hello."],
            {"role": "user", "content": [{"kind": "text", "text": "Look"}, {"kind": "image", "ref": "https://x.test/a.png"}]}
        ]);

        let messages = build_messages(prompt.into()).unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::system("Be terse."));
        assert_eq!(messages[2], Message::assistant("Hello."));
        assert!(has_images(&messages));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = build_messages(json!([["narrator", "Once"]]).into()).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidPromptShape(_)));
    }

    #[test]
    fn test_non_string_root_is_rejected() {
        let err = build_messages(json!({"prompt": "hi"}).into()).unwrap_err();
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_triple_is_rejected() {
        assert!(build_messages(json!([["user", "a", "b"]]).into()).is_err());
    }

    #[test]
    fn test_numeric_content_is_rejected() {
        assert!(build_messages(json!([{"role": "user", "content": 5}]).into()).is_err());
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(build_messages(json!([]).into()).is_err());
        assert!(build_messages(Prompt::Messages(vec![])).is_err());
    }

    #[test]
    fn test_context_goes_first() {
        let messages = with_context(
            vec![Message::user("a"), Message::assistant("b")],
            Some(Message::user("Context:\n{}")),
        );
        assert_eq!(messages[0].content.as_text(), Some("Context:\n{}"));
        assert_eq!(messages[1], Message::user("a"));
    }
}
