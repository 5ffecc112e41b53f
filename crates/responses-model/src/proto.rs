use omo_model::{
    ModelMessage, ModelRequest, ModelResponseEvent, ModelTool, ToolCallOpened,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResponsesConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub call_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum StreamRecord {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: Option<String> },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        output_index: Option<u32>,
        delta: Option<String>,
    },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        output_index: Option<u32>,
        item: Option<OutputItem>,
    },
    #[serde(rename = "response.completed", alias = "response.done")]
    Completed,
    #[serde(other)]
    Unknown,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    name: String,
    description: String,
    parameters: Value,
    strict: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct ContentPart {
    r#type: &'static str,
    text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct InputMessage {
    r#type: &'static str,
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct TextOptions {
    verbosity: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ResponsesRequest {
    model: String,
    store: bool,
    stream: bool,
    instructions: String,
    input: Vec<InputMessage>,
    text: TextOptions,
    include: Vec<&'static str>,
    tool_choice: &'static str,
    parallel_tool_calls: bool,
    tools: Vec<Tool>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &ResponsesConfig,
) -> ResponsesRequest {
    ResponsesRequest {
        model: config.model.clone(),
        store: false,
        stream: true,
        instructions: req.instructions.clone(),
        input: req.messages.iter().map(create_message).collect(),
        text: TextOptions {
            verbosity: "medium",
        },
        include: vec!["reasoning.encrypted_content"],
        tool_choice: "auto",
        parallel_tool_calls: true,
        tools: req.tools.iter().map(create_tool).collect(),
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> InputMessage {
    let (role, content_type) = match msg {
        ModelMessage::User(_) => ("user", "input_text"),
        ModelMessage::Assistant(_) => ("assistant", "output_text"),
    };
    InputMessage {
        r#type: "message",
        role,
        content: vec![ContentPart {
            r#type: content_type,
            text: msg.content().to_owned(),
        }],
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.parameters.clone(),
        strict: None,
    }
}

const ERROR_RECORD: &str = "error";
const FAILED_RECORD: &str = "response.failed";

/// Turns a decoded JSON document from the stream into an event.
///
/// Error records always yield an error event, whatever the shape of their
/// message. Records without a type are ignored. Other records must match
/// the shape of their type.
pub fn decode_record(
    record: Value,
) -> Result<Option<ModelResponseEvent>, serde_json::Error> {
    let message = match record.get("type").and_then(Value::as_str) {
        Some(ERROR_RECORD) => Some(record.get("message")),
        Some(FAILED_RECORD) => Some(record.pointer("/response/error/message")),
        Some(_) => None,
        None => return Ok(None),
    };
    if let Some(message) = message {
        return Ok(Some(ModelResponseEvent::Error {
            message: message.and_then(Value::as_str).map(str::to_owned),
        }));
    }
    serde_json::from_value(record).map(map_record)
}

/// Maps a decoded stream record to a model response event.
///
/// Returns `None` for records the turn engine doesn't care about.
fn map_record(record: StreamRecord) -> Option<ModelResponseEvent> {
    let event = match record {
        StreamRecord::OutputTextDelta { delta } => {
            ModelResponseEvent::MessageDelta {
                delta: delta.unwrap_or_default(),
            }
        }
        StreamRecord::FunctionCallArgumentsDelta {
            output_index,
            delta,
        } => ModelResponseEvent::ToolCallArgumentsDelta {
            slot: output_index.unwrap_or(0),
            delta: delta.unwrap_or_default(),
        },
        StreamRecord::OutputItemAdded { output_index, item } => {
            let item = item?;
            if item.kind.as_deref() != Some("function_call") {
                return None;
            }
            ModelResponseEvent::ToolCallOpened(ToolCallOpened {
                slot: output_index.unwrap_or(0),
                call_id: item.call_id,
                item_id: item.id,
                name: item.name.unwrap_or_default(),
            })
        }
        StreamRecord::Completed => ModelResponseEvent::Completed,
        StreamRecord::Unknown => return None,
    };
    Some(event)
}
