use serde::Serialize;
use serde_json::Value;

/// Notifications emitted by the agent while a turn is in progress.
///
/// They are pure notifications: the agent never waits on or reacts to
/// observers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The model started or stopped composing a response.
    Thinking {
        /// `true` when a request has been issued, `false` on the first
        /// record of the response.
        status: bool,
    },
    /// An assistant text delta.
    Token {
        /// The text fragment.
        text: String,
    },
    /// A tool is about to be invoked.
    ToolStart {
        /// Name of the tool.
        name: String,
        /// Parsed arguments.
        args: Value,
    },
    /// A tool has completed or failed.
    ToolEnd {
        /// Name of the tool.
        name: String,
        /// The tool output, empty when it failed.
        result: String,
        /// The failure reason, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The final round of a turn has been completed.
    ResponseEnd {
        /// The whole assistant text of the final round.
        #[serde(rename = "fullText")]
        full_text: String,
    },
}
