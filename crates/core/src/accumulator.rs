use std::collections::BTreeMap;

use omo_model::{ModelResponseEvent, ToolCallOpened};

use crate::Error;

/// A tool call whose arguments are still being streamed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingToolCall {
    /// The call id, or a synthesized `call_{slot}` when the endpoint gave
    /// none.
    pub id: String,
    /// Name of the tool. Empty when only argument fragments have been seen.
    pub name: String,
    /// The concatenated argument fragments.
    pub arguments: String,
}

/// A fully received tool call, ready to be dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    /// The call id.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// The raw argument text, not parsed yet.
    pub arguments: String,
}

/// The outcome of folding a single record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Folded {
    /// An assistant text delta was appended.
    Text {
        /// The appended fragment.
        delta: String,
        /// `true` if this is the first text delta of the response.
        first: bool,
    },
    /// Tool call state was updated.
    ToolCall,
    /// The response has been completed.
    Completed,
}

/// Everything a single response produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulatedResponse {
    /// The whole assistant text.
    pub text: String,
    /// Tool calls with a non-empty name, in slot order.
    pub tool_calls: Vec<ToolCall>,
}

/// Folds response records into assistant text and tool calls.
///
/// Tool calls are keyed by their slot, so argument fragments for
/// different calls may interleave freely.
#[derive(Debug, Default)]
pub struct Accumulator {
    text: String,
    calls: BTreeMap<u32, PendingToolCall>,
    seen_text: bool,
}

impl Accumulator {
    /// Creates an empty accumulator.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text accumulated so far.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the pending call at `slot`.
    #[inline]
    pub fn pending_call(&self, slot: u32) -> Option<&PendingToolCall> {
        self.calls.get(&slot)
    }

    /// Folds a record into the accumulated state.
    ///
    /// An error record is turned into [`Error::Protocol`].
    pub fn fold(&mut self, event: ModelResponseEvent) -> Result<Folded, Error> {
        match event {
            ModelResponseEvent::MessageDelta { delta } => {
                self.text.push_str(&delta);
                let first = !self.seen_text;
                self.seen_text = true;
                Ok(Folded::Text { delta, first })
            }
            ModelResponseEvent::ToolCallOpened(opened) => {
                self.open_call(opened);
                Ok(Folded::ToolCall)
            }
            ModelResponseEvent::ToolCallArgumentsDelta { slot, delta } => {
                self.calls
                    .entry(slot)
                    .or_insert_with(|| PendingToolCall {
                        id: fallback_id(slot),
                        ..Default::default()
                    })
                    .arguments
                    .push_str(&delta);
                Ok(Folded::ToolCall)
            }
            ModelResponseEvent::Completed => Ok(Folded::Completed),
            ModelResponseEvent::Error { message } => Err(Error::Protocol(
                message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "API error".to_owned()),
            )),
        }
    }

    /// Consumes the accumulator and returns the assembled response.
    ///
    /// Calls whose name is still empty (arguments arrived, but the call
    /// was never announced) are dropped.
    pub fn finish(self) -> AccumulatedResponse {
        let tool_calls = self
            .calls
            .into_iter()
            .filter_map(|(slot, call)| {
                if call.name.trim().is_empty() {
                    debug!("dropping unnamed tool call at slot {slot}");
                    return None;
                }
                Some(ToolCall {
                    id: call.id,
                    name: call.name,
                    arguments: call.arguments,
                })
            })
            .collect();
        AccumulatedResponse {
            text: self.text,
            tool_calls,
        }
    }

    fn open_call(&mut self, opened: ToolCallOpened) {
        let ToolCallOpened {
            slot,
            call_id,
            item_id,
            name,
        } = opened;
        let id = call_id
            .or(item_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| fallback_id(slot));
        // Fragments seen before the announcement are discarded.
        self.calls.insert(
            slot,
            PendingToolCall {
                id,
                name,
                arguments: String::new(),
            },
        );
    }
}

#[inline]
fn fallback_id(slot: u32) -> String {
    format!("call_{slot}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(slot: u32, call_id: Option<&str>, name: &str) -> ModelResponseEvent {
        ModelResponseEvent::ToolCallOpened(ToolCallOpened {
            slot,
            call_id: call_id.map(str::to_owned),
            item_id: None,
            name: name.to_owned(),
        })
    }

    fn args(slot: u32, delta: &str) -> ModelResponseEvent {
        ModelResponseEvent::ToolCallArgumentsDelta {
            slot,
            delta: delta.to_owned(),
        }
    }

    fn text(delta: &str) -> ModelResponseEvent {
        ModelResponseEvent::MessageDelta {
            delta: delta.to_owned(),
        }
    }

    #[test]
    fn test_text_concatenation() {
        let mut acc = Accumulator::new();
        assert_eq!(
            acc.fold(text("Hello, ")).unwrap(),
            Folded::Text {
                delta: "Hello, ".to_owned(),
                first: true
            }
        );
        assert_eq!(
            acc.fold(text("world")).unwrap(),
            Folded::Text {
                delta: "world".to_owned(),
                first: false
            }
        );
        assert_eq!(acc.fold(text("")).unwrap(), Folded::Text {
            delta: String::new(),
            first: false
        });
        assert_eq!(acc.fold(ModelResponseEvent::Completed).unwrap(), Folded::Completed);

        let resp = acc.finish();
        assert_eq!(resp.text, "Hello, world");
        assert!(resp.tool_calls.is_empty());
    }

    #[test]
    fn test_interleaved_calls_in_slot_order() {
        let mut acc = Accumulator::new();
        acc.fold(opened(3, Some("call_b"), "read")).unwrap();
        acc.fold(opened(1, Some("call_a"), "bash")).unwrap();
        acc.fold(args(3, "{\"path\":")).unwrap();
        acc.fold(args(1, "{\"command\":")).unwrap();
        acc.fold(args(3, "\"a.txt\"}")).unwrap();
        acc.fold(args(1, "\"ls\"}")).unwrap();

        let resp = acc.finish();
        assert_eq!(
            resp.tool_calls,
            vec![
                ToolCall {
                    id: "call_a".to_owned(),
                    name: "bash".to_owned(),
                    arguments: "{\"command\":\"ls\"}".to_owned(),
                },
                ToolCall {
                    id: "call_b".to_owned(),
                    name: "read".to_owned(),
                    arguments: "{\"path\":\"a.txt\"}".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_id_fallbacks() {
        let mut acc = Accumulator::new();
        acc.fold(ModelResponseEvent::ToolCallOpened(ToolCallOpened {
            slot: 0,
            call_id: None,
            item_id: Some("fc_1".to_owned()),
            name: "bash".to_owned(),
        }))
        .unwrap();
        acc.fold(opened(4, None, "read")).unwrap();
        acc.fold(opened(5, Some(""), "write")).unwrap();

        let ids: Vec<_> =
            acc.finish().tool_calls.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["fc_1", "call_4", "call_5"]);
    }

    #[test]
    fn test_unnamed_calls_are_dropped() {
        let mut acc = Accumulator::new();
        acc.fold(args(2, "{}")).unwrap();
        acc.fold(opened(7, None, "  ")).unwrap();
        acc.fold(opened(8, None, "bash")).unwrap();

        let pending = acc.pending_call(2).unwrap();
        assert_eq!(pending.id, "call_2");
        assert_eq!(pending.name, "");
        assert_eq!(pending.arguments, "{}");

        let resp = acc.finish();
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "bash");
    }

    #[test]
    fn test_announcement_resets_arguments() {
        let mut acc = Accumulator::new();
        acc.fold(args(1, "garbage")).unwrap();
        acc.fold(opened(1, Some("call_x"), "bash")).unwrap();
        acc.fold(args(1, "{}")).unwrap();

        let resp = acc.finish();
        assert_eq!(resp.tool_calls[0].arguments, "{}");
        assert_eq!(resp.tool_calls[0].id, "call_x");
    }

    #[test]
    fn test_error_record() {
        let mut acc = Accumulator::new();
        let err = acc
            .fold(ModelResponseEvent::Error {
                message: Some("quota exceeded".to_owned()),
            })
            .unwrap_err();
        assert!(matches!(&err, Error::Protocol(m) if m == "quota exceeded"));

        let err = acc
            .fold(ModelResponseEvent::Error { message: None })
            .unwrap_err();
        assert_eq!(err.to_string(), "API error");

        let err = acc
            .fold(ModelResponseEvent::Error {
                message: Some(String::new()),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "API error");
    }
}
