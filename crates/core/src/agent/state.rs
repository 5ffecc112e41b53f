/// Where a conversation is within its current turn.
///
/// A turn moves from `Requesting` to `Streaming`, then either ends in
/// `Finalizing` or goes through `Dispatching` and starts over with the
/// next round. Between turns the agent is `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnStage {
    /// No turn is in progress.
    #[default]
    Idle,
    /// A request is being prepared or sent.
    Requesting,
    /// Records are being read from the response.
    Streaming,
    /// The final response is being recorded.
    Finalizing,
    /// Requested tools are being executed.
    Dispatching,
}
