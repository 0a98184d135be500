use thiserror::Error;

/// Bridge error taxonomy.
///
/// Faults propagate synchronously to the caller; nothing is retried and
/// nothing is downgraded to a warning. A failed weak-reference resolution
/// during a sweep is not an error. It is the expected "already reclaimed"
/// case and is handled silently by the registry.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The foreign engine rejected or failed an invocation.
    #[error("Foreign invocation fault: {0}")]
    Invocation(String),
    /// Interchange encoding of an argument failed (non-encodable value).
    #[error("Interchange encode fault: {0}")]
    Encode(String),
    /// Interchange decoding of a result failed.
    #[error("Interchange decode fault: {0}")]
    Decode(String),
    /// The engine adapter itself failed (runtime creation, lost context).
    #[error("Engine fault: {0}")]
    Engine(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
