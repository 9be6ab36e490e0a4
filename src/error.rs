use thiserror::Error;

/// Errors surfaced by the dispatch engine.
///
/// Statement-store and lookup failures are synchronous and returned straight
/// from the call that caused them. Execution failures inside workers never
/// appear here directly — they travel the result queue as
/// [`ResultPayload::Error`](crate::types::ResultPayload::Error) payloads and
/// reach the callback registered for the request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A statement with this name is already registered; the first
    /// registration is retained.
    #[error("duplicate statement name: {0}")]
    DuplicateStatement(String),

    /// No statement registered under this name.
    #[error("unknown statement name: {0}")]
    UnknownStatement(String),

    /// The template references an argument the caller did not supply.
    #[error("statement '{statement}' references argument '{argument}' which was not supplied")]
    MissingArgument {
        /// Name of the statement being formatted.
        statement: String,
        /// The placeholder name with no matching argument.
        argument: String,
    },

    /// A completed result arrived with no registered callback. Indicates a
    /// correlation bug; never silently swallowed.
    #[error("no callback registered for result id {0}")]
    UnmatchedResult(u64),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("execution error: {0}")]
    ExecutionError(String),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),
}
