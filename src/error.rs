/// Errors returned while registering routes.
///
/// Every variant is produced synchronously by the registration calls on
/// [`Router`](crate::Router); nothing here is ever raised at request time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The method is empty or not a valid HTTP verb token.
    #[error("expect `method` to be a string naming an HTTP verb, got {0:?}")]
    InvalidMethod(String),

    /// The pattern could not be compiled into a matcher.
    #[error("expect `pathname` be string, array or function, got {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// A route was registered without any handlers.
    #[error("expect at least one handler for route `{0}`")]
    EmptyChain(String),
}
