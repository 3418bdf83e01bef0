//! The handler seam: application logic bound to intent names.
//!
//! Handlers report failure through an explicit error value; the runtime
//! converts it into the intent's `ExecutionResult`. A handler that
//! panics is contained at the dispatch boundary, but panicking is not
//! part of the contract.

use async_trait::async_trait;
use thiserror::Error;

use intentwire_core::ParamValue;

/// Failure reported by a handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("missing parameter at position {0}")]
    MissingParam(usize),

    #[error("invalid parameter at position {index}: expected {expected}")]
    BadParam {
        index: usize,
        expected: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// An application-level failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A handler bound to an intent name.
///
/// Handlers are opaque to the runtime: they may block, take arbitrarily
/// long, or fail. Each invocation runs on its own task under the
/// runtime's timeout.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Execute with the intent's parameters, positionally.
    async fn invoke(&self, params: &[ParamValue]) -> Result<ParamValue, HandlerError>;
}

/// Adapter for plain synchronous closures.
pub struct FnHandler<F>(F);

impl<F> FnHandler<F>
where
    F: Fn(&[ParamValue]) -> Result<ParamValue, HandlerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> IntentHandler for FnHandler<F>
where
    F: Fn(&[ParamValue]) -> Result<ParamValue, HandlerError> + Send + Sync,
{
    async fn invoke(&self, params: &[ParamValue]) -> Result<ParamValue, HandlerError> {
        (self.0)(params)
    }
}

/// Extract a required text parameter.
pub fn text_param(params: &[ParamValue], index: usize) -> Result<&str, HandlerError> {
    let value = params.get(index).ok_or(HandlerError::MissingParam(index))?;
    value.as_text().ok_or(HandlerError::BadParam {
        index,
        expected: "text",
    })
}

/// Extract a required integer parameter.
pub fn int_param(params: &[ParamValue], index: usize) -> Result<i64, HandlerError> {
    let value = params.get(index).ok_or(HandlerError::MissingParam(index))?;
    value.as_int().ok_or(HandlerError::BadParam {
        index,
        expected: "int",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_handler_invokes_closure() {
        let handler = FnHandler::new(|params: &[ParamValue]| {
            let name = text_param(params, 0)?;
            Ok(ParamValue::from(format!("hello {name}")))
        });

        let out = handler.invoke(&[ParamValue::from("world")]).await.unwrap();
        assert_eq!(out.as_text(), Some("hello world"));
    }

    #[test]
    fn test_text_param_errors() {
        assert_eq!(text_param(&[], 0), Err(HandlerError::MissingParam(0)));
        assert_eq!(
            text_param(&[ParamValue::Int(1)], 0),
            Err(HandlerError::BadParam {
                index: 0,
                expected: "text"
            })
        );
    }

    #[test]
    fn test_failed_message_is_verbatim() {
        let err = HandlerError::failed("disk on fire");
        assert_eq!(err.to_string(), "disk on fire");
    }
}
