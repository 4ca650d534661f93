//! Servlet errors and their HTTP rendering.

use thiserror::Error;

use crate::codec::CodecError;
use crate::custom_field::StoreError;
use crate::types::Response;

/// Why a request could not be served.
///
/// Every variant renders to a plain-text response; the internal ones hide
/// their cause from the client and log it instead.
#[derive(Debug, Error)]
pub enum ServletError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("{0}")]
    SaveFailed(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ServletError {
    pub fn resource_not_found(path: &str) -> Self {
        Self::NotFound(format!("Resource {path} not found"))
    }

    pub fn status(&self) -> u16 {
        match self {
            ServletError::NotFound(_) => 404,
            ServletError::BadRequest(_) => 400,
            ServletError::MethodNotAllowed(_) => 405,
            ServletError::SaveFailed(_) | ServletError::Store(_) | ServletError::Codec(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ServletError::MethodNotAllowed(_) => {
                Response::text(status, self.to_string()).with_header("allow", "GET, PUT")
            }
            ServletError::Store(_) | ServletError::Codec(_) => {
                tracing::error!(error = %self, "request failed");
                Response::text(status, "Internal Server Error")
            }
            _ => Response::text(status, self.to_string()),
        }
    }
}
