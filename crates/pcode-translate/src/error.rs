use std::borrow::Cow;

use pcode_sys::api::TranslationContext;
use pcode_sys::sys::{self, ErrorType};

use crate::location::Address;
use crate::session::Session;

/// Errors returned by this crate. Failures to decode instructions are not errors of the API call
/// and are instead reported in [crate::TranslationResult::error].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input invalid: {message}")]
    InvalidInput { message: Cow<'static, str> },

    #[error("dependency error: {message} caused by {source}")]
    DependencyError {
        message: Cow<'static, str>,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown register: {0}")]
    UnknownRegister(String),
}

/// Result returned by this crate
pub type Result<T> = std::result::Result<T, Error>;

/// A decode failure. Decoding does not continue past the failing instruction.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SleighError {
    /// The instruction was identified but has no p-code semantics
    #[error("unimplemented instruction at {address}: {explain}")]
    Unimplemented {
        explain: String,
        address: Address,
        instruction_length: usize,
    },

    /// The bytes do not match any instruction
    #[error("bad data at {address}: {explain}")]
    BadData { explain: String, address: Address },
}

impl SleighError {
    /// Classify a raw decode error. Returns `None` if the raw error reports success.
    ///
    /// # Panics
    ///
    /// Panics if the engine reports an error type this crate does not know about.
    pub fn classify<C: TranslationContext>(
        session: &Session<C>,
        error: &sys::RawError,
    ) -> Option<Self> {
        match error.error_type {
            ErrorType::ERROR_TYPE_NOERROR => None,
            ErrorType::ERROR_TYPE_UNIMPL => Some(Self::Unimplemented {
                explain: error.explain.clone(),
                address: Address::from_raw(session, &error.address),
                instruction_length: error.instruction_length as usize,
            }),
            ErrorType::ERROR_TYPE_BADDATA => Some(Self::BadData {
                explain: error.explain.clone(),
                address: Address::from_raw(session, &error.address),
            }),
            error_type => panic!("Unknown decode error type: {error_type:?}"),
        }
    }

    pub fn explain(&self) -> &str {
        match self {
            Self::Unimplemented { explain, .. } | Self::BadData { explain, .. } => explain,
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Self::Unimplemented { address, .. } | Self::BadData { address, .. } => address,
        }
    }
}
