//! Response error codes and their bijection with [`ResponseError`].
//!
//! The wire carries a plain `i32` in `Response.code`; everything above the
//! framing layer should deal in [`ResponseError`] instead, converting at the
//! boundary.

/// A `Request` failure reported back to the caller via a `Response`'s code
/// field. Never tears the connection down — see §7 in the design notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// The model could not find the requested file.
    #[error("no such file")]
    NoSuchFile,
    /// The model rejected the file as invalid (e.g. changed since indexing).
    #[error("invalid file")]
    InvalidFile,
    /// Any other model-reported failure.
    #[error("generic error")]
    Generic,
}

/// Numeric wire value for "no error" (`Response.code == NO_ERROR`).
pub const NO_ERROR: i32 = 0;
const GENERIC: i32 = 1;
const NO_SUCH_FILE: i32 = 2;
const INVALID_FILE: i32 = 3;

/// Converts a `Response.code` wire value into an optional [`ResponseError`].
///
/// Returns `None` for `NO_ERROR`; unrecognized codes map to
/// [`ResponseError::Generic`] so a future wire addition degrades gracefully
/// instead of panicking or surfacing a protocol error.
#[must_use]
pub fn code_to_error(code: i32) -> Option<ResponseError> {
    match code {
        NO_ERROR => None,
        NO_SUCH_FILE => Some(ResponseError::NoSuchFile),
        INVALID_FILE => Some(ResponseError::InvalidFile),
        _ => Some(ResponseError::Generic),
    }
}

/// Converts a [`ResponseError`] into its wire code.
#[must_use]
pub const fn error_to_code(err: ResponseError) -> i32 {
    match err {
        ResponseError::Generic => GENERIC,
        ResponseError::NoSuchFile => NO_SUCH_FILE,
        ResponseError::InvalidFile => INVALID_FILE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_maps_to_none() {
        assert_eq!(code_to_error(NO_ERROR), None);
    }

    #[test]
    fn known_codes_round_trip() {
        for err in [
            ResponseError::Generic,
            ResponseError::NoSuchFile,
            ResponseError::InvalidFile,
        ] {
            let code = error_to_code(err);
            assert_eq!(code_to_error(code), Some(err));
        }
    }

    #[test]
    fn unknown_code_maps_to_generic() {
        assert_eq!(code_to_error(99), Some(ResponseError::Generic));
    }
}
