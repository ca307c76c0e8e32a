//! TC3-HMAC-SHA256 request signing.
//!
//! Pure functions over immutable values: a [`SigningRequest`] plus a
//! [`Credential`] yields exactly one `Authorization` header value. The
//! verifier on the provider side recomputes the same chain, so every byte
//! of the canonical request and string-to-sign matters.

mod credential;
mod tc3;

pub use credential::Credential;
pub use tc3::{
    canonical_request, credential_scope, sha256_hex, sign, string_to_sign, utc_date,
    SigningRequest, ALGORITHM, JSON_CONTENT_TYPE, REQUEST_SUFFIX, SIGNED_HEADERS,
};
