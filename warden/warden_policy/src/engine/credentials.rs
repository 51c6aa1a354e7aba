//! Transport credential comparison.
//!
//! All comparisons run in constant time with respect to the compared bytes.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use warden_core::types::{BasicCredentials, DigestExpectation, DigestResponse};

/// Check supplied Basic credentials against the expected pair.
pub fn basic_matches(expected: &BasicCredentials, supplied: &BasicCredentials) -> bool {
    let username = expected
        .username
        .as_bytes()
        .ct_eq(supplied.username.as_bytes());
    let password = expected
        .password
        .as_bytes()
        .ct_eq(supplied.password.as_bytes());

    (username & password).into()
}

/// Compute the Digest response for the given request parameters.
///
/// `HA1 = H(username:realm:password)`, `HA2 = H(method:uri)` and the
/// response is `H(HA1:nonce:HA2)`, where `H` is lowercase-hex SHA-256.
pub fn digest_response(
    username: &str,
    realm: &str,
    password: &str,
    method: &str,
    uri: &str,
    nonce: &str,
) -> String {
    let ha1 = sha256_hex(&format!("{}:{}:{}", username, realm, password));
    let ha2 = sha256_hex(&format!("{}:{}", method, uri));
    sha256_hex(&format!("{}:{}:{}", ha1, nonce, ha2))
}

/// Check a supplied Digest response against the expected credentials.
pub fn digest_matches(expected: &DigestExpectation, supplied: &DigestResponse) -> bool {
    let computed = digest_response(
        &expected.username,
        &expected.realm,
        &expected.password,
        &supplied.method,
        &supplied.uri,
        &supplied.nonce,
    );
    let response = supplied.response.to_ascii_lowercase();

    let username = expected
        .username
        .as_bytes()
        .ct_eq(supplied.username.as_bytes());
    let realm = expected.realm.as_bytes().ct_eq(supplied.realm.as_bytes());
    let response = computed.as_bytes().ct_eq(response.as_bytes());

    (username & realm & response).into()
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
