// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token format tests: tokens minted after the OAuth callback must
//! stay decodable by the auth middleware.

use goldenchat::middleware::auth::create_jwt;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Mirror of the middleware's claim set. If either side drifts, decoding
/// here fails first.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

fn decode_claims(token: &str, key: &[u8], validate_exp: bool) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = validate_exp;
    decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)
}

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt("1234567890@google", SIGNING_KEY).expect("Failed to create JWT");

    let claims = decode_claims(&token, SIGNING_KEY, true)
        .expect("Middleware-compatible decode failed")
        .claims;

    // The subject carries the full user key, not a bare provider ID
    assert_eq!(claims.sub, "1234567890@google");
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_jwt_rejects_wrong_key() {
    let token = create_jwt("42@github", SIGNING_KEY).expect("Failed to create JWT");

    assert!(decode_claims(&token, b"a_completely_different_key_here!", true).is_err());
}

#[test]
fn test_jwt_expiration_is_future() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let token = create_jwt("42@google", SIGNING_KEY).expect("Failed to create JWT");
    let claims = decode_claims(&token, SIGNING_KEY, false).unwrap().claims;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    assert!(
        claims.exp > now + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
}
