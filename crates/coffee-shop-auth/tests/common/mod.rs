//! Shared fixtures: RSA test keys, a mock JWKS endpoint and token minting.

#![allow(dead_code)]

use std::time::Duration;

use coffee_shop_auth::{AuthConfig, JwksTokenVerifier};
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Private key published in the JWKS as `primary`.
pub const PRIMARY_PEM: &str = include_str!("../fixtures/primary.pem");
/// Modulus of [`PRIMARY_PEM`].
pub const PRIMARY_N: &str = "tDkICfklg7I-RPt2mMkYLIAo52H1ZK213AjoPyKq6wLo83qPTRzPy3ot-NXEm44uEYhDbNR3ZC54fFuWQhUS3cFHX8q9sU3YiVTb9UBV5VCdylkvopVn5eu1KjFTXPNmBD0yRvRKrYOn_yyWCULoeQygPqOSSLn5mTy_R6wBia-lx6QeTSPBjiBW6qWfSsQ_kvLslG9fiPZZXHJcBS4QW2IWXvhHyVmoHd6Y2T9q7cYUlMtT__A9nm9MhgfAr6PwyDQwqEyEAriyhXWz-CbWKtgsQqEtxFzTBYfuYLJQ03m2ZP1DKF6VdC1JKJ_4EFpuxczeu4XUSDlPSqtP9SIHUw";

/// A second key pair the provider does not publish by default.
pub const ROGUE_PEM: &str = include_str!("../fixtures/rogue.pem");
/// Modulus of [`ROGUE_PEM`].
pub const ROGUE_N: &str = "ps1kjo93qdKbpmcieT1JHNMMm3UjphD8H7cjaOiv0RfeH3aTnbvpmroo2YI3-zvosFL-_sb2HvtWJo4CO8Bq50o8sp7a_YBtTliBi2hqGx87IQUPzCtKd67zu4wR6L9OiIwV3BmP2IApTSpkjP9HvEqaqCrOMm7Uj6A71XedX0IIBwl-n1elW1P57_G-t1e-WJsMASkwzIcFQLNuBxG6-UJmyKhKS45t0n5L-JVEIScE3dn1L1z4ZGLtWlMcXEEks0zAw_xHI3lTDIUyxPIG-QWv9LiFN2nKPCcHWCcyNbhYfxjOqOttX9R2YXw3FwugEqMlL9NU3DMSQTL7OqB2_w";

pub const AUDIENCE: &str = "coffee-shop";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// An RSA signing JWK.
pub fn rsa_jwk(kid: &str, n: &str) -> Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": n,
        "e": "AQAB",
    })
}

/// The JWKS document containing only `primary`.
pub fn primary_jwks() -> Value {
    json!({ "keys": [rsa_jwk("primary", PRIMARY_N)] })
}

/// Serve `body` from the JWKS path, expecting exactly `expected` fetches.
pub async fn serve_jwks(server: &MockServer, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(server)
        .await;
}

/// Serve `body` once, then fall through to later mounts.
pub async fn serve_jwks_once(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

/// Serve `body` after `delay`.
pub async fn serve_jwks_slowly(server: &MockServer, body: Value, delay: Duration, expected: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .expect(expected)
        .mount(server)
        .await;
}

/// Verifier configuration pointing at the mock provider.
pub fn config(server: &MockServer) -> AuthConfig {
    let mut config = AuthConfig::new(server.uri(), AUDIENCE);
    config.jwks_timeout_seconds = 2;
    config
}

pub fn verifier(server: &MockServer) -> JwksTokenVerifier {
    JwksTokenVerifier::new(config(server)).unwrap()
}

/// The issuer the default configuration expects.
pub fn issuer(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Claims for a token valid for one hour.
pub fn claims(server: &MockServer, permissions: &[&str]) -> Value {
    let now = get_current_timestamp();
    json!({
        "iss": issuer(server),
        "sub": "auth0|barista",
        "aud": [AUDIENCE, "https://tenant.auth0.com/userinfo"],
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

/// Sign `claims` with an RSA key under the given `kid`.
pub fn sign(kid: &str, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Sign with the published primary key.
pub fn sign_primary(claims: &Value) -> String {
    sign("primary", PRIMARY_PEM, claims)
}
