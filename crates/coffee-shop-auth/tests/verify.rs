//! Token verification against a mock identity provider.

mod common;

use base64::prelude::*;
use coffee_shop_auth::{
    check_permission, AuthError, BearerToken, FailureKind, RequiredPermission, TokenVerifier,
};
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::json;
use wiremock::MockServer;

use common::*;

const GET_DRINKS_DETAIL: RequiredPermission = RequiredPermission::new("get:drinks-detail");
const POST_DRINKS: RequiredPermission = RequiredPermission::new("post:drinks");

#[tokio::test]
async fn valid_token_round_trip() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let token = sign_primary(&claims(&server, &["get:drinks-detail"]));
    let claims = verifier.verify(&BearerToken::new(token)).await.unwrap();

    assert_eq!(claims.subject(), "auth0|barista");
    assert_eq!(claims.issuer(), issuer(&server));
    assert!(claims.audience().iter().any(|a| a == AUDIENCE));
    assert!(claims.issued_at().is_some());
    assert!(check_permission(&claims, GET_DRINKS_DETAIL).is_ok());
    assert_eq!(
        check_permission(&claims, POST_DRINKS).unwrap_err().kind(),
        FailureKind::InsufficientScope
    );
}

#[tokio::test]
async fn verification_is_idempotent() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let token = BearerToken::new(sign_primary(&claims(&server, &["patch:drinks"])));
    let first = verifier.verify(&token).await.unwrap();
    let second = verifier.verify(&token).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(verifier.keys().fetch_count(), 1);
}

#[tokio::test]
async fn string_audience_is_accepted() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &[]);
    body["aud"] = json!(AUDIENCE);
    let claims = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap();
    assert_eq!(claims.audience(), [AUDIENCE.to_string()]);
}

#[tokio::test]
async fn missing_permissions_claim_is_empty_set() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &[]);
    body.as_object_mut().unwrap().remove("permissions");
    let claims = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap();

    assert!(claims.permissions().is_empty());
    for required in [GET_DRINKS_DETAIL, POST_DRINKS] {
        assert_eq!(
            check_permission(&claims, required).unwrap_err().kind(),
            FailureKind::InsufficientScope
        );
    }
}

#[tokio::test]
async fn token_from_unpublished_key_is_unverifiable() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let token = sign("rogue", ROGUE_PEM, &claims(&server, &["get:drinks-detail"]));
    let err = verifier.verify(&BearerToken::new(token)).await.unwrap_err();

    assert_eq!(err, AuthError::UnknownKey("rogue".to_string()));
    assert_eq!(err.kind(), FailureKind::UnverifiableSignature);
}

#[tokio::test]
async fn forged_signature_under_known_kid_is_unverifiable() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let token = sign("primary", ROGUE_PEM, &claims(&server, &["get:drinks-detail"]));
    let err = verifier.verify(&BearerToken::new(token)).await.unwrap_err();

    assert_eq!(err, AuthError::InvalidSignature);
    assert_eq!(err.kind(), FailureKind::UnverifiableSignature);
}

#[tokio::test]
async fn tampered_payload_is_unverifiable() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let token = sign_primary(&claims(&server, &["get:drinks-detail"]));
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let mut forged = claims(&server, &["get:drinks-detail", "delete:drinks"]);
    forged["sub"] = json!("auth0|intruder");
    parts[1] = BASE64_URL_SAFE_NO_PAD.encode(forged.to_string());

    let err = verifier
        .verify(&BearerToken::new(parts.join(".")))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidSignature);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &["get:drinks-detail"]);
    body["exp"] = json!(get_current_timestamp() - 3600);
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::Expired);
}

#[tokio::test]
async fn token_expiring_now_is_expired() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &["get:drinks-detail"]);
    body["exp"] = json!(get_current_timestamp());
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Expired);
}

#[tokio::test]
async fn clock_skew_tolerates_recent_expiry() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let mut config = config(&server);
    config.clock_skew_seconds = 120;
    let verifier = coffee_shop_auth::JwksTokenVerifier::new(config).unwrap();

    let mut body = claims(&server, &[]);
    body["exp"] = json!(get_current_timestamp() - 30);
    assert!(verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .is_ok());
}

#[tokio::test]
async fn wrong_audience_is_rejected() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &[]);
    body["aud"] = json!(["another-api"]);
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongAudience);

    body.as_object_mut().unwrap().remove("aud");
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongAudience);
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &[]);
    body["iss"] = json!("https://impostor.example/");
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongIssuer);
}

#[tokio::test]
async fn missing_issuer_is_wrong_issuer() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 1).await;
    let verifier = verifier(&server);

    let mut body = claims(&server, &["get:drinks-detail"]);
    body.as_object_mut().unwrap().remove("iss");
    let err = verifier
        .verify(&BearerToken::new(sign_primary(&body)))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongIssuer);
}

#[tokio::test]
async fn hmac_token_is_unsupported_algorithm() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 0).await;
    let verifier = verifier(&server);

    // Classic confusion: HMAC keyed with public material the attacker knows.
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("primary".to_string());
    let token = encode(
        &header,
        &claims(&server, &["delete:drinks"]),
        &EncodingKey::from_secret(PRIMARY_N.as_bytes()),
    )
    .unwrap();

    let err = verifier.verify(&BearerToken::new(token)).await.unwrap_err();
    assert_eq!(err, AuthError::UnsupportedAlgorithm("HS256".to_string()));
    assert_eq!(verifier.keys().fetch_count(), 0);
}

#[tokio::test]
async fn unsigned_token_is_unsupported_algorithm() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 0).await;
    let verifier = verifier(&server);

    let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"none","kid":"primary","typ":"JWT"}"#);
    let payload = BASE64_URL_SAFE_NO_PAD.encode(claims(&server, &["delete:drinks"]).to_string());
    let token = format!("{header}.{payload}.");

    let err = verifier.verify(&BearerToken::new(token)).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnsupportedAlgorithm);
}

#[tokio::test]
async fn key_pinned_to_other_algorithm_is_unverifiable() {
    let server = MockServer::start().await;
    let mut jwk = rsa_jwk("primary", PRIMARY_N);
    jwk["alg"] = json!("RS512");
    serve_jwks(&server, json!({ "keys": [jwk] }), 1).await;
    let verifier = verifier(&server);

    let token = sign_primary(&claims(&server, &[]));
    let err = verifier.verify(&BearerToken::new(token)).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnverifiableSignature);
}

#[tokio::test]
async fn malformed_tokens_never_reach_the_provider() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 0).await;
    let verifier = verifier(&server);

    let no_kid = {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#);
        format!("{header}.e30.c2ln")
    };
    let no_alg = {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"kid":"primary"}"#);
        format!("{header}.e30.c2ln")
    };

    for token in ["", "not-a-jwt", "a.b", "a.b.c.d", no_kid.as_str(), no_alg.as_str()] {
        let err = verifier
            .verify(&BearerToken::new(token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedToken, "token {token:?}");
    }
}

#[tokio::test]
async fn empty_signature_is_malformed_without_fetch() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 0).await;
    let verifier = verifier(&server);

    let token = sign_primary(&claims(&server, &["get:drinks-detail"]));
    let unsigned = format!("{}.", &token[..token.rfind('.').unwrap()]);

    let err = verifier
        .verify(&BearerToken::new(unsigned))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedToken);
    assert_eq!(verifier.keys().fetch_count(), 0);
}

#[tokio::test]
async fn unrecognized_algorithm_names_are_unsupported() {
    let server = MockServer::start().await;
    serve_jwks(&server, primary_jwks(), 0).await;
    let verifier = verifier(&server);

    for alg in ["rs256", "RS256 ", "PS256", "RSA"] {
        let header = BASE64_URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","kid":"primary"}}"#));
        let token = format!("{header}.e30.c2ln");
        let err = verifier
            .verify(&BearerToken::new(token))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::UnsupportedAlgorithm(alg.to_string()));
    }
    assert_eq!(verifier.keys().fetch_count(), 0);
}
