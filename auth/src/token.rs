//! Bearer tokens.
//!
//! Tokens are compact JWS (HS256) with the claims below. The signing key is
//! the configured secret; verification recomputes the HMAC over
//! `base64url(header).base64url(claims)` and compares in constant time.

use crate::config::TokenConfig;
use crate::error::{AuthError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use eventhub_core::types::{Role, UserId};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Role at issue time. The server re-reads the user on every request,
    /// so this is informational only.
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Subject as a typed id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// Compact JWS string
    pub token: String,
    /// Expiration instant
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("ttl", &self.config.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec from configuration.
    #[must_use]
    pub const fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> chrono::Duration {
        self.config.ttl
    }

    /// Sign a token for `user_id` valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encoding`] if serialization or keying fails.
    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now + self.config.ttl;
        let claims = Claims {
            sub: *user_id.as_uuid(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let header = encode_segment(&header)?;
        let payload = encode_segment(&claims)?;
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            expires_at,
        })
    }

    /// Verify signature, issuer and expiry of `token` at instant `now`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] for malformed tokens, unsupported
    ///   algorithms, bad signatures or a foreign issuer
    /// - [`AuthError::TokenExpired`] when `now` is at or past `exp`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let malformed = || AuthError::InvalidToken("expected three segments".to_string());
        let (signing_input, signature) = token.rsplit_once('.').ok_or_else(malformed)?;
        let (header, payload) = signing_input.split_once('.').ok_or_else(malformed)?;
        if payload.contains('.') {
            return Err(malformed());
        }

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken("signature is not base64url".to_string()))?;
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".to_string()))?;

        let claims: Claims = decode_segment(payload)?;
        if claims.iss != self.config.issuer {
            return Err(AuthError::InvalidToken("unexpected issuer".to_string()));
        }
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidToken("exp out of range".to_string()))?;
        if now >= expires_at {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken("segment is not base64url".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively.
///
/// ```
/// use eventhub_auth::token::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(parse_bearer("bearer   abc"), Some("abc"));
/// assert_eq!(parse_bearer("Basic dXNlcg=="), None);
/// assert_eq!(parse_bearer("Bearer "), None);
/// ```
#[must_use]
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
