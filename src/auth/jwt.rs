use crate::config::Config;
use chrono::Utc;
use derive_more::Display;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub user_id: i32,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum TokenError {
    #[display(fmt = "Token is invalid or expired")]
    Invalid,
    #[display(fmt = "Token has wrong type")]
    WrongType,
    #[display(fmt = "Token could not be issued")]
    Encoding,
}

impl std::error::Error for TokenError {}

#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// HMAC keys and lifetimes for issuing and checking tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: chrono::Duration,
    refresh_lifetime: chrono::Duration,
}

impl JwtKeys {
    pub fn new(
        secret: &[u8],
        access_lifetime: chrono::Duration,
        refresh_lifetime: chrono::Duration,
    ) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_lifetime,
            refresh_lifetime,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.secret_key.as_bytes(),
            config.jwt_access_lifetime,
            config.jwt_refresh_lifetime,
        )
    }

    fn issue(&self, user_id: i32, token_type: TokenType) -> Result<String, TokenError> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let claims = Claims {
            token_type,
            user_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            log::error!("JwtKeys::issue: {}", e);
            TokenError::Encoding
        })
    }

    pub fn issue_pair(&self, user_id: i32) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    /// Decodes any well-formed, unexpired token signed with our key.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }

    /// Exchanges a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<(i32, String), TokenError> {
        let claims = self.verify(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongType);
        }
        Ok((claims.user_id, self.issue(claims.user_id, TokenType::Access)?))
    }
}
