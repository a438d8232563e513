use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{config::IdentityConfig, db::AppState};

/// Claims of an identity-provider token. The engine performs no
/// authentication of its own; a verified `sub` is taken as the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct IdentityKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for IdentityKeys {
    fn from_ref(state: &AppState) -> Self {
        let IdentityConfig {
            secret,
            issuer,
            audience,
        } = state.config.identity.clone();
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }
}

impl IdentityKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "identity token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};

    /// Signs a token the way the identity provider would, for extractor and
    /// verification tests.
    pub fn issue(secret: &str, issuer: &str, audience: &str, user_id: Uuid) -> String {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + Duration::minutes(5)).unix_timestamp() as usize,
            iss: issuer.to_string(),
            aud: audience.to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign test token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    fn make_keys() -> IdentityKeys {
        IdentityKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn verify_accepts_provider_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = test_tokens::issue("test-secret", "test-issuer", "test-aud", user_id);
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn verify_rejects_wrong_issuer() {
        let keys = make_keys();
        let token = test_tokens::issue("test-secret", "other-issuer", "test-aud", Uuid::new_v4());
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let token = test_tokens::issue("other-secret", "test-issuer", "test-aud", Uuid::new_v4());
        assert!(keys.verify(&token).is_err());
    }
}
