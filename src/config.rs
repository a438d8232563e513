use serde::Deserialize;

/// Verification parameters for tokens issued by the external identity
/// provider. This service never signs user tokens; it only trusts `sub`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub identity: IdentityConfig,
    /// Bearer credential for the scheduled job runner, distinct from any
    /// user session token.
    pub job_token: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let identity = IdentityConfig {
            secret: std::env::var("IDENTITY_JWT_SECRET")?,
            issuer: std::env::var("IDENTITY_JWT_ISSUER").unwrap_or_else(|_| "kcalweek-idp".into()),
            audience: std::env::var("IDENTITY_JWT_AUDIENCE")
                .unwrap_or_else(|_| "kcalweek-users".into()),
        };
        let job_token = std::env::var("JOB_RUNNER_TOKEN")?;
        Ok(Self {
            database_url,
            identity,
            job_token,
        })
    }
}
