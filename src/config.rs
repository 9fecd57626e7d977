use serde::Deserialize;

/// Settings for the access-grant lifecycle.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    pub code_length: usize,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub share: ShareConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name->value lookup, so the defaulting
    /// rules are testable without mutating the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
        let share = ShareConfig {
            code_length: lookup("ACCESS_CODE_LENGTH")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(8),
            ttl_minutes: lookup("ACCESS_CODE_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let mail = MailConfig {
            from: lookup("MAIL_FROM").unwrap_or_else(|| "noreply@healthshare.local".into()),
        };
        Ok(Self {
            database_url,
            share,
            mail,
        })
    }
}
