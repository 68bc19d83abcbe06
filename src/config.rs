use anyhow::Context;

use crate::accounts::HashingConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Prefix joined to stored avatar keys when records are read.
    pub avatar_base_url: String,
    pub hashing: HashingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let avatar_base_url = std::env::var("AVATAR_BASE_URL")
            .or_else(|_| std::env::var("DO_SPACES_URL"))
            .unwrap_or_default();

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: env_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            avatar_base_url,
            hashing,
        })
    }
}

fn env_or(key: &str, default: u32) -> anyhow::Result<u32> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{key} must be a non-negative integer, got {v:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_parses_and_defaults() {
        std::env::set_var("ACCOUNTS_TEST_ENV_OR_SET", " 42 ");
        assert_eq!(env_or("ACCOUNTS_TEST_ENV_OR_SET", 7).unwrap(), 42);
        assert_eq!(env_or("ACCOUNTS_TEST_ENV_OR_UNSET", 7).unwrap(), 7);

        std::env::set_var("ACCOUNTS_TEST_ENV_OR_BAD", "lots");
        let err = env_or("ACCOUNTS_TEST_ENV_OR_BAD", 7).unwrap_err();
        assert!(err.to_string().contains("ACCOUNTS_TEST_ENV_OR_BAD"));
    }
}
