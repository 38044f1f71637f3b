//! Runtime configuration read from the environment.
//!
//! | Variable                     | Default                | Meaning                          |
//! |------------------------------|------------------------|----------------------------------|
//! | `RESULTSD_WORKSPACE`         | unset                  | workspace opened at startup      |
//! | `RESULTSD_SECRET`            | `dev-secret-change-me` | password-reset signing key       |
//! | `RESULTSD_RESET_TTL_SECS`    | `1800`                 | password-reset link lifetime     |
//! | `RESULTSD_ARGON2_MEMORY_KIB` | `19456`                | argon2 memory cost               |
//! | `RESULTSD_ARGON2_ITERATIONS` | `2`                    | argon2 time cost                 |

use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_RESET_TTL_SECS: i64 = 30 * 60;
const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
const DEFAULT_ARGON2_ITERATIONS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub secret: String,
    pub reset_ttl_secs: i64,
    pub hash_cost: HashCost,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            secret: DEFAULT_SECRET.to_string(),
            reset_ttl_secs: DEFAULT_RESET_TTL_SECS,
            hash_cost: HashCost::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let workspace = non_empty("RESULTSD_WORKSPACE").map(PathBuf::from);
        let secret = non_empty("RESULTSD_SECRET").unwrap_or(defaults.secret);

        let reset_ttl_secs = match non_empty("RESULTSD_RESET_TTL_SECS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("RESULTSD_RESET_TTL_SECS must be a positive integer, got {v:?}"))?,
            None => defaults.reset_ttl_secs,
        };
        let memory_kib = match non_empty("RESULTSD_ARGON2_MEMORY_KIB") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("RESULTSD_ARGON2_MEMORY_KIB must be an integer, got {v:?}"))?,
            None => defaults.hash_cost.memory_kib,
        };
        let iterations = match non_empty("RESULTSD_ARGON2_ITERATIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("RESULTSD_ARGON2_ITERATIONS must be an integer, got {v:?}"))?,
            None => defaults.hash_cost.iterations,
        };

        Ok(Self {
            workspace,
            secret,
            reset_ttl_secs,
            hash_cost: HashCost {
                memory_kib,
                iterations,
            },
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}
