//! Runtime configuration read from `ROSTER_*` environment variables.

use std::time::Duration;

use roster_core::PageSizePolicy;
use tracing::warn;

pub const DEFAULT_SUBMIT_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    /// Snapshot database path. `None` means the persist crate's default location.
    pub db_path: Option<String>,
    pub page_sizes: PageSizePolicy,
    /// Simulated latency before a form submit is applied.
    pub submit_delay: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            page_sizes: PageSizePolicy::default(),
            submit_delay: Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
        }
    }
}

impl RosterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; invalid numbers fall back to defaults with a warning.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let num = |key: &str, fallback: u64| -> u64 {
            match get(key) {
                None => fallback,
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(v) => v,
                    Err(_) => {
                        warn!(key = key, value = %raw, "invalid number; using default");
                        fallback
                    }
                },
            }
        };
        let page = |key: &str, fallback: usize| -> usize {
            let v = num(key, fallback as u64) as usize;
            if v == 0 {
                warn!(key = key, "page size must be positive; using default");
                fallback
            } else {
                v
            }
        };
        Self {
            db_path: get("ROSTER_DB_PATH").filter(|p| !p.trim().is_empty()),
            page_sizes: PageSizePolicy {
                list: page("ROSTER_PAGE_SIZE_LIST", d.page_sizes.list),
                grid: page("ROSTER_PAGE_SIZE_GRID", d.page_sizes.grid),
            },
            submit_delay: Duration::from_millis(num("ROSTER_SUBMIT_DELAY_MS", DEFAULT_SUBMIT_DELAY_MS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_and_fallbacks() {
        let env: HashMap<&str, &str> = [
            ("ROSTER_PAGE_SIZE_LIST", "25"),
            ("ROSTER_PAGE_SIZE_GRID", "zero"),
            ("ROSTER_SUBMIT_DELAY_MS", "0"),
            ("ROSTER_DB_PATH", "/tmp/r.db"),
        ]
        .into_iter()
        .collect();
        let cfg = RosterConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.page_sizes, PageSizePolicy { list: 25, grid: 4 });
        assert_eq!(cfg.submit_delay, Duration::ZERO);
        assert_eq!(cfg.db_path.as_deref(), Some("/tmp/r.db"));

        let cfg = RosterConfig::from_lookup(|k| (k == "ROSTER_PAGE_SIZE_LIST").then(|| "0".to_string()));
        assert_eq!(cfg.page_sizes.list, 10);
    }
}
