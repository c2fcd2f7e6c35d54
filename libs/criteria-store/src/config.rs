use serde::{Deserialize, Serialize};
use tracing::warn;

use criteria_core::{Error, Result};

/// Paging knobs shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Keys cursor checksums. Without it cursors are only integrity-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_secret: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cursor_secret: None,
        }
    }
}

impl QueryConfig {
    pub fn limits(&self) -> LimitCfg {
        LimitCfg {
            default: self.default_page_size,
            max: self.max_page_size,
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

impl Default for LimitCfg {
    fn default() -> Self {
        QueryConfig::default().limits()
    }
}

/// Resolve the requested page size: absent means the default, zero is rejected,
/// anything above the cap is clamped to it.
pub fn clamp_limit(req: Option<u64>, cfg: LimitCfg) -> Result<u64> {
    let l = req.unwrap_or(cfg.default);
    if l == 0 {
        return Err(Error::InvalidPageSize(l));
    }
    if l > cfg.max {
        warn!(requested = l, max = cfg.max, "page size clamped");
        return Ok(cfg.max);
    }
    Ok(l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = QueryConfig::default();
        assert_eq!(cfg.limits(), LimitCfg { default: 10, max: 100 });
        assert_eq!(clamp_limit(None, cfg.limits()), Ok(10));
    }

    #[test]
    fn zero_is_rejected_and_large_is_clamped() {
        let cfg = LimitCfg { default: 5, max: 20 };
        assert_eq!(clamp_limit(Some(0), cfg), Err(Error::InvalidPageSize(0)));
        assert_eq!(clamp_limit(Some(21), cfg), Ok(20));
        assert_eq!(clamp_limit(Some(20), cfg), Ok(20));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg: QueryConfig =
            serde_json::from_value(serde_json::json!({"max_page_size": 50})).unwrap();
        assert_eq!(cfg.default_page_size, 10);
        assert_eq!(cfg.max_page_size, 50);
        assert!(serde_json::from_value::<QueryConfig>(serde_json::json!({"pagesize": 1})).is_err());
    }
}
