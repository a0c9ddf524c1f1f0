use std::path::Path;

use sfh_lib::{Config, HarnessError};
use tracing::debug;

use crate::cli::GlobalArgs;

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/sfh/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, HarnessError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        HarnessError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;
    Ok(cfg)
}

/// Apply CLI flags on top of the loaded config.
pub fn apply_overrides(mut config: Config, args: &GlobalArgs) -> Config {
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(product_path) = &args.product_path {
        config.product_path = product_path.clone();
    }
    if let Some(viewport) = args.viewport {
        config.browser.viewport = viewport;
    }
    if args.headed {
        config.browser.headless = false;
    }
    config
}

/// Load, override and validate; the effective config is logged at debug level.
pub fn resolve_config(args: &GlobalArgs) -> Result<Config, HarnessError> {
    let config = apply_overrides(load_config(args.config.as_deref())?, args);
    config.validate().map_err(|e| {
        let prefix = args
            .config
            .as_deref()
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        HarnessError::Config(prefix)
    })?;
    debug!(
        "{}",
        format_effective_config(&config, args.config.as_deref())
    );
    Ok(config)
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let viewport = config.browser.viewport;
    format!(
        "Effective config [{source}]: base_url={}, product_path={}, viewport={}x{}, headless={}, cache_ttl={:?}, max_variant_attempts={}, timeouts: nav={:?}, element={:?}, checkout={:?}",
        config.base_url,
        config.product_path,
        viewport.width,
        viewport.height,
        config.browser.headless,
        config.timings.cache_ttl,
        config.max_variant_attempts,
        config.timings.navigation_timeout,
        config.timings.element_timeout,
        config.timings.checkout_load_timeout,
    )
}
