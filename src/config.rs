use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
    limits: RequestLimits,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "PALLET_STACK_API_HOST";
    const PORT_VAR: &'static str = "PALLET_STACK_API_PORT";

    fn from_env() -> Self {
        let mut config = Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR));
        config.limits = RequestLimits::from_env();
        config
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
            limits: RequestLimits::default(),
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Size limits applied to incoming pack requests.
    pub fn limits(&self) -> RequestLimits {
        self.limits
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Upper bounds on a single pack request.
///
/// Every pallet receives the full box multiset, so work grows with
/// `max_units × max_pallets`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestLimits {
    /// Total boxes across all box types.
    pub max_units: u64,
    pub max_pallets: usize,
}

impl RequestLimits {
    pub const DEFAULT_MAX_UNITS: u64 = 2_000;
    pub const DEFAULT_MAX_PALLETS: usize = 20;
    const MAX_UNITS_VAR: &'static str = "PALLET_STACK_MAX_UNITS";
    const MAX_PALLETS_VAR: &'static str = "PALLET_STACK_MAX_PALLETS";

    fn from_env() -> Self {
        let max_units = env_string(Self::MAX_UNITS_VAR)
            .and_then(|raw| parse_limit(&raw, Self::MAX_UNITS_VAR))
            .unwrap_or(Self::DEFAULT_MAX_UNITS);
        let max_pallets = env_string(Self::MAX_PALLETS_VAR)
            .and_then(|raw| parse_limit(&raw, Self::MAX_PALLETS_VAR))
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(Self::DEFAULT_MAX_PALLETS);
        Self {
            max_units,
            max_pallets,
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_units: Self::DEFAULT_MAX_UNITS,
            max_pallets: Self::DEFAULT_MAX_PALLETS,
        }
    }
}

/// Configuration for the placement engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const HEIGHT_EPSILON_VAR: &'static str = "PALLET_STACK_HEIGHT_EPSILON";
    const GENERAL_EPSILON_VAR: &'static str = "PALLET_STACK_GENERAL_EPSILON";
    const VOLUMETRIC_DIVISOR_VAR: &'static str = "PALLET_STACK_VOLUMETRIC_DIVISOR";
    const PERFECT_FILL_VAR: &'static str = "PALLET_STACK_PERFECT_FILL_TOLERANCE";
    const PROBE_BUDGET_VAR: &'static str = "PALLET_STACK_PROBE_BUDGET";
    const PARALLEL_VAR: &'static str = "PALLET_STACK_PARALLEL_PALLETS";

    /// Probe cap per pallet when none is configured; 0 in the env disables it.
    pub const DEFAULT_PROBE_BUDGET: u64 = 50_000_000;

    fn from_env() -> Self {
        let height_epsilon = load_f64_with_warning(
            Self::HEIGHT_EPSILON_VAR,
            PackingConfig::DEFAULT_HEIGHT_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted height tolerance changes which boxes count as support",
        );

        let general_epsilon = load_f64_with_warning(
            Self::GENERAL_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted bounds tolerance may let boxes poke past the pallet edge",
        );

        let volumetric_divisor = load_f64_with_warning(
            Self::VOLUMETRIC_DIVISOR_VAR,
            PackingConfig::DEFAULT_VOLUMETRIC_DIVISOR,
            |value| value > 0.0,
            "must be greater than 0",
            "Non-standard volumetric divisor in use",
        );

        let perfect_fill_tolerance = load_f64_with_warning(
            Self::PERFECT_FILL_VAR,
            PackingConfig::DEFAULT_PERFECT_FILL_TOLERANCE,
            |value| (0.0..1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted perfect-fill tolerance",
        );

        let probe_budget = env_string(Self::PROBE_BUDGET_VAR)
            .and_then(|raw| parse_probe_budget(&raw, Self::PROBE_BUDGET_VAR))
            .unwrap_or(Some(Self::DEFAULT_PROBE_BUDGET));

        let parallel_pallets = env_string(Self::PARALLEL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_VAR))
            .unwrap_or(PackingConfig::DEFAULT_PARALLEL_PALLETS);

        let packing = PackingConfig::builder()
            .height_epsilon(height_epsilon)
            .general_epsilon(general_epsilon)
            .volumetric_divisor(volumetric_divisor)
            .perfect_fill_tolerance(perfect_fill_tolerance)
            .probe_budget(probe_budget)
            .parallel_pallets(parallel_pallets)
            .build();

        Self { packing }
    }

    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl From<PackingConfig> for OptimizerConfig {
    fn from(packing: PackingConfig) -> Self {
        Self { packing }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

/// `Some(None)` disables the budget (value 0), `None` means unparsable.
fn parse_probe_budget(raw: &str, var_name: &str) -> Option<Option<u64>> {
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("{} is 0: the search is unbounded.", var_name);
            Some(None)
        }
        Ok(value) => {
            info!("{} caps the search at {} probes per pallet.", var_name, value);
            Some(Some(value))
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as probe count: {}. Using the default cap.",
                var_name, raw, err
            );
            None
        }
    }
}

fn parse_limit(raw: &str, var_name: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("{} must be at least 1. Using default value.", var_name);
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "Could not parse {} ('{}'): {}. Using default value.",
                var_name, raw, err
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_warning(&raw, var_name, default, validator, invalid_hint, notice),
        None => default,
    }
}

fn parse_f64_with_warning(
    raw: &str,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                info!("{} ({} = {}).", notice, var_name, value);
            }
            value
        }
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_values() {
        for raw in ["1", "true", "YES", " y ", "On"] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true), "{raw}");
        }
        for raw in ["0", "false", "No", " n ", "OFF"] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false), "{raw}");
        }
        for raw in ["maybe", "2", "", "  "] {
            assert_eq!(parse_bool(raw, "TEST_VAR"), None, "{raw:?}");
        }
    }

    #[test]
    fn test_parse_probe_budget() {
        assert_eq!(parse_probe_budget("0", "TEST_VAR"), Some(None));
        assert_eq!(parse_probe_budget(" 5000 ", "TEST_VAR"), Some(Some(5000)));
        assert_eq!(parse_probe_budget("-3", "TEST_VAR"), None);
        assert_eq!(parse_probe_budget("lots", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_f64_falls_back_on_invalid_input() {
        let positive = |v: f64| v > 0.0;
        assert_eq!(
            parse_f64_with_warning("5000", "TEST_VAR", 6000.0, positive, "hint", "notice"),
            5000.0
        );
        assert_eq!(
            parse_f64_with_warning("-1", "TEST_VAR", 6000.0, positive, "hint", "notice"),
            6000.0
        );
        assert_eq!(
            parse_f64_with_warning("abc", "TEST_VAR", 6000.0, positive, "hint", "notice"),
            6000.0
        );
        assert_eq!(
            parse_f64_with_warning("inf", "TEST_VAR", 6000.0, positive, "hint", "notice"),
            6000.0
        );
    }

    #[test]
    fn test_parse_limit_rejects_zero_and_garbage() {
        assert_eq!(parse_limit("500", "TEST_VAR"), Some(500));
        assert_eq!(parse_limit("0", "TEST_VAR"), None);
        assert_eq!(parse_limit("-5", "TEST_VAR"), None);
        assert_eq!(parse_limit("many", "TEST_VAR"), None);
    }

    #[test]
    fn test_api_config_defaults_and_fallbacks() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert!(config.binds_to_all_interfaces());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.limits(), RequestLimits::default());

        let config = ApiConfig::from_values(Some("127.0.0.1".into()), Some("9000".into()));
        assert_eq!(config.display_host(), "127.0.0.1");
        assert!(!config.binds_to_all_interfaces());
        assert_eq!(config.port(), 9000);

        let config = ApiConfig::from_values(Some("not-an-ip".into()), Some("0".into()));
        assert_eq!(config.display_host(), "0.0.0.0");
        assert_eq!(config.port(), 8080);
    }
}
