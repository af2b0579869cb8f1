//! Provider and run configuration, loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NCLOUD_ACCESS_KEY`, `NCLOUD_SECRET_KEY` | required |
//! | `NCLOUD_REGION` | `KR` |
//! | `NCLOUD_SITE` | `public` (`gov`, `fin`) |
//! | `NCLOUD_SUPPORT_VPC` | `false` |
//! | `NCLOUD_API_URL`, `NCLOUD_NKS_API_URL` | site gateways |
//! | `NCLOUD_POLL_INTERVAL_SECS` / `NCLOUD_MAX_POLL_INTERVAL_SECS` | 2 / 20 |
//! | `NCLOUD_CREATE_TIMEOUT_SECS` | 1800 |
//! | `NCLOUD_UPDATE_TIMEOUT_SECS` | 1800 |
//! | `NCLOUD_DELETE_TIMEOUT_SECS` | 1800 |
//! | `NCLOUD_MANIFEST` | `ncloud.yaml` |
//! | `NCLOUD_STATE_FILE` | `ncloud-state.json` |
//! | `NCLOUD_ACTION` | `apply` (`destroy`, `lookup`) |

use crate::error::ControllerError;
use ncloud_client::{Credentials, DeploymentMode, Endpoints, Site};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Consecutive "not found" observations tolerated after a create
pub const DEFAULT_NOT_FOUND_TOLERANCE: u32 = 20;

/// Poll cadence of every wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_interval: Duration,
    pub not_found_tolerance: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(20),
            not_found_tolerance: DEFAULT_NOT_FOUND_TOLERANCE,
        }
    }
}

/// Deadlines per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        let thirty_minutes = Duration::from_secs(30 * 60);
        Self {
            create: thirty_minutes,
            update: thirty_minutes,
            delete: thirty_minutes,
        }
    }
}

/// Everything the reconciler needs to talk to one NCloud account
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credentials: Credentials,
    pub region: String,
    pub site: Site,
    pub endpoints: Endpoints,
    /// Capability flag: VPC (`vserver`) rather than classic (`server`) APIs
    pub support_vpc: bool,
    pub poll: PollSettings,
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                ControllerError::Config(format!("{} environment variable is required", key))
            })
        };

        let credentials = Credentials::new(
            required("NCLOUD_ACCESS_KEY")?,
            required("NCLOUD_SECRET_KEY")?,
        );

        let site_name = lookup("NCLOUD_SITE").unwrap_or_default();
        let site = Site::parse(&site_name).ok_or_else(|| {
            ControllerError::Config(format!(
                "NCLOUD_SITE must be one of public, gov, fin (got {:?})",
                site_name
            ))
        })?;

        let defaults = Endpoints::for_site(site);
        let endpoints = Endpoints::new(
            lookup("NCLOUD_API_URL").unwrap_or(defaults.api_url),
            lookup("NCLOUD_NKS_API_URL").unwrap_or(defaults.nks_url),
        );

        let poll_defaults = PollSettings::default();
        let timeout_defaults = Timeouts::default();
        let seconds = |key: &str, default: Duration| -> Result<Duration, ControllerError> {
            Ok(parse_var::<_, u64>(&lookup, key)?.map_or(default, Duration::from_secs))
        };

        let interval = seconds("NCLOUD_POLL_INTERVAL_SECS", poll_defaults.interval)?;
        if interval.is_zero() {
            return Err(ControllerError::Config(
                "NCLOUD_POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            credentials,
            region: lookup("NCLOUD_REGION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "KR".to_string()),
            site,
            endpoints,
            support_vpc: parse_var::<_, bool>(&lookup, "NCLOUD_SUPPORT_VPC")?.unwrap_or(false),
            poll: PollSettings {
                interval,
                max_interval: seconds("NCLOUD_MAX_POLL_INTERVAL_SECS", poll_defaults.max_interval)?,
                not_found_tolerance: poll_defaults.not_found_tolerance,
            },
            timeouts: Timeouts {
                create: seconds("NCLOUD_CREATE_TIMEOUT_SECS", timeout_defaults.create)?,
                update: seconds("NCLOUD_UPDATE_TIMEOUT_SECS", timeout_defaults.update)?,
                delete: seconds("NCLOUD_DELETE_TIMEOUT_SECS", timeout_defaults.delete)?,
            },
        })
    }

    /// Deployment mode selected by the capability flag
    pub fn mode(&self) -> DeploymentMode {
        DeploymentMode::from_support_vpc(self.support_vpc)
    }
}

/// Parse an optional variable; `Ok(None)` when unset or empty
fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ControllerError::Config(format!("{} has an invalid value: {:?}", key, raw))
        }),
    }
}

/// What a run of the binary does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    Destroy,
    /// Run the manifest's `data` lookups and print the results
    Lookup,
}

/// Where the manifest and state live, and what to do with them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    pub action: Action,
}

impl RunSettings {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let action = match lookup("NCLOUD_ACTION").as_deref().map(str::trim) {
            None | Some("") | Some("apply") => Action::Apply,
            Some("destroy") => Action::Destroy,
            Some("lookup") => Action::Lookup,
            Some(other) => {
                return Err(ControllerError::Config(format!(
                    "NCLOUD_ACTION must be apply, destroy or lookup (got {:?})",
                    other
                )));
            }
        };

        Ok(Self {
            manifest_path: lookup("NCLOUD_MANIFEST")
                .map_or_else(|| PathBuf::from("ncloud.yaml"), PathBuf::from),
            state_path: lookup("NCLOUD_STATE_FILE")
                .map_or_else(|| PathBuf::from("ncloud-state.json"), PathBuf::from),
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const KEYS: [(&str, &str); 2] = [("NCLOUD_ACCESS_KEY", "ak"), ("NCLOUD_SECRET_KEY", "sk")];

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_lookup(lookup_from(&KEYS)).expect("valid config");
        assert_eq!(config.region, "KR");
        assert_eq!(config.site, Site::Public);
        assert_eq!(config.mode(), DeploymentMode::Classic);
        assert_eq!(config.poll, PollSettings::default());
        assert_eq!(config.endpoints.api_url, "https://ncloud.apigw.ntruss.com");
    }

    #[test]
    fn test_missing_secret_key_is_rejected() {
        let err = ProviderConfig::from_lookup(lookup_from(&[("NCLOUD_ACCESS_KEY", "ak")]))
            .expect_err("secret key missing");
        assert!(err.to_string().contains("NCLOUD_SECRET_KEY"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = KEYS.to_vec();
        pairs.extend([
            ("NCLOUD_SUPPORT_VPC", "true"),
            ("NCLOUD_SITE", "gov"),
            ("NCLOUD_NKS_API_URL", "http://localhost:9000/"),
            ("NCLOUD_POLL_INTERVAL_SECS", "5"),
            ("NCLOUD_DELETE_TIMEOUT_SECS", "60"),
        ]);
        let config = ProviderConfig::from_lookup(lookup_from(&pairs)).expect("valid config");

        assert_eq!(config.mode(), DeploymentMode::Vpc);
        assert_eq!(config.endpoints.api_url, "https://ncloud.apigw.gov-ntruss.com");
        assert_eq!(config.endpoints.nks_url, "http://localhost:9000");
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.timeouts.delete, Duration::from_secs(60));
        assert_eq!(config.timeouts.create, Timeouts::default().create);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("NCLOUD_SUPPORT_VPC", "yes please"));
        assert!(ProviderConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = KEYS.to_vec();
        pairs.push(("NCLOUD_SITE", "moon"));
        assert!(ProviderConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("NCLOUD_POLL_INTERVAL_SECS", "0"));
        let err = ProviderConfig::from_lookup(lookup_from(&pairs)).expect_err("zero interval");
        assert!(err.to_string().contains("NCLOUD_POLL_INTERVAL_SECS"), "{}", err);
    }

    #[test]
    fn test_run_settings() {
        let settings = RunSettings::from_lookup(lookup_from(&[])).expect("defaults");
        assert_eq!(settings.action, Action::Apply);
        assert_eq!(settings.manifest_path, PathBuf::from("ncloud.yaml"));

        let settings = RunSettings::from_lookup(lookup_from(&[
            ("NCLOUD_ACTION", "destroy"),
            ("NCLOUD_STATE_FILE", "/tmp/state.json"),
        ]))
        .expect("valid settings");
        assert_eq!(settings.action, Action::Destroy);
        assert_eq!(settings.state_path, PathBuf::from("/tmp/state.json"));

        let settings = RunSettings::from_lookup(lookup_from(&[("NCLOUD_ACTION", "lookup")]))
            .expect("valid settings");
        assert_eq!(settings.action, Action::Lookup);

        assert!(RunSettings::from_lookup(lookup_from(&[("NCLOUD_ACTION", "plan")])).is_err());
    }
}
