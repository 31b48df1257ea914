use crate::ambient::AmbientRouteDataKey;
use crate::convention::PrefixMode;
use crate::redirect::RedirectOptions;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// What to do with a request whose path is not in its localized form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonLocalizedUrlHandling {
    /// Redirect to the localized path
    #[default]
    Redirect,
    /// Respond with 404
    NotFound,
    /// Serve it anyway
    ContinueProcessing,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub path_base: String,

    // Resources
    pub resources_dir: PathBuf,
    pub resource_name: String,

    // Cultures
    pub default_culture: String,
    pub supported_cultures: Vec<String>,

    // Routing
    pub lowercase_urls: bool,
    pub culture_route_key: String,
    pub culture_constraint_key: Option<String>,
    pub prefix_mode: PrefixMode,
    pub ambient_route_keys: Vec<AmbientRouteDataKey>,

    // Redirects
    pub redirect: RedirectOptions,
    pub non_localized_url_handling: NonLocalizedUrlHandling,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let redirect_defaults = RedirectOptions::default();

        Ok(Self {
            // Server
            port: var("PORT")
                .map(|v| v.parse().context("PORT must be a valid port number"))
                .transpose()?
                .unwrap_or(8080),
            path_base: normalize_path_base(&var("PATH_BASE").unwrap_or_default()),

            // Resources
            resources_dir: var("RESOURCES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("resources")),
            resource_name: var("RESOURCE_NAME").unwrap_or_else(|| "Url".to_string()),

            // Cultures
            default_culture: var("DEFAULT_CULTURE").unwrap_or_else(|| "en-US".to_string()),
            supported_cultures: var("SUPPORTED_CULTURES")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| {
                    ["en-US", "es", "fr", "de"]
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                }),

            // Routing
            lowercase_urls: parse_bool(var("LOWERCASE_URLS"), "LOWERCASE_URLS", true)?,
            culture_route_key: var("CULTURE_ROUTE_KEY").unwrap_or_else(|| "culture".to_string()),
            culture_constraint_key: match lookup("CULTURE_CONSTRAINT_KEY") {
                Some(value) if value.trim().is_empty() => None,
                Some(value) => Some(value.trim().to_string()),
                None => Some("cultureCheck".to_string()),
            },
            prefix_mode: parse_prefix_mode(var("CULTURE_PREFIX_MODE"))?,
            ambient_route_keys: match var("AMBIENT_ROUTE_KEYS") {
                Some(value) => parse_ambient_keys(&value)?,
                None => vec![
                    AmbientRouteDataKey::new("area", false),
                    AmbientRouteDataKey::new("culture", true),
                    AmbientRouteDataKey::new("ui-culture", true),
                ],
            },

            // Redirects
            redirect: RedirectOptions {
                redirect_culture_less_to_default: parse_bool(
                    var("REDIRECT_CULTURELESS_TO_DEFAULT"),
                    "REDIRECT_CULTURELESS_TO_DEFAULT",
                    redirect_defaults.redirect_culture_less_to_default,
                )?,
                redirect_unsupported_cultures: parse_bool(
                    var("REDIRECT_UNSUPPORTED_CULTURES"),
                    "REDIRECT_UNSUPPORTED_CULTURES",
                    redirect_defaults.redirect_unsupported_cultures,
                )?,
            },
            non_localized_url_handling: parse_non_localized_handling(var(
                "NON_LOCALIZED_URL_HANDLING",
            ))?,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_path_base(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_bool(value: Option<String>, key: &str, default: bool) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => bail!("{} must be true or false, got '{}'", key, other),
        },
    }
}

fn parse_prefix_mode(value: Option<String>) -> Result<PrefixMode> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(PrefixMode::default()),
        Some(v) => match v.as_str() {
            "optional" => Ok(PrefixMode::Optional),
            "mandatory" => Ok(PrefixMode::Mandatory),
            other => bail!(
                "CULTURE_PREFIX_MODE must be 'optional' or 'mandatory', got '{}'",
                other
            ),
        },
    }
}

fn parse_non_localized_handling(value: Option<String>) -> Result<NonLocalizedUrlHandling> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(NonLocalizedUrlHandling::default()),
        Some(v) => match v.as_str() {
            "redirect" => Ok(NonLocalizedUrlHandling::Redirect),
            "not-found" | "404" => Ok(NonLocalizedUrlHandling::NotFound),
            "continue" => Ok(NonLocalizedUrlHandling::ContinueProcessing),
            other => bail!(
                "NON_LOCALIZED_URL_HANDLING must be redirect, not-found or continue, got '{}'",
                other
            ),
        },
    }
}

/// Parse `key:bool` pairs, e.g. `area:false,culture:true`. A bare key
/// round-trips.
fn parse_ambient_keys(value: &str) -> Result<Vec<AmbientRouteDataKey>> {
    split_list(value)
        .into_iter()
        .map(|item| match item.split_once(':') {
            Some((key, round_trip)) => {
                let round_trip = parse_bool(
                    Some(round_trip.to_string()),
                    "AMBIENT_ROUTE_KEYS",
                    true,
                )?;
                Ok(AmbientRouteDataKey::new(key.trim(), round_trip))
            }
            None => Ok(AmbientRouteDataKey::new(item, true)),
        })
        .collect()
}
