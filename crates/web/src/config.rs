use std::{env, error::Error, fmt, net::SocketAddr, path::PathBuf, str::FromStr};

use tracker::DEFAULT_NEAREST_STOPS;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.variable, self.value)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub bind_address: SocketAddr,
    pub nearest_stops: usize,
    /// Route definitions imported at startup.
    pub seed_file: Option<PathBuf>,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        Ok(Self {
            bind_address: parse_or(&lookup, "WEB_BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            nearest_stops: match lookup("NEAREST_STOPS_COUNT") {
                Some(value) => parse("NEAREST_STOPS_COUNT", value)?,
                None => DEFAULT_NEAREST_STOPS,
            },
            seed_file: lookup("SEED_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse<T: FromStr>(variable: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError { variable, value })
}

fn parse_or<F, T>(lookup: &F, variable: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    parse(variable, lookup(variable).unwrap_or_else(|| default.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&'static str, &str)]) -> Result<WebConfig, ConfigError> {
        let vars = vars
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect::<HashMap<_, _>>();
        WebConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.nearest_stops, 4);
        assert_eq!(config.seed_file, None);
    }

    #[test]
    fn reads_variables() {
        let config = config(&[
            ("WEB_BIND_ADDRESS", "127.0.0.1:3000"),
            ("NEAREST_STOPS_COUNT", "6"),
            ("SEED_FILE", "routes.json"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.nearest_stops, 6);
        assert_eq!(config.seed_file, Some(PathBuf::from("routes.json")));
    }

    #[test]
    fn rejects_garbage() {
        let error = config(&[("NEAREST_STOPS_COUNT", "many")]).unwrap_err();
        assert_eq!(error.variable, "NEAREST_STOPS_COUNT");
    }
}
