use std::{net::IpAddr, str::FromStr};

use axum::http::HeaderValue;
use sqlx::{postgres::PgConnectOptions, ConnectOptions};

/// An error raised while reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{key} has an invalid value {value:?}")]
	Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub database_max_connections: u32,
	pub host: IpAddr,
	pub port: u16,
	/// Origins allowed to post from a browser. Empty allows none.
	pub cors_origins: Vec<HeaderValue>,
	/// Exports traces and metrics over OTLP when set.
	pub otlp_enabled: bool,
}

impl Config {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Connection options for the pool. Every statement is logged at INFO.
	pub fn connect_options(&self) -> Result<PgConnectOptions, Error> {
		let options = self
			.database_url
			.parse::<PgConnectOptions>()
			.map_err(|_| Error::Invalid {
				key: "DATABASE_URL",
				value: self.database_url.clone(),
			})?;

		Ok(options.log_statements(log::LevelFilter::Info))
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
	where
		F: Fn(&str) -> Option<String>,
	{
		let database_url = lookup("DATABASE_URL").ok_or(Error::Missing("DATABASE_URL"))?;

		Ok(Self {
			database_url,
			database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(10),
			host: parse(&lookup, "HOST")?.unwrap_or(IpAddr::from([127, 0, 0, 1])),
			port: parse(&lookup, "PORT")?.unwrap_or(3000),
			cors_origins: cors_origins(&lookup)?,
			otlp_enabled: parse(&lookup, "OTLP_ENABLED")?.unwrap_or(false),
		})
	}
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, Error>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
{
	let Some(value) = lookup(key) else {
		return Ok(None);
	};

	value
		.trim()
		.parse()
		.map(Some)
		.map_err(|_| Error::Invalid { key, value })
}

fn cors_origins<F>(lookup: &F) -> Result<Vec<HeaderValue>, Error>
where
	F: Fn(&str) -> Option<String>,
{
	let Some(value) = lookup("CORS_ORIGINS") else {
		return Ok(Vec::new());
	};

	value
		.split(',')
		.map(str::trim)
		.filter(|origin| !origin.is_empty())
		.map(|origin| {
			let invalid = || Error::Invalid {
				key: "CORS_ORIGINS",
				value: value.clone(),
			};

			// a wildcard cannot be mixed into an origin list
			if origin == "*" {
				return Err(invalid());
			}

			HeaderValue::from_str(origin).map_err(|_| invalid())
		})
		.collect()
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect::<HashMap<_, _>>();

		move |key| vars.get(key).cloned()
	}

	#[test]
	fn test_defaults() {
		let config =
			Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db")])).unwrap();

		assert_eq!(config.database_url, "postgres://localhost/db");
		assert_eq!(config.database_max_connections, 10);
		assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
		assert_eq!(config.port, 3000);
		assert!(config.cors_origins.is_empty());
		assert!(!config.otlp_enabled);
	}

	#[test]
	fn test_database_url_is_required() {
		let error = Config::from_lookup(lookup(&[])).unwrap_err();

		assert!(matches!(error, Error::Missing("DATABASE_URL")));
	}

	#[test]
	fn test_overrides() {
		let config = Config::from_lookup(lookup(&[
			("DATABASE_URL", "postgres://db"),
			("HOST", "0.0.0.0"),
			("PORT", "8080"),
			("DATABASE_MAX_CONNECTIONS", "4"),
			("CORS_ORIGINS", "https://a.example, https://b.example,"),
			("OTLP_ENABLED", "true"),
		]))
		.unwrap();

		assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
		assert_eq!(config.port, 8080);
		assert_eq!(config.database_max_connections, 4);
		assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
		assert!(config.otlp_enabled);
	}

	#[test]
	fn test_wildcard_cors_origin_is_invalid() {
		let error = Config::from_lookup(lookup(&[
			("DATABASE_URL", "postgres://db"),
			("CORS_ORIGINS", "https://a.example, *"),
		]))
		.unwrap_err();

		assert!(matches!(error, Error::Invalid { key: "CORS_ORIGINS", .. }));
	}

	#[test]
	fn test_connect_options() {
		let config =
			Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db:5433/posts")])).unwrap();
		let options = config.connect_options().unwrap();

		assert_eq!(options.get_port(), 5433);
		assert_eq!(options.get_database(), Some("posts"));

		let config = Config::from_lookup(lookup(&[("DATABASE_URL", "not a url")])).unwrap();
		let error = config.connect_options().unwrap_err();

		assert!(matches!(error, Error::Invalid { key: "DATABASE_URL", .. }));
	}

	#[test]
	fn test_invalid_port() {
		let error = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db"), ("PORT", "http")]))
			.unwrap_err();

		assert_eq!(error.to_string(), r#"PORT has an invalid value "http""#);
	}
}
