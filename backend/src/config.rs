use std::env;

use rocket::figment::providers::{Env, Format, Toml};
use rocket::figment::{Figment, Profile};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:notes.db";

/// Settings read from the Rocket figment when the store is opened.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    #[serde(default = "default_seed")]
    pub seed: bool,
}

fn default_seed() -> bool {
    true
}

/// Built-in values only; nothing is read from the environment or disk.
pub fn defaults() -> Figment {
    Figment::from(rocket::Config::default())
        .merge(("port", DEFAULT_PORT))
        .merge(("database_url", DEFAULT_DATABASE_URL))
        .merge(("seed", default_seed()))
}

/// Rocket's usual provider chain on top of [`defaults`]: `DATABASE_URL`,
/// then `Rocket.toml`, then `ROCKET_*` variables.
pub fn figment() -> Figment {
    let mut figment = defaults();
    if let Ok(database_url) = env::var("DATABASE_URL") {
        figment = figment.merge(("database_url", database_url));
    }

    figment
        .merge(Toml::file(Env::var_or("ROCKET_CONFIG", "Rocket.toml")).nested())
        .merge(Env::prefixed("ROCKET_").ignore(&["PROFILE"]).global())
        .select(Profile::from_env_or("ROCKET_PROFILE", rocket::Config::DEFAULT_PROFILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() {
        let figment = defaults();
        let settings: Settings = figment.extract().expect("settings");
        let config: rocket::Config = figment.extract().expect("rocket config");

        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert!(settings.seed);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn later_layers_win() {
        let figment = defaults()
            .merge(("database_url", "sqlite::memory:"))
            .merge(("seed", false));
        let settings: Settings = figment.extract().expect("settings");

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert!(!settings.seed);
    }
}
