use std::env;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_FILE: &str = "database/library.bin.gz";
pub const DEFAULT_ADMIN_PASSWORD: &str = "suisui2025";

/// Runtime settings, read once from the environment at startup
///
/// Everything has a default so a bare `cargo run` serves a working site:
/// `SUIREN_PORT` picks the listen port, `SUIREN_DATA` the library snapshot
/// file and `SUIREN_ADMIN_PASSWORD` the password the admin screens log in
/// with.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_file: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("SUIREN_PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_file = lookup("SUIREN_DATA").unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
        let admin_password =
            lookup("SUIREN_ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

        Config {
            port,
            data_file,
            admin_password,
        }
    }
}
