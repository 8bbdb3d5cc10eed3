use super::constants::MODEL_FILE;

/// Runtime options read from the page URL, e.g. `?testing=1&log=debug`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Run without the hosting player: flags keep their defaults and no
    /// variables are written.
    pub testing: bool,
    pub log_level: log::Level,
    /// Prefix for every asset URL; always ends with `/`.
    pub asset_base: String,
    pub model_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            testing: false,
            log_level: log::Level::Info,
            asset_base: "./".to_string(),
            model_file: MODEL_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a `location.search` string (leading `?` optional). Unknown keys
    /// are ignored and malformed values keep their defaults.
    pub fn from_query(query: &str) -> Self {
        let mut cfg = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "testing" => {
                    if let Some(b) = parse_bool(&value) {
                        cfg.testing = b;
                    }
                }
                "log" => {
                    if let Ok(level) = value.parse::<log::Level>() {
                        cfg.log_level = level;
                    }
                }
                "assets" if !value.is_empty() => {
                    let mut base = value.into_owned();
                    if !base.ends_with('/') {
                        base.push('/');
                    }
                    cfg.asset_base = base;
                }
                "model" if !value.is_empty() => cfg.model_file = value.into_owned(),
                _ => {}
            }
        }
        cfg
    }

    pub fn asset_url(&self, relative: &str) -> String {
        format!("{}{}", self.asset_base, relative)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
