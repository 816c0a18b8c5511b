use std::{collections::HashMap, fs};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    /// Title used for converted HTML pages that carry no `<title>`.
    pub site_title: String,
    /// Path of the page hosting iframe-rendered HTML responses.
    pub frame_url: String,
    /// Where `/admin/turbo-init/` sends the shell when no path is given.
    pub admin_home: String,
    /// Largest HTML body the negotiation layer buffers for conversion.
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8000".into(),
            site_title: "Wagtail Turbo".into(),
            frame_url: "/admin/turbo-frame/".into(),
            admin_home: "/admin/".into(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, "ignoring unreadable server.toml");
            return;
        }
    };

    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("site_title") {
        settings.site_title = v.clone();
    }
    if let Some(v) = file_cfg.get("frame_url") {
        settings.frame_url = v.clone();
    }
    if let Some(v) = file_cfg.get("admin_home") {
        settings.admin_home = v.clone();
    }
    if let Some(v) = file_cfg.get("max_body_bytes") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("APP__SITE_TITLE") {
        settings.site_title = v;
    }
    if let Some(v) = lookup("APP__FRAME_URL") {
        settings.frame_url = v;
    }
    if let Some(v) = lookup("APP__ADMIN_HOME") {
        settings.admin_home = v;
    }

    if let Some(v) = lookup("APP__MAX_BODY_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
