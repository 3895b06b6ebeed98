use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

use crate::session::SessionSettings;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut cfg = Self::from_file(&default_config_path());

        // Environment wins over the rc file
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }
        cfg
    }

    /// Defaults overlaid by `path`, without consulting the environment.
    pub fn from_file(path: &Path) -> Self {
        let mut map = default_map();
        if let Ok(file) = fs::File::open(path) {
            let reader = BufReader::new(file);
            for line in reader.lines().map_while(Result::ok) {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((k, v)) = line.split_once('=') {
                    map.insert(k.trim().to_string(), v.trim().to_string());
                }
            }
        } else {
            tracing::debug!(path = %path.display(), "no rc file, using defaults");
        }
        Self {
            inner: map,
            config_path: path.to_path_buf(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn log_path(&self) -> PathBuf {
        self.get_path("LOG_PATH")
            .unwrap_or_else(|| env::temp_dir().join("cad_console").join("logs"))
    }

    pub fn log_level(&self) -> String {
        self.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string())
    }

    pub fn document_name(&self) -> String {
        self.get("DOCUMENT_NAME")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    pub fn session_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();
        SessionSettings {
            editor_lines: self
                .get_usize("EDITOR_LINES")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.editor_lines),
            output_lines: self
                .get_usize("OUTPUT_LINES")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.output_lines),
            preload_sample: self.get_bool("PRELOAD_SAMPLE"),
        }
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "EDITOR_LINES",
        "OUTPUT_LINES",
        "PRELOAD_SAMPLE",
        "START_WITH_DESIGN",
        "DOCUMENT_NAME",
        "LOG_LEVEL",
        "LOG_PATH",
    ];

    KEYS.contains(&k) || k.starts_with("CADCON_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("cad_console").join(".cadconrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let temp = env::temp_dir().join("cad_console");

    m.insert(
        "LOG_PATH".into(),
        temp.join("logs").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("EDITOR_LINES".into(), "20".into());
    m.insert("OUTPUT_LINES".into(), "5".into());

    // Strings
    m.insert("DOCUMENT_NAME".into(), "Untitled".into());
    m.insert("LOG_LEVEL".into(), "info".into());

    // Bools as strings
    m.insert("PRELOAD_SAMPLE".into(), "true".into());
    m.insert("START_WITH_DESIGN".into(), "true".into());

    m
}
