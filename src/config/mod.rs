use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .figcaprc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
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
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("EXEC_TIMEOUT").unwrap_or(60))
    }

    pub fn python_path(&self) -> String {
        self.get("PYTHON_PATH").unwrap_or_else(|| "python3".into())
    }

    pub fn default_model(&self) -> String {
        self.get("DEFAULT_MODEL").unwrap_or_else(|| "gpt-4o".into())
    }

    pub fn max_tokens(&self) -> u32 {
        self.get_u64("MAX_TOKENS")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(1024)
    }

    pub fn arxiv_base_url(&self) -> String {
        self.get("ARXIV_BASE_URL")
            .unwrap_or_else(|| "https://arxiv.org".into())
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or FIGCAP_*/OPENAI_* for forward-compat
    const KEYS: &[&str] = &[
        "OPENAI_API_KEY",
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "DEFAULT_MODEL",
        "MAX_TOKENS",
        "PYTHON_PATH",
        "EXEC_TIMEOUT",
        "ARXIV_BASE_URL",
    ];

    KEYS.contains(&k) || k.starts_with("FIGCAP_") || k.starts_with("OPENAI_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("figcap").join(".figcaprc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("EXEC_TIMEOUT".into(), "60".into());
    m.insert("MAX_TOKENS".into(), "1024".into());

    // Strings
    m.insert("DEFAULT_MODEL".into(), "gpt-4o".into());
    m.insert("API_BASE_URL".into(), "default".into());
    m.insert("PYTHON_PATH".into(), "python3".into());
    m.insert("ARXIV_BASE_URL".into(), "https://arxiv.org".into());

    m
}
