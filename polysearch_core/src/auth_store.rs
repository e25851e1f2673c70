use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("persist error: {0}")]
    Persist(String),
}

/// Secrets keyed by their environment variable name (e.g. `BRAVE_API_KEY`).
pub trait AuthStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// A simple in-memory store, mainly for testing.
pub struct MemoryAuthStore {
    map: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self {
            map: std::sync::Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore for MemoryAuthStore {
    fn load(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map
            .lock()
            .map_err(|e| StoreError::Persist(format!("lock poisoned: {}", e)))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A file-backed JSON store at `~/.config/polysearch/auth.json` (Unix)
/// or `%APPDATA%/polysearch/auth.json` (Windows).
pub struct FileAuthStore {
    path: PathBuf,
}

impl FileAuthStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(crate::config::config_dir().join("auth.json"))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_map(&self) -> HashMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let s = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::Persist(format!("serde: {}", e)))?;
        std::fs::write(&self.path, &s).map_err(|e| StoreError::Persist(e.to_string()))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| StoreError::Persist(format!("chmod: {}", e)))?;
        }

        Ok(())
    }
}

impl AuthStore for FileAuthStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}
