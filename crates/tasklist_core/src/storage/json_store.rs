use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key-value store backed by a single JSON object file.
///
/// The whole file is replaced on every `set`, so the file always mirrors the
/// in-memory entries. A file that does not parse is moved aside to
/// `<name>.corrupt` and the store opens empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let entries = load_entries(path)?;
        debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self {
            path: path.to_path_buf(),
            entries: RefCell::new(entries),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        save_entries(&self.path, &self.entries.borrow())
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, AppError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    match serde_json::from_str(&content) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            let aside = corrupt_path(path);
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %err,
                "store file is corrupt, starting empty"
            );
            std::fs::rename(path, &aside)
                .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
            Ok(BTreeMap::new())
        }
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn save_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|err| AppError::io(err.to_string()))?;

    let content = serde_json::to_string_pretty(entries)?;
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| AppError::io(err.to_string()))?;
    temp.write_all(content.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|err| AppError::io(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| AppError::io(format!("failed to persist {}: {}", path.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}
