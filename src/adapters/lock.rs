use crate::utils::error::{Result, StackError};
use fs2::FileExt;
use std::fs;
use std::path::{Path, PathBuf};

/// 專案命名空間的建議性排他鎖，drop 時釋放
#[derive(Debug)]
pub struct NamespaceLock {
    file: fs::File,
    path: PathBuf,
}

impl NamespaceLock {
    /// 不等待；已被其他程序持有時回傳 `NamespaceLocked`
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| StackError::NamespaceLocked {
                path: path.display().to_string(),
            })?;

        tracing::debug!("🔐 Acquired namespace lock {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        tracing::debug!("🔓 Released namespace lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_until_released() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".localai.lock");

        let first = NamespaceLock::acquire(&path).unwrap();
        let err = NamespaceLock::acquire(&path).unwrap_err();
        assert!(matches!(err, StackError::NamespaceLocked { .. }));

        drop(first);
        assert!(NamespaceLock::acquire(&path).is_ok());
    }
}
