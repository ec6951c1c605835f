use crate::config::toml_config::SecretsConfig;
use crate::core::Storage;
use crate::utils::error::{Result, StackError};
use rand::RngCore;

/// 金鑰長度（位元組），十六進位後為 64 個字元
pub const SECRET_KEY_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    /// 找不到範本，什麼都沒做
    TemplateMissing,
    /// 設定檔已建立或已存在，且佔位字串已被替換
    Generated { created: bool },
    /// 設定檔中沒有佔位字串，保留現有金鑰
    AlreadyProvisioned { created: bool },
}

pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; SECRET_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 產生 SearXNG 設定檔並填入隨機金鑰
pub struct SecretProvisioner<'a, S: Storage> {
    storage: &'a S,
    config: &'a SecretsConfig,
}

impl<'a, S: Storage> SecretProvisioner<'a, S> {
    pub fn new(storage: &'a S, config: &'a SecretsConfig) -> Self {
        Self { storage, config }
    }

    pub async fn provision(&self) -> Result<SecretOutcome> {
        let created = self.ensure_settings_file().await?;
        let Some(created) = created else {
            return Ok(SecretOutcome::TemplateMissing);
        };

        let bytes = self.storage.read_file(&self.config.settings_file).await?;
        let content = String::from_utf8(bytes).map_err(|source| StackError::InvalidUtf8 {
            path: self.config.settings_file.clone(),
            source,
        })?;

        // 每次都產生新值；只有仍含佔位字串時才會真的寫入
        let key = generate_secret_key();
        match substitute_placeholder(&content, &self.config.placeholder, &key) {
            Some(updated) => {
                self.storage
                    .write_file(&self.config.settings_file, updated.as_bytes())
                    .await?;
                tracing::info!("🔑 Secret key generated in {}", self.config.settings_file);
                Ok(SecretOutcome::Generated { created })
            }
            None => {
                tracing::debug!(
                    "No '{}' placeholder left in {}, keeping the existing key",
                    self.config.placeholder,
                    self.config.settings_file
                );
                Ok(SecretOutcome::AlreadyProvisioned { created })
            }
        }
    }

    /// `None` 表示找不到範本；否則回傳是否新建了設定檔
    async fn ensure_settings_file(&self) -> Result<Option<bool>> {
        if self.storage.exists(&self.config.settings_file).await {
            tracing::debug!("Settings file already exists at {}", self.config.settings_file);
            return Ok(Some(false));
        }

        if !self.storage.exists(&self.config.base_file).await {
            tracing::warn!(
                "⚠️ Base settings file not found at {}",
                self.config.base_file
            );
            return Ok(None);
        }

        tracing::info!(
            "📝 {} not found, creating it from {}",
            self.config.settings_file,
            self.config.base_file
        );
        let template = self.storage.read_file(&self.config.base_file).await?;
        self.storage
            .write_file(&self.config.settings_file, &template)
            .await?;
        Ok(Some(true))
    }

    /// 自動產生失敗時給使用者的手動步驟
    pub fn manual_instructions(&self) -> Vec<String> {
        let file = &self.config.settings_file;
        let placeholder = &self.config.placeholder;
        vec![
            format!(
                "Linux: sed -i \"s|{}|$(openssl rand -hex 32)|g\" {}",
                placeholder, file
            ),
            format!(
                "macOS: sed -i '' \"s|{}|$(openssl rand -hex 32)|g\" {}",
                placeholder, file
            ),
            format!(
                "Windows (PowerShell): $k = -join ((1..32) | ForEach-Object {{ '{{0:x2}}' -f (Get-Random -Max 256) }}); (Get-Content {f}) -replace '{p}', $k | Set-Content {f}",
                f = file,
                p = placeholder
            ),
        ]
    }
}

/// 只有內容含有佔位字串時回傳替換後的內容
pub fn substitute_placeholder(content: &str, placeholder: &str, key: &str) -> Option<String> {
    if placeholder.is_empty() || !content.contains(placeholder) {
        return None;
    }
    Some(content.replace(placeholder, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let key = generate_secret_key();
        assert_eq!(key.len(), SECRET_KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_secret_key());
    }

    #[test]
    fn test_substitute_placeholder() {
        let content = "server:\n  secret_key: \"ultrasecretkey\"\n";
        let updated = substitute_placeholder(content, "ultrasecretkey", "abc123").unwrap();
        assert_eq!(updated, "server:\n  secret_key: \"abc123\"\n");

        assert!(substitute_placeholder(&updated, "ultrasecretkey", "zzz").is_none());
        assert!(substitute_placeholder(content, "", "zzz").is_none());
    }
}
