use crate::config::toml_config::DirectiveConfig;

/// 對 compose 檔內容套用 capability-drop 開關後的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveTransition {
    /// 首次執行：指令已改成註解
    Relaxed(String),
    /// 已初始化：指令已還原
    Restored(String),
    /// 不需要寫檔
    Unchanged,
}

impl DirectiveTransition {
    pub fn new_text(&self) -> Option<&str> {
        match self {
            DirectiveTransition::Relaxed(text) | DirectiveTransition::Restored(text) => Some(text.as_str()),
            DirectiveTransition::Unchanged => None,
        }
    }
}

/// 純文字替換的開關，不解析 YAML。
///
/// 註解形式本身包含原指令字串，所以首次執行時只替換註解形式以外的部分，
/// 同一個 `first_run` 值重複套用第二次一定是 `Unchanged`。
#[derive(Debug, Clone)]
pub struct DirectiveToggle {
    active: String,
    commented: String,
}

impl DirectiveToggle {
    pub fn new(active: impl Into<String>, commented: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            commented: commented.into(),
        }
    }

    pub fn from_config(config: &DirectiveConfig) -> Self {
        Self::new(config.active.clone(), config.commented.clone())
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn commented(&self) -> &str {
        &self.commented
    }

    pub fn apply(&self, current: &str, first_run: bool) -> DirectiveTransition {
        if first_run {
            self.relax(current)
        } else {
            self.restore(current)
        }
    }

    fn relax(&self, current: &str) -> DirectiveTransition {
        let segments: Vec<&str> = current.split(self.commented.as_str()).collect();
        if !segments.iter().any(|segment| segment.contains(self.active.as_str())) {
            return DirectiveTransition::Unchanged;
        }

        let relaxed: Vec<String> = segments
            .iter()
            .map(|segment| segment.replace(self.active.as_str(), &self.commented))
            .collect();
        DirectiveTransition::Relaxed(relaxed.join(self.commented.as_str()))
    }

    fn restore(&self, current: &str) -> DirectiveTransition {
        if !current.contains(self.commented.as_str()) {
            return DirectiveTransition::Unchanged;
        }
        DirectiveTransition::Restored(current.replace(self.commented.as_str(), &self.active))
    }
}

impl Default for DirectiveToggle {
    fn default() -> Self {
        Self::from_config(&DirectiveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE: &str = "services:\n  searxng:\n    image: searxng/searxng\n    cap_drop: - ALL\n";

    #[test]
    fn test_first_run_comments_directive_once() {
        let toggle = DirectiveToggle::default();

        let DirectiveTransition::Relaxed(relaxed) = toggle.apply(COMPOSE, true) else {
            panic!("expected the directive to be relaxed");
        };
        assert_eq!(relaxed.matches(toggle.commented()).count(), 1);
        assert!(relaxed.contains("    # cap_drop: - ALL  # Temporarily commented out for first run\n"));

        // 第二次首次執行不應再疊加註解
        assert_eq!(toggle.apply(&relaxed, true), DirectiveTransition::Unchanged);
    }

    #[test]
    fn test_restore_after_initialisation() {
        let toggle = DirectiveToggle::default();
        let relaxed = toggle.apply(COMPOSE, true).new_text().unwrap().to_string();

        let DirectiveTransition::Restored(restored) = toggle.apply(&relaxed, false) else {
            panic!("expected the directive to be restored");
        };
        assert_eq!(restored, COMPOSE);
        assert_eq!(toggle.apply(&restored, false), DirectiveTransition::Unchanged);
    }

    #[test]
    fn test_no_directive_means_no_write() {
        let toggle = DirectiveToggle::default();
        let text = "services:\n  n8n:\n    image: n8nio/n8n\n";

        assert_eq!(toggle.apply(text, true), DirectiveTransition::Unchanged);
        assert_eq!(toggle.apply(text, false), DirectiveTransition::Unchanged);
    }

    #[test]
    fn test_steady_state_leaves_active_directive() {
        let toggle = DirectiveToggle::default();
        assert_eq!(toggle.apply(COMPOSE, false), DirectiveTransition::Unchanged);
    }

    #[test]
    fn test_mixed_text_only_relaxes_active_occurrences() {
        let toggle = DirectiveToggle::default();
        let mixed = format!("{}\n{}\n", toggle.commented(), toggle.active());

        let relaxed = toggle.apply(&mixed, true).new_text().unwrap().to_string();
        assert_eq!(relaxed, format!("{}\n{}\n", toggle.commented(), toggle.commented()));
    }
}
