use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Upper bound on the wait between requesting expansion and locating the target.
    pub expand_settle: Duration,
    /// Section id for top-level simple fields.
    pub general_section: String,
    pub substring_matching: bool,
    pub min_substring_len: usize,
    pub token_scan: bool,
    pub history_limit: usize,
    /// Re-validate after every committed edit.
    pub auto_validate: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            expand_settle: Duration::from_millis(250),
            general_section: "general".to_string(),
            substring_matching: true,
            min_substring_len: 3,
            token_scan: true,
            history_limit: 64,
            auto_validate: true,
        }
    }
}

impl EngineOptions {
    pub fn with_expand_settle(mut self, settle: Duration) -> Self {
        self.expand_settle = settle;
        self
    }

    pub fn with_general_section(mut self, id: impl Into<String>) -> Self {
        self.general_section = id.into();
        self
    }

    pub fn with_substring_matching(mut self, enabled: bool) -> Self {
        self.substring_matching = enabled;
        self
    }

    pub fn with_min_substring_len(mut self, len: usize) -> Self {
        self.min_substring_len = len;
        self
    }

    pub fn with_token_scan(mut self, enabled: bool) -> Self {
        self.token_scan = enabled;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_auto_validate(mut self, enabled: bool) -> Self {
        self.auto_validate = enabled;
        self
    }
}
