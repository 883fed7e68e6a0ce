use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（连接已有浏览器时使用）
    pub browser_debug_port: u16,
    /// 是否启动无头浏览器而不是连接已有浏览器
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 待投递职位列表（TOML）
    pub jobs_file: String,
    /// 候选人资料（TOML）
    pub profile_path: String,
    /// 简历文件（.txt / .md / .pdf）
    pub resume_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败记录文件
    pub warn_file: String,
    /// 打开申请向导的入口按钮文字
    pub entry_button_label: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    // --- 流程配置 ---
    /// 发送给 LLM 的简历最大字符数
    pub resume_char_limit: usize,
    /// 动作历史保留条数
    pub history_limit: usize,
    /// 单个申请最多处理的向导页数
    pub max_wizard_pages: usize,
    /// 每次驱动调用的最长等待（毫秒）
    pub driver_timeout_ms: u64,
    /// 字段之间的稳定等待（毫秒）
    pub settle_ms: u64,
    /// 页面快照失败时的重试次数
    pub snapshot_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            jobs_file: "jobs.toml".to_string(),
            profile_path: "user_profile.toml".to_string(),
            resume_path: "resume.txt".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
            entry_button_label: "Easy Apply".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.1,
            resume_char_limit: 15_000,
            history_limit: 10,
            max_wizard_pages: 15,
            driver_timeout_ms: 20_000,
            settle_ms: 1_000,
            snapshot_retries: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，未设置或无法解析的项保留默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let parsed = |key: &'static str| ParsedVar {
            key,
            raw: lookup(key),
        };
        Self {
            browser_debug_port: parsed("BROWSER_DEBUG_PORT").or(default.browser_debug_port),
            headless: parsed("HEADLESS").or(default.headless),
            chrome_executable: lookup("CHROME_EXECUTABLE").or(default.chrome_executable),
            jobs_file: lookup("JOBS_FILE").unwrap_or(default.jobs_file),
            profile_path: lookup("PROFILE_PATH").unwrap_or(default.profile_path),
            resume_path: lookup("RESUME_PATH").unwrap_or(default.resume_path),
            verbose_logging: parsed("VERBOSE_LOGGING").or(default.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            warn_file: lookup("WARN_FILE").unwrap_or(default.warn_file),
            entry_button_label: lookup("ENTRY_BUTTON_LABEL").unwrap_or(default.entry_button_label),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: parsed("LLM_TEMPERATURE").or(default.llm_temperature),
            resume_char_limit: parsed("RESUME_CHAR_LIMIT").or(default.resume_char_limit),
            history_limit: parsed("HISTORY_LIMIT").or(default.history_limit),
            max_wizard_pages: parsed("MAX_WIZARD_PAGES").or(default.max_wizard_pages),
            driver_timeout_ms: parsed("DRIVER_TIMEOUT_MS").or(default.driver_timeout_ms),
            settle_ms: parsed("SETTLE_MS").or(default.settle_ms),
            snapshot_retries: parsed("SNAPSHOT_RETRIES").or(default.snapshot_retries),
        }
    }

    /// 单次驱动调用的超时
    pub fn driver_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.driver_timeout_ms)
    }

    /// 字段之间的稳定等待
    pub fn settle(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_ms)
    }
}

/// 环境变量原始值，按字段类型解析
struct ParsedVar {
    key: &'static str,
    raw: Option<String>,
}

impl ParsedVar {
    fn or<T: std::str::FromStr>(self, default: T) -> T {
        let Some(raw) = self.raw else {
            return default;
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                let err = ConfigError::EnvVarParseFailed {
                    var_name: self.key.to_string(),
                    value: raw,
                    expected_type: std::any::type_name::<T>().to_string(),
                };
                tracing::warn!("⚠️ {}，使用默认值", err);
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_overrides_and_keeps_defaults() {
        let vars: HashMap<&str, &str> = [
            ("MAX_WIZARD_PAGES", "4"),
            ("HEADLESS", "true"),
            ("LLM_MODEL_NAME", "local-model"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.max_wizard_pages, 4);
        assert!(config.headless);
        assert_eq!(config.llm_model_name, "local-model");
        assert_eq!(config.resume_char_limit, 15_000);
        assert_eq!(config.entry_button_label, "Easy Apply");
    }

    #[test]
    fn test_unparsable_value_falls_back_to_default() {
        let config = Config::from_lookup(|k| (k == "DRIVER_TIMEOUT_MS").then(|| "soon".to_string()));
        assert_eq!(config.driver_timeout_ms, 20_000);
    }
}
