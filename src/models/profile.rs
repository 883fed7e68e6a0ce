use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 首次运行时向用户收集的资料项 (字段名, 问题)
pub const PROFILE_QUESTIONS: &[(&str, &str)] = &[
    ("phone", "What is your mobile phone number?"),
    ("notice_period", "What is your notice period?"),
    ("current_ctc", "What is your current compensation?"),
    ("expected_ctc", "What is your expected compensation?"),
    ("preferred_location", "What is your preferred job location?"),
    ("work_authorization", "Are you authorized to work in the job's country? (Yes/No)"),
    ("relocation_willingness", "Are you willing to relocate if required? (Yes/No)"),
];

/// 候选人资料
///
/// 扁平的 字段名 → 字符串 映射，运行期间只读。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    fields: BTreeMap<String, String>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// 缺少哪些收集项
    pub fn missing_fields(&self) -> Vec<&'static str> {
        PROFILE_QUESTIONS
            .iter()
            .map(|(field, _)| *field)
            .filter(|field| self.get(field).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Profile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 待投递职位列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub urls: Vec<String>,
}
