//! 集成测试用的脚本化协作者

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use wizard_apply::infrastructure::{Driver, PageStateProvider};
use wizard_apply::models::{
    ButtonInfo, ChoiceOption, DriverAction, InputInfo, PageSnapshot, Profile,
};
use wizard_apply::services::{GateDecision, HumanGate, HumanRequest, ReasoningOracle};
use wizard_apply::workflow::{ApplicationFlow, Collaborators, FlowSettings};

// ========== 页面构造 ==========

pub fn text_input(id: &str, placeholder: &str) -> InputInfo {
    InputInfo {
        id: Some(id.to_string()),
        input_type: Some("text".to_string()),
        placeholder: Some(placeholder.to_string()),
        ..InputInfo::default()
    }
}

pub fn file_input(id: &str, label: &str) -> InputInfo {
    InputInfo {
        id: Some(id.to_string()),
        input_type: Some("file".to_string()),
        label: Some(label.to_string()),
        ..InputInfo::default()
    }
}

pub fn select_input(id: &str, label: &str, options: &[(&str, &str)]) -> InputInfo {
    InputInfo {
        tag: "select".to_string(),
        id: Some(id.to_string()),
        label: Some(label.to_string()),
        options: options
            .iter()
            .map(|(label, value)| ChoiceOption::new(*label, *value))
            .collect(),
        ..InputInfo::default()
    }
}

pub fn page(title: &str, inputs: Vec<InputInfo>, buttons: &[&str]) -> PageSnapshot {
    PageSnapshot {
        url: format!("https://jobs.example/apply/{}", title.to_lowercase().replace(' ', "-")),
        title: title.to_string(),
        buttons: buttons.iter().map(|b| ButtonInfo::new(*b)).collect(),
        inputs,
        ..PageSnapshot::default()
    }
}

// ========== 浏览器 ==========

/// 按页面序列回放的浏览器
///
/// 点击非 submit 按钮会前进到下一页；点击 submit 类按钮记为已提交。
pub struct ScriptedBrowser {
    pages: Vec<PageSnapshot>,
    current: Mutex<usize>,
    failing_snapshots: Mutex<usize>,
    pub fields: Mutex<HashMap<String, String>>,
    pub set_calls: Mutex<Vec<(String, String)>>,
    pub clicks: Mutex<Vec<String>>,
    pub navigations: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<(String, String)>>,
    pub enters: Mutex<Vec<String>>,
    pub submitted: Mutex<bool>,
}

impl ScriptedBrowser {
    pub fn new(pages: Vec<PageSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            current: Mutex::new(0),
            failing_snapshots: Mutex::new(0),
            fields: Mutex::new(HashMap::new()),
            set_calls: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            enters: Mutex::new(Vec::new()),
            submitted: Mutex::new(false),
        })
    }

    /// 接下来 n 次快照返回传输错误
    pub fn fail_next_snapshots(&self, n: usize) {
        *self.failing_snapshots.lock().unwrap() = n;
    }

    /// 不经点击直接前进一页（模拟人工操作）
    pub fn advance(&self) {
        let mut current = self.current.lock().unwrap();
        *current = (*current + 1).min(self.pages.len() - 1);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn field(&self, id: &str) -> Option<String> {
        self.fields.lock().unwrap().get(id).cloned()
    }

    fn current_page(&self) -> PageSnapshot {
        let index = *self.current.lock().unwrap();
        self.pages[index].clone()
    }
}

#[async_trait]
impl PageStateProvider for ScriptedBrowser {
    async fn snapshot(&self) -> anyhow::Result<PageSnapshot> {
        {
            let mut failing = self.failing_snapshots.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                anyhow::bail!("target detached");
            }
        }
        Ok(self.current_page())
    }
}

#[async_trait]
impl Driver for ScriptedBrowser {
    async fn dispatch(&self, action: &DriverAction) -> anyhow::Result<String> {
        let page = self.current_page();
        match action {
            DriverAction::Click { identifier, .. } => {
                if !page.buttons.iter().any(|b| &b.text == identifier) {
                    return Ok(format!(
                        "Error: Could not find button with identifier '{}'",
                        identifier
                    ));
                }
                self.clicks.lock().unwrap().push(identifier.clone());
                if identifier.to_lowercase().contains("submit") {
                    *self.submitted.lock().unwrap() = true;
                } else {
                    self.advance();
                }
                Ok(format!("Successfully clicked button: {}", identifier))
            }
            DriverAction::SetValue {
                identifier, value, ..
            } => {
                if !page
                    .inputs
                    .iter()
                    .any(|i| i.identifier() == Some(identifier.as_str()))
                {
                    return Ok(format!("Error: element '{}' not found", identifier));
                }
                self.set_calls
                    .lock()
                    .unwrap()
                    .push((identifier.clone(), value.clone()));
                self.fields
                    .lock()
                    .unwrap()
                    .insert(identifier.clone(), value.clone());
                Ok(format!("Successfully filled field '{}'", identifier))
            }
            DriverAction::Navigate { url } => {
                self.navigations.lock().unwrap().push(url.clone());
                Ok(format!("Successfully navigated to: {}", url))
            }
            DriverAction::UploadFile { identifier, path } => {
                self.uploads
                    .lock()
                    .unwrap()
                    .push((identifier.clone(), path.clone()));
                Ok(format!("Successfully uploaded '{}' to '{}'", path, identifier))
            }
            DriverAction::PressEnter { identifier } => {
                self.enters.lock().unwrap().push(identifier.clone());
                Ok(format!("Successfully pressed Enter on input '{}'", identifier))
            }
        }
    }
}

// ========== LLM ==========

/// 按请求类型分别排队回复的 LLM
///
/// 负载里带 `form_questions` 的是答案请求，其余是提取请求。
#[derive(Default)]
pub struct ScriptedOracle {
    extract_replies: Mutex<VecDeque<String>>,
    resolve_replies: Mutex<VecDeque<String>>,
    pub extract_calls: Mutex<usize>,
    pub resolve_payloads: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(extract_replies: &[&str], resolve_replies: &[&str]) -> Arc<Self> {
        fn queue(replies: &[&str]) -> VecDeque<String> {
            replies.iter().map(|r| r.to_string()).collect()
        }
        Arc::new(Self {
            extract_replies: Mutex::new(queue(extract_replies)),
            resolve_replies: Mutex::new(queue(resolve_replies)),
            ..Self::default()
        })
    }

    pub fn extract_calls(&self) -> usize {
        *self.extract_calls.lock().unwrap()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, _system: &str, payload: &str) -> anyhow::Result<String> {
        let reply = if payload.contains("\"form_questions\"") {
            self.resolve_payloads
                .lock()
                .unwrap()
                .push(payload.to_string());
            self.resolve_replies.lock().unwrap().pop_front()
        } else {
            *self.extract_calls.lock().unwrap() += 1;
            self.extract_replies.lock().unwrap().pop_front()
        };
        reply.ok_or_else(|| anyhow::anyhow!("no scripted reply"))
    }
}

// ========== 人工确认 ==========

/// 按顺序给出决定；记录每次请求以及当时已发生的点击数
pub struct ScriptedGate {
    decisions: Mutex<VecDeque<GateDecision>>,
    observed: Option<Arc<ScriptedBrowser>>,
    pub requests: Mutex<Vec<HumanRequest>>,
    pub clicks_at_confirm: Mutex<Vec<usize>>,
}

impl ScriptedGate {
    pub fn new(decisions: &[GateDecision], observed: Option<Arc<ScriptedBrowser>>) -> Arc<Self> {
        Arc::new(Self {
            decisions: Mutex::new(decisions.iter().copied().collect()),
            observed,
            requests: Mutex::new(Vec::new()),
            clicks_at_confirm: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HumanGate for ScriptedGate {
    async fn confirm(&self, request: &HumanRequest) -> GateDecision {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(browser) = &self.observed {
            let clicks = browser.clicks.lock().unwrap().len();
            self.clicks_at_confirm.lock().unwrap().push(clicks);
        }
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(GateDecision::Abort)
    }
}

/// 永远不答复的操作者
pub struct SilentGate;

#[async_trait]
impl HumanGate for SilentGate {
    async fn confirm(&self, _request: &HumanRequest) -> GateDecision {
        std::future::pending::<()>().await;
        GateDecision::Abort
    }
}

// ========== 组装 ==========

pub fn settings() -> FlowSettings {
    FlowSettings {
        max_pages: 15,
        history_limit: 10,
        snapshot_retries: 3,
        resume_char_limit: 1_000,
        upload_path: Some("/tmp/resume.pdf".to_string()),
        call_timeout: Duration::from_secs(2),
        settle: Duration::from_millis(1),
    }
}

pub fn collaborators(
    browser: &Arc<ScriptedBrowser>,
    oracle: &Arc<ScriptedOracle>,
    gate: Arc<dyn HumanGate>,
) -> Collaborators {
    Collaborators {
        provider: browser.clone(),
        driver: browser.clone(),
        oracle: oracle.clone(),
        gate,
    }
}

/// 不会被触发的中止信号
pub fn no_abort() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

pub fn flow(collaborators: Collaborators, settings: FlowSettings) -> ApplicationFlow {
    ApplicationFlow::new(collaborators, settings, no_abort())
}

pub fn profile_with_phone(phone: &str) -> Profile {
    [("phone", phone), ("notice_period", "30 days")]
        .into_iter()
        .collect()
}
