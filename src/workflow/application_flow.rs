//! 申请处理流程 - 流程层
//!
//! 核心职责：驱动"一次申请"跨越多个向导页面
//!
//! 每页流程：
//! 1. collecting：读取快照，提取问题
//! 2. filling：生成答案，填写有值的字段
//! 3. awaiting_human：有答不上的问题时等待人工确认
//! 4. submitting：点击一个提交类按钮，按结果翻页、结束或失败

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::{with_deadline, Driver, PageStateProvider};
use crate::models::{
    ActionHistory, Answer, ApplicationOutcome, ApplicationState, ApplicationStatus, PageSnapshot,
    Profile, Question, SubmitOutcome,
};
use crate::services::{
    AnswerResolver, FieldFiller, GateDecision, HumanGate, HumanRequest, QuestionExtractor,
    ReasoningOracle, SubmissionController,
};
use crate::workflow::application_ctx::ApplicationCtx;
use crate::workflow::transitions::{transition, FlowEvent};

/// 发给 LLM 的表单 HTML 最大字符数
const MAX_EXTRACT_PAYLOAD_CHARS: usize = 40_000;

/// 流程依赖的外部协作者
///
/// 一次申请期间由流程独占，每个组件调用时临时借用。
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn PageStateProvider>,
    pub driver: Arc<dyn Driver>,
    pub oracle: Arc<dyn ReasoningOracle>,
    pub gate: Arc<dyn HumanGate>,
}

/// 流程参数
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub max_pages: usize,
    pub history_limit: usize,
    pub snapshot_retries: usize,
    pub resume_char_limit: usize,
    /// 文件上传类问题使用的文件（简历）
    pub upload_path: Option<String>,
    pub call_timeout: Duration,
    pub settle: Duration,
}

impl From<&Config> for FlowSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_pages: config.max_wizard_pages,
            history_limit: config.history_limit,
            snapshot_retries: config.snapshot_retries,
            resume_char_limit: config.resume_char_limit,
            upload_path: Some(config.resume_path.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            call_timeout: config.driver_timeout(),
            settle: config.settle(),
        }
    }
}

/// 一次申请的完整结果
#[derive(Debug, Clone)]
pub struct ApplicationReport {
    pub outcome: ApplicationOutcome,
    /// 结束时的状态
    pub state: ApplicationState,
    /// 经历过的状态序列（含初始状态）
    pub trace: Vec<ApplicationStatus>,
    /// 交给人工处理过的问题
    pub unanswered: Vec<String>,
    pub history: ActionHistory,
}

/// 申请处理流程
///
/// - 持有本次申请的协作者和组件
/// - 独占状态转移，组件只返回结果不改状态
/// - 每页都重新提取，不跨页复用问题和答案
pub struct ApplicationFlow {
    collaborators: Collaborators,
    extractor: QuestionExtractor,
    resolver: AnswerResolver,
    filler: FieldFiller,
    submitter: SubmissionController,
    settings: FlowSettings,
    abort: watch::Receiver<bool>,
}

/// 单次运行的可变部分
struct RunState {
    state: ApplicationState,
    history: ActionHistory,
    trace: Vec<ApplicationStatus>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    unanswered: Vec<String>,
    after_review: bool,
    /// 上一页快照的指纹，用于确认 Next 之后页面确实变了
    last_fingerprint: Option<String>,
    failure: Option<String>,
}

impl ApplicationFlow {
    /// 创建流程；`abort` 变为 true 时流程尽快进入 failed
    pub fn new(
        collaborators: Collaborators,
        settings: FlowSettings,
        abort: watch::Receiver<bool>,
    ) -> Self {
        Self {
            extractor: QuestionExtractor::new(MAX_EXTRACT_PAYLOAD_CHARS),
            resolver: AnswerResolver::new(settings.resume_char_limit)
                .with_upload_path(settings.upload_path.clone()),
            filler: FieldFiller::new(settings.settle, settings.call_timeout),
            submitter: SubmissionController::new(settings.call_timeout),
            collaborators,
            settings,
            abort,
        }
    }

    pub async fn run(
        &mut self,
        ctx: &ApplicationCtx,
        profile: &Profile,
        resume_text: &str,
    ) -> ApplicationReport {
        let initial = ApplicationState::default();
        let mut run = RunState {
            trace: vec![initial.status],
            state: initial,
            history: ActionHistory::new(self.settings.history_limit),
            questions: Vec::new(),
            answers: Vec::new(),
            unanswered: Vec::new(),
            after_review: false,
            last_fingerprint: None,
            failure: None,
        };

        info!("{} 🧭 开始填写申请向导", ctx);

        while !run.state.status.is_terminal() {
            let event = if *self.abort.borrow() {
                FlowEvent::Fail("申请被中止".to_string())
            } else {
                match run.state.status {
                    ApplicationStatus::Collecting => self.collect(ctx, &mut run).await,
                    ApplicationStatus::Filling => self.fill(ctx, &mut run, profile, resume_text).await,
                    ApplicationStatus::AwaitingHuman => self.wait_for_human(ctx, &mut run).await,
                    ApplicationStatus::Submitting => self.submit(ctx, &mut run).await,
                    ApplicationStatus::Submitted | ApplicationStatus::Failed => break,
                }
            };
            self.apply(ctx, &mut run, event);
        }

        let outcome = match run.state.status {
            ApplicationStatus::Submitted => {
                info!(
                    "{} ✅ 申请已提交（共 {} 页）",
                    ctx, run.state.current_page_step
                );
                ApplicationOutcome::Submitted {
                    pages: run.state.current_page_step,
                }
            }
            _ => {
                let reason = run
                    .failure
                    .take()
                    .unwrap_or_else(|| "未知原因".to_string());
                error!("{} ❌ 申请失败: {}", ctx, reason);
                ApplicationOutcome::Failed { reason }
            }
        };

        ApplicationReport {
            outcome,
            state: run.state,
            trace: run.trace,
            unanswered: run.unanswered,
            history: run.history,
        }
    }

    /// 执行状态转移；非法转移直接进入 failed
    fn apply(&self, ctx: &ApplicationCtx, run: &mut RunState, event: FlowEvent) {
        let from = run.state.status;
        let to = match transition(from, &event) {
            Ok(to) => to,
            Err(e) => {
                error!("{} {}", ctx, e);
                run.failure.get_or_insert_with(|| e.to_string());
                ApplicationStatus::Failed
            }
        };

        match &event {
            FlowEvent::Fail(reason) => {
                run.failure.get_or_insert_with(|| reason.clone());
            }
            FlowEvent::ResolutionFailed => {
                run.failure
                    .get_or_insert_with(|| "无法为本页问题生成答案".to_string());
            }
            FlowEvent::Clicked(outcome) if to == ApplicationStatus::Failed => {
                run.failure
                    .get_or_insert_with(|| format!("提交按钮点击结果为 {}", outcome));
            }
            _ => {}
        }

        debug!("{} 状态: {} --{}--> {}", ctx, from, event, to);
        run.state.status = to;
        run.trace.push(to);
    }

    async fn collect(&self, ctx: &ApplicationCtx, run: &mut RunState) -> FlowEvent {
        if run.state.current_page_step > self.settings.max_pages {
            return FlowEvent::Fail(format!(
                "超过最大向导页数 {}",
                self.settings.max_pages
            ));
        }

        // 上一页的问题和答案作废
        run.questions.clear();
        run.answers.clear();
        run.after_review = false;

        let snapshot = match self.snapshot_with_retry(ctx).await {
            Ok(snapshot) => snapshot,
            Err(reason) => return FlowEvent::Fail(reason),
        };
        let fingerprint = snapshot.fingerprint();
        if run.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return FlowEvent::Fail("点击 Next 后页面没有变化".to_string());
        }
        run.last_fingerprint = Some(fingerprint);
        info!(
            "{} 📄 第 {} 页: {}",
            ctx, run.state.current_page_step, snapshot.title
        );

        run.questions = self
            .extractor
            .extract(self.collaborators.oracle.as_ref(), &snapshot)
            .await;

        if run.questions.is_empty() {
            info!("{} 本页没有需要填写的问题", ctx);
            FlowEvent::NoQuestions
        } else {
            for q in &run.questions {
                debug!("{}   [{}] {} ({})", ctx, q.id, q.text, q.kind);
            }
            FlowEvent::QuestionsFound
        }
    }

    async fn fill(
        &self,
        ctx: &ApplicationCtx,
        run: &mut RunState,
        profile: &Profile,
        resume_text: &str,
    ) -> FlowEvent {
        info!("{} 🤖 正在为 {} 个问题生成答案...", ctx, run.questions.len());
        run.answers = self
            .resolver
            .resolve_with_history(
                self.collaborators.oracle.as_ref(),
                &run.questions,
                profile,
                resume_text,
                &run.history,
            )
            .await;

        if run.answers.is_empty() {
            return FlowEvent::ResolutionFailed;
        }

        let ready: Vec<Answer> = run
            .answers
            .iter()
            .filter(|a| a.value.is_some())
            .cloned()
            .collect();
        if !ready.is_empty() {
            let report = self
                .filler
                .fill(self.collaborators.driver.as_ref(), &run.questions, &ready)
                .await;
            for result in &report.results {
                run.history
                    .push("set_value", &result.question_id, &result.message);
            }
        }

        if run.answers.iter().any(Answer::needs_human) {
            FlowEvent::NeedsHuman
        } else {
            FlowEvent::AllAnswered
        }
    }

    async fn wait_for_human(&mut self, ctx: &ApplicationCtx, run: &mut RunState) -> FlowEvent {
        let pending: Vec<&Answer> = run.answers.iter().filter(|a| a.needs_human()).collect();
        run.unanswered
            .extend(pending.iter().map(|a| a.text.clone()));
        warn!("{} ✋ {} 个问题需要人工填写", ctx, pending.len());

        let request = HumanRequest::unanswered(&pending);
        let decision = self.confirm_or_abort(&request).await;
        run.history.push(
            "human",
            format!("{} fields", request.fields.len()),
            match decision {
                GateDecision::Continue => "confirmed",
                GateDecision::Abort => "aborted",
            },
        );

        match decision {
            GateDecision::Continue => FlowEvent::HumanConfirmed,
            GateDecision::Abort => FlowEvent::Fail("人工确认时中止".to_string()),
        }
    }

    async fn submit(&self, ctx: &ApplicationCtx, run: &mut RunState) -> FlowEvent {
        let outcome = self
            .submitter
            .submit(
                self.collaborators.provider.as_ref(),
                self.collaborators.driver.as_ref(),
            )
            .await;
        run.history.push("click", "submission control", outcome.to_string());

        if run.after_review && outcome != SubmitOutcome::Submit {
            return FlowEvent::Fail(format!("Review 之后未能提交（结果: {}）", outcome));
        }

        match outcome {
            SubmitOutcome::Next => {
                run.state.current_page_step += 1;
                info!("{} ➡️ 进入第 {} 页", ctx, run.state.current_page_step);
            }
            SubmitOutcome::Review => {
                run.after_review = true;
                info!("{} 🔎 已进入 Review，继续提交", ctx);
            }
            _ => {}
        }
        FlowEvent::Clicked(outcome)
    }

    /// 读取快照；失败时等待后重试，用尽次数后放弃
    async fn snapshot_with_retry(&self, ctx: &ApplicationCtx) -> Result<PageSnapshot, String> {
        let attempts = self.settings.snapshot_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match with_deadline(
                "snapshot",
                self.settings.call_timeout,
                self.collaborators.provider.snapshot(),
            )
            .await
            {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    warn!(
                        "{} ⚠️ 读取页面失败 ({}/{}): {}",
                        ctx, attempt, attempts, e
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                sleep(self.settings.settle).await;
            }
        }
        Err(format!("无法读取页面: {}", last_error))
    }

    /// 等待人工确认，同时监听外部中止信号
    async fn confirm_or_abort(&mut self, request: &HumanRequest) -> GateDecision {
        let gate = Arc::clone(&self.collaborators.gate);
        let abort = &mut self.abort;
        tokio::select! {
            decision = gate.confirm(request) => decision,
            _ = wait_for_abort(abort) => GateDecision::Abort,
        }
    }
}

/// 直到中止标志变为 true 才返回；发送端关闭后永不返回
pub async fn wait_for_abort(abort: &mut watch::Receiver<bool>) {
    loop {
        if *abort.borrow_and_update() {
            return;
        }
        if abort.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
