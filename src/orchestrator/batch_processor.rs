//! 批量职位处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责职位列表的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、连接或启动浏览器、创建驱动和 LLM 服务
//! 2. **资料准备**：加载（或首次收集）候选人资料、读取简历
//! 3. **顺序处理**：逐个职位处理，同一时间只有一个申请占用页面
//! 4. **中止信号**：Ctrl-C 中止当前申请，连按两次退出程序
//! 5. **全局统计**：汇总所有职位的处理结果

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ChromeDriver, JsExecutor};
use crate::models::{load_job_list, load_profile, save_profile, ApplicationOutcome, Profile};
use crate::orchestrator::job_processor::{self, JobEnv};
use crate::services::{profile_collector, resume, ConsoleGate, FailureLog, LlmService};
use crate::utils::logging;
use crate::workflow::{ApplicationCtx, Collaborators, FlowSettings};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    collaborators: Collaborators,
    abort_tx: Arc<watch::Sender<bool>>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法初始化日志文件: {}", config.output_log_file))?;

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port, None).await?
        };

        // ChromeDriver 持有唯一的 JsExecutor（page owner）
        let driver = Arc::new(ChromeDriver::new(JsExecutor::new(page), config.settle()));
        let llm = LlmService::new(&config);
        logging::log_startup(llm.model_name(), config.headless);
        let collaborators = Collaborators {
            provider: driver.clone(),
            driver,
            oracle: Arc::new(llm),
            gate: Arc::new(ConsoleGate::stdin()),
        };

        let (abort_tx, _) = watch::channel(false);
        let abort_tx = Arc::new(abort_tx);
        spawn_ctrl_c_listener(Arc::clone(&abort_tx));

        Ok(Self {
            config,
            _browser: browser,
            collaborators,
            abort_tx,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, refresh_profile: bool) -> Result<()> {
        let profile = self.prepare_profile(refresh_profile).await?;
        let resume_text = resume::load_resume_text(Path::new(&self.config.resume_path)).await?;

        let jobs = load_job_list(Path::new(&self.config.jobs_file)).await?;
        if jobs.urls.is_empty() {
            warn!("⚠️ 职位列表为空，程序结束");
            return Ok(());
        }
        logging::log_jobs_loaded(jobs.urls.len());

        let stats = self.process_all_jobs(&jobs.urls, &profile, &resume_text).await;

        logging::print_final_stats(
            stats.submitted,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );
        Ok(())
    }

    /// 加载资料；缺失或要求刷新时进入收集流程并保存
    async fn prepare_profile(&self, refresh: bool) -> Result<Profile> {
        let path = Path::new(&self.config.profile_path);
        let existing = load_profile(path).await?;

        match existing {
            Some(profile) if !refresh => Ok(profile),
            existing => {
                if existing.is_none() {
                    info!("📋 未找到资料文件，开始首次收集");
                }
                let profile = profile_collector::collect_profile(existing.as_ref()).await?;
                save_profile(path, &profile).await?;
                Ok(profile)
            }
        }
    }

    /// 逐个处理职位
    async fn process_all_jobs(
        &self,
        urls: &[String],
        profile: &Profile,
        resume_text: &str,
    ) -> ProcessingStats {
        let settings = FlowSettings::from(&self.config);
        let failure_log = FailureLog::new(&self.config.warn_file);
        let mut stats = ProcessingStats {
            total: urls.len(),
            ..Default::default()
        };

        for (index, url) in urls.iter().enumerate() {
            let ctx = ApplicationCtx::new(index + 1, url.clone());
            logging::log_job_start(ctx.job_index, urls.len(), url);

            // 上一个申请的中止不影响下一个
            self.abort_tx.send_replace(false);

            let env = JobEnv {
                collaborators: &self.collaborators,
                settings: &settings,
                entry_button_label: &self.config.entry_button_label,
                failure_log: &failure_log,
                abort: self.abort_tx.subscribe(),
            };
            match job_processor::process_job(env, &ctx, profile, resume_text).await {
                ApplicationOutcome::Submitted { pages } => {
                    info!("{} ✅ 已提交（{} 页）", ctx, pages);
                    stats.submitted += 1;
                }
                ApplicationOutcome::Failed { reason } => {
                    error!("{} ❌ 未完成: {}", ctx, reason);
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}

/// Ctrl-C：第一次中止当前申请，中止未被重置前再按一次则退出
fn spawn_ctrl_c_listener(abort_tx: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if *abort_tx.borrow() {
                warn!("再次收到 Ctrl-C，程序退出");
                std::process::exit(130);
            }
            warn!("⛔ 收到 Ctrl-C，中止当前申请（再按一次退出）");
            abort_tx.send_replace(true);
        }
    });
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    submitted: usize,
    failed: usize,
    total: usize,
}
