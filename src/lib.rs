//! # Wizard Apply
//!
//! 自动填写多页职位申请向导的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `ChromeDriver` - 页面快照与点击 / 填值等原子动作，所有调用带超时
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程顺序
//! - `QuestionExtractor` - 从页面快照提取问题（LLM 优先，启发式兜底）
//! - `AnswerResolver` - 根据资料和简历生成答案
//! - `FieldFiller` - 逐个字段填写
//! - `SubmissionController` - 按 Next > Review > Submit 点击一个按钮
//! - `HumanGate` - 人工确认
//! - `LlmService` / `FailureLog` - LLM 调用、写 warn.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次申请"的状态机
//! - `ApplicationFlow` - collecting → filling → awaiting_human → submitting
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 管理资源，逐个处理职位
//! - `orchestrator/job_processor` - 打开职位、进入向导、记录失败

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeDriver, Driver, JsExecutor, PageStateProvider};
pub use models::{Answer, ApplicationOutcome, ApplicationStatus, PageSnapshot, Profile, Question};
pub use orchestrator::App;
pub use services::{HumanGate, ReasoningOracle};
pub use workflow::{ApplicationCtx, ApplicationFlow, ApplicationReport, Collaborators, FlowSettings};
