//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量职位处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载资料、简历和职位列表
//! - 持有浏览器资源和中止信号
//! - 输出全局统计信息
//!
//! ### `job_processor` - 单个职位处理器
//! - 打开职位页面、处理安全验证
//! - 点击入口按钮进入申请向导
//! - 创建 `ApplicationFlow` 并记录失败
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理职位列表)
//!     ↓
//! job_processor (处理单个职位)
//!     ↓
//! workflow::ApplicationFlow (处理一次申请的所有向导页)
//!     ↓
//! services (能力层：extract / resolve / fill / submit / human gate)
//!     ↓
//! infrastructure (基础设施：ChromeDriver / JsExecutor)
//! ```

pub mod batch_processor;
pub mod job_processor;

pub use batch_processor::App;
pub use job_processor::{process_job, JobEnv};
