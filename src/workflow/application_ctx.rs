//! 申请上下文
//!
//! 封装"我正在处理第几个职位"这一信息，主要用于日志前缀

use std::fmt::Display;

/// 申请上下文
#[derive(Debug, Clone)]
pub struct ApplicationCtx {
    /// 职位序号（从 1 开始，仅用于日志显示）
    pub job_index: usize,

    /// 职位链接
    pub url: String,
}

impl ApplicationCtx {
    pub fn new(job_index: usize, url: impl Into<String>) -> Self {
        Self {
            job_index,
            url: url.into(),
        }
    }
}

impl Display for ApplicationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[职位 {}]", self.job_index)
    }
}
