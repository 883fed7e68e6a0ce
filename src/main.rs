use anyhow::Result;
use clap::Parser;
use wizard_apply::{utils::logging, App, Config};

/// 自动填写多页职位申请向导
#[derive(Parser, Debug)]
#[command(name = "wizard_apply", version, about)]
struct Args {
    /// 职位列表文件（覆盖 JOBS_FILE）
    #[arg(long)]
    jobs_file: Option<String>,

    /// 重新收集候选人资料
    #[arg(long)]
    refresh_profile: bool,

    /// 启动无头浏览器而不是连接已有浏览器
    #[arg(long)]
    headless: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置，命令行参数优先
    let mut config = Config::from_env();
    if let Some(jobs_file) = args.jobs_file {
        config.jobs_file = jobs_file;
    }
    config.headless |= args.headless;
    config.verbose_logging |= args.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)
        .await?
        .run(args.refresh_profile)
        .await?;

    Ok(())
}
