//! Notification Center CLI
//!
//! 拉取并查看用户通知，标记已读，或打开 TUI 通知弹出层

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use notification_center::notification::{format, relative_age};
use notification_center::{Config, HttpNotificationService, NotificationStore};

#[derive(Parser)]
#[command(name = "notif")]
#[command(about = "Notification Center - 查看和管理用户通知")]
#[command(version)]
struct Cli {
    /// 后端 API 地址（覆盖配置文件和环境变量）
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出通知（后端顺序）
    List {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
        /// 只显示未读
        #[arg(long)]
        unread: bool,
    },
    /// 标记通知为已读
    Read {
        /// 通知 ID
        id: i64,
    },
    /// 启动 TUI 通知弹出层
    Tui {
        /// 自动刷新间隔（秒），默认取配置
        #[arg(long)]
        refresh_interval: Option<u64>,
    },
}

fn build_store(config: &Config) -> Result<Arc<NotificationStore>> {
    let service = HttpNotificationService::new(config)?;
    Ok(Arc::new(NotificationStore::new(Arc::new(service))))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug notif list
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notification_center=info,notif=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    debug!(base_url = %config.base_url, "using backend");

    let store = build_store(&config)?;

    match cli.command {
        Commands::List { json, unread } => {
            store.fetch().await;
            let state = store.snapshot();
            if let Some(error) = state.error() {
                return Err(anyhow!("{}", error));
            }

            let entries: Vec<_> = state
                .feed()
                .iter()
                .filter(|n| !unread || !n.is_read)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No notifications");
            } else {
                println!("{} notifications, {} unread:\n", state.feed().len(), state.unread_count());
                let now = Utc::now();
                for n in entries {
                    let text = format(&n.content);
                    let marker = if n.is_read { " " } else { "●" };
                    println!(
                        "  {} [{}] {} {} · {}",
                        marker,
                        n.id,
                        text.icon.symbol(),
                        text.title,
                        relative_age(n.created_at, now)
                    );
                    println!("        {}", text.message);
                }
            }
        }
        Commands::Read { id } => {
            store.fetch().await;
            let state = store.snapshot();
            if let Some(error) = state.error() {
                return Err(anyhow!("{}", error));
            }
            match state.get(id) {
                None => {
                    eprintln!("Notification {} not found", id);
                    std::process::exit(1);
                }
                Some(n) if n.is_read => {
                    println!("Notification {} is already read", id);
                    return Ok(());
                }
                Some(_) => {}
            }

            store.mark_as_read(id).await;
            let state = store.snapshot();
            match state.error() {
                Some(error) => {
                    eprintln!("❌ {}", error);
                    std::process::exit(1);
                }
                None => println!("✅ Notification {} marked as read ({} unread)", id, state.unread_count()),
            }
        }
        Commands::Tui { refresh_interval } => {
            use notification_center::tui::{App, init_terminal, restore_terminal, run};

            let every = Duration::from_secs(refresh_interval.unwrap_or(config.refresh_interval_secs));
            let mut terminal = init_terminal()?;
            let mut app = App::new();

            let result = run(&mut terminal, &mut app, store, every).await;

            restore_terminal(&mut terminal)?;

            result?;
        }
    }

    Ok(())
}
