use chrono::Local;
use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// 控制日志级别的环境变量
pub const LOG_ENV: &str = "FLATFS_LOG";

struct ShellLogger;

static LOGGER: ShellLogger = ShellLogger;

impl Log for ShellLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".green(),
            Level::Debug => "DEBUG".blue(),
            Level::Trace => "TRACE".bright_black(),
        };
        eprintln!(
            "{} {} {} {}",
            Local::now().format("%H:%M:%S%.3f").to_string().bright_black(),
            level,
            record.target().bright_black(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// 解析日志级别，缺省或无法识别时为 warn
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// 安装 shell 的日志输出，重复调用无效果
pub fn init() {
    let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
