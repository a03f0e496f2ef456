pub mod command;
pub mod logger;
pub mod parse;

use crate::{
    disk::init::perform_disk_initialization,
    fs::{error::FileSystemError, FileSystem},
    shell::{
        command::{execute_command, Command},
        parse::parse_command,
    },
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::{
    io::stdout,
    path::PathBuf,
    sync::mpsc,
    thread,
};

/// 启动线程向 shell 汇报的进度
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<FileSystem, FileSystemError>),
}

const COMMANDS: [&str; 17] = [
    "help", "ls", "pwd", "mkdir", "rmdir", "create", "touch", "rm", "cd", "read", "cat", "write",
    "append", "stat", "df", "format", "exit",
];

pub fn start_shell(image: PathBuf) {
    let Some(fs) = boot(image) else {
        // 镜像打不开或挂载失败，无法继续
        std::process::exit(1);
    };

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    let mut current_dir = String::from("/");

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flatfs_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => log::warn!("command history disabled: {}", e),
    }

    // 命令补全
    let commands: Vec<String> = COMMANDS.iter().map(|c| c.to_string()).collect();
    let completer = DefaultCompleter::new_with_wordlen(commands, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let full_prompt = format!(
            "{}:{}",
            format!("{}@{}", username, hostname).green(),
            current_dir.blue()
        );
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(full_prompt),
            DefaultPromptSegment::Basic("FlatFS".bright_blue().bold().to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &fs, &mut current_dir) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, Command::Exit) {
                            println!("{}", "👋 Bye!".bright_yellow());
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or missing arguments. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting FlatFS...".yellow());
                break;
            }
            Ok(_) => {
                // Ctrl-C 只清掉当前行
                println!();
                continue;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
}

/// 后台线程打开并挂载镜像，前台用进度条显示真实进度
fn boot(image: PathBuf) -> Option<FileSystem> {
    let mut stdout = stdout();

    let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
    println!("{}", "[FlatFS Booting...]".bright_yellow().bold());
    println!("💿 Image: {}", image.display().to_string().cyan());

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || perform_disk_initialization(image, tx));

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut result = None;
    for msg in rx {
        match msg {
            BootProgress::Step(step) => pb.println(step),
            BootProgress::Progress(p) => pb.set_position(p),
            BootProgress::Finished(r) => result = Some(r),
        }
    }
    let _ = worker.join();

    match result {
        Some(Ok(fs)) => {
            pb.finish_with_message("✅ Ready!");
            let _ = execute!(
                stdout,
                SetForegroundColor(Color::Cyan),
                Print(format!("Welcome to FlatFS v{}\n", env!("CARGO_PKG_VERSION"))),
                ResetColor
            );
            Some(fs)
        }
        Some(Err(e)) => {
            pb.abandon_with_message("❌ Boot failed");
            eprintln!("{} {}", "❌ Error:".red().bold(), e);
            None
        }
        None => {
            pb.abandon_with_message("❌ Boot failed");
            eprintln!("{}", "❌ Error: disk initialization stopped unexpectedly".red().bold());
            None
        }
    }
}
