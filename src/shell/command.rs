use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

use crate::{
    disk::BLOCK_SIZE,
    fs::{
        attr::NodeKind,
        error::FileSystemError,
        FileSystem,
    },
};

#[derive(Debug)]
pub enum Command {
    Help,
    Ls(Option<String>),
    Pwd,
    Mkdir(String),
    Rmdir(String),
    Create(String),
    Rm(String),
    Cd(String),
    Read {
        path: String,
        offset: u64,
        len: Option<u64>,
    },
    Write(String, String),
    Append(String, String),
    Stat(String),
    Df,
    Format,
    Exit,
}

/// 把 shell 参数换成绝对路径，只有两层所以 `..` 总是回到根目录
pub fn absolute_path(current_dir: &str, arg: &str) -> String {
    if arg.starts_with('/') {
        arg.to_string()
    } else if arg == ".." {
        "/".to_string()
    } else if arg == "." {
        current_dir.to_string()
    } else if current_dir == "/" {
        format!("/{}", arg)
    } else {
        format!("{}/{}", current_dir, arg)
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

pub fn execute_command(
    cmd: &Command,
    fs: &FileSystem,
    current_dir: &mut String,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls(arg) => {
            let dir = arg
                .as_deref()
                .map(|a| absolute_path(current_dir, a))
                .unwrap_or_else(|| current_dir.clone());
            let entries = fs.read_dir(&dir)?;
            println!("📂  .");
            println!("📁  ..");
            for name in entries {
                let attr = fs.getattr(&join(&dir, &name))?;
                match attr.kind {
                    NodeKind::File => println!(
                        "📄  {:<12} {}",
                        name,
                        format!("{} B", attr.size).bright_black()
                    ),
                    _ => println!("📁  {}", name.blue()),
                }
            }
        }
        Command::Pwd => println!("📍 {}", current_dir.cyan()),
        Command::Mkdir(name) => {
            let path = absolute_path(current_dir, name);
            fs.mkdir(&path)?;
            println!("✅ Created directory: {}", path.green());
        }
        Command::Rmdir(name) => {
            let path = absolute_path(current_dir, name);
            fs.rmdir(&path)?;
            println!(
                "{} {}",
                "⚠️  Directories are never removed, nothing changed:".yellow(),
                path
            );
        }
        Command::Create(name) => {
            let path = absolute_path(current_dir, name);
            fs.mknod(&path)?;
            println!("📝 Created file: {}", path.green());
        }
        Command::Rm(name) => {
            let path = absolute_path(current_dir, name);
            fs.unlink(&path)?;
            println!(
                "{} {}",
                "⚠️  Files are never removed, nothing changed:".yellow(),
                path
            );
        }
        Command::Cd(arg) => {
            let path = absolute_path(current_dir, arg);
            if path != "/" {
                let attr = fs.getattr(&path)?;
                if attr.kind == NodeKind::File {
                    return Err(FileSystemError::NotADirectory(path).into());
                }
            }
            // 去掉结尾的 '/'，保持 `/dir` 的形式
            let trimmed = path.trim_end_matches('/');
            *current_dir = if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            };
            println!("📂 Moved to {}", current_dir.blue());
        }
        Command::Read { path, offset, len } => {
            let path = absolute_path(current_dir, path);
            let len = match len {
                Some(len) => *len,
                None => fs.getattr(&path)?.size,
            };
            let data = fs.read(&path, len, *offset)?;
            println!("📖 Reading file: {}", path.cyan());
            println!("{}", String::from_utf8_lossy(&data));
        }
        Command::Write(file, content) => {
            let path = absolute_path(current_dir, file);
            let size = fs.write(&path, content.as_bytes(), 0)?;
            println!("✏️  Writing to {}", path.cyan());
            println!("{} {} bytes", "✅ Size:".green(), size);
        }
        Command::Append(file, content) => {
            let path = absolute_path(current_dir, file);
            let offset = fs.getattr(&path)?.size;
            let size = fs.write(&path, content.as_bytes(), offset)?;
            println!("✏️  Appending to {}", path.cyan());
            println!("{} {} bytes", "✅ Size:".green(), size);
        }
        Command::Stat(file) => {
            let path = absolute_path(current_dir, file);
            let attr = fs.getattr(&path)?;
            let (kind, blocks) = match attr.kind {
                NodeKind::Root => ("Root", 1),
                NodeKind::Directory => ("Directory", 1),
                NodeKind::File => ("File", fs.file_blocks(&path)?.len()),
            };
            println!(
                "{}\n{}: {}\n{}: {}\n{}: {} bytes\n{}: {}\n{}: {}\n{}: {}\n",
                "📊 File Info".bright_yellow().bold(),
                "Name".blue(),
                path,
                "Type".blue(),
                kind,
                "Size".blue(),
                attr.size,
                "Blocks".blue(),
                blocks,
                "Mode".blue(),
                attr.mode.symbolic(),
                "Links".blue(),
                attr.nlink
            );
        }
        Command::Df => {
            let usage = fs.usage()?;
            let used = usage.total_blocks - usage.free_blocks;
            println!(
                "{}\n{}: {} ({} KiB)\n{}: {}\n{}: {} ({} KiB)\n{}: {}\n",
                "💽 Disk Usage".bright_yellow().bold(),
                "Blocks".blue(),
                usage.total_blocks,
                usage.total_blocks * BLOCK_SIZE as u64 / 1024,
                "Used".blue(),
                used,
                "Free".blue(),
                usage.free_blocks,
                usage.free_blocks * BLOCK_SIZE as u64 / 1024,
                "Directories".blue(),
                usage.directories
            );
        }
        Command::Format => {
            let confirmed = Confirm::new()
                .with_prompt("Erase every file and directory on this disk?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Format cancelled.".bright_black());
                return Ok(());
            }

            println!("💾 Formatting virtual disk...");
            let pb = ProgressBar::new(fs.geometry().block_count);
            pb.set_style(
                ProgressStyle::with_template("[{bar:40.green/black}] {pos:>5}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            fs.reformat(|done, _| pb.set_position(done))?;
            pb.finish_with_message("✅ Disk formatted successfully!");
            *current_dir = "/".to_string();
        }
        Command::Exit => println!("{}", "👋 Exiting FlatFS shell...".yellow().bold()),
    }

    Ok(())
}

fn print_help() {
    println!("{}", "📘 FlatFS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls [dir]                 List a directory (default: current)
  pwd                      Print current path
  cd <dir>                 Change directory
  mkdir <dir>              Create directory (root level only)
  rmdir <dir>              Remove directory (accepted, no effect)
  create|touch <file>      Create file (inside a directory, 8.3 names)
  rm <file>                Remove file (accepted, no effect)
  read|cat <file> [off] [len]
                           Read file content
  write <file> <str>       Write string at offset 0
  append <file> <str>      Append string at the end
  stat <path>              Show file info
  df                       Show disk usage
  format                   Format virtual disk
  help                     Show this help message
  exit                     Quit the shell
"
        .bright_black()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;

    fn run(fs: &FileSystem, cwd: &mut String, line: &str) -> Result<(), Box<dyn Error>> {
        let cmd = crate::shell::parse::parse_command(line).expect("command should parse");
        execute_command(&cmd, fs, cwd)
    }

    #[test]
    fn relative_paths() {
        assert_eq!(absolute_path("/", "docs"), "/docs");
        assert_eq!(absolute_path("/docs", "a.txt"), "/docs/a.txt");
        assert_eq!(absolute_path("/docs", ".."), "/");
        assert_eq!(absolute_path("/docs", "/other"), "/other");
    }

    #[test]
    fn session_creates_and_fills_a_file() {
        let fs = FileSystem::mount(MemoryDisk::new(64)).unwrap();
        let mut cwd = String::from("/");

        run(&fs, &mut cwd, "mkdir docs").unwrap();
        run(&fs, &mut cwd, "cd docs").unwrap();
        assert_eq!(cwd, "/docs");

        run(&fs, &mut cwd, "touch note.txt").unwrap();
        run(&fs, &mut cwd, "write note.txt hello").unwrap();
        run(&fs, &mut cwd, "append note.txt world").unwrap();
        assert_eq!(fs.read("/docs/note.txt", 64, 0).unwrap(), b"helloworld");

        run(&fs, &mut cwd, "ls").unwrap();
        run(&fs, &mut cwd, "stat note.txt").unwrap();
        run(&fs, &mut cwd, "cd ..").unwrap();
        assert_eq!(cwd, "/");
    }

    #[test]
    fn cd_into_a_file_fails() {
        let fs = FileSystem::mount(MemoryDisk::new(64)).unwrap();
        let mut cwd = String::from("/");
        run(&fs, &mut cwd, "mkdir docs").unwrap();
        run(&fs, &mut cwd, "touch /docs/a").unwrap();
        assert!(run(&fs, &mut cwd, "cd /docs/a").is_err());
        assert!(run(&fs, &mut cwd, "cd missing").is_err());
        assert_eq!(cwd, "/");
    }
}
