use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "ls" => Some(Command::Ls(args.first().map(|s| s.to_string()))),
        "pwd" => Some(Command::Pwd),
        "mkdir" => args.first().map(|&name| Command::Mkdir(name.to_string())),
        "rmdir" => args.first().map(|&name| Command::Rmdir(name.to_string())),
        "create" | "touch" => args.first().map(|&name| Command::Create(name.to_string())),
        "rm" => args.first().map(|&name| Command::Rm(name.to_string())),
        "cd" => args.first().map(|&name| Command::Cd(name.to_string())),
        "read" | "cat" => {
            let path = args.first()?.to_string();
            // 可选的 offset 和长度，必须是数字
            let offset = match args.get(1) {
                Some(s) => s.parse().ok()?,
                None => 0,
            };
            let len = match args.get(2) {
                Some(s) => Some(s.parse().ok()?),
                None => None,
            };
            Some(Command::Read { path, offset, len })
        }
        "write" | "append" => {
            if args.len() >= 2 {
                let path = args[0].to_string();
                let text = args[1..].join(" ");
                if cmd == "write" {
                    Some(Command::Write(path, text))
                } else {
                    Some(Command::Append(path, text))
                }
            } else {
                None
            }
        }
        "stat" => args.first().map(|&name| Command::Stat(name.to_string())),
        "df" => Some(Command::Df),
        "format" => Some(Command::Format),
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}
