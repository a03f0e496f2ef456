use std::path::PathBuf;

use flatfs::shell::{logger, start_shell};

const DISK_PATH: &str = "disk.img";

fn main() {
    logger::init();

    let image = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DISK_PATH));

    start_shell(image);
}
