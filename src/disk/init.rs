use std::{path::PathBuf, sync::mpsc::Sender};

use crate::{
    disk::{file_disk::FileDisk, types::BLOCK_COUNT},
    fs::FileSystem,
    shell::BootProgress,
};

/// 打开镜像并挂载文件系统，通过 `tx` 汇报进度和最终结果。
pub fn perform_disk_initialization(path: PathBuf, tx: Sender<BootProgress>) {
    let _ = tx.send(BootProgress::Step("🧠 Initializing virtual disk..."));

    let disk_exists = path.exists();

    let disk = match FileDisk::open(&path, BLOCK_COUNT) {
        Ok(d) => d,
        Err(e) => {
            let _ = tx.send(BootProgress::Finished(Err(e.into())));
            return;
        }
    };
    let _ = tx.send(BootProgress::Progress(10));

    if !disk_exists {
        // 只有“明确是新磁盘”才格式化
        let _ = tx.send(BootProgress::Step(
            "🔧 No disk found, formatting new file system...",
        ));

        let mut last = 10;
        let result = FileSystem::format(&disk, |done, total| {
            let pct = 10 + done * 80 / total.max(1);
            if pct != last {
                last = pct;
                let _ = tx.send(BootProgress::Progress(pct));
            }
        });
        if let Err(e) = result {
            let _ = tx.send(BootProgress::Finished(Err(e)));
            return;
        }
    }

    // 不论是否新盘，最终都要 mount
    let _ = tx.send(BootProgress::Step("⚙️ Mounting file system..."));
    let _ = tx.send(BootProgress::Progress(90));

    match FileSystem::mount(disk) {
        Ok(fs) => {
            let _ = tx.send(BootProgress::Progress(100));
            let _ = tx.send(BootProgress::Finished(Ok(fs)));
        }
        Err(e) => {
            let _ = tx.send(BootProgress::Finished(Err(e)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn new_image_is_formatted_and_mounted() {
        let path = std::env::temp_dir().join(format!("flatfs-boot-{}.img", uuid::Uuid::new_v4()));
        let (tx, rx) = mpsc::channel();
        perform_disk_initialization(path.clone(), tx);

        let mut mounted = None;
        let mut last_progress = 0;
        for msg in rx {
            match msg {
                BootProgress::Progress(p) => {
                    assert!(p >= last_progress);
                    last_progress = p;
                }
                BootProgress::Finished(result) => mounted = Some(result),
                BootProgress::Step(_) => {}
            }
        }

        let fs = mounted.expect("boot never finished").expect("mount failed");
        assert_eq!(last_progress, 100);
        assert!(fs.read_dir("/").unwrap().is_empty());
        drop(fs);
        std::fs::remove_file(&path).unwrap();
    }
}
