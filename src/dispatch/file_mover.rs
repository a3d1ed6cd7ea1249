// ==========================================
// 订单导入服务 - 文件归档（防覆盖）
// ==========================================
// 目标目录已有同名文件时，在扩展名前追加 " (n)"，n 从 1 递增直到不冲突
// 优先 rename；跨卷失败时改为 复制+删除源文件
// ==========================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 计算不冲突的目标路径
pub fn unique_destination(file_name: &Path, destination_dir: &Path) -> PathBuf {
    let candidate = destination_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut count = 1;
    loop {
        let renamed = destination_dir.join(format!("{} ({}){}", stem, count, extension));
        if !renamed.exists() {
            return renamed;
        }
        count += 1;
    }
}

/// 把文件移入目标目录
///
/// # 返回
/// - Ok(PathBuf): 最终路径
pub fn relocate(file: &Path, destination_dir: &Path) -> io::Result<PathBuf> {
    let file_name = file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("无效的文件路径: {}", file.display()),
        )
    })?;

    let target = unique_destination(Path::new(file_name), destination_dir);
    if fs::rename(file, &target).is_err() {
        fs::copy(file, &target)?;
        fs::remove_file(file)?;
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_name_collisions_get_counted_suffix() {
        let tmp = TempDir::new().unwrap();
        let inbox = tmp.path().join("inbox");
        let done = tmp.path().join("done");
        fs::create_dir_all(&inbox).unwrap();
        fs::create_dir_all(&done).unwrap();

        let mut moved = Vec::new();
        for content in ["one", "two", "three"] {
            let file = inbox.join("orders.xlsx");
            fs::write(&file, content).unwrap();
            moved.push(relocate(&file, &done).unwrap());
        }

        assert_eq!(moved[0], done.join("orders.xlsx"));
        assert_eq!(moved[1], done.join("orders (1).xlsx"));
        assert_eq!(moved[2], done.join("orders (2).xlsx"));
        assert_eq!(fs::read_to_string(&moved[0]).unwrap(), "one");
        assert_eq!(fs::read_to_string(&moved[2]).unwrap(), "three");
        assert!(!inbox.join("orders.xlsx").exists());
    }

    #[test]
    fn test_missing_source_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(relocate(&tmp.path().join("gone.xlsx"), tmp.path()).is_err());
    }
}
