// ==========================================
// 订单导入服务 - 目录路径格式校验
// ==========================================
// 接受三种绝对路径:
// - Windows 盘符路径  C:\data\inbox
// - UNC 共享路径      \\server\share\inbox
// - POSIX 绝对路径    /srv/inbox
// Windows 路径中，分隔符前的段不能以空格或句点结尾
// ==========================================

use regex::Regex;

const WINDOWS_DRIVE_PATTERN: &str = r#"^[a-zA-Z]:\\([^<>:/\\|?*]+\\?)*$"#;
const UNC_SHARE_PATTERN: &str = r"^\\\\[a-zA-Z0-9.\-_]+(\\[a-zA-Z0-9\-_]+)+\$?";
const POSIX_PATTERN: &str = r"^/[^\x00]*$";

pub struct PathRules {
    windows_drive: Regex,
    unc_share: Regex,
    posix: Regex,
}

impl PathRules {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            windows_drive: Regex::new(WINDOWS_DRIVE_PATTERN)?,
            unc_share: Regex::new(UNC_SHARE_PATTERN)?,
            posix: Regex::new(POSIX_PATTERN)?,
        })
    }

    /// 路径是否符合任一绝对路径格式
    pub fn is_valid_directory(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        if self.windows_drive.is_match(path) {
            return windows_segments_valid(path);
        }
        self.unc_share.is_match(path) || self.posix.is_match(path)
    }
}

/// 后面跟着分隔符的段不能以空格或句点结尾
fn windows_segments_valid(path: &str) -> bool {
    let body = &path[3..];
    let segments: Vec<&str> = body.split('\\').collect();
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx < last)
        .all(|(_, seg)| !seg.ends_with(' ') && !seg.ends_with('.'))
}
