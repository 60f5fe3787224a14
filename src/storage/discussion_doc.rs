use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::parser::discussion::STYLE_FRAGMENT;
use crate::utils::YamolResult;

/// 一道题的全部讨论片段
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDiscussion {
    pub id: String,
    pub fragments: Vec<String>,
}

/// 只追加、不截断的讨论文档
pub struct DiscussionDocument {
    path: PathBuf,
    repeat_style_per_item: bool,
}

impl DiscussionDocument {
    pub fn new(path: impl Into<PathBuf>, repeat_style_per_item: bool) -> Self {
        Self {
            path: path.into(),
            repeat_style_per_item,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 生成本次要追加的内容；样式默认只在新文档开头写一次
    pub fn render(&self, items: &[ItemDiscussion], is_new: bool) -> String {
        let mut out = String::new();
        if items.is_empty() {
            return out;
        }

        if self.repeat_style_per_item {
            for item in items {
                out.push_str(STYLE_FRAGMENT);
                item.fragments.iter().for_each(|f| out.push_str(f));
            }
        } else {
            if is_new {
                out.push_str(STYLE_FRAGMENT);
            }
            for item in items {
                item.fragments.iter().for_each(|f| out.push_str(f));
            }
        }
        out
    }

    pub fn append(&self, items: &[ItemDiscussion]) -> YamolResult<()> {
        let is_new = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        let content = self.render(items, is_new);
        if content.is_empty() {
            return Ok(());
        }

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(content.as_bytes())?;

        for item in items {
            debug!("题目 {} 追加讨论 {} 则", item.id, item.fragments.len());
        }
        let count: usize = items.iter().map(|i| i.fragments.len()).sum();
        info!("讨论已追加 {} 则: {}", count, self.path().display());
        Ok(())
    }
}
