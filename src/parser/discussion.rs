use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

use super::compile_selector;
use crate::utils::{YamolError, YamolResult};

/// 限制讨论文档中图片宽度的样式片段
pub const STYLE_FRAGMENT: &str = r#"
        <style type="text/css">
          img{max-width:80%; height: auto;}
        </style>
    "#;

const ENTRY_PATTERN: &str = r#"(?s)<span class="comment">(.*)<a href="support_open\.php"#;
const UNLOCKED_BADGE: &str = r#"<label class="badge badge-danger">已解鎖</label>"#;
const DIV_OPEN: &str = r#"<div style="border: 2px solid red; border-radius: 5px; border-color: gray; padding: 25px 25px 25px 25px; margin-top: 25px;width: 1000px;">"#;

/// 把讨论内容包进带标题的边框
pub fn wrap_fragment(id: &str, label: usize, body: &str) -> String {
    format!("{DIV_OPEN}<h1>{id}-{label}</h1>{body}</div></div>")
}

/// 从题目区块取出每则讨论并包装成 HTML 片段
pub struct DiscussionCompiler {
    entry_selector: Selector,
    capture: Regex,
}

impl DiscussionCompiler {
    pub fn new(entry_selector: &str) -> YamolResult<Self> {
        Ok(Self {
            entry_selector: compile_selector(entry_selector)?,
            capture: Regex::new(ENTRY_PATTERN)?,
        })
    }

    pub fn compile(&self, item: ElementRef<'_>, id: &str) -> YamolResult<Vec<String>> {
        item.select(&self.entry_selector)
            .enumerate()
            .map(|(index, entry)| {
                let markup = entry.html();
                let body = self
                    .capture
                    .captures(&markup)
                    .and_then(|caps| caps.get(1))
                    .ok_or_else(|| YamolError::DiscussionCapture {
                        id: id.to_string(),
                        index: index + 1,
                    })?
                    .as_str()
                    .replace(UNLOCKED_BADGE, "");

                debug!("讨论 {}-{}: {} 字节", id, index + 1, body.len());
                Ok(wrap_fragment(id, index + 1, &body))
            })
            .collect()
    }
}
