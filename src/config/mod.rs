use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub markup: MarkupConfig,
    pub output: OutputConfig,
}

/// 图片下载设置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// 为空时图片 src 必须是绝对网址
    pub base_url: String,
    pub max_image_bytes: usize,
    pub require_image_content_type: bool,
}

/// 题目页面的选择器与固定标签
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MarkupConfig {
    pub item_selector: String,
    pub content_selector: String,
    pub answer_selector: String,
    pub discussion_selector: String,
    pub reload_phrase: String,
    pub answer_label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    pub static_dir: String,
    pub discussion_file: String,
    /// 旧版排版：每道题前都重复写入一次样式
    pub repeat_style_per_item: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// 默认值 -> 配置文件（可缺省）-> YAMOL_ 前缀的环境变量
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Config::try_from(&Self::default()).context("无法生成默认配置")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("YAMOL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("加载配置失败: {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("解析配置失败: {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig {
                timeout_secs: 30,
                user_agent: "yamolbot/0.1".to_string(),
                base_url: String::new(),
                max_image_bytes: 10 * 1024 * 1024,
                require_image_content_type: true,
            },
            markup: MarkupConfig {
                item_selector: r#"[class="col-lg-12 reponse-card"]"#.to_string(),
                content_selector: r#"[class="itemcontent"]"#.to_string(),
                answer_selector: r#"[class="col-sm-6 col-md-4 col-lg-4"]"#.to_string(),
                discussion_selector: r#"[class="well itemcomment"] div[style*="min-height"]"#
                    .to_string(),
                reload_phrase: "重新載圖".to_string(),
                answer_label: "答案：".to_string(),
            },
            output: OutputConfig {
                static_dir: "static".to_string(),
                discussion_file: "discussion.html".to_string(),
                repeat_style_per_item: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.markup, AppConfig::default().markup);
        assert_eq!(config.output, AppConfig::default().output);
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[output]\nstatic_dir = \"assets\"\ndiscussion_file = \"talk.html\"\nrepeat_style_per_item = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.output.static_dir, "assets");
        assert!(config.output.repeat_style_per_item);
        assert_eq!(config.markup.answer_label, "答案：");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut config = AppConfig::default();
        config.fetch.base_url = "https://www.yamol.tw/".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.fetch.base_url, "https://www.yamol.tw/");
        assert_eq!(loaded.markup.reload_phrase, "重新載圖");
    }
}
