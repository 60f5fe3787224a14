pub mod answer;
pub mod discussion;
pub mod image_harvester;
pub mod record;
pub mod segmenter;

pub use answer::AnswerExtractor;
pub use discussion::DiscussionCompiler;
pub use image_harvester::ImageHarvester;
pub use segmenter::Segmenter;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{AppConfig, OutputConfig};
use crate::crawler::ImageFetcher;
use crate::storage::{merge, DiscussionDocument, ItemDiscussion, Store, StoreFile, StoreLocation};
use crate::utils::{YamolError, YamolResult};
use record::ValidationWarning;

pub(crate) fn compile_selector(selector: &str) -> YamolResult<Selector> {
    Selector::parse(selector).map_err(|e| YamolError::SelectorError {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// 元素的纯文本，换行替换为空格
fn flatten_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().replace('\n', " ")
}

/// 由题库路径推出的输出位置
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub static_dir: PathBuf,
    pub discussion: PathBuf,
}

impl OutputPaths {
    pub fn from_store(store_path: &Path, output: &OutputConfig) -> Self {
        let base = store_path.parent().unwrap_or_else(|| Path::new(""));
        let static_dir = base.join(&output.static_dir);
        let discussion = static_dir.join(&output.discussion_file);
        Self {
            static_dir,
            discussion,
        }
    }
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunReport {
    pub location: StoreLocation,
    pub records: usize,
    pub warnings: Vec<(String, ValidationWarning)>,
}

/// 统一提取管道：切分 -> 答案 -> 图片 -> 讨论 -> 组装，最后合并写入题库
pub struct ExtractionPipeline {
    item_selector: Selector,
    content_selector: Selector,
    answer_selector: Selector,
    content_selector_text: String,
    answer_selector_text: String,
    segmenter: Segmenter,
    answer_extractor: AnswerExtractor,
    image_harvester: ImageHarvester,
    discussion_compiler: DiscussionCompiler,
    output: OutputConfig,
}

impl ExtractionPipeline {
    pub fn new(config: &AppConfig) -> YamolResult<Self> {
        let markup = &config.markup;
        Ok(Self {
            item_selector: compile_selector(&markup.item_selector)?,
            content_selector: compile_selector(&markup.content_selector)?,
            answer_selector: compile_selector(&markup.answer_selector)?,
            content_selector_text: markup.content_selector.clone(),
            answer_selector_text: markup.answer_selector.clone(),
            segmenter: Segmenter::new(markup.reload_phrase.as_str()),
            answer_extractor: AnswerExtractor::new(markup.answer_label.as_str()),
            image_harvester: ImageHarvester::new(&config.fetch)?,
            discussion_compiler: DiscussionCompiler::new(&markup.discussion_selector)?,
            output: config.output.clone(),
        })
    }

    /// 处理一页题目；任何硬错误都会在写入题库之前中止
    pub async fn run<F: ImageFetcher>(
        &self,
        html: &str,
        store_path: &Path,
        fetcher: &F,
    ) -> Result<RunReport> {
        let paths = OutputPaths::from_store(store_path, &self.output);
        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&self.item_selector).collect();
        info!("找到 {} 道题", items.len());

        let mut accumulator = Store::new();
        let mut discussions = Vec::with_capacity(items.len());
        let mut warnings = Vec::new();

        for (position, item) in items.iter().enumerate() {
            let ordinal = position + 1;
            let content = item
                .select(&self.content_selector)
                .next()
                .ok_or_else(|| YamolError::MissingBlock {
                    id: format!("#{}", ordinal),
                    selector: self.content_selector_text.clone(),
                })?;

            let segments = self
                .segmenter
                .segment(&flatten_text(content))
                .with_context(|| format!("第 {} 道题切分失败", ordinal))?;
            let id = segments.id.clone();
            for marker in &segments.missing_markers {
                warn!("题目 {} 缺少选项标记 {}", id, marker);
            }

            let answer_block = item
                .select(&self.answer_selector)
                .next()
                .ok_or_else(|| YamolError::MissingBlock {
                    id: id.clone(),
                    selector: self.answer_selector_text.clone(),
                })?;
            let answer = self
                .answer_extractor
                .extract(&answer_block.text().collect::<String>())
                .with_context(|| format!("题目 {} 读取答案失败", id))?;

            let sources = self.image_harvester.sources(content, &id)?;
            let images = self
                .image_harvester
                .harvest(fetcher, &id, &sources, &paths.static_dir)
                .await
                .with_context(|| format!("题目 {} 下载图片失败", id))?;

            let fragments = self
                .discussion_compiler
                .compile(*item, &id)
                .with_context(|| format!("题目 {} 讨论提取失败", id))?;

            let assembled = record::assemble(
                segments.id,
                segments.question,
                segments.choices,
                answer,
                images,
            )?;
            for warning in assembled.warnings {
                warn!(
                    "题目 {}: {} 选项: {:?}",
                    assembled.id, warning, assembled.record.choices
                );
                warnings.push((assembled.id.clone(), warning));
            }

            discussions.push(ItemDiscussion {
                id: assembled.id.clone(),
                fragments,
            });
            accumulator.insert(assembled.id, assembled.record);
        }

        // 旧题库读不出来时，讨论文档也不能动
        let store_file = StoreFile::new(store_path);
        let existing = store_file.load().context("读取题库失败")?;
        let records = accumulator.len();
        let merged = merge(existing, accumulator);

        DiscussionDocument::new(&paths.discussion, self.output.repeat_style_per_item)
            .append(&discussions)
            .context("写入讨论文档失败")?;

        let location = store_file.save(&merged).context("写入题库失败")?;

        Ok(RunReport {
            location,
            records,
            warnings,
        })
    }
}
