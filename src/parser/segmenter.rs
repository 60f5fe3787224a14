use tracing::debug;

use crate::utils::{YamolError, YamolResult};

const FIRST_MARKER: &str = "(A)";
const SPLIT_MARKERS: [&str; 3] = ["(B)", "(C)", "(D)"];

/// 题干与选项的切分结果
#[derive(Debug, Clone, PartialEq)]
pub struct Segments {
    pub id: String,
    pub question: String,
    pub choices: Vec<String>,
    /// 文本中没有出现的 (B)/(C)/(D) 标记
    pub missing_markers: Vec<&'static str>,
}

/// 按固定的 (A)..(D) 标记切分题目文本
pub struct Segmenter {
    reload_phrase: String,
}

impl Segmenter {
    pub fn new(reload_phrase: impl Into<String>) -> Self {
        Self {
            reload_phrase: reload_phrase.into(),
        }
    }

    /// `text` 为 itemcontent 的纯文本，换行已替换为空格
    pub fn segment(&self, text: &str) -> YamolResult<Segments> {
        let a_pos = text.find(FIRST_MARKER).ok_or_else(|| YamolError::MissingChoiceMarker {
            text: text.trim().to_string(),
        })?;

        let stem_start = match text.find(&self.reload_phrase) {
            Some(pos)
                if !self.reload_phrase.is_empty()
                    && pos + self.reload_phrase.len() <= a_pos =>
            {
                pos + self.reload_phrase.len()
            }
            _ => 0,
        };
        let question = text[stem_start..a_pos].trim().to_string();

        let mut choices = Vec::with_capacity(4);
        let mut missing_markers = Vec::new();
        let mut rest = text[a_pos..].trim();
        for marker in SPLIT_MARKERS {
            match rest.find(marker) {
                Some(pos) => {
                    choices.push(rest[..pos].trim().to_string());
                    rest = &rest[pos..];
                }
                None => missing_markers.push(marker),
            }
        }
        choices.push(rest.trim().to_string());

        let id = match question.find('.') {
            Some(pos) => question[..pos].to_string(),
            None => return Err(YamolError::MissingQuestionNumber { question }),
        };

        debug!("切分题目 {}: {} 个选项", id, choices.len());
        Ok(Segments {
            id,
            question,
            choices,
            missing_markers,
        })
    }
}
