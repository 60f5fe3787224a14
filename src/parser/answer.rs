use crate::utils::{YamolError, YamolResult};

/// 读取答案标签后紧接的一个字符
pub struct AnswerExtractor {
    label: String,
}

impl AnswerExtractor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn extract(&self, text: &str) -> YamolResult<String> {
        let pos = text.find(&self.label).ok_or_else(|| YamolError::MissingAnswerLabel {
            label: self.label.clone(),
        })?;

        text[pos + self.label.len()..]
            .chars()
            .next()
            .map(String::from)
            .ok_or_else(|| YamolError::TruncatedAnswer {
                label: self.label.clone(),
            })
    }
}
