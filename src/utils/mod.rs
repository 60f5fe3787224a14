pub mod logger;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum YamolError {
    #[error("选择器无效 `{selector}`: {reason}")]
    SelectorError { selector: String, reason: String },

    #[error("正则表达式错误: {0}")]
    RegexError(#[from] regex::Error),

    #[error("题目缺少选项标记 (A): {text}")]
    MissingChoiceMarker { text: String },

    #[error("题干缺少题号: {question}")]
    MissingQuestionNumber { question: String },

    #[error("题号不一致: {id} 与题干 `{question}`")]
    IdMismatch { id: String, question: String },

    #[error("找不到答案标签 `{label}`")]
    MissingAnswerLabel { label: String },

    #[error("答案标签 `{label}` 之后没有字符")]
    TruncatedAnswer { label: String },

    #[error("题目 {id} 缺少 `{selector}` 区块")]
    MissingBlock { id: String, selector: String },

    #[error("题目 {id} 的第 {index} 张图片缺少 src")]
    MissingImageSource { id: String, index: usize },

    #[error("拒绝保存图片 {url}: {reason}")]
    ImageRejected { url: String, reason: String },

    #[error("题目 {id} 的第 {index} 则讨论无法匹配内容")]
    DiscussionCapture { id: String, index: usize },

    #[error("网络请求错误: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("网址错误: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type YamolResult<T> = Result<T, YamolError>;
