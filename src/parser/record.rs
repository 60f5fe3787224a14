use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{YamolError, YamolResult};

pub const EXPECTED_CHOICES: usize = 4;

/// 一道题的标准化记录，题号作为存储的键，不在记录内
///
/// 存储为 `[question, choices, answer]`，有图片时追加第四个元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordRepr", into = "RecordRepr")]
pub struct Record {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
    pub images: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecordRepr {
    WithImages(String, Vec<String>, String, Vec<String>),
    Plain(String, Vec<String>, String),
}

impl From<RecordRepr> for Record {
    fn from(repr: RecordRepr) -> Self {
        match repr {
            RecordRepr::WithImages(question, choices, answer, images) => Self {
                question,
                choices,
                answer,
                images: Some(images),
            },
            RecordRepr::Plain(question, choices, answer) => Self {
                question,
                choices,
                answer,
                images: None,
            },
        }
    }
}

impl From<Record> for RecordRepr {
    fn from(record: Record) -> Self {
        match record.images {
            Some(images) => {
                RecordRepr::WithImages(record.question, record.choices, record.answer, images)
            }
            None => RecordRepr::Plain(record.question, record.choices, record.answer),
        }
    }
}

/// 不中断流程的校验问题
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationWarning {
    #[error("There are {found} choice(s), not 4!")]
    ChoiceCount { found: usize },

    #[error("No such answer! `{answer}` matches no choice marker")]
    AnswerNotInChoices { answer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub id: String,
    pub record: Record,
    pub warnings: Vec<ValidationWarning>,
}

/// 题号取题干第一个 `.` 之前的部分
pub fn question_number(question: &str) -> &str {
    question.split('.').next().unwrap_or_default()
}

/// 组装记录并校验：题号不符为硬错误，其余问题只作为警告返回
pub fn assemble(
    id: impl ToString,
    question: String,
    choices: Vec<String>,
    answer: String,
    images: Option<Vec<String>>,
) -> YamolResult<Assembled> {
    let id = id.to_string();
    if id != question_number(&question) {
        return Err(YamolError::IdMismatch { id, question });
    }

    let mut warnings = Vec::new();
    if choices.len() != EXPECTED_CHOICES {
        warnings.push(ValidationWarning::ChoiceCount {
            found: choices.len(),
        });
    }

    let matches_marker = |choice: &String| {
        let head: String = choice.chars().take(3).collect();
        head.contains(answer.as_str())
    };
    if !choices.iter().any(matches_marker) {
        warnings.push(ValidationWarning::AnswerNotInChoices {
            answer: answer.clone(),
        });
    }

    Ok(Assembled {
        id,
        record: Record {
            question,
            choices,
            answer,
            images,
        },
        warnings,
    })
}
