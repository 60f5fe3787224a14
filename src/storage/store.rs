use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::parser::record::Record;
use crate::utils::YamolResult;

/// 题号 -> 记录
pub type Store = BTreeMap<String, Record>;

/// 写入位置：有目录时为 `[文件名, 目录]`，否则为原路径
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoreLocation {
    InDirectory(String, String),
    Bare(String),
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::InDirectory(file, dir) => write!(f, "{} 于 {}", file, dir),
            StoreLocation::Bare(path) => write!(f, "{} 于当前工作目录", path),
        }
    }
}

/// 新记录覆盖同题号的旧记录
pub fn merge(mut existing: Store, incoming: Store) -> Store {
    existing.extend(incoming);
    existing
}

/// 题库 JSON 文件的读写
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// 文件不存在时返回空题库
    pub fn load(&self) -> YamolResult<Store> {
        if !self.path.is_file() {
            return Ok(Store::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 先写临时文件再改名覆盖
    pub fn save(&self, store: &Store) -> YamolResult<StoreLocation> {
        if let Some(dir) = self.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, serde_json::to_string(store)?)?;
        std::fs::rename(&tmp_path, &self.path)?;

        let location = self.location();
        info!("已建立 {} (共 {} 题)", location, store.len());
        Ok(location)
    }

    pub fn location(&self) -> StoreLocation {
        match self.parent() {
            Some(dir) => StoreLocation::InDirectory(
                self.path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                dir.to_string_lossy().into_owned(),
            ),
            None => StoreLocation::Bare(self.path.to_string_lossy().into_owned()),
        }
    }
}
