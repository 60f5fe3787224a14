use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::FetchConfig;
use crate::utils::{YamolError, YamolResult};

/// 下载到的图片内容
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// 按网址取回图片字节
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = YamolResult<FetchedImage>>;
}

pub struct HttpFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> YamolResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_image_bytes,
        })
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> YamolResult<FetchedImage> {
        debug!("下载图片: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            error!("下载失败，状态码: {}", response.status());
        }
        let response = response.error_for_status()?;

        // 先看声明的长度，避免把超大文件读进内存
        if let Some(len) = response.content_length() {
            check_declared_len(url, len, self.max_bytes)?;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// 长度按 u64 比较，32 位平台上也不会截断
fn check_declared_len(url: &str, len: u64, max_bytes: usize) -> YamolResult<()> {
    if len > max_bytes as u64 {
        return Err(YamolError::ImageRejected {
            url: url.to_string(),
            reason: format!("声明大小 {} 字节超过上限 {}", len, max_bytes),
        });
    }
    Ok(())
}


#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

    /// 内存中的假下载器，未登记的网址视为连接失败
    #[derive(Default)]
    pub struct StaticFetcher {
        images: HashMap<String, FetchedImage>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn with_image(mut self, url: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
            self.images.insert(
                url.to_string(),
                FetchedImage {
                    bytes: bytes.to_vec(),
                    content_type: content_type.map(|s| s.to_string()),
                },
            );
            self
        }

        pub fn with_jpeg(self, url: &str) -> Self {
            self.with_image(url, JPEG_BYTES, Some("image/jpeg"))
        }
    }

    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> YamolResult<FetchedImage> {
            self.requests.borrow_mut().push(url.to_string());
            self.images.get(url).cloned().ok_or_else(|| {
                YamolError::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("connection refused: {}", url),
                ))
            })
        }
    }
}
