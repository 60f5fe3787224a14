use scraper::{ElementRef, Selector};
use std::path::Path;
use tracing::info;
use url::Url;

use super::compile_selector;
use crate::config::FetchConfig;
use crate::crawler::{FetchedImage, ImageFetcher};
use crate::utils::{YamolError, YamolResult};

/// 下载题目内容中的图片，存为 `<dir>/<id>_<i>.jpg`
pub struct ImageHarvester {
    img_selector: Selector,
    base_url: Option<Url>,
    max_bytes: usize,
    require_content_type: bool,
}

impl ImageHarvester {
    pub fn new(config: &FetchConfig) -> YamolResult<Self> {
        let base_url = if config.base_url.trim().is_empty() {
            None
        } else {
            Some(Url::parse(config.base_url.trim())?)
        };

        Ok(Self {
            img_selector: compile_selector("img")?,
            base_url,
            max_bytes: config.max_image_bytes,
            require_content_type: config.require_image_content_type,
        })
    }

    /// 按文档顺序取出图片的 src
    pub fn sources(&self, content: ElementRef<'_>, id: &str) -> YamolResult<Vec<String>> {
        content
            .select(&self.img_selector)
            .enumerate()
            .map(|(index, img)| {
                img.value()
                    .attr("src")
                    .map(|s| s.to_string())
                    .ok_or_else(|| YamolError::MissingImageSource {
                        id: id.to_string(),
                        index,
                    })
            })
            .collect()
    }

    /// 没有图片时返回 None；任何一张失败都让整道题失败
    pub async fn harvest<F: ImageFetcher>(
        &self,
        fetcher: &F,
        id: &str,
        sources: &[String],
        static_dir: &Path,
    ) -> YamolResult<Option<Vec<String>>> {
        if sources.is_empty() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(static_dir).await?;

        let mut paths = Vec::with_capacity(sources.len());
        for (i, src) in sources.iter().enumerate() {
            let url = self.resolve(src)?;
            let image = fetcher.fetch(&url).await?;
            self.check(&url, &image)?;

            let path = static_dir.join(format!("{}_{}.jpg", id, i));
            tokio::fs::write(&path, &image.bytes).await?;
            info!("图片已保存: {} -> {}", url, path.display());
            paths.push(path.to_string_lossy().into_owned());
        }

        Ok(Some(paths))
    }

    fn resolve(&self, src: &str) -> YamolResult<String> {
        let url = match Url::parse(src) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(src)?,
                None => return Err(url::ParseError::RelativeUrlWithoutBase.into()),
            },
            Err(e) => return Err(e.into()),
        };
        Ok(url.to_string())
    }

    fn check(&self, url: &str, image: &FetchedImage) -> YamolResult<()> {
        let reject = |reason: String| YamolError::ImageRejected {
            url: url.to_string(),
            reason,
        };

        if image.bytes.len() > self.max_bytes {
            return Err(reject(format!(
                "大小 {} 字节超过上限 {}",
                image.bytes.len(),
                self.max_bytes
            )));
        }

        if self.require_content_type {
            if let Some(content_type) = &image.content_type {
                if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
                    return Err(reject(format!("Content-Type 不是图片: {}", content_type)));
                }
            }
        }

        if image::guess_format(&image.bytes).is_err() {
            return Err(reject("无法识别的图片格式".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::crawler::image_fetcher::testing::{StaticFetcher, JPEG_BYTES};
    use scraper::Html;

    fn harvester() -> ImageHarvester {
        ImageHarvester::new(&AppConfig::default().fetch).unwrap()
    }

    fn sources(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sources_follow_document_order() {
        let html = Html::parse_fragment(
            r#"<div class="itemcontent"><img src="https://a/1.png"> text <p><img src="https://a/2.png"></p></div>"#,
        );
        let content = html.root_element();
        let found = harvester().sources(content, "1").unwrap();
        assert_eq!(found, vec!["https://a/1.png", "https://a/2.png"]);
    }

    #[test]
    fn image_without_src_is_fatal() {
        let html = Html::parse_fragment(r#"<div><img alt="x"></div>"#);
        let err = harvester().sources(html.root_element(), "4").unwrap_err();
        assert!(matches!(err, YamolError::MissingImageSource { index: 0, .. }));
    }

    #[tokio::test]
    async fn no_images_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::default();
        let out = harvester()
            .harvest(&fetcher, "1", &[], &dir.path().join("static"))
            .await
            .unwrap();
        assert_eq!(out, None);
        assert!(!dir.path().join("static").exists());
    }

    #[tokio::test]
    async fn paths_are_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().join("static");
        let fetcher = StaticFetcher::default()
            .with_jpeg("https://img.example/a.jpg")
            .with_jpeg("https://img.example/b.jpg");
        let srcs = sources(&["https://img.example/a.jpg", "https://img.example/b.jpg"]);

        let first = harvester()
            .harvest(&fetcher, "12", &srcs, &static_dir)
            .await
            .unwrap()
            .unwrap();
        let second = harvester()
            .harvest(&fetcher, "12", &srcs, &static_dir)
            .await
            .unwrap()
            .unwrap();

        let expected = vec![
            static_dir.join("12_0.jpg").to_string_lossy().into_owned(),
            static_dir.join("12_1.jpg").to_string_lossy().into_owned(),
        ];
        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(std::fs::read(&expected[1]).unwrap(), JPEG_BYTES);
        assert_eq!(std::fs::read_dir(&static_dir).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn relative_src_uses_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default().fetch;
        config.base_url = "https://www.yamol.tw/exam/".to_string();
        let harvester = ImageHarvester::new(&config).unwrap();
        let fetcher = StaticFetcher::default().with_jpeg("https://www.yamol.tw/upload/q.jpg");

        harvester
            .harvest(&fetcher, "2", &sources(&["/upload/q.jpg"]), dir.path())
            .await
            .unwrap();
        assert_eq!(
            fetcher.requests.borrow().as_slice(),
            ["https://www.yamol.tw/upload/q.jpg"]
        );
    }

    #[tokio::test]
    async fn relative_src_without_base_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = harvester()
            .harvest(&StaticFetcher::default(), "2", &sources(&["q.jpg"]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, YamolError::UrlError(_)));
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::default()
            .with_image("https://x/login", b"<html>login</html>", Some("text/html"))
            .with_image("https://x/blob", b"not an image", None);

        let err = harvester()
            .harvest(&fetcher, "3", &sources(&["https://x/login"]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, YamolError::ImageRejected { .. }));

        let err = harvester()
            .harvest(&fetcher, "3", &sources(&["https://x/blob"]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, YamolError::ImageRejected { .. }));
        assert!(!dir.path().join("3_0.jpg").exists());
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default().fetch;
        config.max_image_bytes = 4;
        let harvester = ImageHarvester::new(&config).unwrap();
        let fetcher = StaticFetcher::default().with_jpeg("https://x/big.jpg");

        let err = harvester
            .harvest(&fetcher, "5", &sources(&["https://x/big.jpg"]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, YamolError::ImageRejected { .. }));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_harvest() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::default().with_jpeg("https://x/ok.jpg");
        let err = harvester()
            .harvest(
                &fetcher,
                "6",
                &sources(&["https://x/ok.jpg", "https://x/down.jpg"]),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, YamolError::IoError(_)));
    }
}
