use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::board::StoryboardResult;
use crate::client::StoryboardClient;
use crate::errors::ClientError;

/// Reference to a rendered PDF artifact, ready for download.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PdfExport {
    pub pdf_url: String,
    pub filename: String,
}

/// Outcome of a bulk image download.
///
/// Per-frame failures are collected and reported once in aggregate; they do
/// not abort the remaining downloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files written, in frame order.
    pub saved: Vec<PathBuf>,
    /// Failed downloads as `(filename, reason)` pairs.
    pub failed: Vec<(String, String)>,
}

impl DownloadReport {
    /// True when every frame image was saved.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, serde::Deserialize)]
struct PdfResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pdf_url: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    error: Option<String>,
}

impl StoryboardClient {
    /// Sends the finished storyboard to the PDF export endpoint and returns
    /// the artifact reference.
    pub async fn export_pdf(&self, result: &StoryboardResult) -> Result<PdfExport, ClientError> {
        if result.frames.is_empty() {
            return Err(ClientError::Validation("no storyboard to export".into()));
        }
        let payload = build_pdf_payload(result)?;
        let response = self
            .http()
            .post(self.config().export_pdf_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("PDF export request failed: {e}")))?;
        let status = response.status();
        let payload: PdfResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("invalid PDF export response: {e}")))?;
        if !status.is_success() || !payload.success {
            return Err(ClientError::Export(
                payload
                    .error
                    .unwrap_or_else(|| format!("PDF generation failed with status {status}")),
            ));
        }
        Ok(PdfExport {
            pdf_url: payload.pdf_url,
            filename: payload.filename,
        })
    }

    /// Downloads every frame image into `dir`, one at a time with a fixed
    /// pause between fetches so the receiving side is not flooded.
    pub async fn download_all_images(
        &self,
        result: &StoryboardResult,
        dir: &Path,
    ) -> Result<DownloadReport, ClientError> {
        if result.frames.is_empty() {
            return Err(ClientError::Validation("no storyboard to download".into()));
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ClientError::Export(format!("failed to create {}: {e}", dir.display())))?;

        let mut report = DownloadReport::default();
        for (position, frame) in result.frames.iter().enumerate() {
            if position > 0 {
                tokio::time::sleep(self.config().download_delay).await;
            }
            let filename = format!("frame_{}.png", frame.number_at(position));
            match self.fetch_image(&frame.image_url).await {
                Ok(bytes) => {
                    let path = dir.join(&filename);
                    match tokio::fs::write(&path, &bytes).await {
                        Ok(()) => {
                            debug!(file = %path.display(), "image saved");
                            report.saved.push(path);
                        }
                        Err(e) => {
                            warn!(%filename, error = %e, "image write failed");
                            report.failed.push((filename, format!("write failed: {e}")));
                        }
                    }
                }
                Err(e) => {
                    warn!(%filename, error = %e, "image download failed");
                    report.failed.push((filename, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    async fn fetch_image(&self, image_url: &str) -> Result<bytes::Bytes, ClientError> {
        let url = self.config().absolute_url(image_url);
        let response = self
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("image request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "image request failed with status {status}"
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("image read failed: {e}")))
    }
}

/// Builds the export payload: frames plus a server-side `image_path` derived
/// from each root-relative `image_url`, paired with the narrative metadata.
pub(crate) fn build_pdf_payload(
    result: &StoryboardResult,
) -> Result<serde_json::Value, ClientError> {
    let mut storyboard = Vec::with_capacity(result.frames.len());
    for frame in &result.frames {
        let mut value = serde_json::to_value(frame)
            .map_err(|e| ClientError::protocol_msg(format!("failed to serialize frame: {e}")))?;
        if let Some(object) = value.as_object_mut() {
            let image_path = frame
                .image_url
                .strip_prefix('/')
                .unwrap_or(&frame.image_url)
                .to_string();
            object.insert("image_path".into(), serde_json::Value::String(image_path));
        }
        storyboard.push(value);
    }
    Ok(serde_json::json!({
        "storyboard": storyboard,
        "metadata": { "aldar_story": result.narrative },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Frame;

    fn result_with_frames(count: usize) -> StoryboardResult {
        StoryboardResult {
            frames: (0..count)
                .map(|i| Frame {
                    frame_number: Some(i as u32 + 1),
                    image_url: format!("/static/generated/frame_{}.png", i + 1),
                    rhyme: format!("rhyme {i}"),
                    description: format!("description {i}"),
                    moral: "wisdom".into(),
                    shot_type: "wide".into(),
                    setting: None,
                    key_objects: Vec::new(),
                })
                .collect(),
            narrative: "Once upon the steppe".into(),
        }
    }

    #[test]
    fn pdf_payload_adds_image_path_and_metadata() {
        let payload = build_pdf_payload(&result_with_frames(2)).expect("payload builds");
        let frames = payload["storyboard"].as_array().expect("storyboard array");
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0]["image_path"].as_str(),
            Some("static/generated/frame_1.png")
        );
        assert_eq!(
            frames[0]["image_url"].as_str(),
            Some("/static/generated/frame_1.png")
        );
        assert_eq!(
            payload["metadata"]["aldar_story"].as_str(),
            Some("Once upon the steppe")
        );
    }

    #[test]
    fn pdf_response_failure_envelope_parses() {
        let payload: PdfResponse =
            serde_json::from_str(r#"{"success":false,"error":"no images on disk"}"#)
                .expect("envelope parses");
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("no images on disk"));
    }

    #[test]
    fn download_report_completeness() {
        let mut report = DownloadReport::default();
        report.saved.push(PathBuf::from("frame_1.png"));
        assert!(report.is_complete());
        report
            .failed
            .push(("frame_2.png".into(), "status 404".into()));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn empty_storyboard_is_rejected_for_export_and_download() {
        let client =
            StoryboardClient::new(crate::config::ClientConfig::default()).expect("client builds");
        let empty = StoryboardResult::default();
        assert!(matches!(
            client.export_pdf(&empty).await,
            Err(ClientError::Validation(_))
        ));
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            client.download_all_images(&empty, dir.path()).await,
            Err(ClientError::Validation(_))
        ));
    }
}
