//! Post-hoc visual verification of an applied adaptation.

use crate::phases::{PhaseSpec, VISION, run_phase};
use crate::telemetry::PipelineTelemetry;
use aura_core::{CapabilityProvider, ImageAttachment, VisionVerdict};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::VerificationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const DEFAULT_SCREENSHOT_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub url: String,
    pub goal: String,
    #[serde(default)]
    pub actions_applied: Vec<String>,
    /// Data URL (`data:image/jpeg;base64,...`) or bare base64.
    #[serde(default)]
    pub screenshot: Option<String>
}

/// Decode a screenshot given as a data URL or bare base64.
///
/// The mime type comes from the data-URL header and defaults to PNG.
pub fn decode_screenshot(raw: &str) -> Result<ImageAttachment, VerificationError> {
    let raw = raw.trim();
    let (mime_type, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) =
                rest.split_once(',')
                    .ok_or_else(|| VerificationError::InvalidScreenshot {
                        reason: "data URL has no payload".to_string()
                    })?;
            let mime = header
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_SCREENSHOT_MIME);
            (mime.to_string(), payload)
        }
        None => (DEFAULT_SCREENSHOT_MIME.to_string(), raw)
    };

    if payload.trim().is_empty() {
        return Err(VerificationError::InvalidScreenshot {
            reason: "screenshot is empty".to_string()
        });
    }
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| VerificationError::InvalidScreenshot {
            reason: e.to_string()
        })?;

    Ok(ImageAttachment { mime_type, data })
}

pub struct VisualVerifier {
    provider: Arc<dyn CapabilityProvider>,
    spec: PhaseSpec,
    telemetry: Arc<PipelineTelemetry>
}

impl VisualVerifier {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        retries: u32,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        Self {
            provider,
            spec: VISION.with_retries(retries),
            telemetry
        }
    }

    /// Ask the vision phase whether the adaptation helped.
    ///
    /// Never fails: any problem becomes an unsuccessful verdict recommending
    /// `keep`.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn verify_adaptation(&self, request: &VerificationRequest) -> VisionVerdict {
        let Some(screenshot) = request.screenshot.as_deref() else {
            return VisionVerdict::failed("no screenshot was provided");
        };
        let image = match decode_screenshot(screenshot) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Rejected screenshot");
                return VisionVerdict::failed(e);
            }
        };

        let actions = if request.actions_applied.is_empty() {
            "- none".to_string()
        } else {
            request
                .actions_applied
                .iter()
                .map(|a| format!("- {a}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let input = format!(
            "URL: {}\nUser goal: {}\nActions applied:\n{actions}",
            request.url, request.goal
        );

        match run_phase::<VisionVerdict>(
            self.provider.as_ref(),
            &self.spec,
            &input,
            std::slice::from_ref(&image),
            &self.telemetry
        )
        .await
        {
            Ok(verdict) => {
                info!(
                    success = verdict.success,
                    recommendation = %verdict.recommendation,
                    "Visual verification finished"
                );
                verdict
            }
            Err(e) => {
                warn!(error = %e, "Visual verification failed");
                VisionVerdict::failed(e)
            }
        }
    }
}
