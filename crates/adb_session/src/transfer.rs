//! Screenshot capture and device-to-host file transfer

use crate::error::Result;
use crate::session::DeviceSession;
use std::path::PathBuf;
use tracing::{info, warn};

const DEVICE_SCREENSHOT_PATH: &str = "/sdcard/screenshot.png";

impl DeviceSession {
    /// Capture the screen on-device and pull it to
    /// `screenshot{port}.png` in the artifact directory.
    pub async fn take_screenshot(&mut self) -> Result<PathBuf> {
        self.run_recorded_checked(&["shell", "screencap", "-p", DEVICE_SCREENSHOT_PATH], None)
            .await?;

        let local = self.artifact_path(&format!("screenshot{}.png", self.artifact_tag()));
        let local_str = local.to_string_lossy().into_owned();
        self.run_recorded_checked(&["pull", DEVICE_SCREENSHOT_PATH, &local_str], None)
            .await?;

        info!("screenshot saved as {}", local.display());
        Ok(local)
    }

    /// Pull a file from the device. Best-effort and non-fatal: any failure
    /// is logged and reported as `false`, never an error.
    pub async fn pull_file(&mut self, remote_path: &str, local_path: &str) -> bool {
        match self.run_recorded(&["pull", remote_path, local_path], None).await {
            Ok(result) if result.success => true,
            Ok(result) => {
                warn!("pull {} failed: {}", remote_path, result.combined().trim());
                false
            }
            Err(e) => {
                warn!("pull {} failed: {}", remote_path, e);
                false
            }
        }
    }

    /// List a device directory.
    pub async fn list_files(&mut self, path: &str) -> Result<Vec<String>> {
        let result = self.run_recorded_checked(&["shell", "ls", path], None).await?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
