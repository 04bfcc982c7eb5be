//! App lifecycle and permission management
//!
//! Install failures throw; uninstall, clear-data and grant report success
//! as a boolean instead. The asymmetry is deliberate: an install the caller
//! cannot proceed without is an error, the others are routinely issued
//! against packages that may not be present.

use crate::config::TIMING_CONFIG;
use crate::error::{AdbError, Result};
use crate::session::DeviceSession;
use std::time::Duration;
use tracing::{info, warn};

/// adb prints a literal `Success` marker for pm-style operations.
fn reports_success(output: &str) -> bool {
    output.contains("Success")
}

/// Parse `pm list packages` output (`package:com.example.app` per line).
fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(str::to_string)
        .collect()
}

impl DeviceSession {
    /// Packages currently installed on the device.
    pub async fn installed_packages(&mut self) -> Result<Vec<String>> {
        let result = self
            .run_recorded_checked(&["shell", "pm", "list", "packages"], None)
            .await?;
        Ok(parse_package_list(&result.stdout))
    }

    /// Install an APK with `-g -r` (grant runtime permissions, allow
    /// reinstall). When the install command does not report success the
    /// installed-package list is polled for `expected_package`, since slow
    /// emulators sometimes finish the install after the command returns
    /// ambiguously. Exhausting the poll attempts is an `Install` error.
    pub async fn install_apk(&mut self, apk_path: &str, expected_package: &str) -> Result<()> {
        let config = &TIMING_CONFIG.lifecycle;
        let timeout = Duration::from_secs(config.install_timeout);
        info!("installing {}", apk_path);

        let result = self
            .run_recorded(&["install", "-g", "-r", apk_path], Some(timeout))
            .await?;
        let install_output = result.combined();
        if reports_success(&install_output) {
            return Ok(());
        }

        for attempt in 1..=config.install_attempts {
            tokio::time::sleep(Duration::from_secs_f64(config.install_poll_interval)).await;
            if self
                .installed_packages()
                .await?
                .iter()
                .any(|p| p == expected_package)
            {
                info!("{} appeared after {} poll(s)", expected_package, attempt);
                return Ok(());
            }
        }

        Err(AdbError::Install(format!(
            "{} not installed: {}",
            expected_package,
            install_output.trim()
        )))
    }

    /// Uninstall a package. False when adb does not report success.
    pub async fn uninstall(&mut self, package: &str) -> Result<bool> {
        let timeout = Duration::from_secs(TIMING_CONFIG.lifecycle.uninstall_timeout);
        let result = self.run_recorded(&["uninstall", package], Some(timeout)).await?;
        warn!("uninstall {}: {}", package, result.combined().trim());
        Ok(reports_success(&result.combined()))
    }

    /// Clear a package's data. False when adb does not report success.
    pub async fn clear_data(&mut self, package: &str) -> Result<bool> {
        let timeout = Duration::from_secs(TIMING_CONFIG.lifecycle.uninstall_timeout);
        let result = self
            .run_recorded(&["shell", "pm", "clear", package], Some(timeout))
            .await?;
        warn!("pm clear {}: {}", package, result.combined().trim());
        Ok(reports_success(&result.combined()))
    }

    /// Grant one runtime permission. False when adb does not report success.
    pub async fn grant_permission(&mut self, package: &str, permission: &str) -> Result<bool> {
        let timeout = Duration::from_secs(TIMING_CONFIG.lifecycle.grant_timeout);
        let result = self
            .run_recorded(&["shell", "pm", "grant", package, permission], Some(timeout))
            .await?;
        info!("pm grant {} {}: {}", package, permission, result.combined().trim());
        Ok(reports_success(&result.combined()))
    }

    /// Launch a package's default launcher activity.
    pub async fn open_app(&mut self, package: &str) -> Result<()> {
        self.run_recorded_checked(
            &["shell", "monkey", "-p", package, "-c", "android.intent.category.LAUNCHER", "1"],
            None,
        )
        .await?;
        info!("opened {}", package);
        Ok(())
    }

    /// Force-stop a package.
    pub async fn close_app(&mut self, package: &str) -> Result<()> {
        self.run_recorded_checked(&["shell", "am", "force-stop", package], None)
            .await?;
        info!("{} force-stopped", package);
        Ok(())
    }

    /// Open a deep link, routed to the given package.
    pub async fn open_deep_link(&mut self, url: &str, target_package: &str) -> Result<()> {
        self.run_recorded(
            &["shell", "am", "start", "-a", "android.intent.action.VIEW", "-d", url, target_package],
            None,
        )
        .await?;
        Ok(())
    }
}
