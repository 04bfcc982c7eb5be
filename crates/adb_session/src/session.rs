//! Stateful session bound to one adb target
//!
//! A [`DeviceSession`] wraps one device (or emulator) reachable through adb
//! and holds the last UI snapshot pulled from it. Operations run one at a
//! time; the session takes `&mut self` wherever state is touched, so
//! concurrent use of one session does not compile. Use one session per
//! worker when parallelism is needed, on distinct ports so host-side
//! artifacts do not collide.

use crate::config::TIMING_CONFIG;
use crate::error::{AdbError, Result};
use crate::gestures::GestureProfile;
use crate::runner::{AdbRunner, CommandResult};
use crate::ui::{Bounds, Selector, UiSnapshot};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Path the UI dump is written to on the device before being pulled.
pub(crate) const DEVICE_DUMP_PATH: &str = "/sdcard/window_dump.xml";

/// Session handle for one adb target.
///
/// Invariant: query results (`exists`, `get_text`, `get_bounds`, ...) are as
/// of the last [`refresh_snapshot`](Self::refresh_snapshot) call. No query
/// refreshes implicitly; refresh explicitly before reading to avoid stale
/// results.
pub struct DeviceSession {
    pub(crate) runner: AdbRunner,
    host: String,
    port: Option<u16>,
    artifact_dir: PathBuf,
    pub(crate) gestures: GestureProfile,
    current: Option<UiSnapshot>,
    last_raw_output: String,
}

impl DeviceSession {
    /// Create a session without connecting. Most callers want
    /// [`open`](Self::open), which also issues the connect request.
    pub fn new(host: &str, port: Option<u16>) -> Self {
        let serial = port.map(|p| format!("{}:{}", host, p));
        Self {
            runner: AdbRunner::new(serial),
            host: host.to_string(),
            port,
            artifact_dir: PathBuf::from("."),
            gestures: GestureProfile::default(),
            current: None,
            last_raw_output: String::new(),
        }
    }

    /// Create a session and immediately connect to `host:port`. With no
    /// port, commands target whatever single device is already attached and
    /// no connect request is issued.
    pub async fn open(host: &str, port: Option<u16>) -> Result<Self> {
        let mut session = Self::new(host, port);
        session.connect().await?;
        Ok(session)
    }

    /// Use an adb binary other than the one on `PATH`.
    pub fn with_adb_path(mut self, adb_path: &str) -> Self {
        let serial = self.runner.serial().map(str::to_string);
        self.runner = AdbRunner::with_path(adb_path.to_string(), serial);
        self
    }

    /// Directory host-side artifacts (UI dumps, screenshots) are written to.
    /// Defaults to the working directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Override the fixed-vector swipe gesture profile.
    pub fn with_gesture_profile(mut self, profile: GestureProfile) -> Self {
        self.gestures = profile;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Raw output of the most recent adb invocation, kept for diagnostics.
    pub fn last_raw_output(&self) -> &str {
        &self.last_raw_output
    }

    /// Host-side filename component keying this session's artifacts.
    pub(crate) fn artifact_tag(&self) -> String {
        match self.port {
            Some(port) => port.to_string(),
            None => "local".to_string(),
        }
    }

    pub(crate) fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.artifact_dir.join(file_name)
    }

    /// Run a device-scoped command and record its output for diagnostics.
    pub(crate) async fn run_recorded(
        &mut self,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        let result = self.runner.run(args, timeout).await?;
        self.last_raw_output = result.combined();
        Ok(result)
    }

    /// Like [`run_recorded`](Self::run_recorded) but non-zero exit is an error.
    pub(crate) async fn run_recorded_checked(
        &mut self,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        let result = self.run_recorded(args, timeout).await?;
        if !result.success {
            return Err(AdbError::Process {
                args: args.join(" "),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }

    /// Issue `adb connect host:port`. Idempotent: an already-connected
    /// target reports `already connected` and still counts as success.
    /// Without a configured port this is a no-op.
    pub async fn connect(&mut self) -> Result<bool> {
        let Some(port) = self.port else {
            return Ok(true);
        };
        let addr = format!("{}:{}", self.host, port);
        let result = self.runner.run_global(&["connect", &addr], None).await?;
        self.last_raw_output = result.combined();

        if self.last_raw_output.contains("connected") {
            info!("adb connected to {}", addr);
            Ok(true)
        } else {
            Err(AdbError::Connection(format!(
                "cannot connect to {}: {}",
                addr,
                self.last_raw_output.trim()
            )))
        }
    }

    /// Dump the on-device UI hierarchy, pull it to the host and parse it,
    /// replacing the current snapshot. Retries a bounded number of times
    /// with a short backoff, then propagates the last failure; there is no
    /// silent empty-snapshot result.
    pub async fn refresh_snapshot(&mut self) -> Result<&UiSnapshot> {
        let config = &TIMING_CONFIG.snapshot;
        let mut last_err = AdbError::Parse("snapshot never attempted".into());

        for attempt in 1..=config.attempts {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_secs_f64(config.retry_delay)).await;
            }
            match self.acquire_snapshot().await {
                Ok(snapshot) => {
                    return Ok(&*self.current.insert(snapshot));
                }
                Err(e) => {
                    warn!("snapshot attempt {}/{} failed: {}", attempt, config.attempts, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn acquire_snapshot(&mut self) -> Result<UiSnapshot> {
        self.run_recorded_checked(&["shell", "uiautomator", "dump", DEVICE_DUMP_PATH], None)
            .await?;

        let local = self.artifact_path(&format!("file{}.xml", self.artifact_tag()));
        let local_str = local.to_string_lossy().into_owned();
        self.run_recorded_checked(&["pull", DEVICE_DUMP_PATH, &local_str], None)
            .await?;

        let xml = std::fs::read_to_string(&local)?;
        UiSnapshot::parse(&xml)
    }

    /// The last-refreshed snapshot, if any.
    pub fn snapshot(&self) -> Option<&UiSnapshot> {
        self.current.as_ref()
    }

    /// Refresh until the snapshot differs structurally from the previous
    /// one. Returns `Ok(true)` on the first detected difference and
    /// `Timeout` once `max_attempts` refreshes saw no change.
    pub async fn wait_for_change(
        &mut self,
        poll_interval: Duration,
        max_attempts: usize,
    ) -> Result<bool> {
        let previous = self.current.clone();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(poll_interval).await;
            }
            self.refresh_snapshot().await?;
            if self.current != previous {
                info!("UI changed after {} refresh(es)", attempt);
                return Ok(true);
            }
        }
        Err(AdbError::Timeout(format!(
            "UI unchanged after {} refreshes",
            max_attempts
        )))
    }

    /// Whether any node matches the selector in the current snapshot.
    /// False when no snapshot has been taken yet.
    pub fn exists(&self, selector: &Selector) -> bool {
        self.current
            .as_ref()
            .map_or(false, |s| s.exists(selector))
    }

    /// The matched node's text, or absent when nothing matches.
    pub fn get_text(&self, selector: &Selector) -> Option<String> {
        self.current
            .as_ref()
            .and_then(|s| s.text(selector).map(str::to_string))
    }

    /// The matched node's content description, or absent when nothing matches.
    pub fn get_content_description(&self, selector: &Selector) -> Option<String> {
        self.current
            .as_ref()
            .and_then(|s| s.content_desc(selector).map(str::to_string))
    }

    /// The matched node's bounds; an error when nothing matches, since the
    /// caller is about to act on the rectangle.
    pub fn get_bounds(&self, selector: &Selector) -> Result<Bounds> {
        match &self.current {
            Some(snapshot) => snapshot.bounds(selector),
            None => Err(AdbError::ElementNotFound(format!(
                "{} (no snapshot taken)",
                selector
            ))),
        }
    }

    /// Whether a node with exactly this text is on screen.
    pub fn text_exists(&self, text: &str) -> bool {
        self.exists(&Selector::text(text))
    }

    /// Whether the matched node's text equals `expected`.
    pub fn text_matches(&self, selector: &Selector, expected: &str) -> bool {
        self.get_text(selector).as_deref() == Some(expected)
    }

    /// The `mCurrentFocus` line from the window manager, identifying the
    /// focused window.
    pub async fn current_focus_window(&mut self) -> Result<String> {
        let result = self
            .run_recorded_checked(
                &["shell", "dumpsys", "window", "displays"],
                Some(Duration::from_secs(TIMING_CONFIG.lifecycle.grant_timeout)),
            )
            .await?;
        result
            .stdout
            .lines()
            .find(|line| line.contains("mCurrentFocus"))
            .map(|line| line.trim().to_string())
            .ok_or_else(|| AdbError::Parse("mCurrentFocus not present in dumpsys output".into()))
    }

    /// Raw notification dump lines.
    pub async fn notifications(&mut self) -> Result<Vec<String>> {
        let result = self
            .run_recorded_checked(&["shell", "dumpsys", "notification", "--noredact"], None)
            .await?;
        Ok(result.stdout.lines().map(str::to_string).collect())
    }

    #[cfg(test)]
    pub(crate) fn set_snapshot_for_test(&mut self, snapshot: UiSnapshot) {
        self.current = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node class="android.widget.FrameLayout" text="" resource-id="" bounds="[0,0][1080,2400]">
    <node class="android.widget.TextView" text="Inbox" content-desc="Inbox tab" resource-id="com.app:id/inbox" bounds="[10,20][30,40]" />
  </node>
</hierarchy>
"#;

    #[test]
    fn test_queries_without_snapshot() {
        let session = DeviceSession::new("localhost", Some(5555));
        let selector = Selector::text("Inbox");
        assert!(!session.exists(&selector));
        assert_eq!(session.get_text(&selector), None);
        assert!(matches!(
            session.get_bounds(&selector),
            Err(AdbError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_queries_against_snapshot() {
        let mut session = DeviceSession::new("localhost", Some(5555));
        session.set_snapshot_for_test(UiSnapshot::parse(FIXTURE).unwrap());

        let selector = Selector::resource_id("com.app:id/inbox");
        assert!(session.exists(&selector));
        assert_eq!(session.get_text(&selector), Some("Inbox".to_string()));
        assert_eq!(
            session.get_content_description(&selector),
            Some("Inbox tab".to_string())
        );
        assert_eq!(session.get_bounds(&selector).unwrap().center(), (20, 30));
        assert!(session.text_exists("Inbox"));
        assert!(session.text_matches(&selector, "Inbox"));
        assert!(!session.text_matches(&selector, "Outbox"));
    }

    #[test]
    fn test_artifact_tag() {
        assert_eq!(DeviceSession::new("localhost", Some(5555)).artifact_tag(), "5555");
        assert_eq!(DeviceSession::new("localhost", None).artifact_tag(), "local");
    }

    #[cfg(unix)]
    fn fake_adb(dir: &std::path::Path) -> String {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("adb");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_refresh_and_wait_for_change_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let adb = fake_adb(dir.path());
        // The stub adb exits 0 without pulling anything, so the dump file
        // is seeded by the test.
        std::fs::write(dir.path().join("file5555.xml"), FIXTURE).unwrap();

        let mut session = DeviceSession::new("localhost", Some(5555))
            .with_adb_path(&adb)
            .with_artifact_dir(dir.path());

        let snapshot = session.refresh_snapshot().await.unwrap();
        assert!(snapshot.exists(&Selector::text("Inbox")));

        // Identical dump on every poll: bounded wait must time out
        let err = session
            .wait_for_change(Duration::from_millis(1), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AdbError::Timeout(_)));

        // A structurally different dump is detected on the first refresh
        let changed = FIXTURE.replace("Inbox", "Archive");
        std::fs::write(dir.path().join("file5555.xml"), changed).unwrap();
        let detected = session
            .wait_for_change(Duration::from_millis(1), 3)
            .await
            .unwrap();
        assert!(detected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_for_change_timeout_skips_trailing_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let adb = fake_adb(dir.path());
        std::fs::write(dir.path().join("file5555.xml"), FIXTURE).unwrap();

        let mut session = DeviceSession::new("localhost", Some(5555))
            .with_adb_path(&adb)
            .with_artifact_dir(dir.path());
        session.refresh_snapshot().await.unwrap();

        // One attempt means no inter-attempt sleep at all: a long poll
        // interval must not delay the Timeout result
        let started = std::time::Instant::now();
        let err = session
            .wait_for_change(Duration::from_secs(30), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AdbError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("adb");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\necho 'already connected to localhost:5555'\nexit 0\n")
            .unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        drop(file);

        let mut session = DeviceSession::new("localhost", Some(5555))
            .with_adb_path(&path.to_string_lossy());
        assert!(session.connect().await.unwrap());
        assert!(session.connect().await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_failure_classified() {
        let dir = tempfile::tempdir().unwrap();
        let adb = fake_adb(dir.path());
        // Stub prints nothing, so no "connected" marker appears
        let mut session = DeviceSession::new("localhost", Some(5555)).with_adb_path(&adb);
        assert!(matches!(
            session.connect().await,
            Err(AdbError::Connection(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_refresh_propagates_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let adb = fake_adb(dir.path());
        std::fs::write(dir.path().join("file5555.xml"), "<hierarchy><node text=\"x\">").unwrap();

        let mut session = DeviceSession::new("localhost", Some(5555))
            .with_adb_path(&adb)
            .with_artifact_dir(dir.path());

        assert!(matches!(
            session.refresh_snapshot().await,
            Err(AdbError::Parse(_))
        ));
    }
}
