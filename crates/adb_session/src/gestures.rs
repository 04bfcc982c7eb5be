//! Tap, swipe and key-press primitives

use crate::error::{AdbError, Result};
use crate::session::DeviceSession;
use crate::ui::{Bounds, Selector};
use tracing::info;

/// Fixed-vector swipe gesture, as start and end coordinates.
///
/// The default profile reproduces the short vertical flick the wrapper has
/// always used: `(150,400) -> (150,150)` for a downward scroll and the
/// reverse for upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureProfile {
    pub swipe_start: (i32, i32),
    pub swipe_end: (i32, i32),
}

impl Default for GestureProfile {
    fn default() -> Self {
        Self {
            swipe_start: (150, 400),
            swipe_end: (150, 150),
        }
    }
}

impl DeviceSession {
    /// Tap at exact screen coordinates.
    pub async fn tap(&mut self, x: i32, y: i32) -> Result<()> {
        let (xs, ys) = (x.to_string(), y.to_string());
        let result = self
            .run_recorded(&["shell", "input", "tap", &xs, &ys], None)
            .await?;
        if !result.success {
            return Err(AdbError::Interaction(format!(
                "input tap {} {}: {}",
                x,
                y,
                result.combined().trim()
            )));
        }
        info!("input tap {} {} executed", x, y);
        Ok(())
    }

    /// Tap the integer midpoint of a rectangle.
    pub async fn tap_bounds(&mut self, bounds: &Bounds) -> Result<()> {
        let (x, y) = bounds.center();
        self.tap(x, y).await
    }

    /// Resolve a selector against the current snapshot and tap the matched
    /// element's center. Fails with `ElementNotFound` when nothing matches.
    pub async fn tap_selector(&mut self, selector: &Selector) -> Result<()> {
        let bounds = self.get_bounds(selector)?;
        self.tap_bounds(&bounds).await
    }

    /// Swipe between two points.
    pub async fn swipe(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<()> {
        let coords = [x1.to_string(), y1.to_string(), x2.to_string(), y2.to_string()];
        let result = self
            .run_recorded(
                &["shell", "input", "swipe", &coords[0], &coords[1], &coords[2], &coords[3]],
                None,
            )
            .await?;
        if !result.success {
            return Err(AdbError::Interaction(format!(
                "input swipe {} {} {} {}: {}",
                x1,
                y1,
                x2,
                y2,
                result.combined().trim()
            )));
        }
        Ok(())
    }

    /// Scroll down using the session's gesture profile.
    pub async fn swipe_down(&mut self) -> Result<()> {
        let GestureProfile { swipe_start: (x1, y1), swipe_end: (x2, y2) } = self.gestures;
        self.swipe(x1, y1, x2, y2).await
    }

    /// Scroll up: the downward gesture reversed.
    pub async fn swipe_up(&mut self) -> Result<()> {
        let GestureProfile { swipe_start: (x2, y2), swipe_end: (x1, y1) } = self.gestures;
        self.swipe(x1, y1, x2, y2).await
    }

    /// Send one key event by keycode name, e.g. `KEYCODE_BACK`.
    pub async fn press_key(&mut self, keycode: &str) -> Result<()> {
        let result = self
            .run_recorded(&["shell", "input", "keyevent", keycode], None)
            .await?;
        if !result.success {
            return Err(AdbError::Interaction(format!(
                "input keyevent {}: {}",
                keycode,
                result.combined().trim()
            )));
        }
        Ok(())
    }

    /// Press the back button.
    pub async fn press_back(&mut self) -> Result<()> {
        self.press_key("KEYCODE_BACK").await?;
        info!("back key pressed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::AdbRunner;

    #[test]
    fn test_tap_point_from_bounds() {
        // The full tap path: bounds -> integer midpoint -> exact argv
        let bounds = Bounds::parse("[10,20][30,40]").unwrap();
        let (x, y) = bounds.center();
        assert_eq!((x, y), (20, 30));

        let runner = AdbRunner::new(Some("localhost:5555".to_string()));
        let args = runner.build_args(&["shell", "input", "tap", &x.to_string(), &y.to_string()]);
        assert_eq!(
            args,
            vec!["-s", "localhost:5555", "shell", "input", "tap", "20", "30"]
        );
    }

    #[test]
    fn test_default_gesture_profile() {
        let profile = GestureProfile::default();
        assert_eq!(profile.swipe_start, (150, 400));
        assert_eq!(profile.swipe_end, (150, 150));
    }
}
