//! Platform detection for touch handling.

use std::sync::OnceLock;

/// Cached platform detection results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platform {
    /// Phone or tablet. Activating a widget releases editor focus so the
    /// on-screen keyboard does not cover the controls.
    pub mobile: bool,
    /// The device reports touch points, so handles need touch listeners.
    pub touch: bool,
}

impl Platform {
    /// Classify from the navigator's user agent, platform string and touch
    /// point count.
    pub fn from_navigator(user_agent: &str, platform: &str, max_touch_points: i32) -> Self {
        let user_agent = user_agent.to_lowercase();
        let platform = platform.to_lowercase();
        let touch_points = max_touch_points > 0;

        // iPadOS reports a Mac platform; touch points give it away
        let ios = user_agent.contains("iphone")
            || user_agent.contains("ipad")
            || user_agent.contains("ipod")
            || (platform.contains("mac") && touch_points);
        let android = user_agent.contains("android");
        let mobile = ios || android || user_agent.contains("mobile");

        Self {
            mobile,
            touch: touch_points || mobile,
        }
    }
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Get cached platform info. Detection runs once on first call.
pub fn platform() -> &'static Platform {
    PLATFORM.get_or_init(detect_platform)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn detect_platform() -> Platform {
    let Some(window) = web_sys::window() else {
        return Platform::default();
    };
    let navigator = window.navigator();
    Platform::from_navigator(
        &navigator.user_agent().unwrap_or_default(),
        &navigator.platform().unwrap_or_default(),
        navigator.max_touch_points(),
    )
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn detect_platform() -> Platform {
    Platform::default()
}
