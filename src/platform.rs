//! Optional OS window chrome.
//!
//! Cosmetics (dark title bar, screen work area lookup) live behind the
//! `PlatformChrome` capability so the rest of the host never needs
//! conditional compilation. `NoChrome` is the fallback everywhere; macOS with
//! the `gui` feature gets `MacChrome`.

use crate::font_fit::PixelArea;

#[cfg(all(target_os = "macos", feature = "gui"))]
use cocoa::appkit::NSApp;
#[cfg(all(target_os = "macos", feature = "gui"))]
use cocoa::base::id;
#[cfg(all(target_os = "macos", feature = "gui"))]
use cocoa::foundation::NSRect;
#[cfg(all(target_os = "macos", feature = "gui"))]
use objc::{class, msg_send, sel, sel_impl};

pub trait PlatformChrome {
    fn name(&self) -> &'static str;

    /// Force a dark appearance on the application's windows.
    fn apply_dark_appearance(&self) {}

    /// Usable area of the main screen (excluding menu bar and dock), in pixels.
    fn work_area(&self) -> Option<PixelArea> {
        None
    }
}

/// No-op chrome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChrome;

impl PlatformChrome for NoChrome {
    fn name(&self) -> &'static str {
        "none"
    }
}

#[cfg(all(target_os = "macos", feature = "gui"))]
#[link(name = "AppKit", kind = "framework")]
extern "C" {
    static NSAppearanceNameDarkAqua: id;
}

/// AppKit chrome. Must be used from the main thread.
#[cfg(all(target_os = "macos", feature = "gui"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct MacChrome;

#[cfg(all(target_os = "macos", feature = "gui"))]
impl MacChrome {
    fn debug_assert_main_thread() {
        unsafe {
            let is_main: bool = msg_send![class!(NSThread), isMainThread];
            debug_assert!(is_main, "AppKit calls must run on the main thread");
        }
    }
}

#[cfg(all(target_os = "macos", feature = "gui"))]
impl PlatformChrome for MacChrome {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn apply_dark_appearance(&self) {
        Self::debug_assert_main_thread();
        unsafe {
            let dark: id = msg_send![class!(NSAppearance), appearanceNamed: NSAppearanceNameDarkAqua];
            if dark.is_null() {
                tracing::warn!("DarkAqua appearance unavailable");
                return;
            }
            let app = NSApp();
            let _: () = msg_send![app, setAppearance: dark];
        }
        tracing::debug!("Applied dark appearance");
    }

    fn work_area(&self) -> Option<PixelArea> {
        Self::debug_assert_main_thread();
        unsafe {
            let screen: id = msg_send![class!(NSScreen), mainScreen];
            if screen.is_null() {
                return None;
            }
            // Points, which is also what gpui lays out in
            let frame: NSRect = msg_send![screen, visibleFrame];
            Some(PixelArea::new(
                frame.size.width.max(0.0) as u32,
                frame.size.height.max(0.0) as u32,
            ))
        }
    }
}

/// Chrome for the current platform.
pub fn native_chrome() -> Box<dyn PlatformChrome> {
    #[cfg(all(target_os = "macos", feature = "gui"))]
    {
        Box::new(MacChrome)
    }
    #[cfg(not(all(target_os = "macos", feature = "gui")))]
    {
        Box::new(NoChrome)
    }
}
