//! Default browser lookup on Linux via xdg-settings.

use crate::cmd::run_tool;
use crate::types::BrowserFamily;

/// Ask the desktop environment for the default web browser. `None`
/// when xdg-settings is missing, errors out, or names nothing we know.
pub(crate) async fn default_family() -> Option<BrowserFamily> {
    let out = run_tool("default browser", "xdg-settings", &["get", "default-web-browser"])
        .await
        .ok()?;
    if !out.success {
        return None;
    }
    let family = from_desktop_entry(out.stdout.trim());
    (family != BrowserFamily::Unknown).then_some(family)
}

/// Map a freedesktop .desktop entry name to a browser family. Matched
/// by stem prefix so vendor variants (firefox-esr, google-chrome-beta,
/// snap's firefox_firefox) resolve to their family.
pub(crate) fn from_desktop_entry(entry: &str) -> BrowserFamily {
    let stem = entry
        .trim()
        .to_ascii_lowercase()
        .trim_end_matches(".desktop")
        .to_string();
    if stem.starts_with("firefox") {
        BrowserFamily::Firefox
    } else if stem.starts_with("google-chrome") {
        BrowserFamily::Chrome
    } else if stem.starts_with("chromium") {
        BrowserFamily::Chromium
    } else if stem.starts_with("microsoft-edge") {
        BrowserFamily::Edge
    } else if stem.starts_with("brave") {
        BrowserFamily::Brave
    } else {
        BrowserFamily::Unknown
    }
}
