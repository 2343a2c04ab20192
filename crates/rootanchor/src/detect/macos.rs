//! Default browser lookup on macOS via LaunchServices.
//!
//! LaunchServices only records a handler when the user has switched
//! away from Safari, so an empty handler table means Safari.

use crate::cmd::run_tool;
use crate::types::BrowserFamily;

const LS_DOMAIN: &str = "com.apple.LaunchServices/com.apple.launchservices.secure";

pub(crate) async fn default_family() -> Option<BrowserFamily> {
    let out = run_tool("default browser", "defaults", &["read", LS_DOMAIN, "LSHandlers"])
        .await
        .ok()?;
    if !out.success {
        // No LSHandlers array at all: nothing was ever changed
        return Some(BrowserFamily::Safari);
    }
    match parse_ls_handlers(&out.stdout) {
        Some(bundle_id) => {
            let family = from_bundle_id(&bundle_id);
            (family != BrowserFamily::Unknown).then_some(family)
        }
        None => Some(BrowserFamily::Safari),
    }
}

/// Walk the `defaults read` rendition of the LSHandlers array and pull
/// the role handler out of the block that declares the https scheme.
pub(crate) fn parse_ls_handlers(output: &str) -> Option<String> {
    let mut block: Vec<&str> = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            block.clear();
        } else if trimmed.starts_with("},") || trimmed == "}" {
            if block_is_https(&block) {
                if let Some(handler) = block_handler(&block) {
                    return Some(handler);
                }
            }
        } else {
            block.push(trimmed);
        }
    }
    None
}

fn block_is_https(block: &[&str]) -> bool {
    block.iter().any(|line| {
        line.starts_with("LSHandlerURLScheme")
            && (line.contains("https") || line.contains("\"https\""))
    })
}

fn block_handler(block: &[&str]) -> Option<String> {
    // The nested PreferredVersions table also carries an
    // LSHandlerRoleAll line, usually "-"; skip past it
    block
        .iter()
        .filter(|line| {
            line.starts_with("LSHandlerRoleAll") || line.starts_with("LSHandlerRoleViewer")
        })
        .filter_map(|line| line.split('=').nth(1))
        .map(|value| value.trim().trim_end_matches(';').trim_matches('"').to_string())
        .find(|value| !value.is_empty() && value != "-")
}

pub(crate) fn from_bundle_id(bundle_id: &str) -> BrowserFamily {
    let id = bundle_id.to_ascii_lowercase();
    if id.starts_with("org.mozilla.firefox") {
        BrowserFamily::Firefox
    } else if id.starts_with("com.google.chrome") {
        BrowserFamily::Chrome
    } else if id.starts_with("org.chromium.chromium") {
        BrowserFamily::Chromium
    } else if id.starts_with("com.microsoft.edgemac") {
        BrowserFamily::Edge
    } else if id.starts_with("com.brave.browser") {
        BrowserFamily::Brave
    } else if id == "com.apple.safari" {
        BrowserFamily::Safari
    } else {
        BrowserFamily::Unknown
    }
}
