//! Default browser lookup on Windows via the https UserChoice key.

use crate::cmd::run_tool;
use crate::types::BrowserFamily;

const USER_CHOICE_KEY: &str =
    r"HKCU\Software\Microsoft\Windows\Shell\Associations\UrlAssociations\https\UserChoice";

/// Read the ProgId registered for https and map it to a family.
pub(crate) async fn default_family() -> Option<BrowserFamily> {
    let out = run_tool("default browser", "reg", &["query", USER_CHOICE_KEY, "/v", "ProgId"])
        .await
        .ok()?;
    if !out.success {
        return None;
    }
    let prog_id = parse_reg_value(&out.stdout)?;
    let family = from_prog_id(&prog_id);
    (family != BrowserFamily::Unknown).then_some(family)
}

/// Pull the data column out of `reg query` output:
/// `    ProgId    REG_SZ    ChromeHTML`
pub(crate) fn parse_reg_value(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.trim_start().starts_with("ProgId"))
        .and_then(|line| line.split_whitespace().last())
        .map(ToString::to_string)
}

/// Browser ProgIds carry per-install suffixes (FirefoxURL-308046B0AF4A39CB),
/// so families are matched by prefix.
pub(crate) fn from_prog_id(prog_id: &str) -> BrowserFamily {
    if prog_id.starts_with("FirefoxURL") {
        BrowserFamily::Firefox
    } else if prog_id.starts_with("ChromeHTML") {
        BrowserFamily::Chrome
    } else if prog_id.starts_with("ChromiumHTM") {
        BrowserFamily::Chromium
    } else if prog_id.starts_with("MSEdgeHTM") {
        BrowserFamily::Edge
    } else if prog_id.starts_with("BraveHTML") {
        BrowserFamily::Brave
    } else {
        BrowserFamily::Unknown
    }
}
