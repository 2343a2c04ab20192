//! Shared certificate fixtures for unit tests.

use crate::types::CaCertificate;

/// Self-signed CA valid 2024-01-01T00:00:00Z to 2025-01-01T00:00:00Z.
pub(crate) const FIXTURE_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIDazCCAlOgAwIBAgIUIfdulAO97sanJbKy6xBvmVWn19owDQYJKoZIhvcNAQEL
BQAwRTEfMB0GA1UECgwWUm9vdGFuY2hvciBEZXZlbG9wbWVudDEiMCAGA1UEAwwZ
Um9vdGFuY2hvciBEZXZlbG9wbWVudCBDQTAeFw0yNDAxMDEwMDAwMDBaFw0yNTAx
MDEwMDAwMDBaMEUxHzAdBgNVBAoMFlJvb3RhbmNob3IgRGV2ZWxvcG1lbnQxIjAg
BgNVBAMMGVJvb3RhbmNob3IgRGV2ZWxvcG1lbnQgQ0EwggEiMA0GCSqGSIb3DQEB
AQUAA4IBDwAwggEKAoIBAQCVsCkAKEEMzR3lqu9dPHVRVB6DPS5GrfVLTZIRLZrw
yAmm88zN6vjcbPoNuwmTToXcyxSY6eE8FPrdJxUOYwqwBF8k8j5FcwYKikvcJXRb
gppsp0CRVVAvNYtWCIKKTmEK+OgkRRC9IH1O9/PRYY5JXV1FopcmvjYADMBv5C3t
DvBjtBJTCE2/W+I06OIosufa65Os47S3ueViE4RyZnBWyxc1OfOZBiM7dd3hyXlJ
jLrbRK4O1jA3TaDBRl3OwzYSsV6NW+FcpVMGoaD04tVMmBYyGqkbFV4efEDCIogJ
J8OVg9ah6MfWSxhe0SuNKgaH5+w4Jm4dcB6xWTMpt+avAgMBAAGjUzBRMB0GA1Ud
DgQWBBRjn96RrZLT8UkD5N4DF0QL83K3mTAfBgNVHSMEGDAWgBRjn96RrZLT8UkD
5N4DF0QL83K3mTAPBgNVHRMBAf8EBTADAQH/MA0GCSqGSIb3DQEBCwUAA4IBAQAA
kDDZAR3nGIpo6Jvt0qRnpt5u/AApQCMncB4rXD+PFEdhMcbxNhH/iS6iGFX3n8WA
VdiIaMFNj4J1d7qtW+ACt3Lh441F7ppRu38Jq17dWCNWs4dqpO9Ngnj9U/c7QH6Y
/XYly1ioZdUWDqkRva+KDAk+RgDQkVRQa4/BUKMcZtRcDyGg0vKFCbrriMf3ktB6
4C+TzOakd9WqwIpwGVWmJEC4BPn/G6e3xs0yG1mBmsqxngRI3IWJ2fbv64vNSok0
/Z+6/bndr15WIseHbegPDa1Mwic7EwUfqF9YpoU4K+TWWysuvQ1rhXiC4YRhiNDS
TqF3MJWLYP49mjk/xY98
-----END CERTIFICATE-----
";

/// SHA-256 fingerprint of `FIXTURE_PEM`'s DER bytes.
pub(crate) const FIXTURE_SHA256: &str =
    "55adecd69cfb1665a51d182dcb1b586a42fabad17cea2fc4593d869dfa26be8c";

/// SHA-1 fingerprint of `FIXTURE_PEM`'s DER bytes.
pub(crate) const FIXTURE_SHA1: &str = "3f0d49d9b1ae1ee88379d53829ca9be491b6e48e";

/// A different self-signed CA, for fingerprint-mismatch cases.
pub(crate) const OTHER_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIDUzCCAjugAwIBAgIUbIYGxLtwm78py8fbkkNiKOqOMEEwDQYJKoZIhvcNAQEL
BQAwOTEYMBYGA1UECgwPRXhhbXBsZSBXaWRnZXRzMR0wGwYDVQQDDBRFeGFtcGxl
IFdpZGdldHMgUm9vdDAeFw0yNDAxMDEwMDAwMDBaFw0zNDAxMDEwMDAwMDBaMDkx
GDAWBgNVBAoMD0V4YW1wbGUgV2lkZ2V0czEdMBsGA1UEAwwURXhhbXBsZSBXaWRn
ZXRzIFJvb3QwggEiMA0GCSqGSIb3DQEBAQUAA4IBDwAwggEKAoIBAQDDzkoQcKHf
iuSRiIv5iPQx1pHD4ZNSz4mPtVUB8xcTqeHd9DtuwSsfjlRrtgf50DJ0OIfA/EAr
Zy7rR6cwBZ+A3mM/nNCoaa4wXDlKY4fcEkBr/HMCDtk/ZdhtPbM0RGnZmwSBA9i1
XnqL9GY42WbVgSPhkdXwKBsVMW5Sbr1XlC1O0K4PZwhzw8keGmJvcWF09Y/s51N1
L1+iIcfxD4iAhH2J1fSepOj0B/ZlayxYGtq5uHw51dVC8nV+NyaZj9venoWzhx24
z5WBsOv7SecTB101gRkiW53NdYj/XwL7QgJd1x+8U/Amr4KvqVY/FnL8/PjbCJxo
75pp4BZx4aVTAgMBAAGjUzBRMB0GA1UdDgQWBBR+KO0f4nc9uyRRmiBtofpX+/8R
wjAfBgNVHSMEGDAWgBR+KO0f4nc9uyRRmiBtofpX+/8RwjAPBgNVHRMBAf8EBTAD
AQH/MA0GCSqGSIb3DQEBCwUAA4IBAQASVSdbrlhcZg7J3F6uKTT5Ix0mSV+I7IG2
MutkrsztDdlg1INAI9giD9HgxAem3rFC20fnvoDI6kqrfH1dX+7918S8pCMLKqM4
xocotpUKMDzLRJfaDNlRicnElCb9jkEw/nRFBGGC+/9D/Nrp97PM76KNmIeIJMrw
eTmB7upAwIds85G659Hq8K97+mE7rHmPhzZLnKAxyMuo3qUkMKPGlFA5xwI7NW/i
0dhiK3LxtPZhvPUzDmE2kspxugHsgO7TDww/iFFmT5d4sG3hnXTt4owfbzcFs9rd
t1Y0A895UWdOYuvY+D5EagXs4f78gYYFsUd55JK48QijLDp0bOm9
-----END CERTIFICATE-----
";

/// The fixture CA, parsed.
pub(crate) fn fixture_cert() -> CaCertificate {
    CaCertificate::from_bytes(FIXTURE_PEM.as_bytes()).expect("fixture certificate parses")
}
