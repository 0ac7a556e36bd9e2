//! Release artifact URL construction.

use crate::platform::PlatformTag;
use crate::{Error, Result};

/// Build the download URL for a release artifact.
///
/// Shape: `<release_base>/v<version>/<name>_<version>_<os>_<arch>[.exe]`,
/// with `.exe` appended only for Windows. A trailing slash on the base is
/// ignored.
///
/// # Errors
///
/// Returns [`Error::UnsupportedPlatform`] if either platform component has no
/// release artifact.
pub fn resolve_url(
    release_base: &str,
    artifact_name: &str,
    version: &str,
    platform: &PlatformTag,
) -> Result<String> {
    let (Some(os), Some(arch)) = (platform.os.artifact_token(), platform.arch.artifact_token())
    else {
        return Err(Error::unsupported_platform(
            platform.raw_os(),
            platform.raw_arch(),
        ));
    };
    let suffix = platform.os.exe_suffix();

    Ok(format!(
        "{}/v{version}/{artifact_name}_{version}_{os}_{arch}{suffix}",
        release_base.trim_end_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://github.com/salab/iccheck/releases/download";

    #[test]
    fn test_url_table() {
        let table = [
            (
                "1.2.3",
                "windows",
                "amd64",
                "https://github.com/salab/iccheck/releases/download/v1.2.3/iccheck_1.2.3_windows_amd64.exe",
            ),
            (
                "1.2.3",
                "linux",
                "arm64",
                "https://github.com/salab/iccheck/releases/download/v1.2.3/iccheck_1.2.3_linux_arm64",
            ),
            (
                "1.2.3",
                "linux",
                "x86_64",
                "https://github.com/salab/iccheck/releases/download/v1.2.3/iccheck_1.2.3_linux_amd64",
            ),
            (
                "0.7.6",
                "macos",
                "aarch64",
                "https://github.com/salab/iccheck/releases/download/v0.7.6/iccheck_0.7.6_darwin_arm64",
            ),
            (
                "0.7.6",
                "darwin",
                "x64",
                "https://github.com/salab/iccheck/releases/download/v0.7.6/iccheck_0.7.6_darwin_amd64",
            ),
            (
                "0.7.6",
                "Windows 10",
                "arm64",
                "https://github.com/salab/iccheck/releases/download/v0.7.6/iccheck_0.7.6_windows_arm64.exe",
            ),
        ];

        for (version, os, arch, expected) in table {
            let platform = PlatformTag::from_names(os, arch);
            assert_eq!(
                resolve_url(BASE, "iccheck", version, &platform).unwrap(),
                expected,
                "{version} {os} {arch}"
            );
        }
    }

    #[test]
    fn test_trailing_slash_on_base() {
        let platform = PlatformTag::from_names("linux", "amd64");
        assert_eq!(
            resolve_url("http://127.0.0.1:8080/", "iccheck", "1.0.0", &platform).unwrap(),
            "http://127.0.0.1:8080/v1.0.0/iccheck_1.0.0_linux_amd64"
        );
    }

    #[test]
    fn test_unsupported_os_propagates() {
        let platform = PlatformTag::from_names("freebsd", "amd64");
        let err = resolve_url(BASE, "iccheck", "1.0.0", &platform).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { ref os, .. } if os == "freebsd"));
    }

    #[test]
    fn test_unsupported_arch_propagates() {
        let platform = PlatformTag::from_names("linux", "s390x");
        let err = resolve_url(BASE, "iccheck", "1.0.0", &platform).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { ref arch, .. } if arch == "s390x"));
    }
}
