//! Property-based tests for platform normalization and release URLs

use iccheck_provision::{Arch, Error, Os, PlatformTag, resolve_url};
use proptest::prelude::*;

const BASE: &str = "https://github.com/salab/iccheck/releases/download";

fn amd64_alias() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("x86_64"), Just("amd64"), Just("x64"), Just("X86_64"), Just("AMD64")]
}

fn arm64_alias() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("aarch64"), Just("arm64"), Just("arm64e"), Just("ARM64")]
}

fn supported_os() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("linux"),
        Just("Linux"),
        Just("Mac OS X"),
        Just("darwin"),
        Just("Windows 11"),
        Just("windows"),
    ]
}

proptest! {
    #[test]
    fn test_amd64_aliases_normalize(alias in amd64_alias()) {
        prop_assert_eq!(Arch::from_name(alias), Arch::Amd64);
    }

    #[test]
    fn test_arm64_aliases_normalize(alias in arm64_alias()) {
        prop_assert_eq!(Arch::from_name(alias), Arch::Arm64);
    }

    #[test]
    fn test_url_shape_for_supported_platforms(
        os in supported_os(),
        arch in prop_oneof![amd64_alias(), arm64_alias()],
        major in 0u32..20,
        minor in 0u32..50,
        patch in 0u32..50,
    ) {
        let version = format!("{major}.{minor}.{patch}");
        let platform = PlatformTag::from_names(os, arch);
        let url = resolve_url(BASE, "iccheck", &version, &platform).unwrap();

        let expected_prefix = format!("{BASE}/v{version}/iccheck_{version}_{platform}");
        prop_assert!(url.starts_with(&expected_prefix));
        prop_assert_eq!(url.ends_with(".exe"), platform.os == Os::Windows);

        // Same inputs, same URL.
        let again = resolve_url(BASE, "iccheck", &version, &platform).unwrap();
        prop_assert_eq!(url, again);
    }

    #[test]
    fn test_unknown_arch_is_unsupported(arch in "(mips|riscv|s390x|ppc)[a-z0-9]{0,4}") {
        let platform = PlatformTag::from_names("linux", &arch);
        prop_assert!(!platform.is_supported());
        let err = resolve_url(BASE, "iccheck", "0.7.6", &platform).unwrap_err();
        let is_unsupported = matches!(err, Error::UnsupportedPlatform { .. });
        prop_assert!(is_unsupported);
    }
}
