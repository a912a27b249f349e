use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn main() {
    // Re-run build script when this file changes
    println!("cargo:rerun-if-changed=build.rs");

    // Build date (UTC ISO-8601)
    let build_date = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SIMDOCK_BUILD_DATE={build_date}");

    // Target triple and profile
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SIMDOCK_BUILD_TARGET={target}");

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SIMDOCK_BUILD_PROFILE={profile}");

    // rustc version (best-effort)
    let rustc_ver = rustc_version::version_meta()
        .map(|m| format!("rustc {} ({:?})", m.semver, m.channel).to_lowercase())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SIMDOCK_BUILD_RUSTC={rustc_ver}");
}
