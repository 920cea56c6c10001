use semver::Version;

pub fn get_version() -> String {
    let semver = env!("CARGO_PKG_VERSION").parse::<Version>();

    let Ok(semver) = semver else {
        tracing::warn!("couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown.");
        return String::from("0.0.0-unknown");
    };

    // vergen writes this placeholder when the build ran outside a git checkout
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if sha != "VERGEN_IDEMPOTENT_OUTPUT" => format!("{semver} ({sha})"),
        _ => semver.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_starts_with_package_version() {
        assert!(get_version().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
