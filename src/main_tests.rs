//! Tests for main.rs functionality

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::*;
    use cdnip::config::defaults::DEFAULT_PROVIDER_TIMEOUT_MS;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());

        #[cfg(debug_assertions)]
        assert!(version.ends_with("-UNRELEASED"));

        #[cfg(not(debug_assertions))]
        assert!(!version.contains("UNRELEASED"));
    }

    #[test]
    fn test_args_parse_ips() {
        let args = Args::try_parse_from(["cdnip", "1.1.1.1", "2606:4700::1111"]).unwrap();
        assert_eq!(args.ips, vec!["1.1.1.1", "2606:4700::1111"]);
        assert_eq!(args.timeout_ms, DEFAULT_PROVIDER_TIMEOUT_MS);
        assert!(!args.json);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_require_something_to_do() {
        assert!(Args::try_parse_from(["cdnip"]).is_err());
        assert!(Args::try_parse_from(["cdnip", "--list"]).is_ok());
        assert!(Args::try_parse_from(["cdnip", "--warm"]).is_ok());
        assert!(Args::try_parse_from(["cdnip", "--ranges", "fastly"]).is_ok());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "cdnip",
            "--json",
            "--refresh",
            "--cache-dir",
            "/tmp/cdn",
            "--timeout-ms",
            "250",
            "-vv",
            "8.8.8.8",
        ])
        .unwrap();
        assert!(args.json);
        assert!(args.refresh);
        assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/cdn")));
        assert_eq!(args.timeout_ms, 250);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_build_config() {
        let args = Args::try_parse_from([
            "cdnip",
            "--cache-dir",
            "/tmp/cdn",
            "--timeout-ms",
            "750",
            "1.1.1.1",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/cdn")));
        assert_eq!(config.provider_timeout, Duration::from_millis(750));

        let args = Args::try_parse_from(["cdnip", "--timeout-ms", "0", "1.1.1.1"]).unwrap();
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0), "warn");
        assert!(log_filter(1).contains("cdnip=debug"));
        assert!(log_filter(2).contains("cdnip=trace"));
        assert_eq!(log_filter(5), log_filter(2));
    }

    #[test]
    fn test_format_match() {
        assert_eq!(format_match("1.1.1.1", Some("cloudflare")), "1.1.1.1\tcloudflare");
        assert_eq!(format_match("8.8.8.8", None), "8.8.8.8\t-");
    }

    #[test]
    fn test_json_match_serialization() {
        let found = JsonMatch {
            ip: "1.1.1.1".to_string(),
            provider: Some("cloudflare".to_string()),
            error: None,
        };
        let value = serde_json::to_value(&found).unwrap();
        assert_eq!(value["provider"], "cloudflare");
        assert!(value.get("error").is_none());

        let missing = JsonMatch {
            ip: "8.8.8.8".to_string(),
            provider: None,
            error: None,
        };
        let value = serde_json::to_value(&missing).unwrap();
        assert!(value["provider"].is_null());
    }
}
