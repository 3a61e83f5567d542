//! Property-based tests for pwdm-cli

use proptest::prelude::*;

use crate::config::{CliOverrides, Config};
use crate::output::{
    EnvelopeOutput, OutputFormat, OutputFormatter, PathOutput, Report, ValueOutput, VerifyOutput,
};

fn output_format() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![
        Just(OutputFormat::Table),
        Just(OutputFormat::Json),
        Just(OutputFormat::Quiet),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A flag that is given always wins; an absent flag leaves the file value.
    #[test]
    fn overrides_only_touch_given_fields(
        file_format in output_format(),
        flag_format in proptest::option::of(output_format()),
        file_verbose in any::<bool>(),
        flag_verbose in proptest::option::of(Just(true)),
        debug in proptest::option::of(Just(true)),
    ) {
        let mut config = Config::default();
        config.output.format = file_format.to_string();
        config.output.verbose = file_verbose;

        let overrides = CliOverrides {
            output_format: flag_format.map(|f| f.to_string()),
            verbose: flag_verbose,
            debug,
        };
        let merged = config.with_overrides(&overrides);

        let expected = flag_format.unwrap_or(file_format);
        prop_assert_eq!(&merged.output.format, &expected.to_string());
        prop_assert_eq!(merged.output.verbose, flag_verbose.unwrap_or(file_verbose));
        let expected_level = if debug.is_some() { "debug" } else { "warn" };
        prop_assert_eq!(merged.logging.level.as_str(), expected_level);
        prop_assert!(merged.validate().is_ok());
    }

    #[test]
    fn json_reports_always_parse(value in any::<String>(), bytes in 0usize..4096) {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);

        let envelope = EnvelopeOutput {
            envelope: value.clone(),
            plaintext_bytes: bytes,
            envelope_bytes: bytes + 81,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&envelope, "encrypt")).unwrap();
        prop_assert_eq!(parsed["data"]["envelope"].as_str(), Some(value.as_str()));

        let path = PathOutput { path: value.clone(), exists: false };
        let parsed: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&path, "config path")).unwrap();
        prop_assert_eq!(parsed["data"]["path"].as_str(), Some(value.as_str()));
    }

    #[test]
    fn quiet_prints_exactly_the_bare_value(value in "[A-Za-z0-9+/=]{0,64}", valid in any::<bool>()) {
        let quiet = OutputFormatter::new(OutputFormat::Quiet, false);

        let report = ValueOutput { label: "Signature", value: value.clone() };
        prop_assert_eq!(quiet.format_report(&report, "sign"), value);
        prop_assert_eq!(report.exit_code(), crate::ExitCode::Success);

        // Status-only reports speak through the exit code alone.
        let verify = VerifyOutput { valid };
        prop_assert_eq!(quiet.format_report(&verify, "verify"), "");
    }
}
