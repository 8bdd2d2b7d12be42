use clap::Parser;
use figment::providers::{Env, Serialized};
use figment::Figment;
use hardlink::cli::Cli;
use hardlink::config::{ConfigError, Settings};
use hardlink::linker::LinkPolicy;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["hardlink"];
    argv.extend_from_slice(args);
    argv.push("/d");
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_defaults_without_env() {
    // Figment without Env so parallel tests cannot interfere.
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings = Settings::from_figment(figment, &cli(&[])).unwrap();

    assert!(!settings.dry_run);
    assert_eq!(settings.policy, LinkPolicy::First);
    assert_eq!(settings.threads, 1);
    assert!(settings.include.is_empty() && settings.exclude.is_empty());
}

#[test]
fn test_env_layer_and_cli_precedence() {
    // A private prefix keeps this test independent of the real one.
    std::env::set_var("HLTEST_DRY_RUN", "true");
    std::env::set_var("HLTEST_THREADS", "6");
    std::env::set_var("HLTEST_POLICY", "minimize");
    std::env::set_var("HLTEST_RESPECT_TIME", "false");

    let figment = || {
        Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed("HLTEST_"))
    };

    let from_env = Settings::from_figment(figment(), &cli(&[])).unwrap();
    assert!(from_env.dry_run);
    assert_eq!(from_env.threads, 6);
    assert_eq!(from_env.policy, LinkPolicy::Minimize);
    assert!(!from_env.respect_time);

    let overridden =
        Settings::from_figment(figment(), &cli(&["-m", "--threads", "2"])).unwrap();
    assert_eq!(overridden.policy, LinkPolicy::Maximize);
    assert_eq!(overridden.threads, 2);
    assert!(overridden.dry_run);

    std::env::remove_var("HLTEST_DRY_RUN");
    std::env::remove_var("HLTEST_THREADS");
    std::env::remove_var("HLTEST_POLICY");
    std::env::remove_var("HLTEST_RESPECT_TIME");
}

#[test]
fn test_bad_env_value_is_reported() {
    std::env::set_var("HLBAD_THREADS", "many");
    let figment =
        Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed("HLBAD_"));

    let err = Settings::from_figment(figment, &cli(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Extract(_)));

    std::env::remove_var("HLBAD_THREADS");
}

#[test]
fn test_single_env_pattern() {
    std::env::set_var("HLONE_EXCLUDE", r"\.tmp$");
    let figment =
        Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed("HLONE_"));

    let settings = Settings::from_figment(figment, &cli(&[])).unwrap();
    assert_eq!(settings.exclude, vec![r"\.tmp$"]);
    assert!(!settings.walker_config().unwrap().filter.allows("/d/a.tmp"));

    std::env::remove_var("HLONE_EXCLUDE");
}

#[test]
fn test_walker_config_from_settings() {
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings = Settings::from_figment(figment, &cli(&["-c", "-x", r"\.tmp$"])).unwrap();
    let walker = settings.walker_config().unwrap();

    assert!(!walker.fingerprint.respect_mode);
    assert!(!walker.fingerprint.respect_owner);
    assert!(!walker.fingerprint.respect_time);
    assert!(!walker.filter.allows("/d/a.tmp"));
    assert!(walker.filter.allows("/d/a"));
}
