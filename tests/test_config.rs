use std::io::Write;
use std::path::PathBuf;

use gatehouse::config::Config;
use gatehouse::http::mime::MimeRegistration;

const VARS: [&str; 5] = ["LISTEN", "PUBLIC_FOLDER", "MIME_REGISTRY", "MIME_CASE_INSENSITIVE", "LOG_LEVEL"];

// Environment is process-global, so every env case lives in one test.
#[test]
fn test_config_from_environment() {
    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
    let cfg = Config::load();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.public_folder, None);
    assert_eq!(cfg.mime_registry, MimeRegistration::Full);
    assert!(!cfg.mime_case_insensitive);
    assert_eq!(cfg.log_level, "info");

    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
        std::env::set_var("PUBLIC_FOLDER", "/srv/www");
        std::env::set_var("MIME_REGISTRY", "1");
        std::env::set_var("MIME_CASE_INSENSITIVE", "true");
        std::env::set_var("LOG_LEVEL", "debug");
    }
    let cfg = Config::load();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.public_folder, Some(PathBuf::from("/srv/www")));
    assert_eq!(cfg.mime_registry, MimeRegistration::Minimal);
    assert!(cfg.mime_case_insensitive);
    assert_eq!(cfg.log_level, "debug");

    unsafe {
        std::env::set_var("MIME_REGISTRY", "not-a-number");
    }
    assert_eq!(Config::load().mime_registry, MimeRegistration::Full);

    unsafe {
        std::env::set_var("MIME_REGISTRY", "300");
    }
    assert_eq!(Config::load().mime_registry, MimeRegistration::Full);

    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
}

#[test]
fn test_config_yaml_defaults() {
    let cfg = Config::from_yaml_str("{}").unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.mime_registry, MimeRegistration::Full);
}

#[test]
fn test_config_yaml_full() {
    let yaml = "\
listen_addr: 0.0.0.0:5000
public_folder: ./public
mime_registry: 0
mime_case_insensitive: true
log_level: warn
";
    let cfg = Config::from_yaml_str(yaml).unwrap();

    assert!(cfg.listen_addr.starts_with("0.0.0.0"));
    assert_eq!(cfg.public_folder, Some(PathBuf::from("./public")));
    assert_eq!(cfg.mime_registry, MimeRegistration::None);
    assert!(cfg.mime_case_insensitive);
    assert_eq!(cfg.log_level, "warn");
}

#[test]
fn test_config_yaml_large_level_means_full() {
    for level in ["2", "300", "70000", "18446744073709551615"] {
        let cfg = Config::from_yaml_str(&format!("mime_registry: {}", level)).unwrap();
        assert_eq!(cfg.mime_registry, MimeRegistration::Full, "level {}", level);
    }
    let cfg = Config::from_yaml_str("mime_registry: 1").unwrap();
    assert_eq!(cfg.mime_registry, MimeRegistration::Minimal);
}

#[test]
fn test_config_yaml_rejects_bad_types() {
    assert!(Config::from_yaml_str("mime_registry: lots").is_err());
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "listen_addr: 127.0.0.1:9000").unwrap();

    let cfg = Config::from_file(file.path()).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:9000");

    assert!(Config::from_file(&PathBuf::from("/definitely/missing.yaml")).is_err());
}

#[test]
fn test_mime_registration_levels() {
    assert_eq!(MimeRegistration::from_level(0), MimeRegistration::None);
    assert_eq!(MimeRegistration::from_level(1), MimeRegistration::Minimal);
    assert_eq!(MimeRegistration::from_level(2), MimeRegistration::Full);
    assert_eq!(MimeRegistration::from_level(9), MimeRegistration::Full);
    assert_eq!(MimeRegistration::from_level(300), MimeRegistration::Full);
    assert_eq!(MimeRegistration::from_level(u64::MAX), MimeRegistration::Full);
}
