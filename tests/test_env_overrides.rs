//! Environment overrides are validated even without a config file
//!
//! Kept in its own test binary: it sets process-wide environment variables.

use civiclens::config::Config;
use civiclens::CivicError;

#[test]
fn test_env_override_without_file_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    std::env::set_var("CIVICLENS_FUSION__RRF_K", "-61");
    let result = Config::load_or_default(&path, None);
    std::env::remove_var("CIVICLENS_FUSION__RRF_K");

    match result {
        Err(CivicError::ConfigValidation { errors }) => {
            assert!(errors.iter().any(|e| e.path == "fusion.rrf_k"), "{errors:?}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    println!("✓ Negative RRF constant from the environment rejected");
}
