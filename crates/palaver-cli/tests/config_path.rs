use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("# api_url ="));
    assert!(contents.contains("cleanup_grace_ms"));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_path_works_with_broken_config() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "api_url = [").unwrap();

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success();
}

#[test]
fn test_broken_config_fails_other_commands() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "api_url = [").unwrap();

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .args(["delete", "c-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("load config"));
}

#[tokio::test]
async fn test_config_api_url_is_used() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        format!("api_url = \"{}/svc\"\n", mock_server.uri()),
    )
    .unwrap();

    Mock::given(method("DELETE"))
        .and(path("/svc/conversation/c-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("palaver")
        .env("PALAVER_HOME", dir.path())
        .env_remove("PALAVER_API_URL")
        .args(["delete", "c-1"])
        .assert()
        .success();
}
