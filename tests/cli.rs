//! End-to-end tests for the `viewbind` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A template root plus a config file pointing at it.
fn project() -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let views = temp.path().join("views");
    fs::create_dir_all(views.join("news")).unwrap();

    let config = temp.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[templates]\nroot = {:?}\nextension = \"tera\"\nautoescape = true\n",
            views.to_string_lossy()
        ),
    )
    .unwrap();

    (temp, config)
}

fn viewbind(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("viewbind").unwrap();
    cmd.env_remove("RUST_LOG").arg("--config").arg(config);
    cmd
}

#[test]
fn test_check_reports_every_template() {
    let (temp, config) = project();
    let views = temp.path().join("views");
    fs::write(views.join("home.tera"), "<h1>{{ model.title }}</h1>").unwrap();
    fs::write(views.join("news/list.tera"), "{% for i in model.items %}{{ i }}{% endfor %}").unwrap();
    fs::write(views.join("README.md"), "not a template {{").unwrap();

    viewbind(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("home.tera"))
        .stdout(predicate::str::contains("list.tera"))
        .stdout(predicate::str::contains("2 template(s) compiled"))
        .stdout(predicate::str::contains("README.md").not());
}

#[test]
fn test_check_fails_on_broken_template() {
    let (temp, config) = project();
    let views = temp.path().join("views");
    fs::write(views.join("good.tera"), "ok").unwrap();
    fs::write(views.join("bad.tera"), "line one\n{{ unclosed ").unwrap();

    viewbind(&config)
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Unable to parse template"))
        .stdout(predicate::str::contains("(Line 2:"))
        .stderr(predicate::str::contains("1 of 2 template(s) failed to compile"));
}

#[test]
fn test_check_explicit_directory() {
    let (temp, config) = project();
    let views = temp.path().join("views");
    fs::write(views.join("bad.tera"), "{{ unclosed ").unwrap();
    fs::write(views.join("news/item.tera"), "{{ model.title }}").unwrap();

    viewbind(&config)
        .arg("check")
        .arg(views.join("news"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 template(s) compiled"));
}

#[test]
fn test_check_explicit_file_with_foreign_extension() {
    let (temp, config) = project();
    let page = temp.path().join("views/page.html");
    fs::write(&page, "<p>{{ model.body }}</p>").unwrap();

    viewbind(&config)
        .arg("check")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("page.html"))
        .stdout(predicate::str::contains("page.html.tera").not())
        .stdout(predicate::str::contains("1 template(s) compiled"));
}

#[test]
fn test_check_reports_unreadable_files_apart() {
    let (temp, config) = project();
    let views = temp.path().join("views");
    fs::write(views.join("bad.tera"), "{{ unclosed ").unwrap();

    viewbind(&config)
        .arg("check")
        .arg(views.join("bad.tera"))
        .arg(views.join("absent.tera"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to access template"))
        .stderr(predicate::str::contains(
            "1 of 2 template(s) failed to compile, 1 could not be read",
        ));
}

#[test]
fn test_render_with_data_and_vars() {
    let (temp, config) = project();
    let views = temp.path().join("views");
    fs::write(views.join("news/list.tera"), "{{ edition }}:{% for i in model.items %} {{ i }}{% endfor %}")
        .unwrap();
    let data = temp.path().join("list.json");
    fs::write(&data, r#"{"items": ["a", "b"]}"#).unwrap();

    viewbind(&config)
        .args(["render", "~/news/list", "--var", "edition=morning", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout("morning: a b");
}

#[test]
fn test_render_to_output_file() {
    let (temp, config) = project();
    fs::write(temp.path().join("views/hello.tera"), "hello").unwrap();
    let output = temp.path().join("out.html");

    viewbind(&config)
        .args(["-q", "render", "hello", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(output).unwrap(), "hello");
}

#[test]
fn test_render_missing_template() {
    let (_temp, config) = project();

    viewbind(&config)
        .args(["render", "absent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to access template"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "[templates\n").unwrap();

    viewbind(&config)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
#[serial]
fn test_config_from_environment() {
    let (temp, config) = project();
    fs::write(temp.path().join("views/env.tera"), "from env").unwrap();

    Command::cargo_bin("viewbind")
        .unwrap()
        .env_remove("RUST_LOG")
        .env("VIEWBIND_CONFIG", &config)
        .args(["render", "env"])
        .assert()
        .success()
        .stdout("from env");
}
