use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_atlas-batch"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    bin()
        .current_dir(dir)
        .args(args)
        .args(["--progress", "false"])
        .output()
        .expect("spawn atlas-batch")
}

fn write_png(path: &Path, w: u32, h: u32) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    RgbaImage::from_pixel(w, h, Rgba([120, 60, 30, 255]))
        .save(path)
        .expect("save png");
}

/// `art/ui/{a,b}.png`, `art/locked/x.png`, `art/locked/notes.txt`.
fn project(dir: &Path, atlas_size: u32) {
    write_png(&dir.join("art/ui/a.png"), 16, 16);
    write_png(&dir.join("art/ui/b.png"), 8, 24);
    write_png(&dir.join("art/locked/x.png"), 4, 4);
    fs::write(dir.join("art/locked/notes.txt"), "keep").expect("notes");
    let descriptor = serde_json::json!({
        "inputDir": "art",
        "outputDir": "out",
        "atlas": { "width": atlas_size, "height": atlas_size, "POT": false, "textureFormat": "png" },
        "sprite": { "padding": 2, "extrude": 0, "rotation": true, "size": "", "width": "", "height": "" },
        "includeList": [],
        "excludeList": ["art/locked"],
        "extrudeList": [],
        "scaleDir": {}
    });
    fs::write(dir.join("project.json"), descriptor.to_string()).expect("descriptor");
}

#[test]
fn help_lists_project_flag() {
    let out = bin().arg("--help").output().expect("spawn");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--project"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn missing_project_flag_is_a_usage_error() {
    let out = bin().output().expect("spawn");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--project"));
}

#[test]
fn unreadable_descriptor_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = run_in(tmp.path(), &["--project", "absent.json", "-q"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("absent.json"));
}

#[test]
fn packs_and_copies_project() {
    let tmp = tempfile::tempdir().expect("tempdir");
    project(tmp.path(), 256);
    let out = run_in(tmp.path(), &["--project", "project.json", "-q"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let dest = tmp.path().join("out");
    assert!(dest.join("ui.png").is_file());
    let atlas: serde_json::Value =
        serde_json::from_slice(&fs::read(dest.join("ui.atlas")).expect("atlas")).expect("json");
    assert_eq!(atlas["meta"]["image"], "ui.png");
    assert!(atlas["frames"]["a.png"].is_object());
    assert!(atlas["frames"]["b.png"].is_object());
    assert!(dest.join("locked/x.png").is_file());
    assert_eq!(fs::read_to_string(dest.join("locked/notes.txt")).expect("notes"), "keep");
    assert!(!dest.join("locked.png").exists());
}

#[test]
fn output_flag_overrides_descriptor() {
    let tmp = tempfile::tempdir().expect("tempdir");
    project(tmp.path(), 256);
    let out = run_in(tmp.path(), &["--project", "project.json", "--output", "elsewhere", "-q"]);
    assert!(out.status.success());
    assert!(tmp.path().join("elsewhere/ui.png").is_file());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    project(tmp.path(), 256);
    let out = run_in(tmp.path(), &["--project", "project.json", "--dry-run", "-q"]);
    assert!(out.status.success());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn print_config_emits_jobs_as_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    project(tmp.path(), 256);
    let out = run_in(tmp.path(), &["--project", "project.json", "--print-config", "-q"]);
    assert!(out.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json on stdout");
    let jobs = printed["jobs"].as_array().expect("jobs");
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().any(|j| j["kind"] == "copy_through"));
    assert!(jobs.iter().any(|j| j["kind"] == "pack" && j["options"]["textureName"] == "ui"));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn print_config_as_yaml() {
    let tmp = tempfile::tempdir().expect("tempdir");
    project(tmp.path(), 256);
    let out = run_in(
        tmp.path(),
        &["--project", "project.json", "--print-config", "--print-config-format", "yaml", "-q"],
    );
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("jobs:"));
    assert!(stdout.contains("kind: copy_through"));
}

#[test]
fn failed_job_sets_exit_code_but_others_finish() {
    let tmp = tempfile::tempdir().expect("tempdir");
    // 16x16 sprite with padding cannot fit on a 12x12 page
    project(tmp.path(), 12);
    let out = run_in(tmp.path(), &["--project", "project.json", "-q"]);
    assert!(!out.status.success());
    assert!(tmp.path().join("out/locked/x.png").is_file());
    assert!(!tmp.path().join("out/ui.png").exists());
}
