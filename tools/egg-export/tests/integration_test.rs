//! Integration tests for egg-export
//!
//! Runs the binary on the egg-import fixtures and checks the written files.

use std::path::{Path, PathBuf};
use std::process::Command;

use egg_export::formats::{
    EggAnimationHeader, EggMeshHeader, EggSkeletonHeader, MATRIX_3X4_SIZE, ROOT_PARENT,
};
use egg_import::{FORMAT_COLOR, FORMAT_NORMAL, FORMAT_SKINNED, FORMAT_UV};
use tempfile::tempdir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../egg-import/tests/fixtures")
}

fn egg_export(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_egg-export"))
        .args(args)
        .output()
        .expect("Failed to run egg-export")
}

fn run(args: &[&str]) {
    let output = egg_export(args);
    assert!(
        output.status.success(),
        "egg-export {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_export_mesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("bar.eggmesh");
    let root = fixtures();
    run(&[
        "--root",
        root.to_str().unwrap(),
        "mesh",
        "bar.egg",
        "-o",
        out.to_str().unwrap(),
    ]);

    let data = std::fs::read(&out).expect("Failed to read mesh file");
    let header = EggMeshHeader::from_bytes(&data).expect("Failed to parse mesh header");
    assert_eq!(header.vertex_count, 6);
    assert_eq!(header.index_count, 12);
    assert_eq!(
        header.format,
        FORMAT_NORMAL | FORMAT_UV | FORMAT_COLOR | FORMAT_SKINNED
    );
    assert_eq!(data.len(), header.file_size());

    // Last index of the second quad is the sixth vertex
    let last = &data[data.len() - 4..];
    assert_eq!(last, &5u32.to_le_bytes());
}

#[test]
fn test_export_skeleton() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("bar.eggskel");
    let root = fixtures();
    run(&[
        "--root",
        root.to_str().unwrap(),
        "skeleton",
        "bar.egg",
        "-o",
        out.to_str().unwrap(),
    ]);

    let data = std::fs::read(&out).expect("Failed to read skeleton file");
    let header = EggSkeletonHeader::from_bytes(&data).unwrap();
    assert_eq!(header.joint_count, 3);
    assert_eq!(
        data.len(),
        EggSkeletonHeader::SIZE + 3 * EggSkeletonHeader::JOINT_SIZE
    );

    let parent = |joint: usize| {
        let at = EggSkeletonHeader::SIZE + joint * EggSkeletonHeader::JOINT_SIZE;
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    };
    assert_eq!(parent(0), ROOT_PARENT);
    assert_eq!(parent(1), 0);
    assert_eq!(parent(2), 1);
}

#[test]
fn test_export_animation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("bar_bend.egganim");
    let root = fixtures();
    run(&[
        "--root",
        root.to_str().unwrap(),
        "animation",
        "bar.egg",
        "bar_bend.egg",
        "-o",
        out.to_str().unwrap(),
    ]);

    let data = std::fs::read(&out).expect("Failed to read animation file");
    let header = EggAnimationHeader::from_bytes(&data).unwrap();
    assert_eq!(header.joint_count, 3);
    assert_eq!(header.frame_count, 4);
    assert_eq!(header.rate, 4);
    assert_eq!(data.len(), EggAnimationHeader::SIZE + header.data_size());
    assert_eq!(header.data_size(), 4 * 3 * MATRIX_3X4_SIZE);
}

#[test]
fn test_list_commands() {
    let root = fixtures();
    let root = root.to_str().unwrap();
    run(&["--root", root, "skeleton", "bar.egg", "--list"]);
    run(&["--root", root, "animation", "bar.egg", "bar_bend.egg", "--list"]);
}

#[test]
fn test_build_from_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    let manifest = dir.path().join("assets.toml");
    std::fs::write(
        &manifest,
        format!(
            r#"
[build]
root = {:?}
output = "out"

[[models]]
id = "bar"
path = "bar.egg"

[[animations]]
id = "bend"
path = "bar_bend.egg"
model = "bar"
"#,
            fixtures().to_str().unwrap()
        ),
    )
    .unwrap();

    run(&["check", manifest.to_str().unwrap()]);
    run(&["build", manifest.to_str().unwrap()]);

    let out = dir.path().join("out");
    assert!(out.join("bar.eggmesh").exists());
    assert!(out.join("bar.eggskel").exists());
    assert!(out.join("bend.egganim").exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = egg_export(&[
        "--root",
        dir.path().to_str().unwrap(),
        "mesh",
        "missing.egg",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.egg"), "{stderr}");
}
