//! Command-line runs against dumped scenes.

use std::process::Command;

use live2d_extractor::asset::dump;
use live2d_extractor::testing::{Key, SceneBuilder};

const BIN: &str = env!("CARGO_BIN_EXE_live2d-extract");

fn dumped_scene(dir: &std::path::Path) {
    let mut scene = SceneBuilder::new();
    let moc = scene.moc("haru", &["ParamA"], &[]);
    scene.container(moc, "assets/haru/haru.moc3.bytes");
    let keys: &[Key] = &[(0.0, 0.0, 0.0, 0.0), (0.5, 1.0, 1.0, 1.0), (1.0, 0.0, 0.0, 0.0)];
    let clip = scene.clip("nod", 30.0, &[("Parameters/ParamA", "m_Value", keys)], &[]);
    scene.container(clip, "assets/haru/nod.anim");
    dump::save(&scene.build(), dir).unwrap();
}

#[test]
fn test_cli_exports_dump() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    dumped_scene(input.path());

    let status = Command::new(BIN)
        .arg(input.path())
        .args(["-q", "-m", "clip-based-v2", "--force-bezier", "-o"])
        .arg(output.path())
        .status()
        .unwrap();
    assert!(status.success());

    let dir = output.path().join("assets/haru");
    assert!(dir.join("haru.moc3").exists());
    assert!(dir.join("haru.model3.json").exists());
    let motion: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("motions/nod.motion3.json")).unwrap()).unwrap();
    assert_eq!(motion["Meta"]["AreBeziersRestricted"], true);
    assert_eq!(motion["Meta"]["CurveCount"], 1);
}

#[test]
fn test_cli_missing_input_fails() {
    let missing = tempfile::tempdir().unwrap();
    let status = Command::new(BIN).arg(missing.path().join("nope")).arg("-q").status().unwrap();
    assert!(!status.success());
}

#[test]
fn test_cli_rejects_unknown_mode() {
    let input = tempfile::tempdir().unwrap();
    dumped_scene(input.path());
    let status = Command::new(BIN)
        .arg(input.path())
        .args(["-q", "--motion-mode", "sideways"])
        .status()
        .unwrap();
    assert!(!status.success());
}
