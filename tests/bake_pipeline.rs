use std::fs;
use std::path::Path;

use tempfile::tempdir;

use curve_to_texture::asset::{FilterMode, WrapMode};
use curve_to_texture::{
    bake_to_asset, decode_png, encode_png, render, AssetImporter, BakeError, BakeProject,
    BakeSession, Channel, Constant, CurveSet, Easing, ImportSettings, Keyframe, Keyframes,
    PathError, SidecarImporter, WIDTH,
};

#[derive(Default)]
struct RecordingImporter {
    calls: Vec<(std::path::PathBuf, ImportSettings)>,
}

impl AssetImporter for RecordingImporter {
    fn apply(&mut self, file: &Path, settings: &ImportSettings) -> Result<(), BakeError> {
        self.calls.push((file.to_path_buf(), *settings));
        Ok(())
    }
}

struct FailingImporter;

impl AssetImporter for FailingImporter {
    fn apply(&mut self, _file: &Path, _settings: &ImportSettings) -> Result<(), BakeError> {
        Err(BakeError::Import("importer offline".into()))
    }
}

fn gradient_curves() -> CurveSet {
    let mut curves = CurveSet::default();
    curves.set(Channel::R, Keyframes::linear(0.0, 1.0));
    curves.set(Channel::G, Keyframes::linear(1.0, 0.0));
    curves.set(
        Channel::B,
        Keyframes::new(vec![
            Keyframe::new(0.0, 0.0).with_easing(Easing::EaseInOut),
            Keyframe::new(1.0, 1.0),
        ]),
    );
    curves.set(Channel::A, Keyframes::constant(0.5));
    curves
}

#[test]
fn bake_writes_strip_and_applies_lookup_settings() {
    let root = tempdir().unwrap();
    let mut importer = RecordingImporter::default();
    let report = bake_to_asset(
        &gradient_curves(),
        "Assets/RVFX/Tools/CurveTexture_32x1.png",
        root.path(),
        Some(&mut importer),
    )
    .unwrap();

    let expected = root
        .path()
        .join("Assets")
        .join("RVFX")
        .join("Tools")
        .join("CurveTexture_32x1.png");
    assert_eq!(report.file, expected);
    assert_eq!(importer.calls, vec![(expected.clone(), ImportSettings::LOOKUP)]);

    let buf = decode_png(&fs::read(&expected).unwrap()).unwrap();
    assert_eq!(buf.width(), WIDTH);
    assert_eq!(buf.pixel(0), Some([0, 255, 0, 128]));
    assert_eq!(buf.pixel(WIDTH - 1), Some([255, 0, 255, 128]));
}

#[test]
fn sidecar_importer_records_point_clamp_linear() {
    let root = tempdir().unwrap();
    let mut importer = SidecarImporter;
    let report = bake_to_asset(
        &CurveSet::default(),
        "Assets/white.png",
        root.path(),
        Some(&mut importer),
    )
    .unwrap();
    let settings = SidecarImporter::read(&report.file).unwrap();
    assert_eq!(settings.filter, FilterMode::Point);
    assert_eq!(settings.wrap, WrapMode::Clamp);
    assert!(!settings.srgb && !settings.mipmaps);
}

#[test]
fn rejected_paths_never_touch_disk() {
    let root = tempdir().unwrap();
    let cases = [
        ("", PathError::Empty),
        ("Textures/out.png", PathError::OutsideAssetRoot("Textures/out.png".into())),
        ("Assets/../out.png", PathError::Traversal("Assets/../out.png".into())),
    ];
    for (raw, expected) in cases {
        let mut importer = RecordingImporter::default();
        match bake_to_asset(&CurveSet::default(), raw, root.path(), Some(&mut importer)) {
            Err(BakeError::Path(err)) => assert_eq!(err, expected),
            other => panic!("{raw:?}: expected path error, got {other:?}"),
        }
        assert!(importer.calls.is_empty());
    }
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn rebake_overwrites_previous_strip() {
    let root = tempdir().unwrap();
    let mut session = BakeSession::new(BakeProject::default());
    let first = session.generate_and_save(root.path(), None).unwrap();

    session.set_curve(Channel::R, Keyframes::constant(0.0));
    let second = session.generate_and_save(root.path(), None).unwrap();
    assert_eq!(first.file, second.file);

    let buf = decode_png(&fs::read(&second.file).unwrap()).unwrap();
    assert!(buf.pixels().all(|px| px == [0, 255, 255, 255]));
}

#[test]
fn importer_failure_surfaces_after_write() {
    let root = tempdir().unwrap();
    let err = bake_to_asset(
        &CurveSet::default(),
        "Assets/out.png",
        root.path(),
        Some(&mut FailingImporter),
    )
    .unwrap_err();
    assert!(matches!(err, BakeError::Import(_)));
    assert!(root.path().join("Assets").join("out.png").exists());
}

#[test]
fn encoded_bytes_are_stable_across_calls() {
    let hot = Constant(1.5);
    let wave = |t: f32| 0.5 - 0.5 * (t * std::f32::consts::PI).cos();
    let a = encode_png(&render(Some(&hot), Some(&wave), None, None, WIDTH)).unwrap();
    let b = encode_png(&render(Some(&hot), Some(&wave), None, None, WIDTH)).unwrap();
    assert_eq!(a, b);
    let buf = decode_png(&a).unwrap();
    assert!(buf.pixels().all(|px| px[0] == 255));
    assert_eq!(buf.pixel(0).map(|px| px[1]), Some(0));
    assert_eq!(buf.pixel(WIDTH - 1).map(|px| px[1]), Some(255));
}
