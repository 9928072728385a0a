//! Project files and the baking session.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::asset::{write_atomic, AssetImporter, AssetPath, ImportSettings};
use crate::bake::{encode_png, render, PixelBuffer, WIDTH};
use crate::curve::{Curve, Keyframes};
use crate::error::BakeError;

pub const DEFAULT_SAVE_PATH: &str = "Assets/CurveTexture_32x1.png";

// ------------------------- Channels -------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
            Channel::A => "A",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }
}

/// One optional curve per output channel. A missing curve bakes as 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<Keyframes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<Keyframes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Keyframes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Keyframes>,
}

impl Default for CurveSet {
    fn default() -> Self {
        Self {
            r: Some(Keyframes::constant_one()),
            g: Some(Keyframes::constant_one()),
            b: Some(Keyframes::constant_one()),
            a: Some(Keyframes::constant_one()),
        }
    }
}

impl CurveSet {
    pub fn unset() -> Self {
        Self {
            r: None,
            g: None,
            b: None,
            a: None,
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&Keyframes> {
        match channel {
            Channel::R => self.r.as_ref(),
            Channel::G => self.g.as_ref(),
            Channel::B => self.b.as_ref(),
            Channel::A => self.a.as_ref(),
        }
    }

    fn slot(&mut self, channel: Channel) -> &mut Option<Keyframes> {
        match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
            Channel::A => &mut self.a,
        }
    }

    pub fn set(&mut self, channel: Channel, curve: Keyframes) {
        *self.slot(channel) = Some(curve);
    }

    pub fn clear(&mut self, channel: Channel) -> Option<Keyframes> {
        self.slot(channel).take()
    }

    pub fn render(&self) -> PixelBuffer {
        let dynamic = |c: Channel| self.get(c).map(|k| k as &dyn Curve);
        render(
            dynamic(Channel::R),
            dynamic(Channel::G),
            dynamic(Channel::B),
            dynamic(Channel::A),
            WIDTH,
        )
    }
}

// ------------------------- Project -------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeProject {
    pub name: String,
    pub save_path: String,
    pub curves: CurveSet,
}

impl Default for BakeProject {
    fn default() -> Self {
        Self {
            name: "Untitled".into(),
            save_path: DEFAULT_SAVE_PATH.into(),
            curves: CurveSet::default(),
        }
    }
}

pub fn load_project(path: &Path) -> Result<BakeProject, BakeError> {
    let data = fs::read_to_string(path)?;
    let proj: BakeProject = match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "json" => serde_json::from_str(&data)?,
        "c2t" | "toml" => toml::from_str(&data)?,
        _ => match serde_json::from_str(&data) {
            Ok(p) => p,
            Err(_) => toml::from_str(&data)?,
        },
    };
    debug!(path = %path.display(), "loaded project");
    Ok(proj)
}

pub fn save_project(proj: &BakeProject, path: &Path) -> Result<(), BakeError> {
    let data = match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "c2t" | "toml" => toml::to_string_pretty(proj)?,
        _ => serde_json::to_string_pretty(proj)?,
    };
    write_atomic(path, data.as_bytes())
}

// ------------------------- Baking -------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeReport {
    pub asset: AssetPath,
    pub file: PathBuf,
    pub bytes: usize,
}

/// Render, encode and write `curves` to `asset` under `project_root`.
///
/// Nothing touches the file system until the path has been validated.
pub fn bake_to_asset(
    curves: &CurveSet,
    asset: &str,
    project_root: &Path,
    importer: Option<&mut dyn AssetImporter>,
) -> Result<BakeReport, BakeError> {
    let asset = AssetPath::parse(asset)?;
    let png = encode_png(&curves.render())?;
    let file = asset.resolve(project_root);
    write_atomic(&file, &png)?;
    if let Some(importer) = importer {
        importer.apply(&file, &ImportSettings::LOOKUP)?;
    }
    info!(asset = %asset, bytes = png.len(), "baked curve texture");
    Ok(BakeReport {
        asset,
        file,
        bytes: png.len(),
    })
}

/// Headless stand-in for the editor window: edits mark the preview dirty and
/// the strip is only resampled when someone asks for it.
#[derive(Debug, Clone)]
pub struct BakeSession {
    project: BakeProject,
    preview: Option<PixelBuffer>,
    dirty: bool,
}

impl BakeSession {
    pub fn new(project: BakeProject) -> Self {
        Self {
            project,
            preview: None,
            dirty: true,
        }
    }

    pub fn project(&self) -> &BakeProject {
        &self.project
    }

    pub fn into_project(self) -> BakeProject {
        self.project
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_curve(&mut self, channel: Channel, curve: Keyframes) {
        self.project.curves.set(channel, curve);
        self.dirty = true;
    }

    pub fn clear_curve(&mut self, channel: Channel) {
        self.project.curves.clear(channel);
        self.dirty = true;
    }

    /// Edit one channel's keys in place.
    pub fn edit_curve(&mut self, channel: Channel, f: impl FnOnce(&mut Keyframes)) {
        let slot = self.project.curves.slot(channel);
        f(slot.get_or_insert_with(Keyframes::constant_one));
        self.dirty = true;
    }

    /// Back to four constant-one curves.
    pub fn reset_curves(&mut self) {
        self.project.curves = CurveSet::default();
        self.dirty = true;
    }

    pub fn refresh(&mut self) {
        self.dirty = true;
    }

    pub fn set_save_path(&mut self, path: impl Into<String>) {
        self.project.save_path = path.into();
    }

    pub fn can_save(&self) -> bool {
        AssetPath::parse(&self.project.save_path).is_ok()
    }

    pub fn preview(&mut self) -> &PixelBuffer {
        if self.dirty {
            self.preview = None;
            self.dirty = false;
        }
        let curves = &self.project.curves;
        self.preview.get_or_insert_with(|| {
            debug!("resampling preview");
            curves.render()
        })
    }

    pub fn generate_and_save(
        &self,
        project_root: &Path,
        importer: Option<&mut dyn AssetImporter>,
    ) -> Result<BakeReport, BakeError> {
        bake_to_asset(
            &self.project.curves,
            &self.project.save_path,
            project_root,
            importer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::PathError;
    use crate::bake::decode_png;
    use crate::curve::Keyframe;
    use tempfile::tempdir;

    fn ramp_project() -> BakeProject {
        let mut proj = BakeProject::default();
        proj.name = "ramp".into();
        proj.curves.set(Channel::R, Keyframes::linear(0.0, 1.0));
        proj.curves.set(
            Channel::A,
            Keyframes::new(vec![
                Keyframe::new(0.0, 1.0),
                Keyframe::new(0.5, 0.5).with_easing(crate::curve::Easing::SmoothStep),
                Keyframe::new(1.0, 0.0),
            ]),
        );
        proj
    }

    #[test]
    fn default_curve_set_bakes_white() {
        let buf = CurveSet::default().render();
        assert!(buf.pixels().all(|px| px == [255; 4]));
        assert_eq!(CurveSet::unset().render(), buf);
    }

    #[test]
    fn channels_land_in_their_slot() {
        let mut curves = CurveSet::unset();
        curves.set(Channel::B, Keyframes::constant(0.0));
        let buf = curves.render();
        for px in buf.pixels() {
            assert_eq!(px[Channel::B.index()], 0);
            assert_eq!(px[Channel::R.index()], 255);
        }
        assert!(curves.clear(Channel::B).is_some());
        assert!(curves.get(Channel::B).is_none());
    }

    #[test]
    fn json_and_toml_projects_round_trip() {
        let dir = tempdir().unwrap();
        let proj = ramp_project();
        for name in ["p.json", "p.toml", "p.c2t"] {
            let path = dir.path().join(name);
            save_project(&proj, &path).unwrap();
            assert_eq!(load_project(&path).unwrap(), proj, "{name}");
        }
    }

    #[test]
    fn unknown_extension_falls_back_to_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.curves");
        fs::write(
            &path,
            "name = \"t\"\nsave_path = \"Assets/t.png\"\n\n[curves]\n[[curves.g]]\nt = 0.0\nv = 0.25\n",
        )
        .unwrap();
        let proj = load_project(&path).unwrap();
        assert_eq!(proj.save_path, "Assets/t.png");
        assert!(proj.curves.r.is_none());
        assert_eq!(proj.curves.g.as_ref().map(|k| k.evaluate(0.9)), Some(0.25));
    }

    #[test]
    fn preview_only_resamples_when_dirty() {
        let mut session = BakeSession::new(BakeProject::default());
        assert!(session.is_dirty());
        let first = session.preview().clone();
        assert!(!session.is_dirty());
        assert_eq!(session.preview(), &first);

        session.set_curve(Channel::G, Keyframes::constant(0.0));
        assert!(session.is_dirty());
        assert_eq!(session.preview().pixel(0), Some([255, 0, 255, 255]));

        session.reset_curves();
        assert_eq!(session.preview(), &first);

        session.refresh();
        assert!(session.is_dirty());
    }

    #[test]
    fn edit_curve_starts_from_constant_one() {
        let mut session = BakeSession::new(BakeProject {
            curves: CurveSet::unset(),
            ..BakeProject::default()
        });
        session.edit_curve(Channel::R, |k| k.upsert(0.0, 0.0));
        assert_eq!(session.preview().pixel(0), Some([0, 255, 255, 255]));
        assert_eq!(session.preview().pixel(WIDTH - 1), Some([255, 255, 255, 255]));
        session.clear_curve(Channel::R);
        assert_eq!(session.preview().pixel(0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn can_save_tracks_path_validity() {
        let mut session = BakeSession::new(BakeProject::default());
        assert!(session.can_save());
        session.set_save_path("Textures/ramp.png");
        assert!(!session.can_save());
    }

    #[test]
    fn generate_and_save_writes_decodable_png() {
        let dir = tempdir().unwrap();
        let session = BakeSession::new(ramp_project());
        let report = session.generate_and_save(dir.path(), None).unwrap();
        assert_eq!(report.asset.as_str(), DEFAULT_SAVE_PATH);
        let bytes = fs::read(&report.file).unwrap();
        assert_eq!(bytes.len(), report.bytes);
        assert_eq!(decode_png(&bytes).unwrap(), session.project().curves.render());
    }

    #[test]
    fn invalid_path_fails_before_writing() {
        let dir = tempdir().unwrap();
        let mut proj = ramp_project();
        proj.save_path = "../outside.png".into();
        let err = bake_to_asset(&proj.curves, &proj.save_path, dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            BakeError::Path(PathError::OutsideAssetRoot(_))
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
