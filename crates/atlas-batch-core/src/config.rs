use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{BatchError, Result};
use crate::exclude::ExcludeSet;
use crate::paths::{clean, normalize};

/// Atlas descriptor format written next to each atlas page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Exporter {
    /// LayaAir `.atlas` JSON.
    #[default]
    #[serde(alias = "layabox", alias = "Laya")]
    LayaBox,
    /// TexturePacker-style JSON hash (`.json`).
    #[serde(alias = "jsonhash", alias = "JSON (hash)")]
    JsonHash,
}

impl FromStr for Exporter {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "layabox" | "laya" => Ok(Self::LayaBox),
            "jsonhash" | "json-hash" | "json (hash)" => Ok(Self::JsonHash),
            _ => Err(()),
        }
    }
}

/// MaxRects placement method. `Smart` tries every heuristic and keeps the
/// tightest result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PackerMethod {
    #[default]
    Smart,
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for PackerMethod {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smart" => Ok(Self::Smart),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Encoding of atlas pages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl TextureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

impl FromStr for TextureFormat {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            _ => Err(()),
        }
    }
}

/// `atlas` section of the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AtlasSettings {
    /// Maximum page width in pixels.
    pub width: u32,
    /// Maximum page height in pixels.
    pub height: u32,
    /// Round page dimensions up to powers of two.
    #[serde(rename = "POT")]
    pub pot: bool,
    pub texture_format: String,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 2048,
            pot: false,
            texture_format: "png".into(),
        }
    }
}

/// `sprite` section of the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpriteSettings {
    /// Pixels between frames.
    pub padding: u32,
    /// Edge pixels repeated around each frame.
    pub extrude: u32,
    /// Allow 90° rotation.
    pub rotation: bool,
    /// Trim transparent borders before packing.
    pub trim: bool,
    /// Cap on the longer side of a sprite. Absent or 0 means unlimited.
    #[serde(deserialize_with = "lenient_number")]
    pub size: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub height: Option<f64>,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            padding: 2,
            extrude: 0,
            rotation: true,
            trim: true,
            size: None,
            width: None,
            height: None,
        }
    }
}

/// Accepts `12`, `"12"`, `""` and `null`.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// The project file, as written by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDescriptor {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub atlas: AtlasSettings,
    pub sprite: SpriteSettings,
    /// Glob patterns; when non-empty only matching images reach an atlas.
    pub include_list: Vec<String>,
    /// Folders or files kept out of packing and copied through instead.
    pub exclude_list: Vec<String>,
    /// Glob patterns selecting which sprites get extruded; empty means all.
    pub extrude_list: Vec<String>,
    /// Folder name → scale factor.
    pub scale_dir: BTreeMap<String, f64>,
    pub exporter: Exporter,
    pub packer_method: PackerMethod,
}

impl ProjectDescriptor {
    pub fn from_json_str(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| BatchError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BatchError::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(path, &content)
    }
}

/// Descriptor plus the absolute roots it resolves to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub descriptor_path: PathBuf,
    /// Directory relative exclude entries resolve against.
    pub base_dir: PathBuf,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub descriptor: ProjectDescriptor,
}

impl Project {
    /// Relative paths resolve against `cwd`. Missing `inputDir`/`outputDir`
    /// default to the descriptor's own directory; `output_override` wins over
    /// `outputDir`.
    pub fn resolve(
        descriptor: ProjectDescriptor,
        descriptor_path: &Path,
        cwd: &Path,
        output_override: Option<&Path>,
    ) -> Self {
        let descriptor_path = normalize(cwd, &descriptor_path.to_string_lossy());
        let descriptor_dir = descriptor_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        let base_dir = clean(cwd);

        let input_root = match descriptor.input_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => normalize(&base_dir, dir),
            _ => descriptor_dir.clone(),
        };
        let output_root = match (output_override, descriptor.output_dir.as_deref()) {
            (Some(dir), _) => normalize(&base_dir, &dir.to_string_lossy()),
            (None, Some(dir)) if !dir.trim().is_empty() => normalize(&base_dir, dir),
            _ => descriptor_dir,
        };

        if descriptor.atlas.texture_format.parse::<TextureFormat>().is_err() {
            warn!(
                format = %descriptor.atlas.texture_format,
                "unknown texture format, using png"
            );
        }

        Self {
            descriptor_path,
            base_dir,
            input_root,
            output_root,
            descriptor,
        }
    }

    pub fn load(descriptor_path: &Path, cwd: &Path, output_override: Option<&Path>) -> Result<Self> {
        let descriptor = ProjectDescriptor::load(descriptor_path)?;
        Ok(Self::resolve(descriptor, descriptor_path, cwd, output_override))
    }

    pub fn scale_map(&self) -> &BTreeMap<String, f64> {
        &self.descriptor.scale_dir
    }
}

/// Everything the packer needs for one folder. Built fresh per folder and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackJobOptions {
    pub exporter: Exporter,
    pub packer_method: PackerMethod,

    pub width: u32,
    pub height: u32,
    pub power_of_two: bool,
    pub texture_format: TextureFormat,

    pub padding: u32,
    pub extrude: u32,
    pub allow_rotation: bool,
    pub allow_trim: bool,
    pub max_size: Option<f64>,
    pub max_sprite_width: Option<f64>,
    pub max_sprite_height: Option<f64>,

    /// Atlas base name; the folder's own name.
    pub texture_name: String,
    pub scale: f64,

    pub input_root: PathBuf,
    pub include_list: Vec<String>,
    pub extrude_list: Vec<String>,
    /// The resolved exclude set, shared read-only across jobs.
    pub exclude: Arc<ExcludeSet>,
}

impl PackJobOptions {
    pub fn for_folder(
        project: &Project,
        texture_name: impl Into<String>,
        scale: f64,
        exclude: Arc<ExcludeSet>,
    ) -> Self {
        let d = &project.descriptor;
        Self {
            exporter: d.exporter,
            packer_method: d.packer_method,
            width: d.atlas.width,
            height: d.atlas.height,
            power_of_two: d.atlas.pot,
            texture_format: d.atlas.texture_format.parse().unwrap_or_default(),
            padding: d.sprite.padding,
            extrude: d.sprite.extrude,
            allow_rotation: d.sprite.rotation,
            allow_trim: d.sprite.trim,
            max_size: d.sprite.size,
            max_sprite_width: d.sprite.width,
            max_sprite_height: d.sprite.height,
            texture_name: texture_name.into(),
            scale,
            input_root: project.input_root.clone(),
            include_list: d.include_list.clone(),
            extrude_list: d.extrude_list.clone(),
            exclude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "inputDir": "proj/art",
        "atlas": { "width": 1024, "height": 512, "POT": true, "textureFormat": "JPG" },
        "sprite": { "padding": 1, "extrude": 2, "rotation": false, "size": "256", "width": "", "height": 128 },
        "includeList": [],
        "excludeList": ["proj/art/locked"],
        "extrudeList": ["tiles/*"],
        "scaleDir": { "hero": 2, "ui": 1 }
    }"#;

    #[test]
    fn parses_descriptor_fields() {
        let d = ProjectDescriptor::from_json_str(Path::new("p.json"), SAMPLE).expect("parse");
        assert_eq!(d.input_dir.as_deref(), Some("proj/art"));
        assert_eq!(d.output_dir, None);
        assert_eq!((d.atlas.width, d.atlas.height, d.atlas.pot), (1024, 512, true));
        assert_eq!(d.sprite.size, Some(256.0));
        assert_eq!(d.sprite.width, None);
        assert_eq!(d.sprite.height, Some(128.0));
        assert!(!d.sprite.rotation);
        assert!(d.sprite.trim);
        assert_eq!(d.scale_dir.get("hero"), Some(&2.0));
        assert_eq!(d.exporter, Exporter::LayaBox);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ProjectDescriptor::from_json_str(Path::new("bad.json"), "{ nope").unwrap_err();
        assert!(matches!(err, BatchError::DescriptorParse { .. }));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let d = ProjectDescriptor::from_json_str(Path::new("p.json"), "{}").expect("parse");
        assert_eq!(d.atlas, AtlasSettings::default());
        assert_eq!(d.sprite, SpriteSettings::default());
        assert!(d.exclude_list.is_empty());
    }

    #[test]
    fn roots_resolve_against_cwd_and_descriptor_dir() {
        let d = ProjectDescriptor::from_json_str(Path::new("p.json"), SAMPLE).expect("parse");
        let cwd = Path::new("/work");
        let project = Project::resolve(d.clone(), Path::new("proj/project.json"), cwd, None);
        assert_eq!(project.input_root, PathBuf::from("/work/proj/art"));
        assert_eq!(project.output_root, PathBuf::from("/work/proj"));

        let project = Project::resolve(d, Path::new("proj/project.json"), cwd, Some(Path::new("out")));
        assert_eq!(project.output_root, PathBuf::from("/work/out"));
    }

    #[test]
    fn options_are_built_per_folder() {
        let d = ProjectDescriptor::from_json_str(Path::new("p.json"), SAMPLE).expect("parse");
        let project = Project::resolve(d, Path::new("/p/project.json"), Path::new("/p"), None);
        let excludes = Arc::new(ExcludeSet::default());
        let hero = PackJobOptions::for_folder(&project, "hero", 2.0, excludes.clone());
        let ui = PackJobOptions::for_folder(&project, "ui", 1.0, excludes);
        assert_eq!(hero.texture_name, "hero");
        assert_eq!(hero.scale, 2.0);
        assert_eq!(ui.texture_name, "ui");
        assert_eq!(ui.scale, 1.0);
        assert_eq!(hero.texture_format, TextureFormat::Jpg);
        assert!(hero.power_of_two);
        assert_eq!(hero.max_sprite_height, Some(128.0));
    }

    #[test]
    fn option_enums_parse_case_insensitively() {
        assert_eq!("LayaBox".parse::<Exporter>(), Ok(Exporter::LayaBox));
        assert_eq!("BSSF".parse::<PackerMethod>(), Ok(PackerMethod::BestShortSideFit));
        assert_eq!("jpeg".parse::<TextureFormat>(), Ok(TextureFormat::Jpg));
        assert!("webp".parse::<TextureFormat>().is_err());
    }
}
