use std::io::Cursor;
use std::path::Path;

use atlas_batch_core::{
    Exporter, PackInput, PackJobOptions, PackedFile, PackerAdapter, PackerMethod, TextureFormat,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, instrument, warn};

use crate::compositing::compose_page;
use crate::error::{EngineError, Result};
use crate::export::{to_json_hash, to_laya_atlas};
use crate::layout::{Layout, pack_pages, pack_smart};
use crate::model::Meta;
use crate::packer::{Heuristic, PageLimits};
use crate::sprite::{Sprite, SpriteLimits, decode, prepare};

/// Default [`PackerAdapter`]: decode, scale, trim, place with MaxRects and
/// encode pages plus one descriptor.
#[derive(Debug, Clone, Default)]
pub struct AtlasEngine {
    _private: (),
}

impl AtlasEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackerAdapter for AtlasEngine {
    type Error = EngineError;

    fn pack(
        &self,
        files: Vec<PackInput>,
        options: &PackJobOptions,
    ) -> std::result::Result<Vec<PackedFile>, EngineError> {
        pack_job(files, options)
    }
}

fn validate(options: &PackJobOptions) -> Result<()> {
    if options.width == 0 || options.height == 0 {
        return Err(EngineError::InvalidDimensions {
            width: options.width,
            height: options.height,
        });
    }
    if !options.scale.is_finite() || options.scale <= 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "scale must be a positive number, got {}",
            options.scale
        )));
    }
    let reserved = options.padding.saturating_add(options.extrude.saturating_mul(2));
    if reserved >= options.width || reserved >= options.height {
        return Err(EngineError::InvalidConfig(format!(
            "padding {} and extrude {} leave no room on a {}x{} page",
            options.padding, options.extrude, options.width, options.height
        )));
    }
    Ok(())
}

fn build_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

/// Matches the sprite's own name or its path below the input root.
fn matches(set: &GlobSet, input: &PackInput, input_root: &Path) -> bool {
    if set.is_match(&input.path) {
        return true;
    }
    match input.dir.strip_prefix(input_root) {
        Ok(rel) => set.is_match(rel.to_string_lossy().replace('\\', "/")),
        Err(_) => set.is_match(&input.dir),
    }
}

fn select_inputs(files: Vec<PackInput>, options: &PackJobOptions) -> Result<Vec<PackInput>> {
    let include = build_globs(&options.include_list)?;
    Ok(files
        .into_iter()
        .filter(|f| {
            if options.exclude.contains(&f.dir) {
                debug!(file = %f.dir.display(), "excluded");
                return false;
            }
            match &include {
                Some(set) if !matches(set, f, &options.input_root) => {
                    debug!(file = %f.dir.display(), "not in include list");
                    false
                }
                _ => true,
            }
        })
        .collect())
}

fn heuristic_for(method: PackerMethod) -> Option<Heuristic> {
    match method {
        PackerMethod::Smart => None,
        PackerMethod::BestShortSideFit => Some(Heuristic::BestShortSideFit),
        PackerMethod::BestLongSideFit => Some(Heuristic::BestLongSideFit),
        PackerMethod::BestAreaFit => Some(Heuristic::BestAreaFit),
        PackerMethod::BottomLeft => Some(Heuristic::BottomLeft),
        PackerMethod::ContactPoint => Some(Heuristic::ContactPoint),
    }
}

/// LayaAir's `.atlas` loader has no notion of rotated frames.
fn rotation_allowed(options: &PackJobOptions) -> bool {
    if options.allow_rotation && options.exporter == Exporter::LayaBox {
        debug!(texture = %options.texture_name, "rotation disabled for LayaBox output");
        return false;
    }
    options.allow_rotation
}

fn encode(page: RgbaImage, format: TextureFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    match format {
        TextureFormat::Png => DynamicImage::ImageRgba8(page).write_to(&mut out, ImageFormat::Png)?,
        TextureFormat::Jpg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(page).to_rgb8())
            .write_to(&mut out, ImageFormat::Jpeg)?,
    }
    Ok(out.into_inner())
}

/// `ui.png`, `ui1.png`, `ui2.png`, ...
pub fn page_file_name(texture_name: &str, index: usize, format: TextureFormat) -> String {
    match index {
        0 => format!("{texture_name}.{}", format.extension()),
        n => format!("{texture_name}{n}.{}", format.extension()),
    }
}

pub fn descriptor_file_name(texture_name: &str, exporter: Exporter) -> String {
    match exporter {
        Exporter::LayaBox => format!("{texture_name}.atlas"),
        Exporter::JsonHash => format!("{texture_name}.json"),
    }
}

fn load_sprites(inputs: Vec<PackInput>, options: &PackJobOptions) -> Result<Vec<Sprite>> {
    let extrude_set = build_globs(&options.extrude_list)?;
    let limits = SpriteLimits::new(
        options.max_size,
        options.max_sprite_width,
        options.max_sprite_height,
    );
    let mut sprites = Vec::with_capacity(inputs.len());
    for input in inputs {
        let rgba = match decode(&input.contents) {
            Ok(img) => img,
            Err(e) => {
                warn!(file = %input.dir.display(), error = %e, "cannot decode image, skipped");
                continue;
            }
        };
        let extrude = match &extrude_set {
            Some(set) if !matches(set, &input, &options.input_root) => 0,
            _ => options.extrude,
        };
        sprites.push(prepare(
            input.path,
            rgba,
            options.scale,
            &limits,
            options.allow_trim,
            extrude,
        ));
    }
    Ok(sprites)
}

#[instrument(skip_all, fields(texture = %options.texture_name))]
fn pack_job(files: Vec<PackInput>, options: &PackJobOptions) -> Result<Vec<PackedFile>> {
    validate(options)?;
    let inputs = select_inputs(files, options)?;
    if inputs.is_empty() {
        debug!(texture = %options.texture_name, "nothing to pack");
        return Ok(Vec::new());
    }
    let sprites = load_sprites(inputs, options)?;
    if sprites.is_empty() {
        return Ok(Vec::new());
    }

    let limits = PageLimits {
        width: options.width,
        height: options.height,
        padding: options.padding,
        allow_rotation: rotation_allowed(options),
    };
    let Layout { heuristic, pages } = match heuristic_for(options.packer_method) {
        Some(h) => pack_pages(&sprites, limits, h, options.power_of_two)?,
        None => pack_smart(&sprites, limits, options.power_of_two)?,
    };
    info!(
        texture = %options.texture_name,
        sprites = sprites.len(),
        pages = pages.len(),
        heuristic = heuristic.as_str(),
        "packed"
    );

    let page_files: Vec<String> = (0..pages.len())
        .map(|i| page_file_name(&options.texture_name, i, options.texture_format))
        .collect();
    let descriptor = match options.exporter {
        Exporter::LayaBox => to_laya_atlas(&pages, &page_files, &options.texture_name),
        Exporter::JsonHash => {
            let meta = Meta {
                app: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                format: "RGBA8888".into(),
                scale: options.scale,
                power_of_two: options.power_of_two,
                padding: options.padding,
                extrude: options.extrude,
                allow_rotation: options.allow_rotation,
                trim: options.allow_trim,
            };
            to_json_hash(&pages, &page_files, &meta)
        }
    };

    let mut out = Vec::with_capacity(pages.len() + 1);
    out.push(PackedFile {
        name: descriptor_file_name(&options.texture_name, options.exporter),
        buffer: serde_json::to_vec_pretty(&descriptor)?,
    });
    for (page, name) in pages.iter().zip(page_files) {
        debug!(
            page = page.id,
            width = page.width,
            height = page.height,
            occupancy = page.occupancy(),
            "page"
        );
        let canvas = compose_page(page, &sprites);
        out.push(PackedFile {
            name,
            buffer: encode(canvas, options.texture_format)?,
        });
    }
    Ok(out)
}
