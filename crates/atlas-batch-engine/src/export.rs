//! Atlas descriptors written next to the page images.

use serde_json::{Map, Value, json};

use crate::model::{Meta, Page};

/// LayaBox `.atlas` descriptor.
///
/// Shape: `{ frames: { name: { frame: {x,y,w,h,idx}, sourceSize: {w,h},
/// spriteSourceSize: {x,y} } }, meta: { image: "a.png,a1.png", prefix: "a/" } }`.
/// `idx` is the page index into `meta.image`; `rotated` only appears when set.
pub fn to_laya_atlas(pages: &[Page], page_files: &[String], texture_name: &str) -> Value {
    let mut frames = Map::new();
    for page in pages {
        for fr in &page.frames {
            let mut entry = json!({
                "frame": {"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h, "idx": page.id},
                "sourceSize": {"w": fr.source_size.0, "h": fr.source_size.1},
                "spriteSourceSize": {"x": fr.source.x, "y": fr.source.y},
            });
            if fr.rotated {
                entry["rotated"] = Value::Bool(true);
            }
            frames.insert(fr.key.clone(), entry);
        }
    }
    json!({
        "frames": frames,
        "meta": {
            "image": page_files.join(","),
            "prefix": format!("{texture_name}/"),
        },
    })
}

/// TexturePacker-style JSON hash: frames keyed by name with their page id.
pub fn to_json_hash(pages: &[Page], page_files: &[String], meta: &Meta) -> Value {
    let mut frames = Map::new();
    for page in pages {
        for fr in &page.frames {
            frames.insert(
                fr.key.clone(),
                json!({
                    "frame": {"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h},
                    "rotated": fr.rotated,
                    "trimmed": fr.trimmed,
                    "spriteSourceSize": {"x": fr.source.x, "y": fr.source.y, "w": fr.source.w, "h": fr.source.h},
                    "sourceSize": {"w": fr.source_size.0, "h": fr.source_size.1},
                    "page": page.id,
                }),
            );
        }
    }
    let page_info: Vec<Value> = pages
        .iter()
        .zip(page_files)
        .map(|(p, file)| json!({"image": file, "size": {"w": p.width, "h": p.height}}))
        .collect();
    let mut meta_val = json!(meta);
    meta_val["pages"] = Value::Array(page_info);
    json!({ "frames": frames, "meta": meta_val })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frame, Rect};

    fn pages() -> Vec<Page> {
        let frame = |key: &str, x: u32, rotated: bool| Frame {
            key: key.into(),
            frame: Rect::new(x, 0, 4, 2),
            rotated,
            trimmed: true,
            source: Rect::new(1, 3, 4, 2),
            source_size: (8, 8),
            extrude: 0,
        };
        vec![
            Page {
                id: 0,
                width: 16,
                height: 16,
                frames: vec![frame("a.png", 0, false)],
            },
            Page {
                id: 1,
                width: 8,
                height: 8,
                frames: vec![frame("b.png", 2, true)],
            },
        ]
    }

    #[test]
    fn laya_descriptor_shape() {
        let files = vec!["ui.png".to_string(), "ui1.png".to_string()];
        let v = to_laya_atlas(&pages(), &files, "ui");
        assert_eq!(v["meta"]["image"], "ui.png,ui1.png");
        assert_eq!(v["meta"]["prefix"], "ui/");
        let a = &v["frames"]["a.png"];
        assert_eq!(a["frame"], json!({"x": 0, "y": 0, "w": 4, "h": 2, "idx": 0}));
        assert_eq!(a["sourceSize"], json!({"w": 8, "h": 8}));
        assert_eq!(a["spriteSourceSize"], json!({"x": 1, "y": 3}));
        assert!(a.get("rotated").is_none());
        assert_eq!(v["frames"]["b.png"]["frame"]["idx"], 1);
        assert_eq!(v["frames"]["b.png"]["rotated"], true);
    }

    #[test]
    fn json_hash_lists_pages() {
        let meta = Meta {
            app: "atlas-batch".into(),
            version: "0.1.0".into(),
            format: "RGBA8888".into(),
            scale: 1.0,
            power_of_two: false,
            padding: 2,
            extrude: 0,
            allow_rotation: true,
            trim: true,
        };
        let files = vec!["ui.png".to_string(), "ui1.png".to_string()];
        let v = to_json_hash(&pages(), &files, &meta);
        assert_eq!(v["frames"]["b.png"]["page"], 1);
        assert_eq!(v["meta"]["pages"][1]["image"], "ui1.png");
        assert_eq!(v["meta"]["app"], "atlas-batch");
    }
}
