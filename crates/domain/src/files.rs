use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::new_id;

/// Full-width marker that older admin consoles embedded in a name or URL
/// to mean "this entry is a divider".
pub const DIVIDER_MARKER: char = '－';
pub const DEFAULT_DIVIDER_NAME: &str = "──────────";
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "m4v"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"];
const DOCUMENT_EXTS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];
const ARCHIVE_EXTS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildKind {
    File,
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Divider,
}

impl ChildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildKind::File => "file",
            ChildKind::Image => "image",
            ChildKind::Video => "video",
            ChildKind::Audio => "audio",
            ChildKind::Document => "document",
            ChildKind::Archive => "archive",
            ChildKind::Divider => "divider",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "file" => ChildKind::File,
            "image" => ChildKind::Image,
            "video" => ChildKind::Video,
            "audio" => ChildKind::Audio,
            "document" => ChildKind::Document,
            "archive" => ChildKind::Archive,
            "divider" => ChildKind::Divider,
            _ => return None,
        })
    }

    pub fn is_divider(&self) -> bool {
        matches!(self, ChildKind::Divider)
    }

    /// File type from the extension of a URL or file name.
    pub fn from_extension(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        let ext = match last_segment.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return ChildKind::File,
        };
        let ext = ext.as_str();

        if IMAGE_EXTS.contains(&ext) {
            ChildKind::Image
        } else if VIDEO_EXTS.contains(&ext) {
            ChildKind::Video
        } else if AUDIO_EXTS.contains(&ext) {
            ChildKind::Audio
        } else if DOCUMENT_EXTS.contains(&ext) {
            ChildKind::Document
        } else if ARCHIVE_EXTS.contains(&ext) {
            ChildKind::Archive
        } else {
            ChildKind::File
        }
    }

    /// Legacy inference for input that carries no explicit type.
    pub fn sniff(name: &str, url: Option<&str>) -> Self {
        let url = url.unwrap_or_default();
        if name.contains(DIVIDER_MARKER) || url.contains(DIVIDER_MARKER) {
            return ChildKind::Divider;
        }
        if url.is_empty() {
            Self::from_extension(name)
        } else {
            Self::from_extension(url)
        }
    }
}

/// A file or divider owned by exactly one folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChildKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Child {
    pub fn from_input(input: ChildInput) -> Result<Self, String> {
        let url = input
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let kind = match input.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some("folder") => return Err("A folder cannot contain another folder.".to_string()),
            Some(k) => ChildKind::parse(k).ok_or_else(|| format!("Unknown entry type: {}", k))?,
            None => ChildKind::sniff(&input.name, url.as_deref()),
        };

        let name = input.name.trim().to_string();
        let (name, url) = if kind.is_divider() {
            let name = name.replace(DIVIDER_MARKER, "");
            let name = if name.trim().is_empty() {
                DEFAULT_DIVIDER_NAME.to_string()
            } else {
                name.trim().to_string()
            };
            (name, None)
        } else {
            if name.is_empty() {
                return Err("File name is required.".to_string());
            }
            if url.is_none() {
                return Err("File URL is required.".to_string());
            }
            (name, url)
        };

        Ok(Self {
            id: input.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
            name,
            kind,
            url,
            created_at: input
                .created_at
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(now_stamp),
        })
    }
}

/// Serialized as `"folder"`; makes any other top-level type unrepresentable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderTag {
    #[default]
    Folder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FolderTag,
    pub url: String,
    pub note: String,
    pub children: Vec<Child>,
    /// Display state owned by the admin UI; always reported collapsed.
    pub expanded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<ChildInput>>,
}

impl Folder {
    pub fn new(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind: FolderTag::Folder,
            url: String::new(),
            note: note.into(),
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn from_input(input: FolderInput) -> Result<Self, String> {
        if let Some(kind) = input.kind.as_deref().map(str::trim) {
            if !kind.is_empty() && kind != "folder" {
                return Err("Only folders can be placed at the top level.".to_string());
            }
        }
        let name = input.name.trim();
        if name.is_empty() {
            return Err("Folder name is required.".to_string());
        }

        let children = input
            .children
            .unwrap_or_default()
            .into_iter()
            .map(Child::from_input)
            .collect::<Result<Vec<_>, _>>()?;

        let mut folder = Folder::new(name, input.note.unwrap_or_default().trim());
        if let Some(id) = input.id.filter(|id| !id.is_empty()) {
            folder.id = id;
        }
        folder.children = children;
        Ok(folder)
    }
}

fn now_stamp() -> String {
    Utc::now().format(CREATED_AT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, url: &str) -> ChildInput {
        ChildInput {
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    #[test]
    fn infers_kind_from_url() {
        let a = Child::from_input(input("a.txt", "http://x/a.txt")).unwrap();
        assert_eq!(a.kind, ChildKind::File);

        let img = Child::from_input(input("-", "http://x/img.jpg")).unwrap();
        assert_eq!(img.kind, ChildKind::Image);

        assert_eq!(ChildKind::from_extension("http://x/movie.MP4?dl=1"), ChildKind::Video);
        assert_eq!(ChildKind::from_extension("https://x.y/pack.7z#top"), ChildKind::Archive);
        assert_eq!(ChildKind::from_extension("https://x.y/report.pdf"), ChildKind::Document);
        assert_eq!(ChildKind::from_extension("https://x.y/song.flac"), ChildKind::Audio);
        assert_eq!(ChildKind::from_extension("https://x.y/download"), ChildKind::File);
    }

    #[test]
    fn explicit_type_wins() {
        let mut i = input("clip", "http://x/img.jpg");
        i.kind = Some("video".into());
        assert_eq!(Child::from_input(i).unwrap().kind, ChildKind::Video);

        let mut i = input("bad", "http://x");
        i.kind = Some("folder".into());
        assert!(Child::from_input(i).is_err());
    }

    #[test]
    fn marker_makes_divider_without_url() {
        let d = Child::from_input(input("", "－")).unwrap();
        assert_eq!(d.kind, ChildKind::Divider);
        assert_eq!(d.name, DEFAULT_DIVIDER_NAME);
        assert_eq!(d.url, None);

        let d = Child::from_input(ChildInput {
            name: "Section 2".into(),
            kind: Some("divider".into()),
            url: Some("http://ignored".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(d.name, "Section 2");
        assert_eq!(d.url, None);
    }

    #[test]
    fn files_need_name_and_url() {
        assert!(Child::from_input(input("", "http://x/a.txt")).is_err());
        assert!(Child::from_input(ChildInput {
            name: "a.txt".into(),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn folder_input_rejects_other_types() {
        let ok = Folder::from_input(FolderInput {
            name: " Downloads ".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok.name, "Downloads");
        assert!(ok.children.is_empty());
        assert!(!ok.expanded);

        assert!(Folder::from_input(FolderInput {
            name: "x".into(),
            kind: Some("file".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn folder_serializes_with_type_tag() {
        let json = serde_json::to_value(Folder::new("Docs", "")).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["expanded"], false);
        assert_eq!(json["url"], "");
    }
}
