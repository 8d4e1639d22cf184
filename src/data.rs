use serde::{Deserialize, Serialize};

pub type EntryId = u32;

/// One row of a listing page: the detail URL for a record that has not been
/// enriched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReference {
    pub name: String,
    pub url: String,
}

impl PageReference {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Pointer to the next listing page. Exhausted once the endpoint answers with
/// `next: null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    next: Option<String>,
}

impl Cursor {
    pub fn start(url: impl Into<String>) -> Self {
        Self {
            next: Some(url.into()),
        }
    }

    pub const fn exhausted() -> Self {
        Self { next: None }
    }

    pub fn from_next(next: Option<String>) -> Self {
        Self { next }
    }

    pub fn url(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub count: Option<u64>,
    pub next: Option<String>,
    pub results: Vec<PageReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordDetail {
    pub id: EntryId,
    pub name: String,
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sprites {
    pub other: OtherSprites,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork")]
    pub official_artwork: Artwork,
    pub dream_world: Artwork,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: Option<u8>,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A fully enriched record as held by the catalog store. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    pub image: Option<String>,
    pub icon_image: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub localized_name: String,
    pub localized_type: String,
}
