use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A playable asset in the fixed catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Display title, usually with the release year appended
    pub title: String,
    /// Release year
    pub year: i32,
    /// Id of the title in the metadata provider
    pub external_id: u64,
    /// Direct URL of the video file
    pub asset_url: String,
    /// Where the file is hosted
    pub source: String,
    /// License the file is distributed under
    pub license: String,
}

impl CatalogEntry {
    pub fn new(
        title: impl Into<String>,
        year: i32,
        external_id: u64,
        asset_url: impl Into<String>,
        source: impl Into<String>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            external_id,
            asset_url: asset_url.into(),
            source: source.into(),
            license: license.into(),
        }
    }

    fn archive(title: &str, year: i32, external_id: u64, asset_url: &str) -> Self {
        Self::new(title, year, external_id, asset_url, "archive.org", "Public Domain")
    }
}

/// Fixed, read-only list of playable assets.
///
/// Built once at startup and never mutated afterwards. Declaration order is
/// significant: the resolver breaks every tie by it.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Create a catalog from a non-empty list of entries
    pub fn new(entries: Vec<CatalogEntry>) -> CoreResult<Self> {
        if entries.is_empty() {
            return Err(CoreError::Config("catalog must contain at least one entry".to_string()));
        }
        Ok(Self { entries })
    }

    /// Load a catalog from a JSON array of entries
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)?;
        info!("Loaded {} catalog entries from {}", entries.len(), path.display());
        Self::new(entries)
    }

    /// Built-in list of public-domain films hosted on archive.org
    pub fn public_domain() -> Self {
        let entries = vec![
            CatalogEntry::archive(
                "Night of the Living Dead (1968)",
                1968,
                10331,
                "https://ia800707.us.archive.org/5/items/Night_of_the_Living_Dead_1968_720p/Night_of_the_Living_Dead_1968_720p.mp4",
            ),
            CatalogEntry::archive(
                "The Little Shop of Horrors (1960)",
                1960,
                32589,
                "https://ia801603.us.archive.org/13/items/TheLittleShopOfHorrors1960/The_Little_Shop_of_Horrors_1960.mp4",
            ),
            CatalogEntry::archive(
                "Charade (1963)",
                1963,
                4808,
                "https://ia800103.us.archive.org/27/items/Charade1963/Charade1963_512kb.mp4",
            ),
            CatalogEntry::archive(
                "Plan 9 from Outer Space (1959)",
                1959,
                4424,
                "https://ia800300.us.archive.org/1/items/Plan9FromOuterSpace1959/Plan9FromOuterSpace1959.mp4",
            ),
            CatalogEntry::archive(
                "The Phantom of the Opera (1925)",
                1925,
                11377,
                "https://ia800204.us.archive.org/4/items/ThePhantomoftheOpera/Phantom_of_the_Opera_512kb.mp4",
            ),
            CatalogEntry::archive(
                "Nosferatu (1922)",
                1922,
                653,
                "https://ia800701.us.archive.org/12/items/Nosferatu_201407/Nosferatu.mp4",
            ),
            CatalogEntry::archive(
                "The General (1926)",
                1926,
                961,
                "https://ia800205.us.archive.org/29/items/TheGeneral_798/TheGeneral.mp4",
            ),
            CatalogEntry::archive(
                "The Cabinet of Dr. Caligari (1920)",
                1920,
                234,
                "https://ia800302.us.archive.org/13/items/DasKabinettdesDoktorCaligariTheCabinetofDrCaligari/The_Cabinet_of_Dr_Caligari_512kb.mp4",
            ),
            CatalogEntry::archive(
                "Metropolis (1927)",
                1927,
                19,
                "https://ia800303.us.archive.org/16/items/MetropolisFritzLang1927EnglishSubtitles/Metropolis%20-%20Fritz%20Lang%20-%201927%20-%20English%20subtitles.mp4",
            ),
            CatalogEntry::archive(
                "The Kid (1921)",
                1921,
                10098,
                "https://ia800302.us.archive.org/32/items/CC_1921_01_21_TheKid/CC_1921_01_21_TheKid_512kb.mp4",
            ),
        ];
        debug!("Built-in catalog has {} entries", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::public_domain()
    }
}
