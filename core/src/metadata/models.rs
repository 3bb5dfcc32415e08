use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of title in the metadata provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Person,
    #[serde(other)]
    Other,
}

impl MediaType {
    /// Path segment used by the provider's REST API
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Person => "person",
            MediaType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, MediaType::Movie | MediaType::Tv)
    }
}

/// A movie or TV show as listed in rows and search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: u64,
    /// Set for movies
    #[serde(default)]
    pub title: Option<String>,
    /// Set for TV shows
    #[serde(default)]
    pub name: Option<String>,
    /// Only present on mixed listings such as trending and search
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

impl ContentSummary {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// Release date for movies, first air date for shows
    pub fn date(&self) -> Option<&str> {
        [self.release_date.as_deref(), self.first_air_date.as_deref()]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty())
    }

    pub fn release_year(&self) -> Option<i32> {
        self.date().and_then(parse_year)
    }

    /// Media type, inferred from the date field when the listing omits it
    pub fn kind(&self) -> MediaType {
        match self.media_type {
            Some(kind) => kind,
            None if self.first_air_date.is_some() && self.release_date.is_none() => MediaType::Tv,
            None => MediaType::Movie,
        }
    }

    /// Rating out of ten, one decimal
    pub fn rating(&self) -> String {
        format!("{:.1}", self.vote_average)
    }
}

/// Parse the year from a `YYYY-MM-DD` date
pub fn parse_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// A video attached to a title (trailers, teasers, featurettes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        (self.kind == "Trailer" || self.kind == "Teaser") && self.site == "YouTube"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Full record of a title, with its videos appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetails {
    #[serde(flatten)]
    pub summary: ContentSummary,
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Minutes, movies only
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub videos: VideoList,
}

impl ContentDetails {
    /// Key of the first YouTube trailer or teaser
    pub fn trailer_key(&self) -> Option<&str> {
        self.videos
            .results
            .iter()
            .find(|v| v.is_youtube_trailer())
            .map(|v| v.key.as_str())
    }

    pub fn display_title(&self) -> &str {
        self.summary.display_title()
    }

    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }

    /// Runtime as `1h 34m`
    pub fn runtime_label(&self) -> Option<String> {
        self.runtime.filter(|m| *m > 0).map(|m| {
            if m >= 60 {
                format!("{}h {}m", m / 60, m % 60)
            } else {
                format!("{}m", m)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// Paged listing envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Search hit annotated with full-asset availability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub item: ContentSummary,
    pub streaming_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIE_DETAILS: &str = r#"{
        "id": 653,
        "title": "Nosferatu",
        "overview": "The mysterious Count Orlok summons Thomas Hutter to Transylvania.",
        "release_date": "1922-02-16",
        "vote_average": 7.7,
        "runtime": 94,
        "genres": [{"id": 27, "name": "Horror"}, {"id": 14, "name": "Fantasy"}],
        "videos": {"results": [
            {"key": "feat1", "site": "YouTube", "type": "Featurette", "name": "Restoration"},
            {"key": "vimeo1", "site": "Vimeo", "type": "Trailer", "name": "Trailer"},
            {"key": "FC6jFoYm3xs", "site": "YouTube", "type": "Teaser", "name": "Teaser"}
        ]}
    }"#;

    #[test]
    fn test_movie_details_deserialize() {
        let details: ContentDetails = serde_json::from_str(MOVIE_DETAILS).unwrap();
        assert_eq!(details.display_title(), "Nosferatu");
        assert_eq!(details.summary.release_year(), Some(1922));
        assert_eq!(details.summary.kind(), MediaType::Movie);
        assert_eq!(details.genre_names(), vec!["Horror", "Fantasy"]);
        assert_eq!(details.runtime_label().as_deref(), Some("1h 34m"));
    }

    #[test]
    fn test_trailer_key_prefers_youtube_trailers() {
        let details: ContentDetails = serde_json::from_str(MOVIE_DETAILS).unwrap();
        assert_eq!(details.trailer_key(), Some("FC6jFoYm3xs"));

        let bare: ContentDetails = serde_json::from_str(r#"{"id": 1, "title": "No videos"}"#).unwrap();
        assert_eq!(bare.trailer_key(), None);
    }

    #[test]
    fn test_tv_summary_uses_name_and_air_date() {
        let show: ContentSummary = serde_json::from_str(
            r#"{"id": 1399, "name": "Game of Thrones", "first_air_date": "2011-04-17", "vote_average": 8.4}"#,
        )
        .unwrap();
        assert_eq!(show.display_title(), "Game of Thrones");
        assert_eq!(show.release_year(), Some(2011));
        assert_eq!(show.kind(), MediaType::Tv);
        assert_eq!(show.rating(), "8.4");
    }

    #[test]
    fn test_unknown_media_type_and_bad_dates() {
        let item: ContentSummary =
            serde_json::from_str(r#"{"id": 5, "media_type": "collection", "release_date": ""}"#).unwrap();
        assert_eq!(item.media_type, Some(MediaType::Other));
        assert_eq!(item.release_year(), None);
        assert_eq!(parse_year("not a date"), None);
    }
}
