use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

pub type MovieId = i64;

const YOUTUBE_SITE: &str = "YouTube";
const TRAILER_TYPE: &str = "Trailer";

/// The slice of a movie record shown in grids and stored as a favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub release_date: Option<String>,
}

impl MovieSummary {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.as_deref().and_then(release_year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub budget: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub revenue: u64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credits: Credits,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Collection<Video>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub similar: Collection<MovieSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Collection<Review>,
}

impl MovieDetail {
    pub fn id(&self) -> MovieId {
        self.summary.id
    }

    pub fn director(&self) -> Option<&CrewMember> {
        self.credits
            .crew
            .iter()
            .find(|c| c.job.as_deref() == Some("Director"))
    }

    /// YouTube trailers in the order the catalog returned them.
    pub fn trailers(&self) -> impl Iterator<Item = Trailer> + '_ {
        self.videos
            .results
            .iter()
            .filter(|v| v.is_youtube_trailer())
            .map(Trailer::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub site: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.video_type == TRAILER_TYPE && self.site == YOUTUBE_SITE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_details: Option<AuthorDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDetails {
    #[serde(default)]
    pub rating: Option<f64>,
}

/// An appended sub-resource (`videos`, `similar`, `reviews`); may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Collection<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub results: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

/// List endpoint envelope; unlike [`Collection`], `results` is mandatory.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieImages {
    #[serde(default, deserialize_with = "null_as_default")]
    pub backdrops: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posters: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logos: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub file_path: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub iso_639_1: Option<String>,
}

/// A playable trailer, addressed on the video platform by its opaque key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub key: String,
    pub name: Option<String>,
    pub site: String,
}

impl Trailer {
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}?autoplay=1", self.key)
    }

    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/hqdefault.jpg", self.key)
    }
}

impl From<&Video> for Trailer {
    fn from(v: &Video) -> Self {
        Self {
            key: v.key.clone(),
            name: v.name.clone(),
            site: v.site.clone(),
        }
    }
}

/// First YouTube trailer in server order. No secondary sort.
pub fn select_trailer(videos: &[Video]) -> Option<Trailer> {
    videos
        .iter()
        .find(|v| v.is_youtube_trailer())
        .map(Trailer::from)
}

fn release_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.year())
        .ok()
        .or_else(|| date.split('-').next().and_then(|y| y.parse().ok()))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
