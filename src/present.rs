//! Render-ready projections of catalog records for the card grid and the
//! detail page.

use serde::Serialize;

use crate::favorites::FavoritesStore;
use crate::models::{MovieDetail, MovieId, MovieSummary, Trailer};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750?text=No+Image";
const PROFILE_PLACEHOLDER: &str = "https://via.placeholder.com/185x278?text=No+Photo";

const TOP_CAST: usize = 8;
const SIMILAR_SHOWN: usize = 6;
const REVIEWS_SHOWN: usize = 3;
const REVIEW_EXCERPT_CHARS: usize = 400;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub poster_url: String,
    pub rating: String,
    pub year: Option<i32>,
    pub favorite: bool,
    /// Echoed so the front end can post it back when toggling the heart.
    pub summary: MovieSummary,
}

impl MovieCard {
    pub fn new(movie: MovieSummary, favorite: bool) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_url: poster_url(movie.poster_path.as_deref()),
            rating: format!("{:.1}", movie.vote_average),
            year: movie.release_year(),
            favorite,
            summary: movie,
        }
    }
}

pub fn cards(movies: Vec<MovieSummary>, favorites: &FavoritesStore) -> Vec<MovieCard> {
    movies
        .into_iter()
        .map(|m| {
            let favorite = favorites.is_favorite(m.id);
            MovieCard::new(m, favorite)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastCard {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewExcerpt {
    pub author: String,
    pub rating: Option<f64>,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailerLink {
    #[serde(flatten)]
    pub trailer: Trailer,
    pub embed_url: String,
    pub thumbnail_url: String,
}

impl From<Trailer> for TrailerLink {
    fn from(trailer: Trailer) -> Self {
        Self {
            embed_url: trailer.embed_url(),
            thumbnail_url: trailer.thumbnail_url(),
            trailer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPage {
    pub card: MovieCard,
    pub tagline: Option<String>,
    pub overview: String,
    pub backdrop_url: Option<String>,
    pub genres: Vec<String>,
    pub runtime: Option<String>,
    pub director: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub status: Option<String>,
    pub original_language: Option<String>,
    pub vote_count: u64,
    pub trailers: Vec<TrailerLink>,
    pub cast: Vec<CastCard>,
    pub similar: Vec<MovieCard>,
    pub reviews: Vec<ReviewExcerpt>,
}

impl DetailPage {
    pub fn new(detail: MovieDetail, favorites: &FavoritesStore) -> Self {
        let trailers = detail.trailers().map(TrailerLink::from).collect();
        let director = detail.director().map(|c| c.name.clone());
        let MovieDetail {
            summary,
            overview,
            tagline,
            runtime,
            budget,
            revenue,
            backdrop_path,
            status,
            original_language,
            vote_count,
            genres,
            credits,
            similar,
            reviews,
            ..
        } = detail;

        let cast = credits
            .cast
            .into_iter()
            .take(TOP_CAST)
            .map(|c| CastCard {
                id: c.id,
                name: c.name,
                character: c.character,
                profile_url: c
                    .profile_path
                    .map(|p| format!("{IMAGE_BASE}/w185{p}"))
                    .unwrap_or_else(|| PROFILE_PLACEHOLDER.to_string()),
            })
            .collect();
        let similar = cards(
            similar.results.into_iter().take(SIMILAR_SHOWN).collect(),
            favorites,
        );
        let reviews = reviews
            .results
            .into_iter()
            .take(REVIEWS_SHOWN)
            .map(|r| ReviewExcerpt {
                author: r.author,
                rating: r.author_details.and_then(|a| a.rating),
                excerpt: excerpt(&r.content, REVIEW_EXCERPT_CHARS),
            })
            .collect();

        let favorite = favorites.is_favorite(summary.id);
        Self {
            card: MovieCard::new(summary, favorite),
            tagline,
            overview,
            backdrop_url: backdrop_path.map(|p| format!("{IMAGE_BASE}/original{p}")),
            genres: genres.into_iter().map(|g| g.name).collect(),
            runtime: runtime.map(format_runtime),
            director,
            budget: (budget > 0).then(|| format_usd(budget)),
            revenue: (revenue > 0).then(|| format_usd(revenue)),
            status,
            original_language: original_language.map(|l| l.to_uppercase()),
            vote_count,
            trailers,
            cast,
            similar,
            reviews,
        }
    }
}

pub fn poster_url(path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{IMAGE_BASE}/w500{p}"),
        None => POSTER_PLACEHOLDER.to_string(),
    }
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Whole US dollars with thousands separators, e.g. `$160,000,000`.
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
