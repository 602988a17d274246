//! Track output type and the catalog wire types it is mapped from.

use serde::{Deserialize, Serialize};

/// A playable suggestion returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: String,
    pub album: String,
    pub album_art: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

// Spotify Web API types

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub items: Vec<Option<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyTrack {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
    pub preview_url: Option<String>,
    pub external_urls: Option<SpotifyExternalUrls>,
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyAlbum {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyImage {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyExternalUrls {
    pub spotify: Option<String>,
}

impl SpotifyTrack {
    /// Map into a [`Track`]; items without an id cannot be deduplicated and are dropped.
    pub fn into_track(self) -> Option<Track> {
        let id = self.id.filter(|id| !id.is_empty())?;

        let artists = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let (album, album_art) = match self.album {
            Some(album) => {
                // Catalog images are sorted largest first; index 1 is the mid-size one.
                let url_at = |i: usize| album.images.get(i).and_then(|img| img.url.clone());
                let art = url_at(1).or_else(|| url_at(0)).unwrap_or_default();
                (album.name, art)
            }
            None => (String::new(), String::new()),
        };

        Some(Track {
            id,
            name: self.name,
            artists,
            album,
            album_art,
            preview_url: self.preview_url.filter(|u| !u.is_empty()),
            external_url: self.external_urls.and_then(|u| u.spotify),
            uri: self.uri,
        })
    }
}
