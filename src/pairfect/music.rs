use std::collections::BTreeMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use url::Url;

pub const LANGUAGES: [&str; 4] = ["Tamil", "English", "Malayalam", "Hindi"];
pub const MOODS: [&str; 8] = [
    "Love",
    "Joy",
    "Calm",
    "Sadness",
    "Anger",
    "Nostalgia",
    "Party",
    "Devotional",
];

const SPOTIFY_PLAYLIST_BASE: &str = "https://open.spotify.com/playlist/";

static PLAYLISTS: Lazy<PlaylistDirectory> = Lazy::new(|| {
    PlaylistDirectory::from_yaml(include_str!("playlists.yaml"))
        .expect("embedded playlist table must parse")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistLink {
    pub language: String,
    pub mood: String,
    pub id: String,
}

impl PlaylistLink {
    pub fn open_url(&self) -> Result<Url> {
        Ok(Url::parse(SPOTIFY_PLAYLIST_BASE)?.join(&self.id)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistDirectory {
    table: BTreeMap<String, BTreeMap<String, String>>,
}

fn find_key<'a, V>(map: &'a BTreeMap<String, V>, wanted: &str) -> Option<(&'a String, &'a V)> {
    let wanted = wanted.trim();
    map.iter().find(|(key, _)| key.eq_ignore_ascii_case(wanted))
}

impl PlaylistDirectory {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(Self {
            table: serde_yaml::from_str(text)?,
        })
    }

    /// Case-insensitive on both keys; unknown pairs have no playlist.
    pub fn lookup(&self, language: &str, mood: &str) -> Option<PlaylistLink> {
        let (language, moods) = find_key(&self.table, language)?;
        let (mood, id) = find_key(moods, mood)?;
        Some(PlaylistLink {
            language: language.clone(),
            mood: mood.clone(),
            id: id.clone(),
        })
    }
}

pub fn find_playlist(language: &str, mood: &str) -> Option<PlaylistLink> {
    PLAYLISTS.lookup(language, mood)
}
