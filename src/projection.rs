//! Display-oriented, read-only views of a show joined with its artist or venue.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{artist, show, venue};

pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_start_time(start_time: &DateTime<Utc>) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

/// A show as seen from its venue's page: who plays, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowArtist {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

impl ShowArtist {
    pub fn new(show: &show::Model, artist: &artist::Model) -> Self {
        Self {
            artist_id: show.artist_id,
            artist_name: artist.name.clone(),
            artist_image_link: artist.image_link.clone(),
            start_time: format_start_time(&show.start_time),
        }
    }
}

/// A show as seen from its artist's page: where, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowVenue {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

impl ShowVenue {
    pub fn new(show: &show::Model, venue: &venue::Model) -> Self {
        Self {
            venue_id: show.venue_id,
            venue_name: venue.name.clone(),
            venue_image_link: venue.image_link.clone(),
            start_time: format_start_time(&show.start_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Genres;
    use crate::test_utils::utc;

    fn show() -> show::Model {
        show::Model {
            id: 1,
            artist_id: 7,
            venue_id: 3,
            start_time: utc("2023-04-05 18:30:00"),
        }
    }

    fn artist() -> artist::Model {
        artist::Model {
            id: 7,
            name: "Guns N Petals".to_string(),
            city: Some("San Francisco".to_string()),
            state: Some("CA".to_string()),
            phone: None,
            image_link: Some("https://example.com/gnp.jpg".to_string()),
            facebook_link: None,
            seeking_venue: true,
            genres: Genres(vec!["Rock n Roll".to_string()]),
            seeking_description: None,
        }
    }

    fn venue() -> venue::Model {
        venue::Model {
            id: 3,
            name: "The Musical Hop".to_string(),
            city: Some("San Francisco".to_string()),
            state: Some("CA".to_string()),
            address: Some("1015 Folsom Street".to_string()),
            phone: None,
            image_link: None,
            facebook_link: None,
            seeking_talent: false,
            genres: Genres::default(),
            seeking_description: None,
        }
    }

    #[test]
    fn test_show_artist_projection() {
        let projection = ShowArtist::new(&show(), &artist());
        assert_eq!(
            projection,
            ShowArtist {
                artist_id: 7,
                artist_name: "Guns N Petals".to_string(),
                artist_image_link: Some("https://example.com/gnp.jpg".to_string()),
                start_time: "2023-04-05 18:30:00".to_string(),
            }
        );
    }

    #[test]
    fn test_show_venue_projection() {
        let projection = ShowVenue::new(&show(), &venue());
        assert_eq!(projection.venue_id, 3);
        assert_eq!(projection.venue_name, "The Musical Hop");
        assert_eq!(projection.venue_image_link, None);
        assert_eq!(projection.start_time, "2023-04-05 18:30:00");
    }

    #[test]
    fn test_start_time_format_pads_fields_and_drops_fractions() {
        let start = utc("2009-01-02 03:04:05") + chrono::Duration::milliseconds(999);
        assert_eq!(format_start_time(&start), "2009-01-02 03:04:05");
    }

    #[test]
    fn test_projection_serializes_with_expected_keys() {
        let value = serde_json::to_value(ShowArtist::new(&show(), &artist())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "artist_id": 7,
                "artist_name": "Guns N Petals",
                "artist_image_link": "https://example.com/gnp.jpg",
                "start_time": "2023-04-05 18:30:00",
            })
        );
    }
}
