use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities::{Genres, artist, show, venue};
use crate::error::{DirectoryError, Result};
use crate::limits::{LONG_TEXT_MAX, LengthPolicy, SHORT_TEXT_MAX};
use crate::projection::ShowVenue;
use crate::services::show::project_venues;

#[derive(Debug, Clone, Default)]
pub struct NewArtist {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    /// Defaults to false when unset
    pub seeking_venue: Option<bool>,
    pub genres: Vec<String>,
    pub seeking_description: Option<String>,
}

/// Fields to overwrite on an existing artist. `None` leaves a field as is,
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct ArtistChanges {
    pub name: Option<String>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub image_link: Option<Option<String>>,
    pub facebook_link: Option<Option<String>>,
    pub seeking_venue: Option<bool>,
    pub genres: Option<Vec<String>>,
    pub seeking_description: Option<Option<String>>,
}

pub struct ArtistService {
    db: Arc<Database>,
    policy: LengthPolicy,
}

impl ArtistService {
    pub fn new(db: Arc<Database>, policy: LengthPolicy) -> Self {
        Self { db, policy }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewArtist) -> Result<artist::Model> {
        let policy = self.policy;
        let mut model = artist::ActiveModel {
            name: Set(input.name),
            city: Set(policy.apply_opt("city", SHORT_TEXT_MAX, input.city)?),
            state: Set(policy.apply_opt("state", SHORT_TEXT_MAX, input.state)?),
            phone: Set(policy.apply_opt("phone", SHORT_TEXT_MAX, input.phone)?),
            image_link: Set(policy.apply_opt("image_link", LONG_TEXT_MAX, input.image_link)?),
            facebook_link: Set(policy.apply_opt(
                "facebook_link",
                SHORT_TEXT_MAX,
                input.facebook_link,
            )?),
            genres: Set(Genres(input.genres)),
            seeking_description: Set(policy.apply_opt(
                "seeking_description",
                LONG_TEXT_MAX,
                input.seeking_description,
            )?),
            ..Default::default()
        };
        if let Some(seeking_venue) = input.seeking_venue {
            model.seeking_venue = Set(seeking_venue);
        }

        let model = model.insert(&self.db.conn).await?;
        log::info!("Artist created: {}", model);
        Ok(model)
    }

    pub async fn get(&self, id: i64) -> Result<artist::Model> {
        artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::not_found("Artist", id))
    }

    /// All artists ordered by name
    pub async fn list(&self) -> Result<Vec<artist::Model>> {
        Ok(artist::Entity::find()
            .order_by_asc(artist::Column::Name)
            .order_by_asc(artist::Column::Id)
            .all(&self.db.conn)
            .await?)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: ArtistChanges) -> Result<artist::Model> {
        let policy = self.policy;
        let mut model: artist::ActiveModel = self.get(id).await?.into();

        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(city) = changes.city {
            model.city = Set(policy.apply_opt("city", SHORT_TEXT_MAX, city)?);
        }
        if let Some(state) = changes.state {
            model.state = Set(policy.apply_opt("state", SHORT_TEXT_MAX, state)?);
        }
        if let Some(phone) = changes.phone {
            model.phone = Set(policy.apply_opt("phone", SHORT_TEXT_MAX, phone)?);
        }
        if let Some(image_link) = changes.image_link {
            model.image_link = Set(policy.apply_opt("image_link", LONG_TEXT_MAX, image_link)?);
        }
        if let Some(facebook_link) = changes.facebook_link {
            model.facebook_link = Set(policy.apply_opt(
                "facebook_link",
                SHORT_TEXT_MAX,
                facebook_link,
            )?);
        }
        if let Some(seeking_venue) = changes.seeking_venue {
            model.seeking_venue = Set(seeking_venue);
        }
        if let Some(genres) = changes.genres {
            model.genres = Set(Genres(genres));
        }
        if let Some(description) = changes.seeking_description {
            model.seeking_description = Set(policy.apply_opt(
                "seeking_description",
                LONG_TEXT_MAX,
                description,
            )?);
        }

        Ok(model.update(&self.db.conn).await?)
    }

    /// Deletes the artist. Their shows go with it (`ON DELETE CASCADE`).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = artist::Entity::delete_by_id(id).exec(&self.db.conn).await?;
        if result.rows_affected == 0 {
            return Err(DirectoryError::not_found("Artist", id));
        }
        log::info!("Artist deleted (ID: {})", id);
        Ok(())
    }

    /// Distinct venues where the artist has at least one show
    pub async fn venues(&self, id: i64) -> Result<Vec<venue::Model>> {
        let artist = self.get(id).await?;
        Ok(artist
            .find_related(venue::Entity)
            .distinct()
            .order_by_asc(venue::Column::Name)
            .all(&self.db.conn)
            .await?)
    }

    /// Every show by the artist, earliest first
    pub async fn shows(&self, id: i64) -> Result<Vec<ShowVenue>> {
        self.shows_where(id, None).await
    }

    /// Shows starting after `now`
    pub async fn upcoming_shows(&self, id: i64, now: DateTime<Utc>) -> Result<Vec<ShowVenue>> {
        self.shows_where(id, Some(Condition::all().add(show::Column::StartTime.gt(now))))
            .await
    }

    /// Shows that started at or before `now`
    pub async fn past_shows(&self, id: i64, now: DateTime<Utc>) -> Result<Vec<ShowVenue>> {
        self.shows_where(id, Some(Condition::all().add(show::Column::StartTime.lte(now))))
            .await
    }

    async fn shows_where(&self, id: i64, filter: Option<Condition>) -> Result<Vec<ShowVenue>> {
        self.get(id).await?;

        let mut query = show::Entity::find().filter(show::Column::ArtistId.eq(id));
        if let Some(filter) = filter {
            query = query.filter(filter);
        }

        let rows = query
            .find_also_related(venue::Entity)
            .order_by_asc(show::Column::StartTime)
            .all(&self.db.conn)
            .await?;

        project_venues(rows)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::show::ShowService;
    use crate::services::venue::{NewVenue, VenueService};
    use crate::test_utils::{test_db, utc};

    fn petals() -> NewArtist {
        NewArtist {
            name: "Guns N Petals".to_string(),
            city: Some("San Francisco".to_string()),
            state: Some("CA".to_string()),
            phone: Some("326-123-5000".to_string()),
            genres: vec!["Rock n Roll".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seeking_venue_defaults_to_false() {
        let service = ArtistService::new(test_db().await, LengthPolicy::Reject);
        let artist = service.create(petals()).await.unwrap();
        assert!(!service.get(artist.id).await.unwrap().seeking_venue);

        let seeking = service
            .create(NewArtist {
                seeking_venue: Some(true),
                seeking_description: Some("Looking for shows in the Bay Area".to_string()),
                ..petals()
            })
            .await
            .unwrap();
        assert!(service.get(seeking.id).await.unwrap().seeking_venue);
    }

    #[tokio::test]
    async fn test_genres_round_trip_in_order() {
        let service = ArtistService::new(test_db().await, LengthPolicy::Reject);
        let artist = service
            .create(NewArtist {
                genres: vec!["Jazz".to_string(), "Blues".to_string()],
                ..petals()
            })
            .await
            .unwrap();
        assert_eq!(
            service.get(artist.id).await.unwrap().genres,
            Genres(vec!["Jazz".to_string(), "Blues".to_string()])
        );
    }

    #[tokio::test]
    async fn test_long_image_link_is_rejected_or_truncated() {
        let db = test_db().await;
        let link = format!("https://example.com/{}", "i".repeat(500));

        let rejecting = ArtistService::new(db.clone(), LengthPolicy::Reject);
        let err = rejecting
            .create(NewArtist {
                image_link: Some(link.clone()),
                ..petals()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::FieldTooLong {
                field: "image_link",
                max: 500,
                ..
            }
        ));

        let truncating = ArtistService::new(db, LengthPolicy::Truncate);
        let artist = truncating
            .create(NewArtist {
                image_link: Some(link.clone()),
                ..petals()
            })
            .await
            .unwrap();
        let stored = artist.image_link.unwrap();
        assert_eq!(stored.chars().count(), 500);
        assert!(link.starts_with(&stored));
    }

    #[tokio::test]
    async fn test_update_truncates_and_clears() {
        let service = ArtistService::new(test_db().await, LengthPolicy::Truncate);
        let artist = service.create(petals()).await.unwrap();

        let updated = service
            .update(
                artist.id,
                ArtistChanges {
                    state: Some(Some("s".repeat(150))),
                    seeking_description: Some(Some("d".repeat(501))),
                    phone: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.state.as_deref().map(str::len), Some(120));
        assert_eq!(updated.seeking_description.as_deref().map(str::len), Some(500));
        assert_eq!(updated.phone, None);

        let stored = service.get(artist.id).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_rejects_long_facebook_link() {
        let service = ArtistService::new(test_db().await, LengthPolicy::Reject);
        let artist = service.create(petals()).await.unwrap();

        let err = service
            .update(
                artist.id,
                ArtistChanges {
                    facebook_link: Some(Some("f".repeat(121))),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::FieldTooLong {
                field: "facebook_link",
                max: 120,
                actual: 121
            }
        ));
        assert_eq!(service.get(artist.id).await.unwrap().facebook_link, None);
    }

    #[tokio::test]
    async fn test_display() {
        let service = ArtistService::new(test_db().await, LengthPolicy::Reject);
        let artist = service.create(petals()).await.unwrap();
        assert_eq!(
            artist.to_string(),
            format!("Artist Id:{} | Name: Guns N Petals", artist.id)
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_and_venues_are_distinct() {
        let db = test_db().await;
        let artists = ArtistService::new(db.clone(), LengthPolicy::Reject);
        let venues = VenueService::new(db.clone(), LengthPolicy::Reject);
        let shows = ShowService::new(db.clone());

        let artist = artists.create(petals()).await.unwrap();
        let hop = venues
            .create(NewVenue {
                name: "The Musical Hop".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let park = venues
            .create(NewVenue {
                name: "Park Square Live Music & Coffee".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        for (venue, start) in [
            (&hop, "2019-05-21 21:30:00"),
            (&park, "2019-06-15 23:00:00"),
            (&hop, "2035-04-01 20:00:00"),
        ] {
            shows.schedule(artist.id, venue.id, utc(start)).await.unwrap();
        }

        let names: Vec<_> = artists
            .venues(artist.id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Park Square Live Music & Coffee", "The Musical Hop"]);

        let projected = artists.shows(artist.id).await.unwrap();
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0].venue_name, "The Musical Hop");
        assert_eq!(projected[0].start_time, "2019-05-21 21:30:00");

        let now = utc("2024-01-01 00:00:00");
        assert_eq!(artists.past_shows(artist.id, now).await.unwrap().len(), 2);
        assert_eq!(artists.upcoming_shows(artist.id, now).await.unwrap().len(), 1);

        artists.delete(artist.id).await.unwrap();
        assert!(shows.list().await.unwrap().is_empty());
        assert_eq!(venues.list().await.unwrap().len(), 2);
        assert!(matches!(
            artists.shows(artist.id).await,
            Err(DirectoryError::NotFound { entity: "Artist", .. })
        ));
    }
}
