use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use tracing::instrument;

use crate::database::Database;
use crate::entities::{artist, show, venue};
use crate::error::{DirectoryError, Result};
use crate::projection::{ShowArtist, ShowVenue};

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Books `artist_id` at `venue_id`. Both must exist; the store rejects
    /// dangling references.
    #[instrument(skip(self))]
    pub async fn schedule(
        &self,
        artist_id: i64,
        venue_id: i64,
        start_time: DateTime<Utc>,
    ) -> Result<show::Model> {
        let show = show::ActiveModel {
            artist_id: Set(artist_id),
            venue_id: Set(venue_id),
            start_time: Set(start_time),
            ..Default::default()
        };

        let model = show.insert(&self.db.conn).await?;
        log::info!(
            "Show scheduled (ID: {}): artist {} at venue {}",
            model.id,
            artist_id,
            venue_id
        );
        Ok(model)
    }

    pub async fn get(&self, id: i64) -> Result<show::Model> {
        show::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::not_found("Show", id))
    }

    /// All shows, earliest first
    pub async fn list(&self) -> Result<Vec<show::Model>> {
        Ok(show::Entity::find()
            .order_by_asc(show::Column::StartTime)
            .order_by_asc(show::Column::Id)
            .all(&self.db.conn)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn reschedule(&self, id: i64, start_time: DateTime<Utc>) -> Result<show::Model> {
        let mut show: show::ActiveModel = self.get(id).await?.into();
        show.start_time = Set(start_time);
        Ok(show.update(&self.db.conn).await?)
    }

    #[instrument(skip(self))]
    pub async fn reassign(&self, id: i64, artist_id: i64, venue_id: i64) -> Result<show::Model> {
        let mut show: show::ActiveModel = self.get(id).await?.into();
        show.artist_id = Set(artist_id);
        show.venue_id = Set(venue_id);
        Ok(show.update(&self.db.conn).await?)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> Result<()> {
        let result = show::Entity::delete_by_id(id).exec(&self.db.conn).await?;
        if result.rows_affected == 0 {
            return Err(DirectoryError::not_found("Show", id));
        }
        log::info!("Show cancelled (ID: {})", id);
        Ok(())
    }

    /// Resolves `show.artist_id` and projects it for display. The lookup goes
    /// by the reference the model carries, not by the stored show row.
    pub async fn show_artist(&self, show: &show::Model) -> Result<ShowArtist> {
        let artist = artist::Entity::find_by_id(show.artist_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| missing_reference(show, "Artist", show.artist_id))?;
        Ok(ShowArtist::new(show, &artist))
    }

    /// Resolves `show.venue_id` and projects it for display.
    pub async fn show_venue(&self, show: &show::Model) -> Result<ShowVenue> {
        let venue = venue::Entity::find_by_id(show.venue_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| missing_reference(show, "Venue", show.venue_id))?;
        Ok(ShowVenue::new(show, &venue))
    }
}

fn missing_reference(show: &show::Model, entity: &str, id: i64) -> DirectoryError {
    DirectoryError::ReferentialIntegrity(format!(
        "show {} references missing {} {}",
        show.id, entity, id
    ))
}

pub(crate) fn project_artists(
    rows: Vec<(show::Model, Option<artist::Model>)>,
) -> Result<Vec<ShowArtist>> {
    rows.into_iter()
        .map(|(show, artist)| {
            let artist = artist.ok_or_else(|| missing_reference(&show, "Artist", show.artist_id))?;
            Ok(ShowArtist::new(&show, &artist))
        })
        .collect()
}

pub(crate) fn project_venues(
    rows: Vec<(show::Model, Option<venue::Model>)>,
) -> Result<Vec<ShowVenue>> {
    rows.into_iter()
        .map(|(show, venue)| {
            let venue = venue.ok_or_else(|| missing_reference(&show, "Venue", show.venue_id))?;
            Ok(ShowVenue::new(&show, &venue))
        })
        .collect()
}
