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
use crate::projection::ShowArtist;
use crate::services::show::project_artists;

#[derive(Debug, Clone, Default)]
pub struct NewVenue {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    /// Defaults to false when unset
    pub seeking_talent: Option<bool>,
    pub genres: Vec<String>,
    pub seeking_description: Option<String>,
}

/// Fields to overwrite on an existing venue. `None` leaves a field as is,
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct VenueChanges {
    pub name: Option<String>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub image_link: Option<Option<String>>,
    pub facebook_link: Option<Option<String>>,
    pub seeking_talent: Option<bool>,
    pub genres: Option<Vec<String>>,
    pub seeking_description: Option<Option<String>>,
}

pub struct VenueService {
    db: Arc<Database>,
    policy: LengthPolicy,
}

impl VenueService {
    pub fn new(db: Arc<Database>, policy: LengthPolicy) -> Self {
        Self { db, policy }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewVenue) -> Result<venue::Model> {
        let policy = self.policy;
        let mut model = venue::ActiveModel {
            name: Set(input.name),
            city: Set(policy.apply_opt("city", SHORT_TEXT_MAX, input.city)?),
            state: Set(policy.apply_opt("state", SHORT_TEXT_MAX, input.state)?),
            address: Set(policy.apply_opt("address", SHORT_TEXT_MAX, input.address)?),
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
        if let Some(seeking_talent) = input.seeking_talent {
            model.seeking_talent = Set(seeking_talent);
        }

        let model = model.insert(&self.db.conn).await?;
        log::info!("Venue created: {}", model);
        Ok(model)
    }

    pub async fn get(&self, id: i64) -> Result<venue::Model> {
        venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::not_found("Venue", id))
    }

    /// All venues ordered by name
    pub async fn list(&self) -> Result<Vec<venue::Model>> {
        Ok(venue::Entity::find()
            .order_by_asc(venue::Column::Name)
            .order_by_asc(venue::Column::Id)
            .all(&self.db.conn)
            .await?)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: VenueChanges) -> Result<venue::Model> {
        let policy = self.policy;
        let mut model: venue::ActiveModel = self.get(id).await?.into();

        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(city) = changes.city {
            model.city = Set(policy.apply_opt("city", SHORT_TEXT_MAX, city)?);
        }
        if let Some(state) = changes.state {
            model.state = Set(policy.apply_opt("state", SHORT_TEXT_MAX, state)?);
        }
        if let Some(address) = changes.address {
            model.address = Set(policy.apply_opt("address", SHORT_TEXT_MAX, address)?);
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
        if let Some(seeking_talent) = changes.seeking_talent {
            model.seeking_talent = Set(seeking_talent);
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

    /// Deletes the venue. Its shows go with it (`ON DELETE CASCADE`).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = venue::Entity::delete_by_id(id).exec(&self.db.conn).await?;
        if result.rows_affected == 0 {
            return Err(DirectoryError::not_found("Venue", id));
        }
        log::info!("Venue deleted (ID: {})", id);
        Ok(())
    }

    /// Distinct artists with at least one show at the venue
    pub async fn artists(&self, id: i64) -> Result<Vec<artist::Model>> {
        let venue = self.get(id).await?;
        Ok(venue
            .find_related(artist::Entity)
            .distinct()
            .order_by_asc(artist::Column::Name)
            .all(&self.db.conn)
            .await?)
    }

    /// Every show at the venue, earliest first
    pub async fn shows(&self, id: i64) -> Result<Vec<ShowArtist>> {
        self.shows_where(id, None).await
    }

    /// Shows starting after `now`
    pub async fn upcoming_shows(&self, id: i64, now: DateTime<Utc>) -> Result<Vec<ShowArtist>> {
        self.shows_where(id, Some(Condition::all().add(show::Column::StartTime.gt(now))))
            .await
    }

    /// Shows that started at or before `now`
    pub async fn past_shows(&self, id: i64, now: DateTime<Utc>) -> Result<Vec<ShowArtist>> {
        self.shows_where(id, Some(Condition::all().add(show::Column::StartTime.lte(now))))
            .await
    }

    async fn shows_where(&self, id: i64, filter: Option<Condition>) -> Result<Vec<ShowArtist>> {
        self.get(id).await?;

        let mut query = show::Entity::find().filter(show::Column::VenueId.eq(id));
        if let Some(filter) = filter {
            query = query.filter(filter);
        }

        let rows = query
            .find_also_related(artist::Entity)
            .order_by_asc(show::Column::StartTime)
            .all(&self.db.conn)
            .await?;

        project_artists(rows)
    }
}
