use std::marker::PhantomData;
use tracing::debug;

use crate::database::entity::{Entity, Stored};
use crate::database::manager::DatabaseError;
use crate::database::store::Store;

/// List/create/update/delete over the table described by `E::SCHEMA`.
pub struct Repository<E> {
    store: Store,
    _phantom: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// All rows, oldest first
    pub async fn list_all(&self) -> Result<Vec<Stored<E>>, DatabaseError> {
        let rows = self.store.fetch_all(&E::SCHEMA.select_all_sql(), Vec::new()).await?;

        rows.iter()
            .map(|row| -> Result<Stored<E>, DatabaseError> {
                Ok(Stored {
                    id: row.integer("id")?,
                    entity: E::from_row(row)?,
                })
            })
            .collect()
    }

    pub async fn find(&self, id: i64) -> Result<Option<Stored<E>>, DatabaseError> {
        let row = self
            .store
            .fetch_optional(&E::SCHEMA.select_by_id_sql(), vec![id.into()])
            .await?;

        match row {
            Some(row) => Ok(Some(Stored { id, entity: E::from_row(&row)? })),
            None => Ok(None),
        }
    }

    /// Insert a validated entity and return the store-assigned id
    pub async fn create(&self, entity: &E) -> Result<i64, DatabaseError> {
        entity.validate()?;

        let result = self.store.execute(&E::SCHEMA.insert_sql(), entity.values()).await?;
        let id = result.last_insert_id;
        if result.rows_affected == 0 || id <= 0 {
            return Err(DatabaseError::NoInsertId(E::SCHEMA.table));
        }

        debug!("Inserted {} {}", E::SCHEMA.table, id);
        Ok(id)
    }

    /// Overwrite every column of row `id` and return the row as stored
    pub async fn update(&self, id: i64, entity: &E) -> Result<Stored<E>, DatabaseError> {
        entity.validate()?;

        let mut params = entity.values();
        params.push(id.into());
        let result = self.store.execute(&E::SCHEMA.update_sql(), params).await?;
        if result.rows_affected == 0 {
            return Err(not_found::<E>(id));
        }

        self.find(id).await?.ok_or_else(|| not_found::<E>(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = self.store.execute(&E::SCHEMA.delete_sql(), vec![id.into()]).await?;
        if result.rows_affected == 0 {
            return Err(not_found::<E>(id));
        }
        Ok(())
    }
}

fn not_found<E: Entity>(id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", E::LABEL, id))
}
