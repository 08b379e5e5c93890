use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::database::manager::DatabaseError;
use crate::database::schema::EntitySchema;
use crate::database::store::Row;
use crate::validation::{ValidationError, Validator};

pub use crate::database::store::SqlValue;

/// One content type stored in its own table.
///
/// `Input` is what clients send, `View` is what they get back. Conversion from
/// input validates; `check` is re-run by the repository before every write.
pub trait Entity: Sized + Send + Sync + 'static {
    type Input: DeserializeOwned + Send + 'static;
    type View: Serialize + Send + 'static;

    const SCHEMA: &'static EntitySchema;

    /// Human label used in messages, e.g. "FAQ".
    const LABEL: &'static str;

    /// Whether successful writes are published to the webhook.
    const NOTIFIES: bool = false;

    fn from_input(input: Self::Input) -> Result<Self, ValidationError>;

    fn check(&self, validator: &mut Validator);

    /// Column values in `SCHEMA.columns` order.
    fn values(&self) -> Vec<SqlValue>;

    fn from_row(row: &Row) -> Result<Self, DatabaseError>;

    fn into_view(self, id: i64) -> Self::View;

    fn notification_fields(&self) -> Map<String, Value> {
        Map::new()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        self.check(&mut validator);
        validator.finish()
    }
}

/// A row read back from the store.
#[derive(Debug, Clone)]
pub struct Stored<E> {
    pub id: i64,
    pub entity: E,
}

impl<E: Entity> Stored<E> {
    pub fn into_view(self) -> E::View {
        self.entity.into_view(self.id)
    }
}

/// `<` anywhere in the text marks it as markup for the client renderer.
pub fn contains_markup(texts: &[&str]) -> bool {
    texts.iter().any(|t| t.contains('<'))
}
