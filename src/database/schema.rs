//! Canonical table definitions.
//!
//! Every table the service owns is described once here. Schema bootstrap builds
//! its DDL from these definitions and the repositories build their statements
//! from the same column lists, so the two cannot drift apart. Bump `version`
//! when a table's columns change.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Blob,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub default: Option<&'static str>,
    pub unique: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self { name, sql_type, default: None, unique: false }
    }

    pub const fn default_to(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn ddl(&self) -> String {
        let mut ddl = format!("{} {} NOT NULL", self.name, self.sql_type.as_sql());
        if self.unique {
            ddl.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            ddl.push_str(" DEFAULT ");
            ddl.push_str(default);
        }
        ddl
    }
}

/// One table: name, version and the writable columns (the `id` key is implicit).
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub version: i64,
    pub columns: &'static [ColumnDef],
}

impl EntitySchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn create_table_sql(&self) -> String {
        let mut defs = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        defs.extend(self.columns.iter().map(ColumnDef::ddl));
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table, defs.join(", "))
    }

    pub fn select_all_sql(&self) -> String {
        format!("SELECT {} FROM {} ORDER BY id ASC", self.select_list(), self.table)
    }

    pub fn select_by_id_sql(&self) -> String {
        format!("SELECT {} FROM {} WHERE id = ?", self.select_list(), self.table)
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<_> = self.column_names().collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        format!("INSERT INTO {} ({}) VALUES ({})", self.table, names.join(", "), placeholders)
    }

    pub fn update_sql(&self) -> String {
        let assignments: Vec<_> = self.column_names().map(|name| format!("{} = ?", name)).collect();
        format!("UPDATE {} SET {} WHERE id = ?", self.table, assignments.join(", "))
    }

    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = ?", self.table)
    }

    fn select_list(&self) -> String {
        std::iter::once("id")
            .chain(self.column_names())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

use SqlType::{Blob, Integer, Text};

pub const FAQS: EntitySchema = EntitySchema {
    table: "faqs",
    version: 1,
    columns: &[ColumnDef::new("question", Text), ColumnDef::new("answer", Text)],
};

pub const BANNERS: EntitySchema = EntitySchema {
    table: "banners",
    version: 1,
    columns: &[
        ColumnDef::new("title", Text),
        ColumnDef::new("subtitle", Text),
        ColumnDef::new("message", Text),
    ],
};

pub const REVIEWS: EntitySchema = EntitySchema {
    table: "reviews",
    version: 2,
    columns: &[
        ColumnDef::new("name", Text),
        ColumnDef::new("review", Text),
        ColumnDef::new("rating", Integer),
        ColumnDef::new("date", Text),
        ColumnDef::new("role", Text).default_to("''"),
    ],
};

pub const CLASSES: EntitySchema = EntitySchema {
    table: "classes",
    version: 1,
    columns: &[
        ColumnDef::new("name", Text),
        ColumnDef::new("description", Text),
        ColumnDef::new("image", Text),
        ColumnDef::new("url", Text),
        ColumnDef::new("is_active", Integer).default_to("1"),
    ],
};

// v2: image moved from a data-URI TEXT column to image_data BLOB + mime_type
pub const GALLERY_IMAGES: EntitySchema = EntitySchema {
    table: "gallery_images",
    version: 2,
    columns: &[
        ColumnDef::new("filename", Text),
        ColumnDef::new("image_data", Blob),
        ColumnDef::new("mime_type", Text),
        ColumnDef::new("title", Text).default_to("''"),
        ColumnDef::new("alt", Text).default_to("''"),
    ],
};

pub const USERS: EntitySchema = EntitySchema {
    table: "users",
    version: 1,
    columns: &[
        ColumnDef::new("email", Text).unique(),
        ColumnDef::new("name", Text).default_to("''"),
        ColumnDef::new("created_at", Text).default_to("CURRENT_TIMESTAMP"),
    ],
};

pub const ALL: &[&EntitySchema] = &[&FAQS, &BANNERS, &REVIEWS, &CLASSES, &GALLERY_IMAGES, &USERS];
