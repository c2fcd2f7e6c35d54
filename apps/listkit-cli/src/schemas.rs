//! Field schemas for the entities `listkit` can page through.

use clap::ValueEnum;
use criteria_core::{FieldSchema, FieldSpec, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    Subscriber,
    Tag,
    Form,
}

impl Entity {
    pub const ALL: [Entity; 3] = [Entity::Subscriber, Entity::Tag, Entity::Form];

    pub fn schema(self) -> Result<FieldSchema> {
        match self {
            Entity::Subscriber => subscriber(),
            Entity::Tag => tag(),
            Entity::Form => form(),
        }
    }
}

pub const SUBSCRIBER_STATUSES: [&str; 3] = ["ENABLED", "DISABLED", "BLOCKLISTED"];

fn subscriber() -> Result<FieldSchema> {
    FieldSchema::builder("subscriber")
        .field("id", FieldSpec::uuid().sortable())
        .field("workspaceId", FieldSpec::string())
        .field("email", FieldSpec::string().sortable().searchable())
        .field("firstname", FieldSpec::string().sortable().searchable())
        .field("lastname", FieldSpec::string().sortable().searchable())
        .field("status", FieldSpec::enumeration(SUBSCRIBER_STATUSES).sortable())
        .field("createdAt", FieldSpec::date().sortable())
        .field("updatedAt", FieldSpec::date().sortable())
        .tiebreaker("id")
        .build()
}

fn tag() -> Result<FieldSchema> {
    FieldSchema::builder("tag")
        .field("id", FieldSpec::uuid().sortable())
        .field("workspaceId", FieldSpec::string())
        .field("name", FieldSpec::string().sortable().searchable())
        .field("color", FieldSpec::string())
        .field("createdAt", FieldSpec::date().sortable())
        .field("updatedAt", FieldSpec::date().sortable())
        .tiebreaker("id")
        .build()
}

fn form() -> Result<FieldSchema> {
    FieldSchema::builder("form")
        .field("id", FieldSpec::uuid().sortable())
        .field("workspaceId", FieldSpec::string())
        .field("name", FieldSpec::string().sortable().searchable())
        .field("header", FieldSpec::string().searchable())
        .field("description", FieldSpec::string().searchable())
        .field("inputPlaceholder", FieldSpec::string().searchable())
        .field("buttonText", FieldSpec::string().searchable())
        .field("createdAt", FieldSpec::date().sortable())
        .field("updatedAt", FieldSpec::date().sortable())
        .tiebreaker("id")
        .build()
}
