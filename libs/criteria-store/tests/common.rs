#![allow(dead_code)]

use std::sync::Arc;

use criteria_core::{DynRecord, FieldKind, FieldSchema, FieldSpec, Scope, Value};
use criteria_store::{InMemoryStore, Paginator, QueryConfig};
use uuid::Uuid;

/// `2024-01-DD` as a typed date value.
pub fn date(day: u32) -> Value {
    FieldKind::Date
        .parse_value(&format!("2024-01-{day:02}"), &[])
        .expect("date")
}

pub fn subscriber_schema() -> Arc<FieldSchema> {
    Arc::new(
        FieldSchema::builder("subscriber")
            .field("id", FieldSpec::uuid().sortable())
            .field("workspaceId", FieldSpec::string())
            .field("email", FieldSpec::string().sortable().searchable())
            .field("firstname", FieldSpec::string().sortable().searchable())
            .field("status", FieldSpec::enumeration(["ENABLED", "DISABLED"]).sortable())
            .field("createdAt", FieldSpec::date().sortable())
            .tiebreaker("id")
            .build()
            .expect("schema"),
    )
}

pub fn subscriber(n: u32, workspace: &str) -> DynRecord {
    let status = if n % 3 == 0 { "DISABLED" } else { "ENABLED" };
    DynRecord::new()
        .with("id", Uuid::from_u128(u128::from(n)))
        .with("workspaceId", workspace)
        .with("email", format!("user{n:02}@example.com"))
        .with("firstname", if n % 2 == 0 { "John" } else { "Ada" })
        .with("status", Value::Enum(status.into()))
        // several rows share a day so the tie-breaker matters
        .with("createdAt", date(1 + n / 3))
}

/// 23 rows in W1 and 5 in W2.
pub fn store() -> InMemoryStore<DynRecord> {
    let mut rows: Vec<_> = (1..=23).map(|n| subscriber(n, "W1")).collect();
    rows.extend((24..=28).map(|n| subscriber(n, "W2")));
    InMemoryStore::new(rows)
}

pub fn paginator() -> Paginator {
    Paginator::new(
        subscriber_schema(),
        &QueryConfig {
            cursor_secret: Some("test-secret".into()),
            ..QueryConfig::default()
        },
    )
}

pub fn w1() -> Scope {
    Scope::equals("workspaceId", "W1")
}
