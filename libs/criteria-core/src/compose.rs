//! Merging scope, filter and search criteria into the final tree.

use crate::criteria::Criteria;
use crate::error::{Error, Result};
use crate::schema::FieldSchema;
use crate::value::Value;

/// Mandatory constraint supplied by the authenticated-request collaborator
/// (tenant/workspace equality). Never built from client payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope(Criteria);

impl Scope {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Scope(Criteria::equals(field, value))
    }

    /// Add another mandatory constraint.
    pub fn and(self, other: Criteria) -> Self {
        Scope(Criteria::and([self.0, other]))
    }

    pub fn criteria(&self) -> &Criteria {
        &self.0
    }

    /// Check the scope against an entity schema.
    ///
    /// The scope is server-built, so a mismatch is reported as [`Error::Schema`]
    /// rather than as a client error.
    pub fn validate(&self, schema: &FieldSchema) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::MissingScope);
        }
        schema
            .validate(&self.0)
            .map_err(|e| Error::Schema(format!("{}: invalid scope: {}", schema.entity(), e)))
    }
}

/// `And(scope, filter, search)`, omitting empty operands, in that order.
///
/// Fails with `MissingScope` when no (or an empty) scope is supplied, so an
/// unscoped query can never reach a store.
pub fn compose(scope: Option<&Scope>, filter: Criteria, search: Criteria) -> Result<Criteria> {
    let scope = scope
        .map(Scope::criteria)
        .filter(|c| !c.is_empty())
        .ok_or(Error::MissingScope)?;
    Ok(Criteria::and([scope.clone(), filter, search]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::LikePattern;

    #[test]
    fn scope_only() {
        let scope = Scope::equals("workspaceId", "W1");
        let c = compose(Some(&scope), Criteria::Empty, Criteria::Empty).unwrap();
        assert_eq!(c, Criteria::equals("workspaceId", "W1"));
    }

    #[test]
    fn missing_scope_is_rejected() {
        assert_eq!(
            compose(None, Criteria::equals("a", 1), Criteria::Empty),
            Err(Error::MissingScope)
        );
        let empty = Scope(Criteria::Empty);
        assert_eq!(
            compose(Some(&empty), Criteria::Empty, Criteria::Empty),
            Err(Error::MissingScope)
        );
    }

    #[test]
    fn operands_keep_stable_order() {
        let scope = Scope::equals("workspaceId", "W1");
        let filter = Criteria::and([
            Criteria::equals("status", "ENABLED"),
            Criteria::equals("role", "ADMIN"),
        ]);
        let search = Criteria::or([
            Criteria::like("email", LikePattern::contains_ignore_case("jo")),
            Criteria::like("name", LikePattern::contains_ignore_case("jo")),
        ]);
        let c = compose(Some(&scope), filter, search.clone()).unwrap();
        assert_eq!(
            c,
            Criteria::And(vec![
                Criteria::equals("workspaceId", "W1"),
                Criteria::equals("status", "ENABLED"),
                Criteria::equals("role", "ADMIN"),
                search,
            ])
        );
    }

    #[test]
    fn bad_scope_is_not_a_client_error() {
        let schema = FieldSchema::builder("tag")
            .field("id", crate::schema::FieldSpec::number().sortable())
            .field("workspaceId", crate::schema::FieldSpec::string())
            .tiebreaker("id")
            .build()
            .unwrap();

        let err = Scope::equals("tenant", "W1").validate(&schema).unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("tenant")));
        assert!(!err.is_client_error());

        let err = Scope::equals("workspaceId", 7).validate(&schema).unwrap_err();
        assert_eq!(err.code(), "INVALID_SCHEMA");
        assert!(Scope::equals("workspaceId", "W1").validate(&schema).is_ok());
    }

    #[test]
    fn scope_can_carry_several_constraints() {
        let scope = Scope::equals("workspaceId", "W1").and(Criteria::IsNull("deletedAt".into()));
        assert_eq!(
            scope.criteria().to_string(),
            "(workspaceId = W1 AND deletedAt IS NULL)"
        );
    }
}
