//! Conditional predicate composition.
//!
//! Each combinator takes the filter operand wrapped in `Option`: `None` means
//! the user supplied nothing, and the query passes through untouched. An
//! absent value never becomes an `IS NULL` or empty-set predicate.

use super::{ArticleField, AuthorField, Predicate, Query, Relation, Value};

/// Filter operator. The operand travels with the operator, so an equality
/// filter cannot be handed a collection and a set filter cannot be handed a
/// scalar; the mismatch the caller could otherwise write is a compile error,
/// not a runtime fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `column = value`
    Eq(Value),
    /// `column IN (values…)`. An empty list matches no rows.
    In(Vec<Value>),
}

/// Append a predicate on a base-article column when `op` is present.
pub fn filter(query: Query, field: ArticleField, op: Option<Op>) -> Query {
    let Some(op) = op else { return query };
    let column = field.column();
    match op {
        Op::Eq(value) => query.and_where(Predicate::Eq(column, value)),
        Op::In(values) => query.and_where(Predicate::In(column, values)),
    }
}

/// Append a predicate on a related entity's column when `op` is present,
/// joining the relation first. The join is added at most once per query, no
/// matter how many predicates reference the relation.
pub fn assoc_filter(query: Query, relation: Relation, field: AuthorField, op: Option<Op>) -> Query {
    let Some(op) = op else { return query };
    let query = query.ensure_joined(relation);
    let column = relation.column(field);
    match op {
        Op::Eq(value) => query.and_where(Predicate::Eq(column, value)),
        Op::In(values) => query.and_where(Predicate::In(column, values)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_value_is_identity() {
        let base = Query::articles();
        let filtered = filter(base.clone(), ArticleField::Title, None);
        assert_eq!(base.to_sql(10).0, filtered.to_sql(10).0);
    }

    #[test]
    fn present_eq_adds_exactly_one_predicate() {
        let query = filter(
            Query::articles(),
            ArticleField::Title,
            Some(Op::Eq("hello".into())),
        );
        let (sql, params) = query.to_sql(10);
        assert!(sql.contains("WHERE a.title = ?1"));
        assert!(!sql.contains("a.summary ="));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn member_of_set_keeps_empty_collections() {
        let query = filter(
            Query::articles(),
            ArticleField::Status,
            Some(Op::In(Vec::new())),
        );
        assert!(query.to_sql(10).0.contains("a.status IN ()"));
    }

    #[test]
    fn absent_assoc_value_adds_no_join() {
        let query = assoc_filter(Query::articles(), Relation::Author, AuthorField::FirstName, None);
        assert!(!query.has_join(Relation::Author));
        assert_eq!(query.to_sql(10).0, Query::articles().to_sql(10).0);
    }

    #[test]
    fn two_assoc_filters_share_one_join() {
        let query = assoc_filter(
            Query::articles(),
            Relation::Author,
            AuthorField::FirstName,
            Some(Op::Eq("Ada".into())),
        );
        let query = assoc_filter(
            query,
            Relation::Author,
            AuthorField::LastName,
            Some(Op::Eq("Lovelace".into())),
        );
        let (sql, params) = query.to_sql(10);
        assert_eq!(sql.matches("LEFT JOIN authors").count(), 1);
        assert!(sql.contains("au.first_name = ?1"));
        assert!(sql.contains("au.last_name = ?2"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn assoc_member_of_set_follows_the_same_pattern() {
        let query = assoc_filter(
            Query::articles(),
            Relation::Author,
            AuthorField::LastName,
            Some(Op::In(vec![Value::from("Hopper"), Value::from("Lovelace")])),
        );
        let (sql, _) = query.to_sql(10);
        assert_eq!(sql.matches("LEFT JOIN authors").count(), 1);
        assert!(sql.contains("au.last_name IN (?1, ?2)"));
    }
}
