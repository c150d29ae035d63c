//! The validated filter form and its application pipeline.

pub mod form;

use chrono::{DateTime, Months, Utc};

use crate::db::models::ArticleStatus;
use crate::query::combinators::{assoc_filter, filter, Op};
use crate::query::{ArticleField, AuthorField, Predicate, Query, Relation, Value};

/// Typed record of optional search criteria. Built once from validated input
/// (see [`form::build_filter`]) or directly from CLI flags, then consumed by
/// [`apply`](Self::apply) to produce a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub title_eq: Option<String>,
    pub summary_eq: Option<String>,
    pub status_in: Option<Vec<ArticleStatus>>,
    pub author_first_name_eq: Option<String>,
    pub author_last_name_eq: Option<String>,
    pub most_relevant: Option<bool>,
}

impl ArticleFilter {
    /// Thread the filter through the combinator pipeline. The order is fixed
    /// so generated SQL is reproducible; absent fields contribute nothing.
    pub fn apply(&self, query: Query) -> Query {
        self.apply_at(query, Utc::now())
    }

    /// Same as [`apply`](Self::apply) with an explicit clock, so the
    /// most-relevant cutoff is deterministic under test.
    pub fn apply_at(&self, query: Query, now: DateTime<Utc>) -> Query {
        let query = filter(
            query,
            ArticleField::Title,
            self.title_eq.clone().map(|v| Op::Eq(v.into())),
        );
        let query = filter(
            query,
            ArticleField::Summary,
            self.summary_eq.clone().map(|v| Op::Eq(v.into())),
        );
        let query = filter(
            query,
            ArticleField::Status,
            self.status_in
                .clone()
                .map(|vs| Op::In(vs.into_iter().map(Value::from).collect())),
        );
        let query = assoc_filter(
            query,
            Relation::Author,
            AuthorField::FirstName,
            self.author_first_name_eq.clone().map(|v| Op::Eq(v.into())),
        );
        let query = assoc_filter(
            query,
            Relation::Author,
            AuthorField::LastName,
            self.author_last_name_eq.clone().map(|v| Op::Eq(v.into())),
        );
        self.apply_most_relevant(query, now)
    }

    /// `most_relevant` bundles two fixed predicates: published status and a
    /// creation date within the last calendar month.
    fn apply_most_relevant(&self, query: Query, now: DateTime<Utc>) -> Query {
        if self.most_relevant != Some(true) {
            return query;
        }
        let cutoff = now - Months::new(1);
        let query = filter(
            query,
            ArticleField::Status,
            Some(Op::Eq(ArticleStatus::Published.into())),
        );
        query.and_where(Predicate::Gt(
            ArticleField::InsertedAt.column(),
            Value::Timestamp(cutoff),
        ))
    }
}
