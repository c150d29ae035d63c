//! The immutable query value and its filter combinators.
//!
//! A [`Query`] is a pending retrieval of articles: conjunctive predicates, at
//! most one left join per relation, and a deterministic sort order. Every
//! operation consumes the query and returns a new one, so callers holding an
//! earlier value never observe later additions. Nothing here touches the
//! database; [`crate::db::Database`] executes the rendered SQL.

pub mod combinators;

use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use std::fmt;

use crate::db::models::{format_timestamp, ArticleStatus};

/// Filterable columns on the base `articles` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Title,
    Summary,
    Status,
    InsertedAt,
}

impl ArticleField {
    pub(crate) fn column(self) -> Column {
        let name = match self {
            Self::Title => "title",
            Self::Summary => "summary",
            Self::Status => "status",
            Self::InsertedAt => "inserted_at",
        };
        Column {
            binding: Query::BASE_BINDING,
            name,
        }
    }
}

/// Filterable columns on a joined `authors` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorField {
    FirstName,
    LastName,
}

impl AuthorField {
    fn name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }
}

/// Relations reachable from `articles`, one variant per joinable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Author,
}

impl Relation {
    pub(crate) fn column(self, field: AuthorField) -> Column {
        Column {
            binding: self.binding(),
            name: field.name(),
        }
    }

    fn binding(self) -> &'static str {
        match self {
            Self::Author => "au",
        }
    }

    // Left join so an articles row survives until a predicate on the
    // relation actively excludes it.
    fn join_sql(self) -> &'static str {
        match self {
            Self::Author => "LEFT JOIN authors au ON au.id = a.author_id",
        }
    }
}

/// A concrete value bound into a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    fn to_param(&self) -> Box<dyn ToSql> {
        match self {
            Self::Text(s) => Box::new(s.clone()),
            Self::Timestamp(ts) => Box::new(format_timestamp(*ts)),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<ArticleStatus> for Value {
    fn from(status: ArticleStatus) -> Self {
        Self::Text(status.as_str().to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// A column scoped to a named binding, e.g. `a.title` or `au.first_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Column {
    binding: &'static str,
    name: &'static str,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.binding, self.name)
    }
}

/// A single condition attached to a query. All conditions are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Eq(Column, Value),
    In(Column, Vec<Value>),
    Gt(Column, Value),
}

/// Sort order for results. Fixed tie-break on id so plans are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    NewestFirst,
    TitleAsc,
}

impl Order {
    /// Map the CLI sort flag: "title" sorts by title, anything else by date.
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "title" => Self::TitleAsc,
            _ => Self::NewestFirst,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::NewestFirst => "a.inserted_at DESC, a.id ASC",
            Self::TitleAsc => "a.title ASC, a.id ASC",
        }
    }
}

/// An immutable, composable retrieval of articles.
#[derive(Debug, Clone)]
pub struct Query {
    predicates: Vec<Predicate>,
    joins: Vec<Relation>,
    order: Order,
}

impl Query {
    const BASE_BINDING: &'static str = "a";
    const SELECT: &'static str = "a.id, a.title, a.summary, a.status, a.inserted_at, a.author_id";

    /// Start a query over the article archive with no predicates or joins.
    pub fn articles() -> Self {
        Self {
            predicates: Vec::new(),
            joins: Vec::new(),
            order: Order::default(),
        }
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a left join to `relation` unless one is already present.
    /// Invariant: at most one join per relation, however many predicates
    /// reference it.
    pub(crate) fn ensure_joined(mut self, relation: Relation) -> Self {
        if !self.joins.contains(&relation) {
            self.joins.push(relation);
        }
        self
    }

    pub fn has_join(&self, relation: Relation) -> bool {
        self.joins.contains(&relation)
    }

    /// Render SELECT SQL with `?N` placeholders plus the bound parameters.
    /// The limit is always the final parameter.
    pub fn to_sql(&self, limit: usize) -> (String, Vec<Box<dyn ToSql>>) {
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        let mut conditions: Vec<String> = Vec::new();

        for predicate in &self.predicates {
            match predicate {
                Predicate::Eq(column, value) => {
                    params.push(value.to_param());
                    conditions.push(format!("{column} = ?{}", params.len()));
                }
                Predicate::Gt(column, value) => {
                    params.push(value.to_param());
                    conditions.push(format!("{column} > ?{}", params.len()));
                }
                Predicate::In(column, values) => {
                    let mut placeholders = Vec::with_capacity(values.len());
                    for value in values {
                        params.push(value.to_param());
                        placeholders.push(format!("?{}", params.len()));
                    }
                    // SQLite accepts an empty IN list; it matches no rows.
                    conditions.push(format!("{column} IN ({})", placeholders.join(", ")));
                }
            }
        }

        let mut sql = format!("SELECT {} FROM articles a", Self::SELECT);
        for relation in &self.joins {
            sql.push(' ');
            sql.push_str(relation.join_sql());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(self.order.sql());

        params.push(Box::new(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", params.len()));

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sql(query: &Query) -> String {
        query.to_sql(10).0
    }

    #[test]
    fn base_query_has_no_predicates_or_joins() {
        let query = Query::articles();
        assert!(query.predicates.is_empty());
        assert!(query.joins.is_empty());
        assert_eq!(
            sql(&query),
            "SELECT a.id, a.title, a.summary, a.status, a.inserted_at, a.author_id \
             FROM articles a ORDER BY a.inserted_at DESC, a.id ASC LIMIT ?1"
        );
    }

    #[test]
    fn eq_predicate_renders_positional_placeholder() {
        let query = Query::articles()
            .and_where(Predicate::Eq(ArticleField::Title.column(), "hello".into()));
        let (sql, params) = query.to_sql(10);
        assert!(sql.contains("WHERE a.title = ?1"));
        assert_eq!(params.len(), 2); // value + limit
    }

    #[test]
    fn in_predicate_binds_each_element() {
        let query = Query::articles().and_where(Predicate::In(
            ArticleField::Status.column(),
            vec!["draft".into(), "published".into()],
        ));
        let (sql, params) = query.to_sql(10);
        assert!(sql.contains("WHERE a.status IN (?1, ?2)"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_list_renders_empty_parens() {
        let query =
            Query::articles().and_where(Predicate::In(ArticleField::Status.column(), Vec::new()));
        let (sql, params) = query.to_sql(10);
        assert!(sql.contains("WHERE a.status IN ()"));
        assert_eq!(params.len(), 1); // limit only
    }

    #[test]
    fn gt_predicate_renders_for_timestamps() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let query = Query::articles()
            .and_where(Predicate::Gt(ArticleField::InsertedAt.column(), cutoff.into()));
        let (sql, _) = query.to_sql(10);
        assert!(sql.contains("WHERE a.inserted_at > ?1"));
    }

    #[test]
    fn ensure_joined_is_idempotent() {
        let query = Query::articles()
            .ensure_joined(Relation::Author)
            .ensure_joined(Relation::Author);
        assert_eq!(query.joins.len(), 1);
        assert_eq!(sql(&query).matches("LEFT JOIN authors").count(), 1);
    }

    #[test]
    fn predicates_on_earlier_value_are_not_shared() {
        let base = Query::articles();
        let _extended = base
            .clone()
            .and_where(Predicate::Eq(ArticleField::Title.column(), "hello".into()));
        assert!(base.predicates.is_empty());
    }

    #[test]
    fn title_sort_orders_by_title() {
        let query = Query::articles().order_by(Order::TitleAsc);
        assert!(sql(&query).contains("ORDER BY a.title ASC, a.id ASC"));
    }
}
