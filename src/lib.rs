//! Article Query: a worked example of composing optional, user-supplied
//! search filters into SQL.
//!
//! The [`query`] module holds the immutable query value and the conditional
//! filter combinators; [`filter`] the validated form object that drives them;
//! [`db`] the SQLite layer that executes the result.

pub mod config;
pub mod db;
pub mod filter;
pub mod output;
pub mod query;
