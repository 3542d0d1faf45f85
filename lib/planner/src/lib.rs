//! Planning of conjunctive queries over federated RDF sources.
//!
//! A federation layer matches the triple patterns of a query against its sources and produces
//! [Fragment]s. This crate finds the ways in which these fragments can be combined into a plan
//! for the whole query (see [components]) and turns each of them into a join tree (see
//! [join_order]).

pub mod components;
mod config;
mod conjunctive;
mod dispatch;
mod error;
mod fragment;
mod grouping;
pub mod join_order;
mod naive;
mod query;

pub use config::PlannerConfig;
pub use conjunctive::{BitsetConjunctivePlanner, ConjunctivePlanner};
pub use dispatch::{ConjunctivePlannerDispatcher, PlannerRoute};
pub use error::{PlanResult, PlanningError};
pub use fragment::{Fragment, FragmentId, FragmentKind};
pub use grouping::group_fragments;
pub use naive::NaiveConjunctivePlanner;
pub use query::{ConjunctiveQuery, QueryUniverses};
