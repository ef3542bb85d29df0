pub mod ast;
pub mod binding;
pub mod check;
pub mod config;
pub mod database;
pub mod evaluator;
pub mod graph;
pub mod parser;
pub mod query;
pub mod relation;
pub mod report;
pub mod scc;
pub mod tuple;


pub use ast::{Predicate, Program, Rule};
pub use check::{check_program, ProgramIssue};
pub use config::Config;
pub use database::Database;
pub use evaluator::{evaluate, Evaluation, RuleEvaluator};
pub use graph::DependencyGraph;
pub use parser::{parse_program, parse_query};
pub use relation::Relation;
pub use report::{QueryAnswer, Report};
pub use scc::strongly_connected_components;
pub use tuple::Tuple;
