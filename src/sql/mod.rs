//! SQL generation module.
//!
//! A small type-safe builder that renders ANSI SQL:
//!
//! - [`query`] - SELECT query builder with CTEs and joins
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types and layouts for SQL generation

pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use expr::{
    avg, coalesce, count, count_distinct, first_value, last_value, lit_float, lit_int, lit_str,
    max, min, row_number, sum, table_col, table_star, BinaryOperator, Expr, ExprExt, Literal,
    SortDir, WindowExt, WindowFrame, WindowOrderBy,
};
pub use query::{Cte, Join, JoinType, Query, SelectExpr, TableRef};
pub use token::{Layout, Token, TokenStream};
