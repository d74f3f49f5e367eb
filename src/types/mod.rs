//! Value and row types returned by catalog queries.

mod row;
mod value;

pub use row::Row;
pub use value::OracleValue;
