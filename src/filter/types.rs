use crate::database::patch::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    ILike,
    /// Array column contains the value (`col @> ARRAY[$n]`)
    Contains,
}

#[derive(Debug, Clone)]
pub enum FilterWhereInfo {
    Compare {
        column: String,
        operator: FilterOp,
        data: SqlValue,
    },
    /// Disjunction of comparisons, e.g. a search over several columns
    AnyOf(Vec<FilterWhereInfo>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
    pub nulls_last: bool,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}
