use crate::store::schema::{JOB_STATUS_TYPE, JOB_TABLE};

use super::filter::FilterSpec;

/// Columns returned by a job listing. Fixed; never derived from a request.
const LIST_COLUMNS: &str = "id, \
     status::text AS status, \
     created_at, \
     finished_at, \
     priority, \
     data->>'url' AS url, \
     data->>'mode' AS mode, \
     data->>'team_id' AS team_id, \
     data->>'crawl_id' AS crawl_id, \
     data->>'origin' AS origin, \
     failedreason AS failed_reason, \
     owner_id::text AS owner_id, \
     group_id::text AS group_id";

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
}

/// SQL text plus the values for its `$n` placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl JobQuery {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder.
    fn bind(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }
}

/// Builds the count and page queries for a job listing.
#[derive(Debug, Clone)]
pub struct JobQueryBuilder<'a> {
    spec: &'a FilterSpec,
}

impl<'a> JobQueryBuilder<'a> {
    pub fn new(spec: &'a FilterSpec) -> Self {
        Self { spec }
    }

    /// `SELECT COUNT(*)` with the status predicate only.
    pub fn count_query(&self) -> JobQuery {
        let mut query = JobQuery::new(format!("SELECT COUNT(*) AS total FROM {JOB_TABLE}"));
        self.push_status_filter(&mut query);
        query
    }

    /// Ordered, paginated row fetch.
    pub fn list_query(&self) -> JobQuery {
        let mut query = JobQuery::new(format!("SELECT {LIST_COLUMNS} FROM {JOB_TABLE}"));
        self.push_status_filter(&mut query);

        // Both tokens come from closed enums.
        query.sql.push_str(&format!(
            " ORDER BY {} {}",
            self.spec.order_field.as_sql(),
            self.spec.direction.as_sql()
        ));

        let limit = query.bind(QueryParam::Int(self.spec.limit));
        let offset = query.bind(QueryParam::Int(self.spec.offset));
        query.sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        query
    }

    pub fn build(&self) -> (JobQuery, JobQuery) {
        (self.count_query(), self.list_query())
    }

    fn push_status_filter(&self, query: &mut JobQuery) {
        if let Some(status) = &self.spec.status {
            let placeholder = query.bind(QueryParam::Text(status.clone()));
            query
                .sql
                .push_str(&format!(" WHERE status = {placeholder}::{JOB_STATUS_TYPE}"));
        }
    }
}
