//! Resolution of untrusted list parameters into a [`FilterSpec`].
//!
//! List endpoints favour availability over strict validation: anything out of
//! range or unparseable is coerced to a default instead of rejected.

use std::collections::HashMap;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;
pub const DEFAULT_DOMAIN_LIMIT: i64 = 25;
pub const MAX_DOMAIN_LIMIT: i64 = 200;

/// Raw `/status` query string, every field kept as text.
#[derive(Debug, Default, Clone)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub status: Option<String>,
    pub order: Option<String>,
    pub direction: Option<String>,
}

impl ListParams {
    /// Parse a raw query string. Unknown keys are ignored and a repeated key
    /// keeps its first value.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut pairs = first_values(raw);
        Self {
            limit: pairs.remove("limit"),
            offset: pairs.remove("offset"),
            status: pairs.remove("status"),
            order: pairs.remove("order"),
            direction: pairs.remove("direction"),
        }
    }
}

/// Raw `/status/domains` query string.
#[derive(Debug, Default, Clone)]
pub struct DomainParams {
    pub limit: Option<String>,
}

impl DomainParams {
    pub fn from_query(raw: Option<&str>) -> Self {
        Self {
            limit: first_values(raw).remove("limit"),
        }
    }
}

/// Decode `key=value` pairs, keeping the first occurrence of each key.
fn first_values(raw: Option<&str>) -> HashMap<String, String> {
    let pairs: Vec<(String, String)> = raw
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();

    let mut values = HashMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values
}

/// Columns a job listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderField {
    #[default]
    CreatedAt,
    FinishedAt,
    Priority,
    Status,
}

impl OrderField {
    pub const ALL: [OrderField; 4] = [
        OrderField::CreatedAt,
        OrderField::FinishedAt,
        OrderField::Priority,
        OrderField::Status,
    ];

    /// Column name as it appears in SQL. Only ever one of four literals.
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderField::CreatedAt => "created_at",
            OrderField::FinishedAt => "finished_at",
            OrderField::Priority => "priority",
            OrderField::Status => "status",
        }
    }

    /// Exact, case-sensitive match against the whitelist.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| {
            Self::ALL
                .into_iter()
                .find(|field| field.as_sql() == value)
        })
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::default(),
        }
    }
}

/// Validated view of a job listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Always within `0..=MAX_LIMIT`.
    pub limit: i64,
    /// Never negative.
    pub offset: i64,
    /// Passed through untouched; the database enum type is the validator.
    pub status: Option<String>,
    pub order_field: OrderField,
    pub direction: SortDirection,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            status: None,
            order_field: OrderField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl FilterSpec {
    /// Resolve raw parameters. Never fails.
    pub fn resolve(params: &ListParams) -> Self {
        let limit = parse_int(params.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(0, MAX_LIMIT);
        let offset = parse_int(params.offset.as_deref()).unwrap_or(0).max(0);
        let status = params
            .status
            .as_ref()
            .filter(|value| !value.is_empty())
            .cloned();

        Self {
            limit,
            offset,
            status,
            order_field: OrderField::parse(params.order.as_deref()),
            direction: SortDirection::parse(params.direction.as_deref()),
        }
    }
}

/// Number of domain groups to return, clamped to `1..=MAX_DOMAIN_LIMIT`.
pub fn resolve_domain_limit(params: &DomainParams) -> i64 {
    parse_int(params.limit.as_deref())
        .unwrap_or(DEFAULT_DOMAIN_LIMIT)
        .clamp(1, MAX_DOMAIN_LIMIT)
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}
