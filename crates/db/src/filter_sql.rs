//! Rendering of filter predicates into parameterized SQL.
//!
//! Column names come from the whitelisted [`FilterSchema`] fields in
//! `crm_core::filter`, so they are interpolated directly; every value is a
//! bind parameter.
//!
//! [`FilterSchema`]: crm_core::filter::FilterSchema

use crm_core::filter::{CompareOp, FilterValue, Ordering, Predicate};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

/// A rendered `WHERE` condition and the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub condition: String,
    pub binds: Vec<FilterValue>,
}

/// Render `predicate`, numbering placeholders from `$first_bind`.
pub fn render(predicate: &Predicate, first_bind: usize) -> SqlFilter {
    let mut condition = String::new();
    let mut binds = Vec::new();
    write_predicate(predicate, first_bind, &mut condition, &mut binds);
    SqlFilter { condition, binds }
}

fn write_predicate(
    predicate: &Predicate,
    first_bind: usize,
    out: &mut String,
    binds: &mut Vec<FilterValue>,
) {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let placeholder = first_bind + binds.len();
            let (operator, value) = match op {
                CompareOp::Eq => ("=", value.clone()),
                CompareOp::Gt => (">", value.clone()),
                CompareOp::Gte => (">=", value.clone()),
                CompareOp::Lt => ("<", value.clone()),
                CompareOp::Lte => ("<=", value.clone()),
                CompareOp::IContains => ("ILIKE", like_pattern(value, true)),
                CompareOp::StartsWith => ("LIKE", like_pattern(value, false)),
            };
            out.push_str(&format!("{column} {operator} ${placeholder}"));
            binds.push(value);
        }
        Predicate::And(items) => write_group(items, " AND ", "TRUE", first_bind, out, binds),
        Predicate::Or(items) => write_group(items, " OR ", "FALSE", first_bind, out, binds),
        Predicate::Not(inner) => {
            out.push_str("NOT (");
            write_predicate(inner, first_bind, out, binds);
            out.push(')');
        }
    }
}

fn write_group(
    items: &[Predicate],
    joiner: &str,
    empty: &str,
    first_bind: usize,
    out: &mut String,
    binds: &mut Vec<FilterValue>,
) {
    if items.is_empty() {
        out.push_str(empty);
        return;
    }
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(joiner);
        }
        write_predicate(item, first_bind, out, binds);
    }
    out.push(')');
}

/// Escape LIKE metacharacters and wrap the text for the given match kind.
fn like_pattern(value: &FilterValue, contains: bool) -> FilterValue {
    let text = match value {
        FilterValue::Text(s) => s.as_str(),
        other => return other.clone(),
    };
    let mut escaped = String::with_capacity(text.len() + 2);
    if contains {
        escaped.push('%');
    }
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    FilterValue::Text(escaped)
}

/// A full listing statement: `base`, optional filter, ordering and paging.
///
/// The last two placeholders are `LIMIT` and `OFFSET`; bind them after the
/// returned filter values.
pub fn list_statement(
    base: &str,
    filter: Option<&Predicate>,
    ordering: Ordering,
) -> (String, Vec<FilterValue>) {
    let (where_clause, binds) = match filter.map(|p| render(p, 1)) {
        Some(rendered) => (format!(" WHERE {}", rendered.condition), rendered.binds),
        None => (String::new(), Vec::new()),
    };
    let direction = if ordering.descending { "DESC" } else { "ASC" };
    let limit_idx = binds.len() + 1;
    let sql = format!(
        "{base}{where_clause} ORDER BY {column} {direction}, id {direction} LIMIT ${limit_idx} OFFSET ${}",
        limit_idx + 1,
        column = ordering.column,
    );
    (sql, binds)
}

/// Bind rendered filter values onto a query, in placeholder order.
pub fn bind_filters<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: &[FilterValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in values {
        query = match value {
            FilterValue::Text(s) => query.bind(s.clone()),
            FilterValue::Integer(n) => query.bind(*n),
            FilterValue::Money(m) => query.bind(m.cents()),
            FilterValue::Timestamp(t) => query.bind(*t),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::money::Money;

    #[test]
    fn renders_single_comparison() {
        let rendered = render(&Predicate::gte("price_cents", Money::from_cents(100)), 1);
        assert_eq!(rendered.condition, "price_cents >= $1");
        assert_eq!(rendered.binds, vec![FilterValue::Money(Money::from_cents(100))]);
    }

    #[test]
    fn numbers_placeholders_across_nested_groups() {
        let predicate = Predicate::icontains("name", "ali")
            .and(Predicate::eq("stock", 3_i64).or(!Predicate::starts_with("phone", "+1")));
        let rendered = render(&predicate, 2);
        assert_eq!(
            rendered.condition,
            "(name ILIKE $2 AND (stock = $3 OR NOT (phone LIKE $4)))"
        );
        assert_eq!(
            rendered.binds,
            vec![
                FilterValue::Text("%ali%".into()),
                FilterValue::Integer(3),
                FilterValue::Text("+1%".into()),
            ]
        );
    }

    #[test]
    fn escapes_like_metacharacters() {
        let rendered = render(&Predicate::icontains("name", "50%_off\\"), 1);
        assert_eq!(
            rendered.binds,
            vec![FilterValue::Text("%50\\%\\_off\\\\%".into())]
        );
    }

    #[test]
    fn empty_groups_render_constants() {
        assert_eq!(render(&Predicate::And(vec![]), 1).condition, "TRUE");
        assert_eq!(render(&Predicate::Or(vec![]), 1).condition, "FALSE");
    }

    #[test]
    fn list_statement_appends_paging_placeholders() {
        let ordering = Ordering {
            column: "created_at",
            descending: true,
        };
        let (sql, binds) = list_statement(
            "SELECT id FROM customers",
            Some(&Predicate::eq("email", "a@x.com")),
            ordering,
        );
        assert_eq!(
            sql,
            "SELECT id FROM customers WHERE email = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        assert_eq!(binds.len(), 1);

        let (sql, binds) = list_statement("SELECT id FROM products", None, ordering);
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
        assert!(binds.is_empty());
    }
}
