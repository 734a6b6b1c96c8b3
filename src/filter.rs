//! # Dynamic filter compilation
//!
//! Compiles a sparse set of optional search filters plus pagination into a
//! parameterized query: an ordered list of match clauses, an ordered list
//! of where clauses, and a parameter map. Absent filters contribute
//! neither clause nor parameter, so the empty spec compiles to exactly the
//! unfiltered base pattern.
//!
//! Property names, labels and relationship types cannot be bound as
//! parameters, so anything interpolated into query text is validated as a
//! plain identifier first. Values are always bound.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{GraphValue, PropertyMap};
use crate::{Error, Result};

// ============================================================================
// Filter specification
// ============================================================================

/// Sparse filter set for a listing query. Every field is optional;
/// `FilterSpec::default()` is the unfiltered query.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Case-insensitive substring match against the compiler's text field.
    pub text_match: Option<String>,
    /// Exact equality predicates, property name → bound value.
    pub exact_matches: BTreeMap<String, GraphValue>,
    /// Constrain to entities related to a tag with this name.
    pub tag_name: Option<String>,
    /// Constrain to entities related to a pain with this name.
    pub pain_name: Option<String>,
    /// Inclusive bounds on millisecond-epoch properties.
    pub date_ranges: Vec<DateRange>,
    /// Pagination. `None` compiles without SKIP/LIMIT.
    pub page: Option<PageSpec>,
}

/// Inclusive date-range bounds, already resolved to millisecond epochs.
/// Start-of-day / end-of-day normalization is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub field: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// 1-based page plus page size. Callers validate both ≥ 1; the compiler
/// rejects zero rather than clamping.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub page: u64,
    pub limit: u64,
}

// ============================================================================
// Compiler configuration
// ============================================================================

/// Relationship-filter pattern: traverse `-[:rel_type]->(x:label)` and
/// constrain `x.name_prop`.
#[derive(Debug, Clone)]
pub struct RelFilterPattern {
    pub rel_type: String,
    pub label: String,
    pub name_prop: String,
}

impl RelFilterPattern {
    pub fn new(
        rel_type: impl Into<String>,
        label: impl Into<String>,
        name_prop: impl Into<String>,
    ) -> Self {
        Self {
            rel_type: rel_type.into(),
            label: label.into(),
            name_prop: name_prop.into(),
        }
    }
}

/// Schema-aware filter compiler. Holds the entity label and the
/// relationship patterns the tag/pain filters traverse; the default
/// matches the lead schema the dashboard queries.
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    pub entity_label: String,
    /// Property the text filter matches against.
    pub text_field: String,
    pub tag: RelFilterPattern,
    pub pain: RelFilterPattern,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self {
            entity_label: "Lead".into(),
            text_field: "nome".into(),
            tag: RelFilterPattern::new("TEM_TAG", "Tag", "nome"),
            pain: RelFilterPattern::new("TEM_DOR", "Dor", "nome"),
        }
    }
}

// ============================================================================
// Compiled form
// ============================================================================

/// A compiled, parameterized query. Clause order is deterministic for a
/// given spec.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub match_clauses: Vec<String>,
    pub where_clauses: Vec<String>,
    pub params: PropertyMap,
}

impl CompiledQuery {
    /// The base pattern: match clauses followed by the combined WHERE.
    pub fn base_query(&self) -> String {
        let mut q = self.match_clauses.join("\n");
        if !self.where_clauses.is_empty() {
            q.push_str("\nWHERE ");
            q.push_str(&self.where_clauses.join(" AND "));
        }
        q
    }

    fn paginated(&self) -> bool {
        self.params.contains_key("skip")
    }
}

// ============================================================================
// Compilation
// ============================================================================

impl FilterCompiler {
    /// Compile a filter spec into a parameterized query.
    ///
    /// Fails only when a filter value is structurally unusable for
    /// parameter binding: non-finite date bounds, zero page/limit, or a
    /// property name that is not a plain identifier. Business semantics
    /// (whether a tag exists, say) are not validated here.
    pub fn compile(&self, spec: &FilterSpec) -> Result<CompiledQuery> {
        ident("entity_label", &self.entity_label)?;
        let mut match_clauses = vec![format!("MATCH (n:{})", self.entity_label)];
        let mut where_clauses = Vec::new();
        let mut params = PropertyMap::new();

        if let Some(text) = &spec.text_match {
            ident("text_field", &self.text_field)?;
            where_clauses.push(format!(
                "toLower(n.{}) CONTAINS toLower($text)",
                self.text_field
            ));
            params.insert("text".into(), GraphValue::String(text.clone()));
        }

        for (field, value) in &spec.exact_matches {
            ident(field, field)?;
            where_clauses.push(format!("n.{field} = $eq_{field}"));
            params.insert(format!("eq_{field}"), value.clone());
        }

        for range in &spec.date_ranges {
            ident(&range.field, &range.field)?;
            if let Some(start) = range.start {
                let ms = finite_millis(&range.field, start)?;
                where_clauses.push(format!("n.{0} >= ${0}Start", range.field));
                params.insert(format!("{}Start", range.field), GraphValue::Int(ms));
            }
            if let Some(end) = range.end {
                let ms = finite_millis(&range.field, end)?;
                where_clauses.push(format!("n.{0} <= ${0}End", range.field));
                params.insert(format!("{}End", range.field), GraphValue::Int(ms));
            }
        }

        if let Some(tag) = &spec.tag_name {
            push_rel_filter(&self.tag, "tag", &mut match_clauses, &mut where_clauses)?;
            params.insert("tag".into(), GraphValue::String(tag.clone()));
        }
        if let Some(pain) = &spec.pain_name {
            push_rel_filter(&self.pain, "pain", &mut match_clauses, &mut where_clauses)?;
            params.insert("pain".into(), GraphValue::String(pain.clone()));
        }

        if let Some(page) = &spec.page {
            if page.page == 0 || page.limit == 0 {
                return Err(Error::InvalidFilter {
                    field: "page".into(),
                    reason: "page and limit must be >= 1".into(),
                });
            }
            let skip = page
                .page
                .checked_sub(1)
                .and_then(|p| p.checked_mul(page.limit))
                .and_then(|s| i64::try_from(s).ok())
                .ok_or_else(|| Error::InvalidFilter {
                    field: "page".into(),
                    reason: "page * limit exceeds the representable skip range".into(),
                })?;
            let limit = i64::try_from(page.limit).map_err(|_| Error::InvalidFilter {
                field: "page".into(),
                reason: "limit exceeds the representable range".into(),
            })?;
            params.insert("skip".into(), GraphValue::Int(skip));
            params.insert("limit".into(), GraphValue::Int(limit));
        }

        let compiled = CompiledQuery { match_clauses, where_clauses, params };
        debug!(query = %compiled.base_query(), params = compiled.params.len(), "compiled filter query");
        Ok(compiled)
    }

    /// Count query over the compiled base: one row, column `total`.
    pub fn count_query(&self, compiled: &CompiledQuery) -> String {
        format!("{}\nRETURN count(DISTINCT n) AS total", compiled.base_query())
    }

    /// Listing query over the compiled base.
    ///
    /// The tag/pain relationship filters (and the denormalized name lists
    /// collected for display) fan the primary entity out to one row per
    /// relationship. The result is collapsed back to one row per entity —
    /// `WITH DISTINCT` plus de-duplicating `collect` — BEFORE ORDER BY,
    /// SKIP and LIMIT. Ordering or paginating the ungrouped intermediate
    /// rows silently corrupts page contents.
    pub fn listing_query(
        &self,
        compiled: &CompiledQuery,
        order_field: &str,
        descending: bool,
    ) -> Result<String> {
        ident(order_field, order_field)?;
        ident("rel_type", &self.tag.rel_type)?;
        ident("label", &self.tag.label)?;
        ident("name_prop", &self.tag.name_prop)?;
        ident("rel_type", &self.pain.rel_type)?;
        ident("label", &self.pain.label)?;
        ident("name_prop", &self.pain.name_prop)?;

        let mut q = compiled.base_query();
        q.push_str("\nWITH DISTINCT n");
        q.push_str(&format!(
            "\nOPTIONAL MATCH (n)-[:{}]->(t:{})",
            self.tag.rel_type, self.tag.label
        ));
        q.push_str(&format!(
            "\nOPTIONAL MATCH (n)-[:{}]->(d:{})",
            self.pain.rel_type, self.pain.label
        ));
        q.push_str(&format!(
            "\nWITH n, collect(DISTINCT t.{}) AS tags, collect(DISTINCT d.{}) AS pains",
            self.tag.name_prop, self.pain.name_prop
        ));
        q.push_str(&format!(
            "\nORDER BY n.{order_field} {}",
            if descending { "DESC" } else { "ASC" }
        ));
        if compiled.paginated() {
            q.push_str("\nSKIP $skip LIMIT $limit");
        }
        q.push_str("\nRETURN n{.*, tags: tags, pains: pains} AS item");
        Ok(q)
    }
}

/// One relationship filter: an extra MATCH clause plus a bound equality
/// predicate on the related node's name property.
fn push_rel_filter(
    pattern: &RelFilterPattern,
    var: &str,
    match_clauses: &mut Vec<String>,
    where_clauses: &mut Vec<String>,
) -> Result<()> {
    ident("rel_type", &pattern.rel_type)?;
    ident("label", &pattern.label)?;
    ident("name_prop", &pattern.name_prop)?;
    match_clauses.push(format!(
        "MATCH (n)-[:{}]->({var}:{})",
        pattern.rel_type, pattern.label
    ));
    where_clauses.push(format!("{var}.{} = ${var}", pattern.name_prop));
    Ok(())
}

/// Validate a name that must be spliced into query text.
fn ident(field: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::InvalidFilter {
            field: field.into(),
            reason: format!("`{name}` is not a valid identifier"),
        })
    }
}

fn finite_millis(field: &str, value: f64) -> Result<i64> {
    if value.is_finite() {
        Ok(value as i64)
    } else {
        Err(Error::InvalidFilter {
            field: field.into(),
            reason: "date bound must be a finite millisecond epoch".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_spec_is_the_base_query() {
        let compiled = FilterCompiler::default().compile(&FilterSpec::default()).unwrap();
        assert_eq!(compiled.match_clauses, vec!["MATCH (n:Lead)".to_string()]);
        assert!(compiled.where_clauses.is_empty());
        assert!(compiled.params.is_empty());
        assert_eq!(compiled.base_query(), "MATCH (n:Lead)");
    }

    #[test]
    fn test_pagination_binds_native_integers() {
        let spec = FilterSpec {
            page: Some(PageSpec { page: 2, limit: 10 }),
            ..Default::default()
        };
        let compiled = FilterCompiler::default().compile(&spec).unwrap();
        assert_eq!(compiled.params.get("skip"), Some(&GraphValue::Int(10)));
        assert_eq!(compiled.params.get("limit"), Some(&GraphValue::Int(10)));
        assert!(compiled.where_clauses.is_empty());
    }

    #[test]
    fn test_zero_page_is_rejected() {
        let spec = FilterSpec {
            page: Some(PageSpec { page: 0, limit: 10 }),
            ..Default::default()
        };
        assert!(FilterCompiler::default().compile(&spec).is_err());
    }

    #[test]
    fn test_oversized_page_is_rejected() {
        // skip = (page - 1) * limit must not wrap; it is an error, not a panic.
        let spec = FilterSpec {
            page: Some(PageSpec { page: u64::MAX, limit: 10 }),
            ..Default::default()
        };
        let err = FilterCompiler::default().compile(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));

        let spec = FilterSpec {
            page: Some(PageSpec { page: 1, limit: u64::MAX }),
            ..Default::default()
        };
        let err = FilterCompiler::default().compile(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn test_text_filter() {
        let spec = FilterSpec { text_match: Some("ana".into()), ..Default::default() };
        let compiled = FilterCompiler::default().compile(&spec).unwrap();
        assert_eq!(
            compiled.where_clauses,
            vec!["toLower(n.nome) CONTAINS toLower($text)".to_string()]
        );
        assert_eq!(compiled.params.get("text"), Some(&GraphValue::from("ana")));
    }

    #[test]
    fn test_tag_filter_adds_match_clause_and_param() {
        let spec = FilterSpec { tag_name: Some("vip".into()), ..Default::default() };
        let compiled = FilterCompiler::default().compile(&spec).unwrap();
        assert_eq!(
            compiled.match_clauses,
            vec![
                "MATCH (n:Lead)".to_string(),
                "MATCH (n)-[:TEM_TAG]->(tag:Tag)".to_string(),
            ]
        );
        assert_eq!(compiled.where_clauses, vec!["tag.nome = $tag".to_string()]);
        assert_eq!(compiled.params.get("tag"), Some(&GraphValue::from("vip")));
    }

    #[test]
    fn test_date_range_binds_int_millis() {
        let spec = FilterSpec {
            date_ranges: vec![DateRange {
                field: "dtCriacao".into(),
                start: Some(1_000.0),
                end: Some(2_000.0),
            }],
            ..Default::default()
        };
        let compiled = FilterCompiler::default().compile(&spec).unwrap();
        assert_eq!(
            compiled.where_clauses,
            vec![
                "n.dtCriacao >= $dtCriacaoStart".to_string(),
                "n.dtCriacao <= $dtCriacaoEnd".to_string(),
            ]
        );
        assert_eq!(compiled.params.get("dtCriacaoStart"), Some(&GraphValue::Int(1000)));
        assert_eq!(compiled.params.get("dtCriacaoEnd"), Some(&GraphValue::Int(2000)));
    }

    #[test]
    fn test_non_finite_date_bound_is_rejected() {
        let spec = FilterSpec {
            date_ranges: vec![DateRange {
                field: "dtCriacao".into(),
                start: Some(f64::NAN),
                end: None,
            }],
            ..Default::default()
        };
        let err = FilterCompiler::default().compile(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn test_injection_shaped_field_is_rejected() {
        let mut exact = BTreeMap::new();
        exact.insert("nome) DETACH DELETE (n".to_string(), GraphValue::from("x"));
        let spec = FilterSpec { exact_matches: exact, ..Default::default() };
        assert!(FilterCompiler::default().compile(&spec).is_err());
    }

    #[test]
    fn test_full_spec_composes_deterministically() {
        let spec = FilterSpec {
            text_match: Some("ana".into()),
            tag_name: Some("vip".into()),
            pain_name: Some("preço".into()),
            page: Some(PageSpec { page: 1, limit: 20 }),
            ..Default::default()
        };
        let c = FilterCompiler::default();
        let a = c.compile(&spec).unwrap();
        let b = c.compile(&spec).unwrap();
        assert_eq!(a.base_query(), b.base_query());
        assert_eq!(a.match_clauses.len(), 3);
        assert_eq!(a.where_clauses.len(), 3);
        assert_eq!(a.params.len(), 5);
    }

    #[test]
    fn test_listing_query_groups_before_order_and_pagination() {
        let spec = FilterSpec {
            tag_name: Some("vip".into()),
            page: Some(PageSpec { page: 2, limit: 10 }),
            ..Default::default()
        };
        let c = FilterCompiler::default();
        let compiled = c.compile(&spec).unwrap();
        let listing = c.listing_query(&compiled, "dtUltimaAtualizacao", true).unwrap();

        let with = listing.find("WITH DISTINCT n").expect("regroup step");
        let collect = listing.find("collect(DISTINCT").expect("dedup collect");
        let order = listing.find("ORDER BY n.dtUltimaAtualizacao DESC").expect("order");
        let skip = listing.find("SKIP $skip LIMIT $limit").expect("pagination");
        assert!(with < collect && collect < order && order < skip);
        assert!(listing.ends_with("RETURN n{.*, tags: tags, pains: pains} AS item"));
    }

    #[test]
    fn test_listing_query_without_pagination_has_no_skip() {
        let c = FilterCompiler::default();
        let compiled = c.compile(&FilterSpec::default()).unwrap();
        let listing = c.listing_query(&compiled, "dtCriacao", false).unwrap();
        assert!(!listing.contains("SKIP"));
        assert!(listing.contains("ORDER BY n.dtCriacao ASC"));
    }

    #[test]
    fn test_count_query() {
        let c = FilterCompiler::default();
        let compiled = c.compile(&FilterSpec::default()).unwrap();
        assert_eq!(
            c.count_query(&compiled),
            "MATCH (n:Lead)\nRETURN count(DISTINCT n) AS total"
        );
    }
}
