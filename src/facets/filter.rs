// Facet values and dimensions — the row/column axes of the matrix.
//
// A dimension is an ordered list of values; insertion order is display
// order. Each value pairs a display label with the document-selection
// predicate it stands for.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::search::Query;
use crate::text;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterValue {
    descriptor: String,
    predicate: Query,
}

impl FilterValue {
    pub fn new(descriptor: impl Into<String>, predicate: Query) -> Self {
        Self {
            descriptor: descriptor.into(),
            predicate,
        }
    }

    /// Exact facet match, labelled with the value itself.
    pub fn exact(field: &str, value: &str) -> Self {
        Self::new(value, Query::exact(field, value))
    }

    /// Full-text presence, labelled with the text as given. Text that
    /// tokenizes to several words requires every one of them.
    pub fn contains(field: &str, words: &str) -> Self {
        let terms = text::tokenize(words)
            .into_iter()
            .map(|token| Query::term(field, token));
        Self::new(words, Query::and(terms))
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn predicate(&self) -> &Query {
        &self.predicate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterDimension {
    name: String,
    values: Vec<FilterValue>,
}

impl FilterDimension {
    /// Build a dimension. Empty dimensions and repeated descriptors are
    /// configuration errors.
    pub fn new(name: impl Into<String>, values: Vec<FilterValue>) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(Error::config(format!("Dimension '{name}' has no values")));
        }
        let mut seen = HashSet::new();
        for value in &values {
            if !seen.insert(value.descriptor.to_lowercase()) {
                return Err(Error::config(format!(
                    "Dimension '{name}' repeats the value '{}'",
                    value.descriptor
                )));
            }
        }
        Ok(Self { name, values })
    }

    /// Parse a dimension given on the command line.
    ///
    /// `field=v1,v2` selects documents whose facet `field` equals a value;
    /// `field~t1,t2` selects documents whose text field contains every
    /// word of a value.
    pub fn parse(input: &str) -> Result<Self> {
        let (field, values, exact) = if let Some((field, values)) = input.split_once('=') {
            (field, values, true)
        } else if let Some((field, values)) = input.split_once('~') {
            (field, values, false)
        } else {
            return Err(Error::config(format!(
                "Dimension '{input}' must look like field=v1,v2 or field~term1,term2"
            )));
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(Error::config(format!("Dimension '{input}' has no field name")));
        }

        let values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                if exact {
                    Ok(FilterValue::exact(field, v))
                } else if text::tokenize(v).is_empty() {
                    Err(Error::config(format!(
                        "Dimension '{input}' has a value without any word: '{v}'"
                    )))
                } else {
                    Ok(FilterValue::contains(field, v))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(field, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.values.iter().map(|v| v.descriptor.clone()).collect()
    }

    /// A document belongs to the dimension if it satisfies any of its values.
    pub fn any_predicate(&self) -> Query {
        Query::or(self.values.iter().map(|v| v.predicate.clone()), 1)
    }
}

/// Build the global filter from optional date bounds and `field=value`
/// facet restrictions. With no restrictions this is the match-all query.
pub fn global_filter(
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    facet_filters: &[String],
) -> Result<Query> {
    if let (Some(since), Some(until)) = (since, until) {
        if since > until {
            return Err(Error::config(format!(
                "Date range is empty: {since} is after {until}"
            )));
        }
    }

    let mut clauses = Vec::new();
    if since.is_some() || until.is_some() {
        clauses.push(Query::DateRange {
            from: since,
            to: until,
        });
    }
    for filter in facet_filters {
        let Some((field, value)) = filter.split_once('=') else {
            return Err(Error::config(format!(
                "Filter '{filter}' must look like field=value"
            )));
        };
        clauses.push(Query::exact(field.trim(), value.trim()));
    }
    Ok(Query::and(clauses))
}
