// Query model for the search collaborator.
//
// Facet predicates, cell queries and topic-biased queries are all built
// from this one tree. The builders keep two invariants the pipeline relies
// on: conjunctions never carry redundant match-all clauses, and a
// disjunction is never empty (an empty Or would match nothing).

use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    All,
    /// Facet value equality (case-insensitive).
    Exact { field: String, value: String },
    /// Full-text token presence in a text field, scored by TF-IDF.
    Term { field: String, term: String },
    /// Inclusive date range; an open bound is unconstrained.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    And(Vec<Query>),
    Or {
        clauses: Vec<Query>,
        min_should_match: usize,
    },
    Boost { query: Box<Query>, boost: f64 },
}

impl Query {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn term(field: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            term: term.into().to_lowercase(),
        }
    }

    /// Conjunction of `clauses`. Nested conjunctions are flattened and
    /// match-all clauses dropped; a single survivor is returned as is.
    pub fn and(clauses: impl IntoIterator<Item = Query>) -> Self {
        let mut flat = Vec::new();
        for clause in clauses {
            match clause {
                Query::All => {}
                Query::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Query::All,
            1 => flat.remove(0),
            _ => Query::And(flat),
        }
    }

    /// Disjunction requiring at least `min_should_match` clauses (never
    /// less than one, never more than the clause count). An empty clause
    /// list degrades to `All` rather than to an unsatisfiable query.
    pub fn or(clauses: impl IntoIterator<Item = Query>, min_should_match: usize) -> Self {
        let clauses: Vec<Query> = clauses.into_iter().collect();
        if clauses.is_empty() {
            return Query::All;
        }
        if clauses.iter().any(|c| matches!(c, Query::All)) && min_should_match <= 1 {
            return Query::All;
        }
        let min_should_match = min_should_match.clamp(1, clauses.len());
        if clauses.len() == 1 {
            let mut clauses = clauses;
            return clauses.remove(0);
        }
        Query::Or {
            clauses,
            min_should_match,
        }
    }

    /// Multiply the relevance contribution of `query` by `boost`.
    /// Non-finite or non-positive boosts are ignored.
    pub fn boosted(self, boost: f64) -> Self {
        if !boost.is_finite() || boost <= 0.0 || (boost - 1.0).abs() < f64::EPSILON {
            return self;
        }
        Query::Boost {
            query: Box::new(self),
            boost,
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Query::All)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All => write!(f, "*:*"),
            Query::Exact { field, value } => write!(f, "{field}:\"{value}\""),
            Query::Term { field, term } => write!(f, "{field}:{term}"),
            Query::DateRange { from, to } => {
                let from = from.map(|d| d.to_string()).unwrap_or_else(|| "*".into());
                let to = to.map(|d| d.to_string()).unwrap_or_else(|| "*".into());
                write!(f, "date:[{from} TO {to}]")
            }
            Query::And(clauses) => {
                let parts: Vec<String> = clauses.iter().map(|c| format!("+{c}")).collect();
                write!(f, "({})", parts.join(" "))
            }
            Query::Or {
                clauses,
                min_should_match,
            } => {
                let parts: Vec<String> = clauses.iter().map(|c| c.to_string()).collect();
                write!(f, "({})~{min_should_match}", parts.join(" "))
            }
            Query::Boost { query, boost } => write!(f, "{query}^{boost}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_and_drops_match_all() {
        let q = Query::and(vec![
            Query::All,
            Query::and(vec![Query::exact("country", "DE"), Query::term("text", "covid")]),
            Query::exact("lang", "en"),
        ]);
        match q {
            Query::And(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected conjunction, got {other}"),
        }
    }

    #[test]
    fn and_of_nothing_is_match_all() {
        assert_eq!(Query::and(Vec::new()), Query::All);
        assert_eq!(Query::and(vec![Query::All, Query::All]), Query::All);
    }

    #[test]
    fn empty_or_never_matches_nothing() {
        assert_eq!(Query::or(Vec::new(), 3), Query::All);
    }

    #[test]
    fn or_clamps_min_should_match() {
        let q = Query::or(vec![Query::term("text", "a"), Query::term("text", "b")], 5);
        match q {
            Query::Or {
                min_should_match, ..
            } => assert_eq!(min_should_match, 2),
            other => panic!("expected disjunction, got {other}"),
        }
    }

    #[test]
    fn neutral_boost_is_dropped() {
        let q = Query::term("text", "covid").boosted(1.0);
        assert_eq!(q, Query::term("text", "covid"));
        let q = Query::term("text", "covid").boosted(f64::INFINITY);
        assert_eq!(q, Query::term("text", "covid"));
    }

    #[test]
    fn display_is_lucene_like() {
        let q = Query::and(vec![
            Query::exact("country", "DE"),
            Query::or(vec![Query::term("text", "a"), Query::term("text", "b")], 1),
        ]);
        assert_eq!(q.to_string(), "(+country:\"DE\" +(text:a text:b)~1)");
    }
}
