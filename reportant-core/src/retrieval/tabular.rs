//! Tabular grounding: structured queries over numeric records.
//!
//! A section question like "2018년 이후 에너지 부문 배출량 추이는?" implies a
//! structured filter (year range, category keywords). The tabular provider
//! answers it with a numeric summary that is folded into the grounding
//! prompt alongside retrieved snippets.

use crate::error::RetrievalError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// A structured query derived from a section question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularQuery {
    /// Lowercased keywords taken from the topic and question.
    pub keywords: Vec<String>,
    /// Inclusive year range, when the question names any 4-digit years.
    pub year_range: Option<(i32, i32)>,
}

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A plain \b won't do here: Hangul counts as a word character, so
    // "2020년" has no word boundary after the digits. Match maximal digit
    // runs instead and keep the 4-digit ones that look like years.
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digit regex"))
}

impl TabularQuery {
    /// Derive a query from the section question and report topic.
    ///
    /// Purely deterministic: years come from 4-digit matches in the
    /// question, keywords from whitespace-split topic and question tokens.
    pub fn from_question(question: &str, topic: &str) -> Self {
        let years: Vec<i32> = digit_run_regex()
            .find_iter(question)
            .filter(|m| m.as_str().len() == 4)
            .filter_map(|m| m.as_str().parse().ok())
            .filter(|y| (1900..2100).contains(y))
            .collect();
        let year_range = match (years.iter().min(), years.iter().max()) {
            (Some(&min), Some(&max)) => Some((min, max)),
            _ => None,
        };

        let mut keywords: Vec<String> = topic
            .split_whitespace()
            .chain(question.split_whitespace())
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.chars().count() > 1 && w.parse::<i64>().is_err())
            .collect();
        keywords.sort();
        keywords.dedup();

        Self {
            keywords,
            year_range,
        }
    }
}

/// Numeric summary of the rows matching a tabular query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularSummary {
    pub matched_rows: usize,
    pub year_range: (i32, i32),
    pub total: f64,
    pub unit: String,
    /// Highest single value: (year, category, value).
    pub peak: Option<(i32, String, f64)>,
}

impl std::fmt::Display for TabularSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}~{}년 {}건 집계, 합계 {:.1} {}",
            self.year_range.0, self.year_range.1, self.matched_rows, self.total, self.unit
        )?;
        if let Some((year, category, value)) = &self.peak {
            write!(f, ", 최대값 {:.1} {} ({} 부문, {}년)", value, self.unit, category, year)?;
        }
        Ok(())
    }
}

/// Trait for tabular data providers.
#[async_trait]
pub trait TabularProvider: Send + Sync {
    /// Summarize the rows matching the query. `Ok(None)` means no data
    /// matched; the grounding prompt simply omits the tabular section.
    async fn summarize(&self, query: &TabularQuery)
    -> Result<Option<TabularSummary>, RetrievalError>;
}

/// One record of the tabular data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub year: i32,
    pub category: String,
    pub value: f64,
    pub unit: String,
}

/// In-memory table loaded from a JSON array of rows.
#[derive(Debug, Default)]
pub struct InMemoryTable {
    rows: Vec<TableRow>,
}

impl InMemoryTable {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self { rows }
    }

    /// Load rows from a JSON file (`[ { "year", "category", "value",
    /// "unit" } ]`).
    pub fn from_json_file(path: &Path) -> Result<Self, RetrievalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RetrievalError::Tabular {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let rows: Vec<TableRow> =
            serde_json::from_str(&raw).map_err(|e| RetrievalError::Tabular {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?;
        Ok(Self::new(rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn matches<'a>(&'a self, query: &TabularQuery) -> Vec<&'a TableRow> {
        let in_range: Vec<&TableRow> = self
            .rows
            .iter()
            .filter(|r| match query.year_range {
                Some((min, max)) => r.year >= min && r.year <= max,
                None => true,
            })
            .collect();

        // Narrow by category keywords when any of them actually hit;
        // otherwise keep the year-filtered set so an unspecific question
        // still gets an overall summary.
        let by_keyword: Vec<&TableRow> = in_range
            .iter()
            .copied()
            .filter(|r| {
                let category = r.category.to_lowercase();
                query.keywords.iter().any(|k| category.contains(k))
            })
            .collect();
        if by_keyword.is_empty() { in_range } else { by_keyword }
    }
}

#[async_trait]
impl TabularProvider for InMemoryTable {
    async fn summarize(
        &self,
        query: &TabularQuery,
    ) -> Result<Option<TabularSummary>, RetrievalError> {
        let matched = self.matches(query);
        if matched.is_empty() {
            return Ok(None);
        }

        let min_year = matched.iter().map(|r| r.year).min().unwrap_or_default();
        let max_year = matched.iter().map(|r| r.year).max().unwrap_or_default();
        let total: f64 = matched.iter().map(|r| r.value).sum();
        let unit = matched[0].unit.clone();
        let peak = matched
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
            .map(|r| (r.year, r.category.clone(), r.value));

        Ok(Some(TabularSummary {
            matched_rows: matched.len(),
            year_range: (min_year, max_year),
            total,
            unit,
            peak,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_table() -> InMemoryTable {
        InMemoryTable::new(vec![
            TableRow {
                year: 2019,
                category: "에너지".to_string(),
                value: 611.5,
                unit: "Mt CO2eq".to_string(),
            },
            TableRow {
                year: 2020,
                category: "에너지".to_string(),
                value: 569.9,
                unit: "Mt CO2eq".to_string(),
            },
            TableRow {
                year: 2020,
                category: "산업공정".to_string(),
                value: 48.5,
                unit: "Mt CO2eq".to_string(),
            },
        ])
    }

    #[test]
    fn test_query_from_question_extracts_years_and_keywords() {
        let query =
            TabularQuery::from_question("2019년부터 2020년까지 에너지 부문 추이는?", "탄소 배출");
        assert_eq!(query.year_range, Some((2019, 2020)));
        assert!(query.keywords.contains(&"에너지".to_string()));
        assert!(query.keywords.contains(&"탄소".to_string()));
    }

    #[test]
    fn test_query_without_years() {
        let query = TabularQuery::from_question("전체 추이는 어떠한가?", "배출 현황");
        assert_eq!(query.year_range, None);
    }

    #[tokio::test]
    async fn test_summarize_filters_by_year_and_keyword() {
        let table = sample_table();
        let query = TabularQuery::from_question("2020년 에너지 부문 배출량은?", "탄소");
        let summary = table.summarize(&query).await.unwrap().unwrap();
        assert_eq!(summary.matched_rows, 1);
        assert_eq!(summary.year_range, (2020, 2020));
        assert_eq!(summary.total, 569.9);
    }

    #[tokio::test]
    async fn test_summarize_falls_back_to_year_filter() {
        let table = sample_table();
        let query = TabularQuery::from_question("2020년 현황을 요약해줘", "보고서");
        let summary = table.summarize(&query).await.unwrap().unwrap();
        // No category keyword hits: both 2020 rows are aggregated.
        assert_eq!(summary.matched_rows, 2);
        assert_eq!(summary.peak.as_ref().unwrap().1, "에너지");
    }

    #[tokio::test]
    async fn test_summarize_no_match() {
        let table = sample_table();
        let query = TabularQuery::from_question("1990년 수치는?", "탄소");
        assert_eq!(table.summarize(&query).await.unwrap(), None);
    }

    #[test]
    fn test_summary_display() {
        let summary = TabularSummary {
            matched_rows: 2,
            year_range: (2019, 2020),
            total: 1181.4,
            unit: "Mt CO2eq".to_string(),
            peak: Some((2019, "에너지".to_string(), 611.5)),
        };
        let text = summary.to_string();
        assert!(text.contains("2019~2020년"));
        assert!(text.contains("1181.4"));
        assert!(text.contains("에너지"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(
            &path,
            r#"[{"year":2021,"category":"energy","value":1.0,"unit":"Mt"}]"#,
        )
        .unwrap();
        let table = InMemoryTable::from_json_file(&path).unwrap();
        assert_eq!(table.len(), 1);
    }
}
