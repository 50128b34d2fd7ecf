use std::collections::BTreeMap;

use crate::dictionary::lexicon::{Lexicon, LexiconIndex, Morph, MorphStore, RawWordEntry};
use crate::double_array::DoubleArray;
use crate::errors::{Result, SumomoError};
use crate::utils::parse_csv_row;

/// Number of columns required in a CSV row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnSpec {
    /// Exactly the given number of columns.
    Exact(usize),
    /// At least the given number of columns.
    AtLeast(usize),
}

impl ColumnSpec {
    const fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == m,
            Self::AtLeast(m) => n >= m,
        }
    }
}

impl Lexicon {
    /// Builds a new instance from parsed records.
    ///
    /// Records are sorted stably by surface, so that records sharing a
    /// surface keep their input order.
    pub fn from_entries(mut entries: Vec<RawWordEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.surface.as_bytes().cmp(b.surface.as_bytes()));

        let mut keys: Vec<&str> = vec![];
        let mut ids = vec![];
        let mut dup = BTreeMap::new();
        let mut first = 0;
        for (i, e) in entries.iter().enumerate() {
            let word_id = u32::try_from(i)?;
            if keys.last() == Some(&e.surface.as_str()) {
                *dup.entry(first).or_insert(0) += 1;
            } else {
                keys.push(&e.surface);
                ids.push(word_id);
                first = word_id;
            }
        }
        let da = DoubleArray::build_with_ids(&keys, &ids)?;
        tracing::debug!(
            num_records = entries.len(),
            num_surfaces = keys.len(),
            num_cells = da.num_cells(),
            "built the lexicon index"
        );

        let (morphs, contents) = entries.into_iter().map(|e| (e.morph, e.contents)).unzip();
        Ok(Self::from_parts(
            LexiconIndex::new(da, dup),
            MorphStore::new(morphs, contents),
        ))
    }

    /// Parses rows of a lexicon in the CSV format.
    ///
    /// Each row is `surface,left_id,right_id,weight,features...`. Rows with
    /// an empty surface are skipped.
    pub(crate) fn parse_csv(text: &str, name: &str, spec: ColumnSpec) -> Result<Vec<RawWordEntry>> {
        let mut entries = vec![];
        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let cols = parse_csv_row(line);
            if !spec.accepts(cols.len()) {
                let msg = format!(
                    "A csv row must have {spec:?} columns but has {} at line {}, {line}",
                    cols.len(),
                    i + 1,
                );
                return Err(SumomoError::invalid_format(name, msg));
            }
            let mut iter = cols.into_iter();
            let (Some(surface), Some(left_id), Some(right_id), Some(weight)) =
                (iter.next(), iter.next(), iter.next(), iter.next())
            else {
                let msg = format!("A csv row must have four columns at least, {line}");
                return Err(SumomoError::invalid_format(name, msg));
            };
            if surface.is_empty() {
                tracing::warn!(name, line = i + 1, "skipped a row with an empty surface");
                continue;
            }
            let parse = |col: &str, what: &str| {
                col.trim().parse::<i16>().map_err(|e| {
                    let msg = format!("Invalid {what} at line {}: {e}, {line}", i + 1);
                    SumomoError::invalid_format(name, msg)
                })
            };
            let morph = Morph::new(
                parse(left_id.as_str(), "left id")?,
                parse(right_id.as_str(), "right id")?,
                parse(weight.as_str(), "weight")?,
            );
            entries.push(RawWordEntry {
                surface,
                morph,
                contents: iter.collect(),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let data = "自然,0,2,1,sizen\n言語,1,0,-4,gengo,げんご\n";
        let entries = Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].morph, Morph::new(0, 2, 1));
        assert_eq!(entries[0].contents, vec!["sizen"]);
        assert_eq!(entries[1].morph, Morph::new(1, 0, -4));
        assert_eq!(entries[1].contents, vec!["gengo", "げんご"]);
    }

    #[test]
    fn test_quoted_surface() {
        let data = "\"1,2\",3,4,5,記号";
        let entries = Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).unwrap();
        assert_eq!(entries[0].surface, "1,2");
        assert_eq!(entries[0].morph, Morph::new(3, 4, 5));
    }

    #[test]
    fn test_skip_empty_surface() {
        let data = ",0,0,0,x\nあ,0,0,0,y";
        let entries = Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].surface, "あ");
    }

    #[test]
    fn test_few_cols() {
        let data = "自然,0,2";
        assert!(Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).is_err());
    }

    #[test]
    fn test_exact_cols() {
        let data = "自然,0,2,1,a,b";
        assert!(Lexicon::parse_csv(data, "lex.csv", ColumnSpec::Exact(13)).is_err());
        assert!(Lexicon::parse_csv(data, "lex.csv", ColumnSpec::Exact(6)).is_ok());
    }

    #[test]
    fn test_invalid_cost() {
        let data = "自然,2,1,コスト";
        let e = Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).unwrap_err();
        assert!(e.to_string().contains("lex.csv"));
        assert!(e.to_string().contains("自然,2,1,コスト"));
    }

    #[test]
    fn test_out_of_range_cost() {
        let data = "自然,2,1,40000";
        assert!(Lexicon::parse_csv(data, "lex.csv", ColumnSpec::AtLeast(4)).is_err());
    }
}
