use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::double_array::{CommonPrefixIter, DoubleArray, Trie};
use crate::errors::{Result, SumomoError};
use crate::utils::{parse_csv_row, FromU32};

const NAME: &str = "user dictionary";

/// Record of a user dictionary.
///
/// `tokens` and `readings` split the surface into segments and must have the
/// same number of elements.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserDictRecord {
    /// Surface to match.
    pub surface: String,
    /// Segments of the surface.
    pub tokens: Vec<String>,
    /// Readings of the segments.
    pub readings: Vec<String>,
    /// Part-of-speech tag.
    pub pos: String,
}

/// Overlay dictionary consulted before the system lexicon.
///
/// A user word always carries zero context ids and cost, and its features
/// are the part-of-speech tag, the segments joined by `/`, and the readings
/// joined by `/`.
#[derive(Clone, Debug, Default)]
pub struct UserDict {
    da: DoubleArray,
    contents: Vec<Vec<String>>,
}

impl UserDict {
    /// Creates a new instance from a reader of CSV rows
    /// `surface,segments,readings,pos`, where segments and readings are
    /// separated by spaces. Empty lines and lines starting with `#` are
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when a row is malformed, quoting the row.
    pub fn from_reader<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut text = String::new();
        rdr.read_to_string(&mut text)?;

        let mut records = vec![];
        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            records.push(Self::parse_row(line).map_err(|msg| {
                SumomoError::invalid_format(NAME, format!("{msg} at line {}, {line}", i + 1))
            })?);
        }
        Self::from_records(records)
    }

    /// Creates a new instance from a file.
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::from_reader(File::open(path)?)
    }

    /// Creates a new instance from records.
    ///
    /// When records share a surface, the first one is kept.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when a surface is empty or when the
    /// numbers of segments and readings are different.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = UserDictRecord>,
    {
        let mut records: Vec<_> = records.into_iter().collect();
        for r in &records {
            if r.surface.is_empty() {
                return Err(SumomoError::invalid_format(NAME, "A surface must not be empty."));
            }
            if r.tokens.is_empty() || r.tokens.len() != r.readings.len() {
                let msg = format!(
                    "The numbers of segments and readings must be the same and positive, {}",
                    r.surface
                );
                return Err(SumomoError::invalid_format(NAME, msg));
            }
        }
        records.sort_by(|a, b| a.surface.cmp(&b.surface));

        let mut keys: Vec<String> = vec![];
        let mut contents = vec![];
        for r in records {
            if keys.last() == Some(&r.surface) {
                tracing::warn!(surface = %r.surface, "skipped a duplicate user entry");
                continue;
            }
            contents.push(vec![r.pos, r.tokens.join("/"), r.readings.join("/")]);
            keys.push(r.surface);
        }
        let da = DoubleArray::build(&keys)?;
        tracing::debug!(num_entries = keys.len(), "built the user dictionary");
        Ok(Self { da, contents })
    }

    fn parse_row(line: &str) -> Result<UserDictRecord, String> {
        let cols = parse_csv_row(line);
        if cols.len() != 4 {
            return Err(format!("A row must have 4 fields, but has {}", cols.len()));
        }
        let split = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        let tokens = split(&cols[1]);
        let readings = split(&cols[2]);
        if tokens.len() != readings.len() {
            return Err(format!(
                "The numbers of segments and readings are different, {} != {}",
                tokens.len(),
                readings.len()
            ));
        }
        let mut cols = cols.into_iter();
        let surface = cols.next().unwrap_or_default();
        let pos = cols.nth(2).unwrap_or_default();
        Ok(UserDictRecord {
            surface,
            tokens,
            readings,
            pos,
        })
    }

    /// Gets the features of an entry.
    #[inline(always)]
    pub fn contents(&self, id: u32) -> &[String] {
        self.contents
            .get(usize::from_u32(id))
            .map_or(&[], |c| c.as_slice())
    }

    /// Gets the number of entries.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Checks if the dictionary has no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl Trie for UserDict {
    #[inline(always)]
    fn search(&self, key: &[u8]) -> Option<u32> {
        self.da.search(key)
    }

    #[inline(always)]
    fn common_prefix_search<'a>(&'a self, input: &'a [u8]) -> CommonPrefixIter<'a> {
        self.da.common_prefix_search(input)
    }
}
