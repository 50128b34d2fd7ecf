use std::io::{prelude::*, BufReader, Read};

use hashbrown::HashMap;

use crate::dictionary::character::{CharCategory, DEFAULT_CLASS, DEFAULT_CLASS_ID, NUM_BMP_CHARS};
use crate::errors::{Result, SumomoError};

const NAME: &str = "char.def";

struct ClassDef {
    invoke: bool,
    group: bool,
    length: u16,
}

struct CharRange {
    start: usize,
    end: usize,
    classes: Vec<String>,
}

impl CharCategory {
    /// Creates a new instance from `char.def`.
    ///
    /// Class ids follow the order of definition, except that
    /// [`DEFAULT_CLASS`] always takes id zero. When a range lists several
    /// classes, the first one is assigned. Later ranges override earlier ones.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut class_ids = HashMap::new();
        let mut class_names = vec![DEFAULT_CLASS.to_string()];
        let mut defs: Vec<Option<ClassDef>> = vec![None];
        let mut char_ranges = vec![];

        class_ids.insert(DEFAULT_CLASS.to_string(), DEFAULT_CLASS_ID);

        let reader = BufReader::new(rdr);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("0x") {
                char_ranges.push(Self::parse_char_range(line)?);
                continue;
            }

            let (name, def) = Self::parse_class_def(line)?;
            let id = match class_ids.get(&name) {
                Some(&id) => id,
                None => {
                    let id = u8::try_from(class_names.len()).map_err(|_| {
                        SumomoError::invalid_format(NAME, "At most 256 classes can be defined.")
                    })?;
                    class_ids.insert(name.clone(), id);
                    class_names.push(name);
                    defs.push(None);
                    id
                }
            };
            defs[usize::from(id)] = Some(def);
        }

        let mut invoke = Vec::with_capacity(defs.len());
        let mut group = Vec::with_capacity(defs.len());
        let mut length = Vec::with_capacity(defs.len());
        for (name, def) in class_names.iter().zip(&defs) {
            let def = def.as_ref().ok_or_else(|| {
                SumomoError::invalid_format(NAME, format!("{name} must be defined."))
            })?;
            invoke.push(def.invoke);
            group.push(def.group);
            length.push(def.length);
        }

        let mut categories = vec![DEFAULT_CLASS_ID; NUM_BMP_CHARS];
        for r in &char_ranges {
            let mut assigned = None;
            for name in &r.classes {
                let id = class_ids.get(name).copied().ok_or_else(|| {
                    let msg = format!("Undefined category: {name}");
                    SumomoError::invalid_format(NAME, msg)
                })?;
                assigned.get_or_insert(id);
            }
            if let Some(id) = assigned {
                categories[r.start..r.end].fill(id);
            }
        }

        tracing::debug!(
            num_classes = class_names.len(),
            num_ranges = char_ranges.len(),
            "loaded the character definition"
        );
        let cate = Self {
            class_names,
            categories,
            invoke,
            group,
            length,
        };
        cate.verify()?;
        Ok(cate)
    }

    fn parse_class_def(line: &str) -> Result<(String, ClassDef)> {
        let cols: Vec<_> = line.split_whitespace().collect();
        if cols.len() < 4 {
            let msg = format!(
                "A character category must consist of four items separated by spaces, {line}",
            );
            return Err(SumomoError::invalid_format(NAME, msg));
        }

        let flag = |col: &str, what: &str| match col {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(SumomoError::invalid_format(
                NAME,
                format!("{what} must be 1 or 0, {line}"),
            )),
        };
        let invoke = flag(cols[1], "INVOKE")?;
        let group = flag(cols[2], "GROUP")?;
        let length = cols[3].parse().map_err(|e| {
            SumomoError::invalid_format(NAME, format!("Invalid LENGTH: {e}, {line}"))
        })?;

        Ok((
            cols[0].to_string(),
            ClassDef {
                invoke,
                group,
                length,
            },
        ))
    }

    fn parse_char_range(line: &str) -> Result<CharRange> {
        let cols: Vec<_> = line
            .split_whitespace()
            .take_while(|col| !col.starts_with('#'))
            .collect();
        if cols.len() < 2 {
            let msg = format!("A character range must have two items at least, {line}");
            return Err(SumomoError::invalid_format(NAME, msg));
        }

        let parse_hex = |s: &str| {
            usize::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| {
                SumomoError::invalid_format(NAME, format!("Invalid code point: {e}, {line}"))
            })
        };
        let (start, end) = match cols[0].split_once("..") {
            Some((s, e)) => (parse_hex(s)?, parse_hex(e)? + 1),
            None => {
                let s = parse_hex(cols[0])?;
                (s, s + 1)
            }
        };
        if start >= end {
            let msg =
                format!("The start of a character range must be no more than the end, {line}");
            return Err(SumomoError::invalid_format(NAME, msg));
        }
        if end > NUM_BMP_CHARS {
            let msg = format!("A character range must be no more than 0xFFFF, {line}");
            return Err(SumomoError::invalid_format(NAME, msg));
        }

        Ok(CharRange {
            start,
            end,
            classes: cols[1..].iter().map(|c| c.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let data = "DEFAULT 0 1 0\nSPACE 0 1 0\n0x0020 SPACE";
        let cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(cate.class_of(' '), 1);
        assert_eq!(cate.class_of('a'), 0);
        let info = cate.char_info(' ');
        assert!(!info.invoke);
        assert!(info.group);
        assert_eq!(info.length, 0);
        assert_eq!(cate.class_name(1), Some("SPACE"));
        assert_eq!(cate.class_id("SPACE"), Some(1));
    }

    #[test]
    fn test_default_first() {
        let data = "ALPHA 1 1 0\nDEFAULT 0 1 0\n0x0041..0x005A ALPHA";
        let cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(cate.class_id("DEFAULT"), Some(0));
        assert_eq!(cate.class_id("ALPHA"), Some(1));
        assert_eq!(cate.class_of('A'), 1);
        assert!(cate.char_info('Z').invoke);
    }

    #[test]
    fn test_first_class_wins() {
        let data = "DEFAULT 0 1 0
KANJI 0 0 2
KANJINUMERIC 1 1 0
0x4E00..0x9FFF KANJI
0x4E00 KANJINUMERIC KANJI  # 一
";
        let cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(cate.class_of('一'), 2);
        assert_eq!(cate.class_of('丁'), 1);
    }

    #[test]
    fn test_comments() {
        let data = "# comment\nDEFAULT 0 1 0 # mandatory\n\nSPACE 0 1 0\n0x0020 SPACE # space";
        let cate = CharCategory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(cate.class_of(' '), 1);
    }

    #[test]
    fn test_invalid_cate() {
        let data = "DEFAULT 0 1 0\n0x0..0xFFFF INVALID";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_compat_cate() {
        let data = "DEFAULT 0 1 0\n0x0..0xFFFF DEFAULT INVALID";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_no_default_cate() {
        let data = "USER_DEFINED 0 1 0";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_invoke() {
        let data = "DEFAULT 2 1 0";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_group() {
        let data = "DEFAULT 0 2 0";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_length() {
        let data = "DEFAULT 0 1 -1";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_few_cols() {
        let data = "DEFAULT 0 2";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_char_range_1() {
        let data = "DEFAULT 0 1 0\n0x10000 DEFAULT";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_char_range_2() {
        let data = "DEFAULT 0 1 0\n0x0..0xFFFF DEFAULT";
        CharCategory::from_reader(data.as_bytes()).unwrap();
    }

    #[test]
    fn test_char_range_3() {
        let data = "DEFAULT 0 1 0\n0x0..0x10000 DEFAULT";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_char_range_4() {
        let data = "DEFAULT 0 1 0\n0x0020..0x0019 DEFAULT";
        let result = CharCategory::from_reader(data.as_bytes());
        assert!(result.is_err());
    }
}
