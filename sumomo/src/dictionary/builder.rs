use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;

use crate::dictionary::character::CharCategory;
use crate::dictionary::connector::ConnectionTable;
use crate::dictionary::lexicon::{ColumnSpec, Lexicon};
use crate::dictionary::unknown::UnkHandler;
use crate::dictionary::Dictionary;
use crate::errors::{Result, SumomoError};

/// Character encoding of dictionary sources.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SourceEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// EUC-JP.
    EucJp,
    /// Shift_JIS.
    ShiftJis,
    /// ISO-2022-JP.
    Iso2022Jp,
}

impl SourceEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::EucJp => encoding_rs::EUC_JP,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::Iso2022Jp => encoding_rs::ISO_2022_JP,
        }
    }

    /// Decodes a whole source file, failing on malformed sequences.
    pub fn decode(self, bytes: &[u8], name: &str) -> Result<String> {
        let (text, had_errors) = self.encoding().decode_without_bom_handling(bytes);
        if had_errors {
            let msg = format!("Malformed {} sequence", self.encoding().name());
            return Err(SumomoError::invalid_format(name, msg));
        }
        Ok(text.into_owned())
    }
}

impl FromStr for SourceEncoding {
    type Err = SumomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "eucjp" | "euc-jp" => Ok(Self::EucJp),
            "sjis" | "shift_jis" => Ok(Self::ShiftJis),
            "jis" | "iso-2022-jp" => Ok(Self::Iso2022Jp),
            _ => Err(SumomoError::invalid_argument(
                "encoding",
                format!("Unknown encoding: {s}, expected utf8, eucjp, sjis or jis"),
            )),
        }
    }
}

/// Layout of dictionary sources.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SourceFormat {
    /// IPADIC, whose lexicon rows have 13 columns and `unk.def` rows 11.
    Ipa,
    /// Any MeCab dictionary, whose rows have four columns at least.
    #[default]
    Generic,
}

impl SourceFormat {
    const fn lexicon_columns(self) -> ColumnSpec {
        match self {
            Self::Ipa => ColumnSpec::Exact(13),
            Self::Generic => ColumnSpec::AtLeast(4),
        }
    }

    const fn unk_columns(self) -> ColumnSpec {
        match self {
            Self::Ipa => ColumnSpec::Exact(11),
            Self::Generic => ColumnSpec::AtLeast(4),
        }
    }
}

impl FromStr for SourceFormat {
    type Err = SumomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipa" => Ok(Self::Ipa),
            "mecab" | "generic" => Ok(Self::Generic),
            _ => Err(SumomoError::invalid_argument(
                "format",
                format!("Unknown format: {s}, expected ipa or mecab"),
            )),
        }
    }
}

/// Builder of a [`Dictionary`] from MeCab-format sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDictionaryBuilder {
    encoding: SourceEncoding,
    format: SourceFormat,
}

impl SystemDictionaryBuilder {
    /// Creates a builder for UTF-8 sources in the generic layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encoding of the sources.
    pub const fn encoding(mut self, encoding: SourceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the layout of the sources.
    pub const fn format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Creates a new instance from UTF-8 readers in the generic MeCab format.
    ///
    /// # Arguments
    ///
    ///  - `lexicon_rdr`: A reader of a lexicon file `*.csv`.
    ///  - `matrix_rdr`: A reader of matrix file `matrix.def`.
    ///  - `char_def_rdr`: A reader of character definition file `char.def`.
    ///  - `unk_def_rdr`: A reader of unknown definition file `unk.def`.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when an input format is invalid.
    pub fn from_readers<S, C, P, U>(
        lexicon_rdr: S,
        matrix_rdr: C,
        char_def_rdr: P,
        unk_def_rdr: U,
    ) -> Result<Dictionary>
    where
        S: Read,
        C: Read,
        P: Read,
        U: Read,
    {
        Self::new().build_from_readers(lexicon_rdr, matrix_rdr, char_def_rdr, unk_def_rdr)
    }

    /// Builds a dictionary from readers with the configured encoding and
    /// layout.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when an input format is invalid.
    pub fn build_from_readers<S, C, P, U>(
        &self,
        lexicon_rdr: S,
        matrix_rdr: C,
        char_def_rdr: P,
        unk_def_rdr: U,
    ) -> Result<Dictionary>
    where
        S: Read,
        C: Read,
        P: Read,
        U: Read,
    {
        let lexicon = self.read_source(lexicon_rdr, "lex.csv")?;
        let matrix = self.read_source(matrix_rdr, "matrix.def")?;
        let char_def = self.read_source(char_def_rdr, "char.def")?;
        let unk_def = self.read_source(unk_def_rdr, "unk.def")?;
        self.build(&[("lex.csv".to_string(), lexicon)], &matrix, &char_def, &unk_def)
    }

    /// Builds a dictionary from a MeCab source directory holding `*.csv`,
    /// `matrix.def`, `char.def` and `unk.def`.
    ///
    /// Lexicon files are read in the order of their names.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when a file is missing or malformed.
    pub fn build_from_dir<P>(&self, dir: P) -> Result<Dictionary>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let mut csv_paths = vec![];
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "csv") {
                csv_paths.push(path);
            }
        }
        csv_paths.sort();
        if csv_paths.is_empty() {
            let msg = format!("No lexicon file *.csv is found in {}", dir.display());
            return Err(SumomoError::invalid_argument("dir", msg));
        }

        let mut lexicons = vec![];
        for path in &csv_paths {
            let name = path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            tracing::debug!(file = %path.display(), "reading a lexicon file");
            let text = self.read_source(fs::File::open(path)?, &name)?;
            lexicons.push((name, text));
        }
        let matrix = self.read_source(fs::File::open(dir.join("matrix.def"))?, "matrix.def")?;
        let char_def = self.read_source(fs::File::open(dir.join("char.def"))?, "char.def")?;
        let unk_def = self.read_source(fs::File::open(dir.join("unk.def"))?, "unk.def")?;
        self.build(&lexicons, &matrix, &char_def, &unk_def)
    }

    fn read_source<R>(&self, mut rdr: R, name: &str) -> Result<String>
    where
        R: Read,
    {
        let mut buf = vec![];
        rdr.read_to_end(&mut buf)?;
        self.encoding.decode(&buf, name)
    }

    fn build(
        &self,
        lexicons: &[(String, String)],
        matrix: &str,
        char_def: &str,
        unk_def: &str,
    ) -> Result<Dictionary> {
        let mut entries = vec![];
        for (name, text) in lexicons {
            let mut parsed = Lexicon::parse_csv(text, name, self.format.lexicon_columns())?;
            tracing::info!(file = %name, num_records = parsed.len(), "parsed a lexicon file");
            entries.append(&mut parsed);
        }
        let num_records = entries.len();
        let lexicon = Lexicon::from_entries(entries)?;
        let connector = ConnectionTable::from_reader(matrix.as_bytes())?;
        let char_cate = CharCategory::from_reader(char_def.as_bytes())?;
        let unk_handler = UnkHandler::from_text(unk_def, &char_cate, self.format.unk_columns())?;
        tracing::info!(
            num_records,
            num_rows = connector.num_rows(),
            num_cols = connector.num_cols(),
            num_classes = char_cate.num_classes(),
            num_unk_templates = unk_handler.len(),
            "built the system dictionary"
        );
        Dictionary::new(lexicon, connector, char_cate, unk_handler)
    }
}
