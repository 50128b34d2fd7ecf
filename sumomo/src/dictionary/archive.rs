use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::common::bincode_config;
use crate::dictionary::lexicon::{LexiconIndex, MorphStore};
use crate::dictionary::{CharCategory, ConnectionTable, Dictionary, Lexicon, UnkHandler};
use crate::errors::{Result, SumomoError};

/// Member holding the word parameters and features.
pub const MORPH_MEMBER: &str = "morph.dic";
/// Member holding the surface index.
pub const INDEX_MEMBER: &str = "index.dic";
/// Member holding the connection matrix.
pub const CONNECTION_MEMBER: &str = "connection.dic";
/// Member holding the character categories.
pub const CHARDEF_MEMBER: &str = "chardef.dic";
/// Member holding the unknown word templates.
pub const UNK_MEMBER: &str = "unk.dic";

/// Names of all the members of a dictionary artifact.
pub const MEMBER_NAMES: [&str; 5] = [
    MORPH_MEMBER,
    INDEX_MEMBER,
    CONNECTION_MEMBER,
    CHARDEF_MEMBER,
    UNK_MEMBER,
];

#[derive(Default)]
struct Members {
    store: Option<MorphStore>,
    index: Option<LexiconIndex>,
    connector: Option<ConnectionTable>,
    char_cate: Option<CharCategory>,
    unk_handler: Option<UnkHandler>,
}

impl Members {
    /// Decodes a member if the name is known, returning whether it was.
    fn decode<R>(&mut self, name: &str, rdr: &mut R) -> Result<bool>
    where
        R: Read,
    {
        let config = bincode_config();
        let wrap = |e: bincode::error::DecodeError| {
            SumomoError::invalid_format(name, format!("Broken member: {e}"))
        };
        match name {
            MORPH_MEMBER => {
                self.store = Some(bincode::decode_from_std_read(rdr, config).map_err(wrap)?);
            }
            INDEX_MEMBER => {
                self.index = Some(bincode::decode_from_std_read(rdr, config).map_err(wrap)?);
            }
            CONNECTION_MEMBER => {
                self.connector = Some(bincode::decode_from_std_read(rdr, config).map_err(wrap)?);
            }
            CHARDEF_MEMBER => {
                self.char_cate = Some(bincode::decode_from_std_read(rdr, config).map_err(wrap)?);
            }
            UNK_MEMBER => {
                self.unk_handler =
                    Some(bincode::decode_from_std_read(rdr, config).map_err(wrap)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(self) -> Result<Dictionary> {
        let missing = |name: &str| {
            SumomoError::invalid_format(name, "The member is missing in the dictionary.")
        };
        let store = self.store.ok_or_else(|| missing(MORPH_MEMBER))?;
        let index = self.index.ok_or_else(|| missing(INDEX_MEMBER))?;
        let connector = self.connector.ok_or_else(|| missing(CONNECTION_MEMBER))?;
        let char_cate = self.char_cate.ok_or_else(|| missing(CHARDEF_MEMBER))?;
        let unk_handler = self.unk_handler.ok_or_else(|| missing(UNK_MEMBER))?;
        Dictionary::new(
            Lexicon::from_parts(index, store),
            connector,
            char_cate,
            unk_handler,
        )
    }
}

impl Dictionary {
    /// Exports the dictionary as a zip archive of the members.
    ///
    /// # Errors
    ///
    /// When bincode or zip generates an error, it will be returned as is.
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write + Seek,
    {
        let mut zip = ZipWriter::new(wtr);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for name in MEMBER_NAMES {
            zip.start_file(name, options)?;
            let num_bytes = self.write_member(name, &mut zip)?;
            tracing::debug!(member = name, num_bytes, "wrote a member");
        }
        zip.finish()?;
        Ok(())
    }

    /// Exports the dictionary as member files in a directory, which is
    /// created if needed.
    ///
    /// # Errors
    ///
    /// When bincode or the file system generates an error, it will be
    /// returned as is.
    pub fn write_dir<P>(&self, dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for name in MEMBER_NAMES {
            let mut wtr = BufWriter::new(File::create(dir.join(name))?);
            let num_bytes = self.write_member(name, &mut wtr)?;
            wtr.flush()?;
            tracing::debug!(member = name, num_bytes, "wrote a member");
        }
        Ok(())
    }

    /// Creates a dictionary from a zip archive.
    ///
    /// Members may appear in any order, and unknown members are ignored.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when a member is missing, truncated, or
    /// inconsistent with the others.
    pub fn read<R>(rdr: R) -> Result<Self>
    where
        R: Read + Seek,
    {
        let mut archive = ZipArchive::new(rdr)?;
        let mut members = Members::default();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if !members.decode(&name, &mut file)? {
                tracing::debug!(member = %name, "ignored an unknown member");
            }
        }
        members.finish()
    }

    /// Creates a dictionary from a directory of member files.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when a member is missing, truncated, or
    /// inconsistent with the others.
    pub fn read_dir<P>(dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let mut members = Members::default();
        for name in MEMBER_NAMES {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let mut rdr = BufReader::new(File::open(path)?);
            members.decode(name, &mut rdr)?;
        }
        members.finish()
    }

    /// Creates a dictionary from a path, which is either a zip archive or a
    /// directory of member files.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when the dictionary cannot be read.
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if path.is_dir() {
            Self::read_dir(path)
        } else {
            Self::read(BufReader::new(File::open(path)?))
        }
    }

    fn write_member<W>(&self, name: &str, wtr: &mut W) -> Result<usize>
    where
        W: Write,
    {
        let config = bincode_config();
        let num_bytes = match name {
            MORPH_MEMBER => bincode::encode_into_std_write(self.lexicon.store(), wtr, config)?,
            INDEX_MEMBER => bincode::encode_into_std_write(self.lexicon.index(), wtr, config)?,
            CONNECTION_MEMBER => bincode::encode_into_std_write(&self.connector, wtr, config)?,
            CHARDEF_MEMBER => bincode::encode_into_std_write(&self.char_cate, wtr, config)?,
            UNK_MEMBER => bincode::encode_into_std_write(&self.unk_handler, wtr, config)?,
            _ => {
                return Err(SumomoError::invalid_argument(
                    "name",
                    format!("Unknown member: {name}"),
                ))
            }
        };
        Ok(num_bytes)
    }
}
