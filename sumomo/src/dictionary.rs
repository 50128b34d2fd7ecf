//! Dictionary for tokenization.
pub(crate) mod archive;
pub(crate) mod builder;
pub(crate) mod character;
pub(crate) mod connector;
pub(crate) mod lazy;
pub(crate) mod lexicon;
pub(crate) mod unknown;
pub(crate) mod user;

use crate::errors::Result;

pub use archive::{
    CHARDEF_MEMBER, CONNECTION_MEMBER, INDEX_MEMBER, MEMBER_NAMES, MORPH_MEMBER, UNK_MEMBER,
};
pub use builder::{SourceEncoding, SourceFormat, SystemDictionaryBuilder};
pub use character::{CharCategory, CharInfo};
pub use connector::ConnectionTable;
pub use lazy::LazyDictionary;
pub use lexicon::{Lexicon, Morph, RawWordEntry};
pub use unknown::UnkHandler;
pub use user::{UserDict, UserDictRecord};

/// System dictionary for tokenization.
///
/// An instance is immutable and can be shared among threads.
#[derive(Debug, Clone)]
pub struct Dictionary {
    lexicon: Lexicon,
    connector: ConnectionTable,
    char_cate: CharCategory,
    unk_handler: UnkHandler,
}

impl Dictionary {
    /// Creates a new instance from its components.
    ///
    /// # Errors
    ///
    /// [`SumomoError`](crate::errors::SumomoError) is returned when a table
    /// has an invalid shape or a context id is out of the connection table.
    pub fn new(
        lexicon: Lexicon,
        connector: ConnectionTable,
        char_cate: CharCategory,
        unk_handler: UnkHandler,
    ) -> Result<Self> {
        connector.verify()?;
        char_cate.verify()?;
        lexicon.verify(&connector)?;
        unk_handler.verify(&char_cate, &connector)?;
        Ok(Self {
            lexicon,
            connector,
            char_cate,
            unk_handler,
        })
    }

    /// Gets the reference to the system lexicon.
    #[inline(always)]
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Gets the reference to the connection matrix.
    #[inline(always)]
    pub const fn connector(&self) -> &ConnectionTable {
        &self.connector
    }

    /// Gets the reference to the character categories.
    #[inline(always)]
    pub const fn char_cate(&self) -> &CharCategory {
        &self.char_cate
    }

    /// Gets the reference to the handler of unknown words.
    #[inline(always)]
    pub const fn unk_handler(&self) -> &UnkHandler {
        &self.unk_handler
    }
}
