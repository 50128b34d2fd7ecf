//! # Sumomo
//!
//! Sumomo is a dictionary-driven Japanese morphological analyzer. It splits
//! text into words by finding the minimum-cost path over a lattice of
//! candidate words, in the manner of MeCab.
//!
//! ## Examples
//!
//! ```
//! use sumomo::dictionary::SystemDictionaryBuilder;
//! use sumomo::{Mode, Tokenizer};
//!
//! let lexicon_csv = "京都,1,1,2000,名詞,固有名詞,地域,一般,*,*,京都,キョウト,キョート
//! 東,1,1,4000,名詞,一般,*,*,*,*,東,ヒガシ,ヒガシ
//! 東京,1,1,2500,名詞,固有名詞,地域,一般,*,*,東京,トウキョウ,トーキョー
//! 都,1,1,3000,名詞,接尾,地域,*,*,*,都,ト,ト";
//! let matrix_def = "2 2\n0 0 0\n0 1 0\n1 0 0\n1 1 500";
//! let char_def = "DEFAULT 0 1 0";
//! let unk_def = "DEFAULT,1,1,5000,名詞,一般,*,*,*,*,*";
//!
//! let dict = SystemDictionaryBuilder::from_readers(
//!     lexicon_csv.as_bytes(),
//!     matrix_def.as_bytes(),
//!     char_def.as_bytes(),
//!     unk_def.as_bytes(),
//! )?;
//!
//! let tokenizer = Tokenizer::new(dict).omit_bos_eos(true);
//! let tokens = tokenizer.analyze("東京都", Mode::Normal);
//!
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[0].surface(), "東京");
//! assert_eq!(tokens[0].reading(), Some("トウキョウ"));
//! assert_eq!(tokens[1].surface(), "都");
//! assert_eq!(tokens[1].range_char(), 2..3);
//! # Ok::<(), sumomo::errors::SumomoError>(())
//! ```
#![deny(missing_docs)]

#[cfg(target_pointer_width = "16")]
compile_error!("`target_pointer_width` must be larger than or equal to 32");

pub mod common;
pub mod dictionary;
pub mod double_array;
pub mod errors;
mod sentence;
pub mod token;
pub mod tokenizer;
mod utils;

#[cfg(test)]
mod tests;

pub use dictionary::{Dictionary, UserDict};
pub use token::{Token, TokenClass};
pub use tokenizer::{Mode, Tokenizer};
