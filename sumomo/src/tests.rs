mod properties;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::dictionary::{SourceFormat, SystemDictionaryBuilder, UserDict};
use crate::Dictionary;

const LEX_CSV: &str = include_str!("./tests/resources/lex.csv");
const USER_CSV: &str = include_str!("./tests/resources/user.csv");
const MATRIX_DEF: &str = include_str!("./tests/resources/matrix.def");
const CHAR_DEF: &str = include_str!("./tests/resources/char.def");
const UNK_DEF: &str = include_str!("./tests/resources/unk.def");

static DICT: Lazy<Arc<Dictionary>> = Lazy::new(|| Arc::new(build_dict()));

fn build_dict() -> Dictionary {
    SystemDictionaryBuilder::new()
        .format(SourceFormat::Ipa)
        .build_from_readers(
            LEX_CSV.as_bytes(),
            MATRIX_DEF.as_bytes(),
            CHAR_DEF.as_bytes(),
            UNK_DEF.as_bytes(),
        )
        .unwrap()
}

fn shared_dict() -> Arc<Dictionary> {
    Arc::clone(&DICT)
}

fn user_dict() -> UserDict {
    UserDict::from_reader(USER_CSV.as_bytes()).unwrap()
}
