//! Common settings in Sumomo.
use bincode::config::{self, Fixint, LittleEndian};

/// Context id of BOS and EOS.
pub const BOS_EOS_CONNECTION_ID: i16 = 0;

/// Gets the common bincode configuration of serialization.
pub const fn bincode_config() -> config::Configuration<LittleEndian, Fixint> {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}
