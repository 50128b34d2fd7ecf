use std::collections::BTreeMap;
use std::io::Read;

use crate::dictionary::character::CharCategory;
use crate::dictionary::lexicon::{ColumnSpec, Lexicon};
use crate::dictionary::unknown::UnkHandler;
use crate::errors::{Result, SumomoError};

const NAME: &str = "unk.def";

impl UnkHandler {
    /// Creates a new instance from `unk.def`, whose rows are in the lexicon
    /// format with a class name as the surface.
    pub fn from_reader<R>(mut rdr: R, char_cate: &CharCategory) -> Result<Self>
    where
        R: Read,
    {
        let mut text = String::new();
        rdr.read_to_string(&mut text)?;
        Self::from_text(&text, char_cate, ColumnSpec::AtLeast(4))
    }

    pub(crate) fn from_text(
        text: &str,
        char_cate: &CharCategory,
        spec: ColumnSpec,
    ) -> Result<Self> {
        let mut rows = vec![];
        for item in Lexicon::parse_csv(text, NAME, spec)? {
            let class = char_cate.class_id(&item.surface).ok_or_else(|| {
                let msg = format!("Undefined category: {}", item.surface);
                SumomoError::invalid_format(NAME, msg)
            })?;
            rows.push((class, item));
        }
        rows.sort_by_key(|(class, _)| *class);

        let mut index = BTreeMap::new();
        let mut index_dup = BTreeMap::new();
        let mut morphs = Vec::with_capacity(rows.len());
        let mut contents = Vec::with_capacity(rows.len());
        for (i, (class, item)) in rows.into_iter().enumerate() {
            if index.contains_key(&class) {
                *index_dup.entry(class).or_insert(0) += 1;
            } else {
                index.insert(class, u32::try_from(i)?);
            }
            morphs.push(item.morph);
            contents.push(item.contents);
        }
        tracing::debug!(
            num_templates = morphs.len(),
            num_classes = index.len(),
            "loaded the unknown word definition"
        );

        Ok(Self {
            morphs,
            index,
            index_dup,
            contents,
        })
    }
}
