//! Model descriptor consumed by the entry/index manager (§6).
//!
//! The core never defines record fields or indexes itself; a caller hands
//! it a [ModelDescriptor] naming the sub-databases to use and which entry
//! fields are indexed. This is the Rust rendering of the source's
//! model/schema declaration layer, which is deliberately out of scope here.

use std::{collections::BTreeMap, ffi::OsString};

use crate::serializer::IndexSerializer;

/// One declared secondary index: the entry field it is keyed on, the
/// serializer that turns that field's value into the index's sortable
/// key, and whether every live entry must carry that field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDecl {
    pub field: String,
    pub serializer: IndexSerializer,
    pub mandatory: bool,
}

/// Static description of the sub-databases and indexes an [crate::Engine]
/// should maintain (§6).
#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub model_name: String,
    pub config_db_name: String,
    pub entries_db_name: String,
    pub checkpoints_db_name: String,
    pub data_env_directory: OsString,
    pub readers_env_directory: OsString,
    /// Expanded with `{model}` and `{index_name}` to produce an index
    /// sub-database name.
    pub index_db_format: String,
    pub indexes: BTreeMap<String, IndexDecl>,
}

impl ModelDescriptor {
    pub fn new(model_name: &str) -> ModelDescriptor {
        ModelDescriptor {
            model_name: model_name.to_string(),
            config_db_name: "config".to_string(),
            entries_db_name: "entries".to_string(),
            checkpoints_db_name: "checkpoints".to_string(),
            data_env_directory: OsString::from("data"),
            readers_env_directory: OsString::from("readers"),
            index_db_format: "{model}.{index_name}".to_string(),
            indexes: BTreeMap::new(),
        }
    }

    pub fn with_index(
        mut self,
        index_name: &str,
        field: &str,
        serializer: IndexSerializer,
        mandatory: bool,
    ) -> ModelDescriptor {
        self.indexes.insert(
            index_name.to_string(),
            IndexDecl {
                field: field.to_string(),
                serializer,
                mandatory,
            },
        );
        self
    }

    pub fn set_data_env_directory(mut self, dir: &str) -> ModelDescriptor {
        self.data_env_directory = OsString::from(dir);
        self
    }

    pub fn set_readers_env_directory(mut self, dir: &str) -> ModelDescriptor {
        self.readers_env_directory = OsString::from(dir);
        self
    }

    /// Expand [ModelDescriptor::index_db_format] for a declared index.
    pub fn index_db_name(&self, index_name: &str) -> String {
        self.index_db_format
            .replace("{model}", &self.model_name)
            .replace("{index_name}", index_name)
    }
}

#[cfg(test)]
mod model_test {
    use super::*;

    #[test]
    fn test_index_db_name_expansion() {
        let model =
            ModelDescriptor::new("events").with_index("by_kind", "kind", IndexSerializer::Text, true);
        assert_eq!(model.index_db_name("by_kind"), "events.by_kind");
    }

    #[test]
    fn test_defaults() {
        let model = ModelDescriptor::new("events");
        assert_eq!(model.config_db_name, "config");
        assert_eq!(model.entries_db_name, "entries");
        assert_eq!(model.checkpoints_db_name, "checkpoints");
        assert!(model.indexes.is_empty());
    }
}
