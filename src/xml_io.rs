// Reading and writing the XML documents used for splines and path lengths
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>";

/// Serialize `doc` with two-space indentation and write it to `path`.
pub(crate) fn write_xml<T: Serialize>(path: &Path, doc: &T) -> Result<(), PersistenceError> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    doc.serialize(serializer).map_err(|e| PersistenceError::Xml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let text = format!("{}\n{}\n", XML_DECLARATION, body);
    fs::write(path, text).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_xml<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    quick_xml::de::from_str(&text).map_err(|e| PersistenceError::Xml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
