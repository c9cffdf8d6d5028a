//! Path encoding for the worker protocol.
//!
//! Paths that are valid UTF-8 travel as JSON strings. Anything else travels
//! as an array of raw bytes on unix, so a directory with an odd name does not
//! take the rest of its chunk down with it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(untagged)]
enum PathRef<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Text(String),
    Bytes(Vec<u8>),
}

fn encode(path: &Path) -> Option<PathRef<'_>> {
    match path.to_str() {
        Some(text) => Some(PathRef::Text(text)),
        None => raw_bytes(path).map(PathRef::Bytes),
    }
}

fn decode(repr: PathRepr) -> Result<PathBuf, String> {
    match repr {
        PathRepr::Text(text) => Ok(PathBuf::from(text)),
        PathRepr::Bytes(bytes) => from_raw_bytes(bytes),
    }
}

#[cfg(unix)]
fn raw_bytes(path: &Path) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn raw_bytes(_: &Path) -> Option<&[u8]> {
    None
}

#[cfg(unix)]
fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    String::from_utf8(bytes)
        .map(PathBuf::from)
        .map_err(|e| format!("path is not valid UTF-8: {e}"))
}

fn unencodable(path: &Path) -> String {
    format!("path {} cannot be encoded on this platform", path.display())
}

/// `#[serde(with = "crate::wire::path")]` for a single `PathBuf`.
pub mod path {
    use std::path::{Path, PathBuf};

    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{PathRepr, decode, encode, unencodable};

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        encode(path)
            .ok_or_else(|| S::Error::custom(unencodable(path)))?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        decode(PathRepr::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// `#[serde(with = "crate::wire::paths")]` for a `Vec<PathBuf>`.
pub mod paths {
    use std::path::PathBuf;

    use serde::de::Error as _;
    use serde::ser::{Error as _, SerializeSeq};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{PathRepr, decode, encode, unencodable};

    pub fn serialize<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(paths.len()))?;
        for path in paths {
            let encoded = encode(path).ok_or_else(|| S::Error::custom(unencodable(path)))?;
            seq.serialize_element(&encoded)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<PathBuf>, D::Error> {
        Vec::<PathRepr>::deserialize(deserializer)?
            .into_iter()
            .map(decode)
            .collect::<Result<_, _>>()
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "path")]
        one: PathBuf,
        #[serde(with = "paths")]
        many: Vec<PathBuf>,
    }

    #[test]
    fn test_utf8_paths_stay_strings() {
        let holder = Holder {
            one: PathBuf::from("/a/b"),
            many: vec![PathBuf::from("/c"), PathBuf::from("/d é")],
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"one":"/a/b","many":["/c","/d é"]}"#);
        assert_eq!(serde_json::from_str::<Holder>(&json).unwrap(), holder);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_survives() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let odd = PathBuf::from(OsStr::from_bytes(b"/tmp/bad\xff"));
        let holder = Holder {
            one: odd.clone(),
            many: vec![PathBuf::from("/good"), odd.clone()],
        };

        let json = serde_json::to_string(&holder).unwrap();
        assert!(json.contains(r#""/good""#), "{json}");
        assert!(json.contains("255"), "{json}");

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.one, odd);
        assert_eq!(back.many[1], odd);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<Holder>(r#"{"one":7,"many":[]}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"one":"/x","many":[true]}"#).is_err());
    }
}
