use crate::PersistError;
use crate::records::{NodeContentRecord, StateRecord};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

/// Magic prefix of node content files, versioned.
const CONTENT_MAGIC: &[u8; 8] = b"SKEINCT1";

/// Write a state record as pretty JSON.
pub fn write_state(path: impl AsRef<Path>, state: &StateRecord) -> Result<(), PersistError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, state)?;
    Ok(())
}

/// Read a state record. Missing fields default; only unreadable files or
/// invalid JSON fail.
pub fn read_state(path: impl AsRef<Path>) -> Result<StateRecord, PersistError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// Write node content: magic, sha256 of the compressed payload, payload
/// (zstd-compressed CBOR).
pub fn write_node_content(
    path: impl AsRef<Path>,
    content: &NodeContentRecord,
) -> Result<(), PersistError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let cbor = cbor_serialize(content)?;
    let compressed = zstd_compress(&cbor)?;
    let digest = sha256(&compressed);

    let mut out = Vec::with_capacity(CONTENT_MAGIC.len() + digest.len() + compressed.len());
    out.extend_from_slice(CONTENT_MAGIC);
    out.extend_from_slice(&digest);
    out.extend_from_slice(&compressed);
    std::fs::write(path, out)?;
    Ok(())
}

/// Read node content back, verifying the digest. A mismatch is
/// [`PersistError::Corrupt`] — a truncated or flipped-bit file must never
/// load as a quietly wrong world.
pub fn read_node_content(path: impl AsRef<Path>) -> Result<NodeContentRecord, PersistError> {
    let data = std::fs::read(path)?;
    if data.len() < CONTENT_MAGIC.len() + 32 || &data[..CONTENT_MAGIC.len()] != CONTENT_MAGIC {
        return Err(PersistError::BadHeader);
    }
    let (header, payload) = data.split_at(CONTENT_MAGIC.len() + 32);
    let expected = &header[CONTENT_MAGIC.len()..];
    let actual = sha256(payload);
    if expected != actual {
        return Err(PersistError::Corrupt {
            expected: hex(expected),
            actual: hex(&actual),
        });
    }
    let cbor = zstd_decompress(payload)?;
    cbor_deserialize(&cbor)
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| PersistError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, PersistError> {
    ciborium::from_reader(data).map_err(|e| PersistError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{LayerRecord, WorldRecord};

    #[test]
    fn state_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.state.json");

        let state = StateRecord {
            render_debug: true,
            ..StateRecord::default()
        };
        write_state(&path, &state).unwrap();
        let back = read_state(&path).unwrap();
        assert!(back.render_debug);
    }

    #[test]
    fn content_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hub.node");

        let content = NodeContentRecord {
            layers: vec![LayerRecord {
                name: "ground".into(),
                depth: 1.0,
                active: true,
                world: WorldRecord::default(),
            }],
        };
        write_node_content(&path, &content).unwrap();
        let back = read_node_content(&path).unwrap();
        assert_eq!(back.layers.len(), 1);
        assert_eq!(back.layers[0].name, "ground");
    }

    #[test]
    fn corrupt_content_is_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hub.node");
        write_node_content(&path, &NodeContentRecord::default()).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        std::fs::write(&path, &data).unwrap();

        match read_node_content(&path) {
            Err(PersistError::Corrupt { .. }) => {}
            other => panic!("expected corruption error, got {other:?}"),
        }
    }

    #[test]
    fn foreign_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("not_content");
        std::fs::write(&path, b"definitely not a content file").unwrap();
        assert!(matches!(
            read_node_content(&path),
            Err(PersistError::BadHeader)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_node_content(tmp.path().join("absent.node")),
            Err(PersistError::Io(_))
        ));
    }
}
