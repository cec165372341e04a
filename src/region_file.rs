//! On-disk format of a single region.
//!
//! ```notrust
//! | magic "QMAP" | version u32 | payload length u32 | crc32 u32 | postcard payload |
//! ```
//!
//! All header integers are little endian. The payload is a node table in which every branch
//! refers to its children by index, and children always come before their parent. A subtree
//! shared by several branches in memory is written once, and is shared again once read back.

use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MapError;
use crate::error::Result;
use crate::quadtree::Node;
use crate::quadtree::Tree;

pub const REGION_MAGIC: &[u8; 4] = b"QMAP";
pub const REGION_FILE_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

/// `L` is `&T` when encoding and `T` when decoding.
#[derive(Serialize, Deserialize)]
enum StoredNode<L> {
    Leaf(L),
    Branch([u32; 4]),
}

#[derive(Serialize, Deserialize)]
struct RegionPayload<L> {
    root: u32,
    nodes: Vec<StoredNode<L>>,
}

/// Encode `tree` as a region file, header included.
pub fn encode<T: Serialize>(tree: &Tree<T>) -> Result<Vec<u8>> {
    let mut nodes = Vec::new();
    let mut seen = HashMap::new();

    let root = flatten(tree, &mut seen, &mut nodes)?;
    let payload = postcard::to_stdvec(&RegionPayload { root, nodes })?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(REGION_MAGIC);
    bytes.extend_from_slice(&REGION_FILE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&crc32(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);

    Ok(bytes)
}

/// Decode a region file produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Tree<T>> {
    let Some((header, payload)) = bytes.split_at_checked(HEADER_LEN) else {
        return Err(MapError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    };

    let word = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);

    if &header[0..4] != REGION_MAGIC {
        return Err(MapError::BadMagic {
            got: [header[0], header[1], header[2], header[3]],
        });
    }

    let version = word(4);
    if version != REGION_FILE_VERSION {
        return Err(MapError::UnsupportedVersion { version });
    }

    let len = word(8) as usize;
    if payload.len() != len {
        return Err(MapError::Truncated {
            expected: HEADER_LEN + len,
            found: bytes.len(),
        });
    }

    if crc32(payload) != word(12) {
        return Err(MapError::ChecksumMismatch);
    }

    let payload: RegionPayload<T> = postcard::from_bytes(payload)?;

    unflatten(payload)
}

/// Write `tree` to `path`, replacing any previous content. Missing parent directories are created.
pub fn write_region<T: Serialize>(path: &Path, tree: &Tree<T>) -> Result<()> {
    let bytes = encode(tree)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(MapError::io(parent))?;
        }
    }

    let file = File::create(path).map_err(MapError::io(path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).map_err(MapError::io(path))?;
    writer.flush().map_err(MapError::io(path))?;

    Ok(())
}

pub fn read_region<T: DeserializeOwned>(path: &Path) -> Result<Tree<T>> {
    let bytes = fs::read(path).map_err(MapError::io(path))?;

    decode(&bytes)
}

fn flatten<'a, T>(
    tree: &'a Tree<T>,
    seen: &mut HashMap<*const Node<T>, u32>,
    out: &mut Vec<StoredNode<&'a T>>,
) -> Result<u32> {
    let key = Rc::as_ptr(tree);
    if let Some(&id) = seen.get(&key) {
        return Ok(id);
    }

    let node = match &**tree {
        Node::Leaf(value) => StoredNode::Leaf(value),
        Node::Branch(children) => {
            let mut ids = [0; 4];
            for (id, child) in ids.iter_mut().zip(children) {
                *id = flatten(child, seen, out)?;
            }

            StoredNode::Branch(ids)
        }
        Node::Generator(lazy) => {
            return Err(MapError::Unmaterialized {
                origin: lazy.origin(),
                depth: lazy.depth(),
            });
        }
    };

    let id = out.len() as u32;
    out.push(node);
    seen.insert(key, id);

    Ok(id)
}

fn unflatten<T>(payload: RegionPayload<T>) -> Result<Tree<T>> {
    let mut built: Vec<Tree<T>> = Vec::with_capacity(payload.nodes.len());

    for node in payload.nodes {
        let id = built.len() as u32;

        let tree = match node {
            StoredNode::Leaf(value) => Node::leaf(value),
            StoredNode::Branch(ids) => {
                if let Some(&child) = ids.iter().find(|&&child| child >= id) {
                    return Err(MapError::DanglingNode { node: id, child });
                }

                Node::branch(ids.map(|child| Rc::clone(&built[child as usize])))
            }
        };

        built.push(tree);
    }

    built
        .get(payload.root as usize)
        .cloned()
        .ok_or(MapError::DanglingRoot {
            root: payload.root,
            nodes: built.len(),
        })
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::decode;
    use super::encode;
    use crate::error::MapError;
    use crate::quadtree::Node;
    use crate::quadtree::Tree;

    fn leaf_values(tree: &Tree<u16>, out: &mut Vec<u16>) {
        match &**tree {
            Node::Leaf(v) => out.push(*v),
            Node::Branch(children) => children.iter().for_each(|c| leaf_values(c, out)),
            Node::Generator(_) => panic!("decoded trees are materialized"),
        }
    }

    #[test]
    fn keeps_values_and_order() {
        let tree = Node::branch([
            Node::leaf(1u16),
            Node::leaf(2),
            Node::branch([Node::leaf(3), Node::leaf(4), Node::leaf(5), Node::leaf(6)]),
            Node::leaf(7),
        ]);

        let decoded: Tree<u16> = decode(&encode(&tree).unwrap()).unwrap();

        let mut values = vec![];
        leaf_values(&decoded, &mut values);
        assert_eq!(values, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn keeps_sharing() {
        let tree = Node::uniform(0u16, 6);

        let bytes = encode(&tree).unwrap();
        let decoded: Tree<u16> = decode(&bytes).unwrap();

        // 4^6 leaves, but only 7 distinct nodes
        assert!(bytes.len() < 100, "shared subtrees were expanded: {} bytes", bytes.len());

        let children = decoded.children().unwrap();
        assert!(children.iter().all(|c| Rc::ptr_eq(c, &children[0])));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(&Node::leaf(1u16)).unwrap();
        bytes[0..4].copy_from_slice(b"NOPE");

        let err = decode::<u16>(&bytes).unwrap_err();
        assert!(matches!(err, MapError::BadMagic { got } if &got == b"NOPE"));
        insta::assert_snapshot!(err, @"Invalid region file magic, found [78, 79, 80, 69]");
    }

    #[test]
    fn rejects_truncated() {
        let bytes = encode(&Node::leaf(1u16)).unwrap();

        let err = decode::<u16>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, MapError::Truncated { .. }));

        let err = decode::<u16>(&bytes[..3]).unwrap_err();
        assert!(matches!(err, MapError::Truncated { expected: 16, found: 3 }));
        insta::assert_snapshot!(err, @"Region file truncated: expected 16 bytes, found 3");
    }

    #[test]
    fn rejects_corrupt_payload() {
        let mut bytes = encode(&Node::leaf(1u16)).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let err = decode::<u16>(&bytes).unwrap_err();
        assert!(matches!(err, MapError::ChecksumMismatch));
    }

    #[test]
    fn refuses_generators() {
        use crate::generator::Lazy;
        use crate::loader::MemoryLoader;
        use crate::quadtree::Point;

        let lazy = Lazy::new(Point::new(1, 0), 1, 1, Rc::new(MemoryLoader::new(2, 0u16)));
        let tree = Node::branch([Node::leaf(0), Node::generator(lazy), Node::leaf(0), Node::leaf(0)]);

        let err = encode(&tree).unwrap_err();
        assert!(matches!(err, MapError::Unmaterialized { depth: 1, .. }));
        insta::assert_snapshot!(err, @"Cannot persist an unmaterialized subtree at (1, 0), depth 1");
    }
}
