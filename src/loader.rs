use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::Depth;
use crate::error::Result;
use crate::quadtree::Command;
use crate::quadtree::Node;
use crate::quadtree::Point;
use crate::quadtree::Tree;
use crate::region_file;

/// Where a lazily generated map goes once generation reaches the loader depth.
///
/// `origin` is measured in units of the requested subtree's sidelength, and `depth` is the depth
/// of that subtree in the map (`0` being the root).
pub trait Loader<T> {
    /// Produce the subtree at `origin`. Must not have side effects that a later read could observe.
    fn read(&self, origin: Point, depth: Depth) -> Tree<T>;

    /// Accept `subtree` as the new content at `origin`, returning the node to put in the map.
    fn write(&self, origin: Point, depth: Depth, subtree: Tree<T>) -> Result<Tree<T>>;

    fn handle(&self, origin: Point, depth: Depth, command: Command<T>) -> Result<Tree<T>> {
        match command {
            Command::Read => Ok(self.read(origin, depth)),
            Command::Write(subtree) => self.write(origin, depth, subtree),
        }
    }
}

impl<T, L: Loader<T> + ?Sized> Loader<T> for Rc<L> {
    fn read(&self, origin: Point, depth: Depth) -> Tree<T> {
        (**self).read(origin, depth)
    }

    fn write(&self, origin: Point, depth: Depth, subtree: Tree<T>) -> Result<Tree<T>> {
        (**self).write(origin, depth, subtree)
    }
}

/// A [`Loader`] made of a read closure and a write closure.
pub struct FnLoader<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnLoader<R, W> {
    pub fn new<T>(read: R, write: W) -> Self
    where
        R: Fn(Point, Depth) -> Tree<T>,
        W: Fn(Point, Depth, Tree<T>) -> Result<Tree<T>>,
    {
        Self { read, write }
    }
}

impl<T, R, W> Loader<T> for FnLoader<R, W>
where
    R: Fn(Point, Depth) -> Tree<T>,
    W: Fn(Point, Depth, Tree<T>) -> Result<Tree<T>>,
{
    fn read(&self, origin: Point, depth: Depth) -> Tree<T> {
        (self.read)(origin, depth)
    }

    fn write(&self, origin: Point, depth: Depth, subtree: Tree<T>) -> Result<Tree<T>> {
        (self.write)(origin, depth, subtree)
    }
}

/// Keeps written regions in memory, keyed by origin and depth. Regions never written read back as
/// a tree filled with `fill`.
pub struct MemoryLoader<T> {
    regions: RefCell<HashMap<(Point, Depth), Tree<T>>>,

    /// Depth of the map this loader serves
    target_depth: Depth,
    fill: T,
}

impl<T: Clone> MemoryLoader<T> {
    pub fn new(target_depth: Depth, fill: T) -> Self {
        Self {
            regions: RefCell::new(HashMap::new()),
            target_depth,
            fill,
        }
    }

    /// Number of regions written so far
    pub fn len(&self) -> usize {
        self.regions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.borrow().is_empty()
    }
}

impl<T: Clone> Loader<T> for MemoryLoader<T> {
    fn read(&self, origin: Point, depth: Depth) -> Tree<T> {
        if let Some(tree) = self.regions.borrow().get(&(origin, depth)) {
            return Rc::clone(tree);
        }

        Node::uniform(self.fill.clone(), self.target_depth.saturating_sub(depth))
    }

    fn write(&self, origin: Point, depth: Depth, subtree: Tree<T>) -> Result<Tree<T>> {
        self.regions
            .borrow_mut()
            .insert((origin, depth), Rc::clone(&subtree));

        Ok(subtree)
    }
}

/// Extension of region files written by the default naming scheme.
pub const REGION_EXTENSION: &str = "map";

/// The default region file name: `<prefix><x>_<y>_<depth>.map`.
pub fn region_file_name(prefix: &str, origin: Point, depth: Depth) -> String {
    format!(
        "{prefix}{}_{}_{depth}.{REGION_EXTENSION}",
        origin.x, origin.y
    )
}

/// Persists each region to its own file.
///
/// A region that cannot be read, for whatever reason, reads as a tree filled with `fill`. This is
/// what makes the first access to a region work before any file exists.
pub struct FileLoader<T> {
    naming: Box<dyn Fn(Point, Depth) -> PathBuf>,

    /// Depth of the map this loader serves
    target_depth: Depth,
    fill: T,
}

impl<T> FileLoader<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Name files with [`region_file_name`]. `prefix` may contain a directory.
    pub fn new(prefix: impl Into<String>, target_depth: Depth, fill: T) -> Self {
        let prefix = prefix.into();

        Self {
            naming: Box::new(move |origin, depth| region_file_name(&prefix, origin, depth).into()),
            target_depth,
            fill,
        }
    }

    /// Replace the naming scheme.
    pub fn with_naming<F>(mut self, naming: F) -> Self
    where
        F: Fn(Point, Depth) -> PathBuf + 'static,
    {
        self.naming = Box::new(naming);
        self
    }

    pub fn path_for(&self, origin: Point, depth: Depth) -> PathBuf {
        (self.naming)(origin, depth)
    }

    fn fresh(&self, depth: Depth) -> Tree<T> {
        Node::uniform(self.fill.clone(), self.target_depth.saturating_sub(depth))
    }
}

impl<T> Loader<T> for FileLoader<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    fn read(&self, origin: Point, depth: Depth) -> Tree<T> {
        let path = self.path_for(origin, depth);

        match region_file::read_region(&path) {
            Ok(tree) => {
                debug!(?path, "loaded region");
                tree
            }
            Err(error) if error.is_not_found() => {
                trace!(?path, "no region file, using fill");
                self.fresh(depth)
            }
            Err(error) => {
                warn!(?path, %error, "unreadable region file, using fill");
                self.fresh(depth)
            }
        }
    }

    fn write(&self, origin: Point, depth: Depth, subtree: Tree<T>) -> Result<Tree<T>> {
        let path = self.path_for(origin, depth);

        region_file::write_region(&path, &subtree)?;
        debug!(?path, "saved region");

        Ok(subtree)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::FileLoader;
    use super::Loader;
    use super::MemoryLoader;
    use super::region_file_name;
    use crate::quadtree::Command;
    use crate::quadtree::Node;
    use crate::quadtree::Point;

    #[test]
    fn default_file_name() {
        assert_eq!(region_file_name("world_", Point::new(3, 12), 5), "world_3_12_5.map");
        assert_eq!(region_file_name("", Point::ORIGIN, 0), "0_0_0.map");
        assert_eq!(
            region_file_name("saves/a-", Point::new(100, 7), 10),
            "saves/a-100_7_10.map"
        );
    }

    #[test]
    fn custom_naming() {
        let loader = FileLoader::new("ignored", 4, 0u8)
            .with_naming(|origin, depth| PathBuf::from(format!("r.{}.{}.{depth}", origin.x, origin.y)));

        assert_eq!(loader.path_for(Point::new(1, 2), 3), PathBuf::from("r.1.2.3"));
    }

    #[test]
    fn memory_loader_fills_misses() {
        let loader = MemoryLoader::new(3, 'x');

        let tree = loader.read(Point::new(1, 1), 1);
        let children = tree.children().unwrap();
        let grandchildren = children[0].children().unwrap();

        assert!(matches!(*grandchildren[0], Node::Leaf('x')));
        assert!(loader.is_empty());
    }

    #[test]
    fn memory_loader_keeps_writes() {
        let loader = MemoryLoader::new(3, 'x');
        let subtree = Node::leaf('y');

        loader.write(Point::new(1, 1), 1, subtree.clone()).unwrap();

        assert!(Rc::ptr_eq(&loader.read(Point::new(1, 1), 1), &subtree));
        assert!(!Rc::ptr_eq(&loader.read(Point::new(0, 1), 1), &subtree));
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn handle_dispatches_commands() {
        let loader = Rc::new(MemoryLoader::new(2, 0u8));
        let subtree = Node::uniform(5u8, 1);

        let stored = loader.handle(Point::new(0, 1), 1, Command::Write(subtree.clone())).unwrap();
        assert!(Rc::ptr_eq(&stored, &subtree));

        let read = loader.handle(Point::new(0, 1), 1, Command::Read).unwrap();
        assert!(Rc::ptr_eq(&read, &subtree));
    }
}
