use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Coord;
use crate::Depth;
use crate::error::Result;
use crate::generator::Lazy;
use crate::loader::FileLoader;
use crate::loader::Loader;
use crate::quadtree::Command;
use crate::quadtree::Direction;
use crate::quadtree::Node;
use crate::quadtree::Point;
use crate::quadtree::Tree;
use crate::quadtree::depth_of;
use crate::quadtree::pow2;
use crate::quadtree::replace_child;
use crate::quadtree::resolve_read;
use crate::quadtree::util::wrap;

/// A `width` by `height` grid of `T`, stored as a quadtree.
///
/// Maps are persistent: [`Map::set`] returns a new map and leaves `self` untouched. The two share
/// every node except those on the path to the modified cell, so keeping an old map around is a
/// cheap snapshot.
#[derive(Clone)]
pub struct Map<T> {
    /// Root of the tree
    root: Tree<T>,

    /// Tree depth. The root covers a square of sidelength `2^depth`.
    depth: Depth,

    width: Coord,
    height: Coord,

    /// Returned for cells outside of the map
    default: T,
}

impl<T: Clone> Map<T> {
    /// The depth a map of this size is built with.
    pub fn depth_for(width: Coord, height: Coord) -> Depth {
        depth_of(width.max(height).max(0) as u64)
    }

    /// Wrap a tree built elsewhere. `root` should have [`Map::depth_for`] levels of branches.
    pub fn from_root(root: Tree<T>, (width, height): (Coord, Coord), default: T) -> Self {
        Self {
            root,
            depth: Self::depth_for(width, height),
            width,
            height,
            default,
        }
    }

    /// A map with every cell set to `default`.
    ///
    /// Only one node is allocated per level until cells start to differ.
    pub fn materialized(size: (Coord, Coord), default: T) -> Self {
        let depth = Self::depth_for(size.0, size.1);
        let root = Node::uniform(default.clone(), depth);

        Self::from_root(root, size, default)
    }

    /// A map generated on demand. Generation stops at `loader_depth`, where `loader` takes over.
    pub fn dynamic<L>(size: (Coord, Coord), default: T, loader_depth: Depth, loader: L) -> Self
    where
        L: Loader<T> + 'static,
    {
        let root = Node::generator(Lazy::root(loader_depth, Rc::new(loader)));

        Self::from_root(root, size, default)
    }

    /// A map backed by one file per region of `save_depth` levels. Region files are named after
    /// `prefix`, see [`region_file_name`]. Regions without a file start filled with `fill`.
    ///
    /// [`region_file_name`]: crate::loader::region_file_name
    pub fn file_persisted(
        size: (Coord, Coord),
        default: T,
        fill: T,
        save_depth: Depth,
        prefix: impl Into<String>,
    ) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let depth = Self::depth_for(size.0, size.1);
        let loader = FileLoader::new(prefix, depth, fill);

        Self::dynamic(size, default, depth.saturating_sub(save_depth), loader)
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn root(&self) -> &Tree<T> {
        &self.root
    }

    pub fn contains(&self, pos: impl Into<Point>) -> bool {
        let Point { x, y } = pos.into();

        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    /// Value of the cell at `pos`, or the map's default outside of it.
    ///
    /// Lazily generated subtrees met on the way are read, never stored: asking twice for a cell in
    /// an unresolved region generates it twice.
    pub fn get(&self, pos: impl Into<Point>) -> T {
        let pos = pos.into();
        if !self.contains(pos) {
            return self.default.clone();
        }

        // in bounds, so both coordinates are non-negative
        let (mut x, mut y) = (pos.x as u64, pos.y as u64);
        let mut side = pow2(self.depth);
        let mut node = Rc::clone(&self.root);

        loop {
            let next = match &*node {
                Node::Leaf(value) => return value.clone(),
                Node::Generator(_) => resolve_read(&node),

                // The tree is deeper than the map says, there is no cell left to address
                Node::Branch(_) if side == 0 => return self.default.clone(),

                Node::Branch(children) => {
                    let direction = Direction::select(x, y, side);

                    side /= 2;
                    x = wrap(x, side);
                    y = wrap(y, side);

                    Rc::clone(&children[direction.index()])
                }
            };

            node = next;
        }
    }

    /// A copy of this map with the cell at `pos` set to `value`. Outside of the map, this is a
    /// no-op.
    ///
    /// Fails only if a loader fails to store the update.
    pub fn set(&self, pos: impl Into<Point>, value: T) -> Result<Self> {
        let pos = pos.into();
        if !self.contains(pos) {
            return Ok(self.clone());
        }

        let (x, y) = (pos.x as u64, pos.y as u64);
        let root = Self::set_node(&self.root, x, y, pow2(self.depth), value)?;

        Ok(Self {
            root,
            depth: self.depth,
            width: self.width,
            height: self.height,
            default: self.default.clone(),
        })
    }

    fn set_node(node: &Tree<T>, x: u64, y: u64, side: u64, value: T) -> Result<Tree<T>> {
        match &**node {
            Node::Leaf(_) => Ok(Node::leaf(value)),
            Node::Branch(_) if side == 0 => Ok(Rc::clone(node)),
            Node::Branch(children) => {
                let direction = Direction::select(x, y, side);
                let half = side / 2;

                let child = &children[direction.index()];
                let child = Self::set_node(child, wrap(x, half), wrap(y, half), half, value)?;

                Ok(replace_child(children, child, direction))
            }
            Node::Generator(lazy) => {
                let concrete = resolve_read(node);
                let updated = Self::set_node(&concrete, x, y, side, value)?;

                // What becomes of the update is up to the generator
                lazy.generate(Command::Write(updated))
            }
        }
    }

    /// Every cell of the map with its position, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Point, T)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| {
                let pos = Point::new(x, y);

                (pos, self.get(pos))
            })
        })
    }
}
