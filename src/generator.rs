use std::fmt::Debug;
use std::rc::Rc;

use tracing::trace;

use crate::Depth;
use crate::error::Result;
use crate::loader::Loader;
use crate::quadtree::Command;
use crate::quadtree::Direction;
use crate::quadtree::Node;
use crate::quadtree::Point;
use crate::quadtree::Tree;

/// A lazily generated subtree.
///
/// Above the loader depth, reading a `Lazy` yields a branch of four more `Lazy` nodes one level
/// down. At or below the loader depth, reads and writes go to the [`Loader`].
pub struct Lazy<T> {
    /// Origin of the subtree, in units of the subtree's own sidelength
    origin: Point,

    /// Depth of the subtree, where `0` is the root of the map
    depth: Depth,

    /// Depth at which the loader takes over
    loader_depth: Depth,

    loader: Rc<dyn Loader<T>>,
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin,
            depth: self.depth,
            loader_depth: self.loader_depth,
            loader: Rc::clone(&self.loader),
        }
    }
}

impl<T> Lazy<T> {
    pub fn new(origin: Point, depth: Depth, loader_depth: Depth, loader: Rc<dyn Loader<T>>) -> Self {
        Self {
            origin,
            depth,
            loader_depth,
            loader,
        }
    }

    /// The generator covering an entire map.
    pub fn root(loader_depth: Depth, loader: Rc<dyn Loader<T>>) -> Self {
        Self::new(Point::ORIGIN, 0, loader_depth, loader)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn loader_depth(&self) -> Depth {
        self.loader_depth
    }

    fn at_loader(&self) -> bool {
        self.depth >= self.loader_depth
    }

    pub fn generate(&self, command: Command<T>) -> Result<Tree<T>> {
        if self.at_loader() {
            return self.loader.handle(self.origin, self.depth, command);
        }

        match command {
            Command::Read => Ok(self.read()),
            Command::Write(subtree) => self.write(subtree),
        }
    }

    /// Produce the subtree without side effects.
    pub fn read(&self) -> Tree<T> {
        if self.at_loader() {
            return self.loader.read(self.origin, self.depth);
        }

        let children = Direction::ALL.map(|direction| {
            let (dx, dy) = direction.offset();
            let child = Lazy {
                origin: self.origin.child(dx, dy),
                depth: self.depth + 1,
                loader_depth: self.loader_depth,
                loader: Rc::clone(&self.loader),
            };

            Node::generator(child)
        });

        Node::branch(children)
    }

    /// Offer `subtree` as the new content of this generator.
    ///
    /// Only generators at or below the loader depth accept writes. Above it, `subtree` is dropped
    /// and an equivalent generator is returned, so nothing above the loader boundary is ever kept
    /// in memory.
    pub fn write(&self, subtree: Tree<T>) -> Result<Tree<T>> {
        if self.at_loader() {
            return self.loader.write(self.origin, self.depth, subtree);
        }

        trace!(origin = ?self.origin, depth = self.depth, "write above loader depth dropped");

        Ok(Node::generator(self.clone()))
    }
}

impl<T> Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lazy {{ origin: {:?}, depth: {}, loader_depth: {} }}",
            self.origin, self.depth, self.loader_depth
        )
    }
}
