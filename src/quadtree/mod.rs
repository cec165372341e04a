use std::rc::Rc;

pub use crate::quadtree::direction::Direction;
pub use crate::quadtree::node::Command;
pub use crate::quadtree::node::Node;
pub use crate::quadtree::node::Tree;
pub use crate::quadtree::point::Point;
pub use crate::quadtree::util::depth_of;
pub use crate::quadtree::util::pow;
pub use crate::quadtree::util::pow2;

use crate::error::Result;

mod direction;
mod node;
mod point;
pub(crate) mod util;

/// Invoke generators, starting at `node`, until a leaf or a branch comes out. Non-generator nodes
/// are returned as-is.
///
/// Every generator in the chain receives the same `command`. A generator that answers a
/// [`Command::Write`] with another generator of the same depth will keep this looping forever, so
/// writes are normally issued to a single generator instead (see [`Map::set`]).
///
/// [`Map::set`]: crate::map::Map::set
pub fn resolve<T>(node: &Tree<T>, command: &Command<T>) -> Result<Tree<T>> {
    let mut node = Rc::clone(node);

    while let Node::Generator(lazy) = &*node {
        node = lazy.generate(command.clone())?;
    }

    Ok(node)
}

/// Like [`resolve`] under [`Command::Read`], which cannot fail.
pub(crate) fn resolve_read<T>(node: &Tree<T>) -> Tree<T> {
    let mut node = Rc::clone(node);

    while let Node::Generator(lazy) = &*node {
        node = lazy.read();
    }

    node
}

/// Return a new branch with the child at `direction` swapped for `child`. The three other children
/// are shared with `children`, not copied.
pub fn replace_child<T>(children: &[Tree<T>; 4], child: Tree<T>, direction: Direction) -> Tree<T> {
    let mut children = children.clone();
    children[direction.index()] = child;

    Node::branch(children)
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::Command;
    use super::Direction;
    use super::Node;
    use super::replace_child;
    use super::resolve;

    #[test]
    fn replace_child_shares_siblings() {
        let children = [Node::leaf(0), Node::leaf(1), Node::leaf(2), Node::leaf(3)];
        let tree = replace_child(&children, Node::leaf(9), Direction::BottomLeft);

        let new = tree.children().unwrap();

        assert!(Rc::ptr_eq(&new[0], &children[0]));
        assert!(Rc::ptr_eq(&new[1], &children[1]));
        assert!(Rc::ptr_eq(&new[3], &children[3]));
        assert!(matches!(*new[2], Node::Leaf(9)));
        assert!(matches!(*children[2], Node::Leaf(2)));
    }

    #[test]
    fn resolve_materialized_is_identity() {
        let leaf = Node::leaf(5);
        let resolved = resolve(&leaf, &Command::Read).unwrap();

        assert!(Rc::ptr_eq(&leaf, &resolved));
    }
}
