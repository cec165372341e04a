use std::fmt::Debug;
use std::rc::Rc;

use crate::Depth;
use crate::generator::Lazy;

/// A shared handle to an immutable node. Cloning a `Tree` never copies the subtree.
pub type Tree<T> = Rc<Node<T>>;

pub enum Node<T> {
    /// A resolved cell
    Leaf(T),

    /// Four children, stored as `[nw, ne, sw, se]`. Index with [`Direction::index`].
    ///
    /// [`Direction::index`]: crate::quadtree::Direction::index
    Branch([Tree<T>; 4]),

    /// A subtree which has not been materialized yet. See [`Lazy`].
    Generator(Lazy<T>),
}

/// What a [`Node::Generator`] is being asked to do.
pub enum Command<T> {
    /// Produce the subtree, without side effects.
    Read,

    /// Replace the generator's content with the given subtree.
    Write(Tree<T>),
}

impl<T> Clone for Command<T> {
    fn clone(&self) -> Self {
        match self {
            Command::Read => Command::Read,
            Command::Write(tree) => Command::Write(Rc::clone(tree)),
        }
    }
}

impl<T> Node<T> {
    pub fn leaf(value: T) -> Tree<T> {
        Rc::new(Node::Leaf(value))
    }

    pub fn branch(children: [Tree<T>; 4]) -> Tree<T> {
        Rc::new(Node::Branch(children))
    }

    pub fn generator(lazy: Lazy<T>) -> Tree<T> {
        Rc::new(Node::Generator(lazy))
    }

    /// Build a full tree `levels` branches deep, where every leaf holds `value`.
    ///
    /// Only one node is allocated per level: all four children of a branch are the same subtree.
    pub fn uniform(value: T, levels: Depth) -> Tree<T> {
        let mut tree = Node::leaf(value);

        for _ in 0..levels {
            tree = Node::branch([Rc::clone(&tree), Rc::clone(&tree), Rc::clone(&tree), tree]);
        }

        tree
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Node::Branch(_))
    }

    pub fn is_generator(&self) -> bool {
        matches!(self, Node::Generator(_))
    }

    pub fn children(&self) -> Option<&[Tree<T>; 4]> {
        match self {
            Node::Branch(children) => Some(children),
            _ => None,
        }
    }
}

impl<T: Debug> Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Leaf(value) => write!(f, "Leaf({value:?})"),
            Node::Branch([nw, ne, sw, se]) => f
                .debug_struct("Branch")
                .field("nw", nw)
                .field("ne", ne)
                .field("sw", sw)
                .field("se", se)
                .finish(),
            Node::Generator(lazy) => write!(f, "{lazy:?}"),
        }
    }
}
