use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Coord;
use crate::Depth;
use crate::error::Result;
use crate::map::Map;
use crate::quadtree::Point;

/// Indexes elements by a position derived from each element.
///
/// Every element is kept in the cell at `position_of(element)`. Cells hold any number of elements,
/// duplicates included, most recently added first.
pub struct Storage<T> {
    map: Map<Vec<T>>,
    position_of: Rc<dyn Fn(&T) -> Point>,
}

impl<T: Clone> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            position_of: Rc::clone(&self.position_of),
        }
    }
}

impl<T> Storage<T>
where
    T: Clone + PartialEq + 'static,
{
    /// An empty, in-memory storage.
    pub fn new<F>(size: (Coord, Coord), position_of: F) -> Self
    where
        F: Fn(&T) -> Point + 'static,
    {
        Self::from_map(Map::materialized(size, Vec::new()), position_of)
    }

    /// A storage saved to one file per region of `save_depth` levels, see [`Map::file_persisted`].
    pub fn persisted<F>(
        size: (Coord, Coord),
        save_depth: Depth,
        prefix: impl Into<String>,
        position_of: F,
    ) -> Self
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> Point + 'static,
    {
        let map = Map::file_persisted(size, Vec::new(), Vec::new(), save_depth, prefix);

        Self::from_map(map, position_of)
    }

    /// Use an existing map. Elements already in `map` are expected to sit at their position.
    pub fn from_map<F>(map: Map<Vec<T>>, position_of: F) -> Self
    where
        F: Fn(&T) -> Point + 'static,
    {
        Self {
            map,
            position_of: Rc::new(position_of),
        }
    }

    pub fn map(&self) -> &Map<Vec<T>> {
        &self.map
    }

    pub fn position_of(&self, element: &T) -> Point {
        (self.position_of)(element)
    }

    pub fn elements_at(&self, pos: impl Into<Point>) -> Vec<T> {
        self.map.get(pos)
    }

    /// Replace the content of a cell. Nothing checks that `elements` belong there.
    pub fn set_elements(&self, pos: impl Into<Point>, elements: Vec<T>) -> Result<Self> {
        Ok(Self {
            map: self.map.set(pos, elements)?,
            position_of: Rc::clone(&self.position_of),
        })
    }

    /// Put `element` at the front of its cell. Elements positioned outside of the map are dropped.
    pub fn add(&self, element: T) -> Result<Self> {
        let pos = self.position_of(&element);

        let mut elements = self.elements_at(pos);
        elements.insert(0, element);

        self.set_elements(pos, elements)
    }

    /// Remove every element equal to `element` from its cell.
    pub fn remove(&self, element: &T) -> Result<Self> {
        let pos = self.position_of(element);

        let mut elements = self.elements_at(pos);
        elements.retain(|e| e != element);

        self.set_elements(pos, elements)
    }

    pub fn contains(&self, element: &T) -> bool {
        self.elements_at(self.position_of(element)).contains(element)
    }

    /// Every element, cell by cell, row by row.
    pub fn elements(&self) -> impl Iterator<Item = T> + '_ {
        self.map.cells().flat_map(|(_, elements)| elements)
    }
}
