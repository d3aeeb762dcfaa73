//! Where tracked boundary curves come from.

use std::collections::HashMap;

use crate::errors::CalcResult;
use crate::geometry::Curve;
use crate::section::BoundaryId;

/// Supplier of boundary curves by id.
///
/// `refresh` is called once at the start of every poll so file or host backed
/// sources can reload; `fetch` returning `None` means the boundary was deleted.
pub trait GeometrySource {
    fn refresh(&mut self) -> CalcResult<()> {
        Ok(())
    }

    fn fetch(&self, id: BoundaryId) -> Option<Curve>;
}

/// In-process source backed by a map
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    curves: HashMap<BoundaryId, Curve>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a curve
    pub fn set(&mut self, id: BoundaryId, curve: Curve) {
        self.curves.insert(id, curve);
    }

    pub fn remove(&mut self, id: BoundaryId) -> Option<Curve> {
        self.curves.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

impl GeometrySource for MemorySource {
    fn fetch(&self, id: BoundaryId) -> Option<Curve> {
        self.curves.get(&id).cloned()
    }
}

impl<S: GeometrySource + ?Sized> GeometrySource for Box<S> {
    fn refresh(&mut self) -> CalcResult<()> {
        (**self).refresh()
    }

    fn fetch(&self, id: BoundaryId) -> Option<Curve> {
        (**self).fetch(id)
    }
}
