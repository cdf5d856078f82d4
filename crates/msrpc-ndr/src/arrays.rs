//! NDR array types
//!
//! - [`ConformantArray`]: size determined at runtime, `MaximumCount` first
//! - [`ConformantVaryingArray`]: conformant, plus an `Offset`/`ActualCount`
//!   window selecting the transmitted elements
//! - [`CountedArray`]: the `{ EntriesRead; [size_is(EntriesRead)] T *Buffer }`
//!   container nearly every enumeration call returns
//!
//! Elements are decoded into `T::default()` placeholders. A count read from
//! the wire is checked against the decode limits and the bytes remaining
//! before anything is allocated for it.

use crate::{Alignment, NdrError, NdrMarshal, NdrReader, NdrType, NdrUnmarshal, NdrWriter, Result};

fn placeholders<T: Default>(count: usize) -> Vec<T> {
    std::iter::repeat_with(T::default).take(count).collect()
}

/// Conformant array
///
/// Wire format:
/// ```text
/// max_count: u32        # preamble, hoisted to the front of an enclosing struct
/// elements[max_count]   # entity
/// ...element pointees   # deferrals, in element order
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T> Default for ConformantArray<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T> NdrType for ConformantArray<T> {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl<T: NdrMarshal> NdrMarshal for ConformantArray<T> {
    fn marshal_preamble(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_count(self.elements.len())
    }

    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        for element in &self.elements {
            element.marshal_entity(w)?;
        }
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        for element in &self.elements {
            element.marshal_deferrals(w)?;
        }
        Ok(())
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for ConformantArray<T> {
    fn unmarshal_preamble(&mut self, r: &mut NdrReader) -> Result<()> {
        let max_count = r.read_u32()?;
        let count = r.check_count(max_count, T::ALIGNMENT.bytes())?;
        self.elements = placeholders(count);
        Ok(())
    }

    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        for element in &mut self.elements {
            element.unmarshal_entity(r)?;
        }
        Ok(())
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        for element in &mut self.elements {
            element.unmarshal_deferrals(r)?;
        }
        Ok(())
    }
}

/// Counted, pointer-indirected conformant array
///
/// Wire format:
/// ```text
/// entries_read: u32     # entity
/// referent: u32         # entity, 0 when the buffer is null
/// max_count: u32        # deferrals, restates entries_read
/// elements[max_count]
/// ...element pointees
/// ```
///
/// A null buffer and a present buffer with no entries are distinct values.
#[derive(Debug, Clone)]
pub struct CountedArray<T> {
    entries: Option<ConformantArray<T>>,
    entries_read: u32,
}

impl<T> CountedArray<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            entries_read: entries.len() as u32,
            entries: Some(ConformantArray::new(entries)),
        }
    }

    /// A container whose buffer pointer is null
    pub fn null() -> Self {
        Self {
            entries: None,
            entries_read: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.entries.is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, ConformantArray::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries, or `None` when the buffer pointer was null
    pub fn entries(&self) -> Option<&[T]> {
        self.entries.as_ref().map(|array| array.elements.as_slice())
    }

    /// Entries, treating a null buffer as empty
    pub fn into_vec(self) -> Vec<T> {
        self.entries.map(ConformantArray::into_vec).unwrap_or_default()
    }
}

impl<T> Default for CountedArray<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: PartialEq> PartialEq for CountedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Eq> Eq for CountedArray<T> {}

impl<T> From<Vec<T>> for CountedArray<T> {
    fn from(entries: Vec<T>) -> Self {
        Self::new(entries)
    }
}

impl<T> From<Option<Vec<T>>> for CountedArray<T> {
    fn from(entries: Option<Vec<T>>) -> Self {
        entries.map_or_else(Self::null, Self::new)
    }
}

impl<T> NdrType for CountedArray<T> {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl<T: NdrMarshal> NdrMarshal for CountedArray<T> {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_count(self.len())?;
        w.write_referent(self.entries.is_some());
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.entries {
            Some(array) => w.write_value(array),
            None => Ok(()),
        }
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for CountedArray<T> {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        self.entries_read = r.read_u32()?;
        self.entries = if r.read_referent()? {
            Some(ConformantArray::default())
        } else {
            None
        };
        Ok(())
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        let Some(array) = self.entries.as_mut() else {
            return Ok(());
        };
        array.unmarshal_preamble(r)?;
        if array.len() != self.entries_read as usize {
            return Err(NdrError::length_mismatch(
                "counted array",
                self.entries_read as usize,
                array.len(),
            ));
        }
        array.unmarshal_entity(r)?;
        array.unmarshal_deferrals(r)
    }
}

/// Conformant varying array
///
/// Wire format:
/// ```text
/// max_count: u32        # preamble
/// offset: u32           # entity, always 0 when written by this client
/// actual_count: u32     # entity
/// elements[offset + actual_count]
/// ```
///
/// On decode, the `offset` leading elements are consumed and discarded; only
/// the `actual_count` window is kept once the deferrals phase completes.
#[derive(Debug, Clone)]
pub struct ConformantVaryingArray<T> {
    elements: Vec<T>,
    max_count: u32,
    offset: u32,
    min_count: u32,
}

impl<T> ConformantVaryingArray<T> {
    /// Array whose capacity equals its contents
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: elements.len() as u32,
            elements,
            offset: 0,
            min_count: 0,
        }
    }

    /// Array advertising a capacity larger than its contents
    pub fn with_max_count(max_count: u32, elements: Vec<T>) -> Self {
        Self {
            elements,
            max_count,
            offset: 0,
            min_count: 0,
        }
    }

    /// Decode placeholder that rejects an `actual_count` below `min_count`
    pub fn at_least(min_count: u32) -> Self {
        Self {
            elements: Vec::new(),
            max_count: 0,
            offset: 0,
            min_count,
        }
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Offset of the window as decoded (always 0 for arrays built locally)
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> Default for ConformantVaryingArray<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: PartialEq> PartialEq for ConformantVaryingArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements && self.max_count == other.max_count
    }
}

impl<T> NdrType for ConformantVaryingArray<T> {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl<T: NdrMarshal> NdrMarshal for ConformantVaryingArray<T> {
    fn marshal_preamble(&self, w: &mut NdrWriter) -> Result<()> {
        if self.elements.len() > self.max_count as usize {
            return Err(NdrError::InvalidArgument(format!(
                "{} elements exceed maximum count {}",
                self.elements.len(),
                self.max_count
            )));
        }
        w.write_u32(self.max_count);
        Ok(())
    }

    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u32(0);
        w.write_count(self.elements.len())?;
        for element in &self.elements {
            element.marshal_entity(w)?;
        }
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        for element in &self.elements {
            element.marshal_deferrals(w)?;
        }
        Ok(())
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for ConformantVaryingArray<T> {
    fn unmarshal_preamble(&mut self, r: &mut NdrReader) -> Result<()> {
        self.max_count = r.read_u32()?;
        Ok(())
    }

    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        self.offset = r.read_u32()?;
        let actual_count = r.read_u32()?;

        let total = self
            .offset
            .checked_add(actual_count)
            .filter(|total| *total <= self.max_count)
            .ok_or_else(|| {
                NdrError::length_mismatch(
                    "conformant varying array bounds",
                    self.max_count as usize,
                    (self.offset as usize).saturating_add(actual_count as usize),
                )
            })?;
        if actual_count < self.min_count {
            return Err(NdrError::length_mismatch(
                "conformant varying array actual count",
                self.min_count as usize,
                actual_count as usize,
            ));
        }

        let count = r.check_count(total, T::ALIGNMENT.bytes())?;
        self.elements = placeholders(count);
        for element in &mut self.elements {
            element.unmarshal_entity(r)?;
        }
        Ok(())
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        for element in &mut self.elements {
            element.unmarshal_deferrals(r)?;
        }
        let skipped = (self.offset as usize).min(self.elements.len());
        self.elements.drain(..skipped);
        Ok(())
    }
}
