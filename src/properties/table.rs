//! Fixed-shape, row-major table of scalar values.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{ScalarType, Value};
use crate::{Error, Result};

/// Deserialized tables go through [`Table::from_cells`], so a document
/// cannot produce a shape that disagrees with its cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    element: ScalarType,
    dims: SmallVec<[usize; 4]>,
    cells: Vec<Value>,
}

#[derive(Deserialize)]
struct RawTable {
    element: ScalarType,
    dims: SmallVec<[usize; 4]>,
    cells: Vec<Value>,
}

impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_cells(raw.element, &raw.dims, raw.cells)
    }
}

/// Cell count for a shape, or an error when the product does not fit `usize`.
fn cell_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| Error::TypeMismatch {
            key: "table".into(),
            expected: "dimensions whose product fits in memory".into(),
            got: format!("{dims:?}"),
        })
}

impl Table {
    /// A table of the given shape filled with the element type's default.
    pub fn new(element: ScalarType, dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::TypeMismatch {
                key: "table".into(),
                expected: "at least one dimension".into(),
                got: "[]".into(),
            });
        }
        let size = cell_count(dims)?;
        Ok(Self {
            element,
            dims: dims.iter().copied().collect(),
            cells: vec![element.default_value(); size],
        })
    }

    /// The zero-length one-dimensional table.
    pub fn empty(element: ScalarType) -> Self {
        Self { element, dims: SmallVec::from_slice(&[0]), cells: Vec::new() }
    }

    /// Build from a flat row-major cell list.
    pub fn from_cells(element: ScalarType, dims: &[usize], cells: Vec<Value>) -> Result<Self> {
        let size = cell_count(dims)?;
        if dims.is_empty() || cells.len() != size {
            return Err(Error::TypeMismatch {
                key: "table".into(),
                expected: format!("{size} cells for dimensions {dims:?}"),
                got: format!("{} cells", cells.len()),
            });
        }
        if let Some(bad) = cells.iter().find(|c| !c.fits(element.into())) {
            return Err(Error::TypeMismatch {
                key: "table".into(),
                expected: format!("{element:?}"),
                got: bad.type_name(),
            });
        }
        Ok(Self { element, dims: dims.iter().copied().collect(), cells })
    }

    pub fn element_type(&self) -> ScalarType {
        self.element
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (i, d) in index.iter().zip(self.dims.iter()) {
            if i >= d {
                return None;
            }
            flat = flat * d + i;
        }
        Some(flat)
    }

    pub fn get(&self, index: &[usize]) -> Option<&Value> {
        self.flat_index(index).and_then(|i| self.cells.get(i))
    }

    pub fn set(&mut self, index: &[usize], value: Value) -> Result<()> {
        if !value.fits(self.element.into()) {
            return Err(Error::TypeMismatch {
                key: format!("table{index:?}"),
                expected: format!("{:?}", self.element),
                got: value.type_name(),
            });
        }
        let cell = self
            .flat_index(index)
            .and_then(|i| self.cells.get_mut(i))
            .ok_or_else(|| Error::NotFound(format!("table cell {index:?} in shape {:?}", self.dims)))?;
        *cell = value;
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}Table{:?}", self.element, self.dims.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_indexing() {
        let cells = (1..=6).map(Value::Int).collect();
        let t = Table::from_cells(ScalarType::Int, &[2, 3], cells).unwrap();
        assert_eq!(t.get(&[0, 0]), Some(&Value::Int(1)));
        assert_eq!(t.get(&[1, 0]), Some(&Value::Int(4)));
        assert_eq!(t.get(&[1, 2]), Some(&Value::Int(6)));
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_wrong_cell_count() {
        let cells = vec![Value::Int(1)];
        assert!(Table::from_cells(ScalarType::Int, &[2], cells).is_err());
    }

    #[test]
    fn test_wrong_cell_type() {
        let cells = vec![Value::Int(1), Value::Boolean(true)];
        assert!(Table::from_cells(ScalarType::Int, &[2], cells).is_err());
    }

    #[test]
    fn test_set_checks_type() {
        let mut t = Table::new(ScalarType::Boolean, &[3]).unwrap();
        t.set(&[1], Value::Boolean(true)).unwrap();
        assert_eq!(t.get(&[1]), Some(&Value::Boolean(true)));
        assert!(t.set(&[1], Value::Int(1)).is_err());
        assert!(t.set(&[3], Value::Boolean(true)).is_err());
    }

    #[test]
    fn test_oversized_shape_is_rejected() {
        let huge = 1usize << (usize::BITS / 2);
        let err = Table::from_cells(ScalarType::Int, &[huge, huge], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(Table::new(ScalarType::Int, &[usize::MAX, 2]).is_err());
        assert!(Table::new(ScalarType::Int, &[]).is_err());
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let t = Table::from_cells(ScalarType::Int, &[2], vec![Value::Int(1), Value::Int(2)]).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<Table>(&json).unwrap(), t);

        let short = json.replace("[2]", "[3]");
        assert!(serde_json::from_str::<Table>(&short).is_err());
        let huge = format!("{{\"element\":\"Int\",\"dims\":[{m},{m}],\"cells\":[]}}", m = usize::MAX);
        assert!(serde_json::from_str::<Table>(&huge).is_err());
    }
}
