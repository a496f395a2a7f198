//! Validated mutation.
//!
//! `set` checks the value against the field's declared type, resolves the
//! field's coordinate dependencies before array writes, stores, marks the
//! fill chain, and logs the write. `set_unchecked` skips coordinate
//! resolution only; type checking is never skipped.

use strata_catalog::{CatalogEntry, CoordinateRef};

use crate::error::TreeError;
use crate::nav::Located;
use crate::tree::{NodeId, Tree};
use crate::value::{declared_name, Value};

impl Tree {
    /// Assign a leaf field, validating type and coordinates.
    ///
    /// # Errors
    ///
    /// `WrongType` on a declared-type mismatch, `MissingCoordinate` when an
    /// array write precedes its coordinate dependency, `UnknownField` when
    /// the schema declares no such field here.
    pub fn set(&mut self, id: NodeId, field: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        self.set_impl(id, field, value.into(), true)
    }

    /// Assign a leaf field, bypassing coordinate validation.
    pub fn set_unchecked(
        &mut self,
        id: NodeId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), TreeError> {
        self.set_impl(id, field, value.into(), false)
    }

    fn set_impl(
        &mut self,
        id: NodeId,
        field: &str,
        value: Value,
        validate: bool,
    ) -> Result<(), TreeError> {
        self.assert_mutable(id);
        let template = self.template_of(id, field);
        let catalog = std::sync::Arc::clone(&self.catalog);
        let entry = catalog
            .entry(&template)
            .ok_or_else(|| TreeError::UnknownField(self.location_of(id, field)))?;

        let kind = value.kind();
        let value = value.conform(entry.data_type).ok_or_else(|| TreeError::WrongType {
            field: self.location_of(id, field),
            expected: declared_name(entry.data_type),
            actual: kind,
        })?;

        if validate && entry.data_type.is_array() {
            self.check_coordinates(id, field, &template, entry)?;
        }

        let location = self.location_of(id, field);
        self.store_raw(id, field, value);
        self.log.note_write(&location);
        Ok(())
    }

    /// Resolve the declared coordinate dependencies of `field` before an
    /// array write.
    ///
    /// Open coordinates (the field's own length) and self-referential
    /// coordinate paths (a write establishing its own length) are exempt.
    /// Every other coordinate must resolve to a node that already holds
    /// data; `Detached` means "not present" and fails the write.
    fn check_coordinates(
        &self,
        id: NodeId,
        field: &str,
        template: &str,
        entry: &CatalogEntry,
    ) -> Result<(), TreeError> {
        for coordinate in &entry.coordinates {
            let path = match coordinate {
                CoordinateRef::Open => continue,
                CoordinateRef::Path(path) if path == template => continue,
                CoordinateRef::Path(path) => path,
            };
            let present = match self.probe(id, path) {
                Located::Leaf { node, field } => self.is_filled(node, &field),
                Located::Record(node) => self.has_data(node),
                Located::Array(arr) => self.has_data(arr),
                Located::Detached => false,
            };
            if !present {
                return Err(TreeError::MissingCoordinate {
                    field: self.location_of(id, field),
                    coordinate: path.clone(),
                });
            }
        }
        Ok(())
    }
}
