//! Binding of one lhs column to one rhs column

use std::sync::Arc;

use super::diffor::Diffor;
use super::engine::RunContext;
use crate::error::{DiffError, Result};
use crate::model::{CellValue, ColumnModel, TableModel};

/// Compares an lhs column with an rhs column through a [`Diffor`]
#[derive(Debug, Clone)]
pub struct ColumnComparison {
    lhs: ColumnModel,
    rhs: ColumnModel,
    diffor: Arc<dyn Diffor>,
}

impl ColumnComparison {
    pub fn new(lhs: ColumnModel, rhs: ColumnModel, diffor: Arc<dyn Diffor>) -> Self {
        Self { lhs, rhs, diffor }
    }

    /// Check that both columns belong to the given models
    pub fn validate(&self, lhs_model: &TableModel, rhs_model: &TableModel) -> Result<()> {
        for (column, model) in [(&self.lhs, lhs_model), (&self.rhs, rhs_model)] {
            if !model.contains(column) {
                return Err(DiffError::ColumnNotInModel {
                    column: column.name().to_string(),
                    table: model.name().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn lhs_column(&self) -> &ColumnModel {
        &self.lhs
    }

    pub fn rhs_column(&self) -> &ColumnModel {
        &self.rhs
    }

    pub fn diffor(&self) -> &Arc<dyn Diffor> {
        &self.diffor
    }

    /// Either column is part of its table's key
    pub fn is_in_key(&self) -> bool {
        self.lhs.is_key() || self.rhs.is_key()
    }

    /// Both columns are part of their table's key
    pub fn columns_are_key(&self) -> bool {
        self.lhs.is_key() && self.rhs.is_key()
    }

    /// Shared column name, when both sides use the same one
    pub fn column_name(&self) -> Option<&str> {
        (self.lhs.name() == self.rhs.name()).then(|| self.lhs.name())
    }

    /// Shared name, or `lhs:rhs` when the names differ
    pub fn display_name(&self) -> String {
        match self.column_name() {
            Some(name) => name.to_string(),
            None => format!("{}:{}", self.lhs.name(), self.rhs.name()),
        }
    }

    pub fn lhs_value<'a>(&self, row: &'a [CellValue]) -> &'a CellValue {
        row.get(self.lhs.index()).unwrap_or(&CellValue::Null)
    }

    pub fn rhs_value<'a>(&self, row: &'a [CellValue]) -> &'a CellValue {
        row.get(self.rhs.index()).unwrap_or(&CellValue::Null)
    }

    /// Run the diffor over this column's cells of an aligned row pair
    pub fn is_diff(
        &self,
        lhs_row: &[CellValue],
        rhs_row: &[CellValue],
        run: &RunContext,
    ) -> Result<bool> {
        self.diffor
            .is_diff(self.lhs_value(lhs_row), self.rhs_value(rhs_row), run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::EqualsDiffor;
    use crate::model::ColumnType;

    fn model(name: &str, col: &str) -> TableModel {
        TableModel::new(
            name,
            vec![
                ColumnModel::new(0, "id", ColumnType::Integer),
                ColumnModel::new(1, col, ColumnType::String),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_names_and_key_flags() {
        let lhs = model("l", "name");
        let rhs = model("r", "label");

        let key = ColumnComparison::new(
            lhs.columns()[0].clone(),
            rhs.columns()[0].clone(),
            Arc::new(EqualsDiffor),
        );
        assert!(key.columns_are_key());
        assert_eq!(key.column_name(), Some("id"));

        let value = ColumnComparison::new(
            lhs.columns()[1].clone(),
            rhs.columns()[1].clone(),
            Arc::new(EqualsDiffor),
        );
        assert!(!value.is_in_key());
        assert_eq!(value.column_name(), None);
        assert_eq!(value.display_name(), "name:label");
        assert!(value.validate(&lhs, &rhs).is_ok());
    }

    #[test]
    fn test_half_key() {
        let lhs = model("l", "name");
        let rhs = TableModel::new(
            "r",
            vec![
                ColumnModel::new(0, "id", ColumnType::Integer),
                ColumnModel::new(1, "name", ColumnType::String),
            ],
            vec![1],
        )
        .unwrap();
        let comparison = ColumnComparison::new(
            lhs.columns()[0].clone(),
            rhs.columns()[0].clone(),
            Arc::new(EqualsDiffor),
        );
        assert!(comparison.is_in_key());
        assert!(!comparison.columns_are_key());
    }

    #[test]
    fn test_validate_rejects_foreign_column() {
        let lhs = model("l", "name");
        let rhs = model("r", "label");
        let comparison = ColumnComparison::new(
            ColumnModel::new(1, "other", ColumnType::String),
            rhs.columns()[1].clone(),
            Arc::new(EqualsDiffor),
        );
        assert!(matches!(
            comparison.validate(&lhs, &rhs),
            Err(DiffError::ColumnNotInModel { .. })
        ));
    }
}
