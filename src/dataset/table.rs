use serde::{Deserialize, Serialize};

/// Rectangular table of unparsed cells as supplied by a dataset source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers
    pub headers: Vec<String>,

    /// Data rows
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string slices
    pub fn from_str_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row whose width differs from the header row
    pub fn first_ragged_row(&self) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.headers.len())
            .map(|(idx, row)| (idx, row.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_rows() {
        let table = RawTable::from_str_rows(&["a", "b"], &[vec!["1", "2"], vec!["3", "4"]]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][0], "3");
        assert!(table.first_ragged_row().is_none());
    }

    #[test]
    fn test_first_ragged_row() {
        let table = RawTable::from_str_rows(&["a", "b"], &[vec!["1", "2"], vec!["3"]]);
        assert_eq!(table.first_ragged_row(), Some((1, 1)));
    }
}
