use model::records::{
    row::{Columns, Row},
    status::VerificationStatus,
};

/// Ordered consumer of output records. Write order is final output order.
pub trait RowSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_row(&mut self, row: &Row, status: VerificationStatus) -> Result<(), Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Output header derived from the input columns plus the status column.
///
/// An input column that already carries the status column's name is
/// overwritten in place instead of being duplicated.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    header: Vec<String>,
    status_position: usize,
}

impl OutputLayout {
    pub fn new(columns: &Columns, status_column: &str) -> Self {
        let mut header = columns.names().to_vec();
        let status_position = match header.iter().position(|c| c == status_column) {
            Some(pos) => pos,
            None => {
                header.push(status_column.to_string());
                header.len() - 1
            }
        };

        OutputLayout {
            header,
            status_position,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn status_position(&self) -> usize {
        self.status_position
    }

    /// Output values for `row`; missing trailing fields are emitted empty.
    pub fn render<'a>(&self, row: &'a Row, status: VerificationStatus) -> Vec<&'a str> {
        (0..self.header.len())
            .map(|pos| {
                if pos == self.status_position {
                    status.as_str()
                } else {
                    row.get(pos).unwrap_or("")
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_column_is_appended() {
        let layout = OutputLayout::new(&Columns::new(["name", "phone"]), "wa_status");
        assert_eq!(layout.header(), ["name", "phone", "wa_status"]);

        let row = Row::new(0, vec!["Ada".into(), "+1".into()]);
        assert_eq!(
            layout.render(&row, VerificationStatus::Exists),
            vec!["Ada", "+1", "exists"]
        );
    }

    #[test]
    fn test_existing_status_column_is_overwritten() {
        let layout = OutputLayout::new(&Columns::new(["wa_status", "phone"]), "wa_status");
        assert_eq!(layout.header(), ["wa_status", "phone"]);

        let row = Row::new(0, vec!["stale".into(), "+1".into()]);
        assert_eq!(
            layout.render(&row, VerificationStatus::NonExist),
            vec!["non_exist", "+1"]
        );
    }
}
