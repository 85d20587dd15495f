use std::sync::Arc;

/// Ordered column names shared by every row read from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    names: Arc<[String]>,
}

impl Columns {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Columns {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact match first, then a case-insensitive match.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .or_else(|| self.names.iter().position(|n| n.eq_ignore_ascii_case(name)))
    }
}

/// A single input record travelling through the pipeline.
///
/// `index` is assigned at ingestion time and is the only ordering key used
/// when the row is written back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: u64,
    pub fields: Vec<String>,
    pub canonical_number: Option<String>,
}

impl Row {
    pub fn new(index: u64, fields: Vec<String>) -> Self {
        Row {
            index,
            fields,
            canonical_number: None,
        }
    }

    pub fn with_canonical_number(mut self, number: Option<String>) -> Self {
        self.canonical_number = number;
        self
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.fields.get(position).map(String::as_str)
    }

    pub fn get_by_name(&self, columns: &Columns, name: &str) -> Option<&str> {
        columns.position(name).and_then(|pos| self.get(pos))
    }

    /// True when normalization produced a number that may be sent to the provider.
    pub fn is_dialable(&self) -> bool {
        self.canonical_number
            .as_deref()
            .is_some_and(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_prefers_exact_match() {
        let columns = Columns::new(["phone", "Phone", "name"]);
        assert_eq!(columns.position("Phone"), Some(1));
        assert_eq!(columns.position("PHONE"), Some(0));
        assert_eq!(columns.position("email"), None);
    }

    #[test]
    fn test_get_by_name() {
        let columns = Columns::new(["name", "phone"]);
        let row = Row::new(0, vec!["Ada".into(), "+441234".into()]);
        assert_eq!(row.get_by_name(&columns, "phone"), Some("+441234"));
        assert_eq!(row.get_by_name(&columns, "missing"), None);
    }

    #[test]
    fn test_is_dialable() {
        let row = Row::new(3, vec![]);
        assert!(!row.is_dialable());
        assert!(!row.clone().with_canonical_number(Some(String::new())).is_dialable());
        assert!(row.with_canonical_number(Some("+1".into())).is_dialable());
    }
}
