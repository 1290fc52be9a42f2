/// Derives the identifier of a record
///
/// Implemented for any `Fn(&str) -> String`, so plain functions such as
/// [`first_token`] can be used directly.
pub trait IdentifierExtractor: Send + Sync + 'static {
    fn extract(&self, record: &str) -> String;
}

impl<F> IdentifierExtractor for F
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    fn extract(&self, record: &str) -> String {
        self(record)
    }
}

/// First whitespace-separated token of the record (PubChem CIDs)
pub fn first_token(record: &str) -> String {
    record.split_whitespace().next().unwrap_or_default().to_string()
}

/// Value of an SD data item, e.g. `> <Mcule_ID>`
///
/// Takes the text between `<tag>` and the next `>`, trimmed. Records without
/// the data item map to the empty identifier.
#[derive(Debug, Clone)]
pub struct DataItem {
    marker: String,
}

impl DataItem {
    pub fn new(tag: &str) -> Self {
        Self {
            marker: format!("<{tag}>"),
        }
    }
}

impl IdentifierExtractor for DataItem {
    fn extract(&self, record: &str) -> String {
        let Some(start) = record.find(&self.marker) else {
            return String::new();
        };
        let rest = &record[start + self.marker.len()..];
        let end = rest.find('>').unwrap_or(rest.len());
        rest[..end].trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MCULE_RECORD: &str = "\
  Mrv1810

  2  1  0  0  0  0            999 V2000
M  END
> <Mcule_ID>
MCULE-1234567890

> <Price>
12

$$$$
";

    #[test]
    fn first_token_takes_cid() {
        assert_eq!(first_token("2244\n  -OEChem-\nM  END\n$$$$\n"), "2244");
        assert_eq!(first_token("   \n 42 x\n"), "42");
        assert_eq!(first_token(""), "");
    }

    #[test]
    fn data_item_reads_value() {
        let extractor = DataItem::new("Mcule_ID");
        assert_eq!(extractor.extract(MCULE_RECORD), "MCULE-1234567890");
    }

    #[test]
    fn data_item_missing_is_empty() {
        let extractor = DataItem::new("PUBCHEM_COMPOUND_CID");
        assert_eq!(extractor.extract(MCULE_RECORD), "");
    }

    #[test]
    fn data_item_at_end_of_record() {
        let extractor = DataItem::new("ID");
        assert_eq!(extractor.extract("M  END\n> <ID>\nX1\n"), "X1");
    }

    #[test]
    fn closures_are_extractors() {
        let extractor = |record: &str| record.lines().count().to_string();
        assert_eq!(extractor.extract("a\nb\n"), "2");
    }
}
