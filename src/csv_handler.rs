use crate::errors::{CardError, SchemaError};
use crate::models::{CardSpec, InputRecord};
use std::fs;
use std::path::Path;
use tracing::debug;

const EXPECTED_HEADER: [&str; 2] = ["text", "fontSize"];

/// Reads the whole CSV file and turns its data rows into cards.
pub fn load_cards<P: AsRef<Path>>(file_path: P) -> Result<Vec<CardSpec>, CardError> {
    let input = fs::read_to_string(file_path.as_ref())?;
    let cards = parse_cards(&input)?;
    debug!(
        path = %file_path.as_ref().display(),
        cards = cards.len(),
        "Loaded input CSV"
    );
    Ok(cards)
}

/// Parses CSV text with a `text,fontSize` header into cards, in file order.
pub fn parse_cards(input: &str) -> Result<Vec<CardSpec>, SchemaError> {
    // Captions keep their whitespace; only fontSize is trimmed, in to_card.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let headers = rdr.headers()?.clone();
    let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(SchemaError::NoData);
    }
    if headers.len() != EXPECTED_HEADER.len() || headers.iter().ne(EXPECTED_HEADER) {
        return Err(SchemaError::BadHeader);
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let record: InputRecord = row.deserialize(Some(&headers))?;
            to_card(i + 1, record)
        })
        .collect()
}

fn to_card(row: usize, record: InputRecord) -> Result<CardSpec, SchemaError> {
    let font_size = record
        .font_size
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|size| size.is_finite() && *size > 0.0)
        .ok_or_else(|| SchemaError::InvalidFontSize {
            row,
            value: record.font_size.clone(),
        })?;

    Ok(CardSpec {
        text: record.text,
        font_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn card(text: &str, font_size: f64) -> CardSpec {
        CardSpec {
            text: text.to_string(),
            font_size,
        }
    }

    #[rstest]
    #[case(
        "text,fontSize\n\
        Hello,24\n\
        World,36.5\n\
        \"Quoted, with comma\",12",
        vec![card("Hello", 24.0), card("World", 36.5), card("Quoted, with comma", 12.0)]
    )]
    #[case(
        // Caption whitespace is kept, fontSize is trimmed
        "text,fontSize\n\
        \"  spaced \",  18  ",
        vec![card("  spaced ", 18.0)]
    )]
    #[case(
        // Quotes and backslashes pass through untouched
        "text,fontSize\n\
        \"say \"\"hi\"\" \\o/\",20",
        vec![card("say \"hi\" \\o/", 20.0)]
    )]
    fn test_parse_cards_cases(#[case] input: &str, #[case] expected: Vec<CardSpec>) {
        assert_eq!(parse_cards(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("text,fontSize")]
    #[case("text,fontSize\n")]
    // Header-only wins over a bad header, like the row-count check running first
    #[case("label,size\n")]
    fn header_only_or_empty_is_no_data(#[case] input: &str) {
        assert!(matches!(parse_cards(input), Err(SchemaError::NoData)));
    }

    #[rstest]
    #[case("label,size\nHello,24")]
    #[case("fontSize,text\n24,Hello")]
    #[case("Text,fontsize\nHello,24")]
    #[case("text\nHello")]
    #[case("text,fontSize,color\nHello,24,red")]
    #[case(" text,fontSize\nHello,24")]
    fn wrong_header_is_rejected(#[case] input: &str) {
        assert!(matches!(parse_cards(input), Err(SchemaError::BadHeader)));
    }

    #[rstest]
    fn inconsistent_field_count_is_malformed() {
        let input = "text,fontSize\nHello,24\nthis_is_bad_data";
        assert!(matches!(parse_cards(input), Err(SchemaError::Malformed(_))));
    }

    #[rstest]
    #[case("text,fontSize\nHello,big", 1, "big")]
    #[case("text,fontSize\nHello,24\nWorld,0", 2, "0")]
    #[case("text,fontSize\nHello,-3", 1, "-3")]
    #[case("text,fontSize\nHello,", 1, "")]
    #[case("text,fontSize\nHello,inf", 1, "inf")]
    fn invalid_font_size_names_the_row(
        #[case] input: &str,
        #[case] expected_row: usize,
        #[case] expected_value: &str,
    ) {
        match parse_cards(input) {
            Err(SchemaError::InvalidFontSize { row, value }) => {
                assert_eq!(row, expected_row);
                assert_eq!(value, expected_value);
            }
            other => panic!("expected InvalidFontSize, got {other:?}"),
        }
    }

    #[rstest]
    fn test_load_cards_reads_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "text,fontSize\nOne,10\nTwo,20").unwrap();

        let cards = load_cards(temp_file.path()).unwrap();
        assert_eq!(cards, vec![card("One", 10.0), card("Two", 20.0)]);
    }

    #[rstest]
    fn test_load_cards_missing_file_is_io_error() {
        let result = load_cards("non_existent_file_12345.csv");
        assert!(matches!(result, Err(CardError::Io(_))));
    }
}
