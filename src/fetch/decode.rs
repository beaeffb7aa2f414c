/// Quote characters the dataset may wrap a field in.
const FIELD_QUOTES: [char; 2] = ['"', '\''];

/// Split a delimited line, trimming whitespace and surrounding quotes from each field.
pub fn split_csv_line(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).map(trim_field).collect()
}

pub fn trim_field(field: &str) -> &str {
    field.trim().trim_matches(FIELD_QUOTES.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_and_double_quotes() {
        let fields = split_csv_line(r#""MSFT", 'x' ,plain,"#, ',');
        assert_eq!(fields, vec!["MSFT", "x", "plain", ""]);
    }
}
