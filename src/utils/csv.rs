/// Quotes a field when it holds a delimiter, quote, or line break (RFC 4180).
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Appends one CRLF-terminated record.
pub fn push_record<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape_field("ASH-0042"), "ASH-0042");
    }

    #[test]
    fn special_characters_are_quoted() {
        assert_eq!(escape_field("Doe, John"), "\"Doe, John\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn records_end_with_crlf() {
        let mut out = String::new();
        push_record(&mut out, ["id", "name"]);
        push_record(&mut out, ["1".to_string(), "Doe, John".to_string()]);
        assert_eq!(out, "id,name\r\n1,\"Doe, John\"\r\n");
    }
}
