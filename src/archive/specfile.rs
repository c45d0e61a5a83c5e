//! Parser for the per-material spec-file grammar (§6) consumed by
//! [crate::archive::writer::ArchiveWriter].
use crate::archive::spec::{ArchiveFeature, Blending, Shading};
use crate::error::SpecFileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    BlendingMode(Blending),
    ShadingModel(Shading),
    Feature(String, ArchiveFeature),
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn err(file: &str, line: usize, col: usize, msg: impl Into<String>) -> SpecFileError {
    SpecFileError {
        file: file.to_string(),
        line,
        col,
        msg: msg.into(),
    }
}

/// Parse a complete spec-file's text into a sequence of assignments, skipping
/// comment and blank lines.
pub fn parse(file: &str, text: &str) -> Result<Vec<ParsedLine>, SpecFileError> {
    let mut out = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw_line.trim_start();
        let indent = raw_line.len() - trimmed.len();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let eq_pos = trimmed
            .find('=')
            .ok_or_else(|| err(file, line_no, indent + 1, "expected '=' in assignment"))?;
        let ident = trimmed[..eq_pos].trim_end();
        if ident.is_empty()
            || !ident.starts_with(is_ident_start)
            || !ident.chars().all(is_ident_continue)
        {
            return Err(err(file, line_no, indent + 1, format!("invalid identifier '{ident}'")));
        }

        let rest = &trimmed[eq_pos + 1..];
        let value_start = rest.len() - rest.trim_start().len();
        let value_field = rest.trim_start();
        let value_end = value_field
            .find(char::is_whitespace)
            .unwrap_or(value_field.len());
        let value = &value_field[..value_end];
        let value_col = indent + 1 + eq_pos + 1 + value_start;

        if value.is_empty() {
            return Err(err(file, line_no, value_col + 1, "expected a value after '='"));
        }

        let trailing = value_field[value_end..].trim();
        if !trailing.is_empty() {
            return Err(err(
                file,
                line_no,
                value_col + value.len() + 1,
                format!("unexpected trailing text '{trailing}'"),
            ));
        }

        let parsed = match ident {
            "BlendingMode" => {
                let blending = Blending::from_str(value)
                    .ok_or_else(|| err(file, line_no, value_col + 1, format!("'{value}' is not a blending mode")))?;
                ParsedLine::BlendingMode(blending)
            }
            "ShadingModel" => {
                let shading = Shading::from_str(value)
                    .ok_or_else(|| err(file, line_no, value_col + 1, format!("'{value}' is not a shading model")))?;
                ParsedLine::ShadingModel(shading)
            }
            name => {
                let feature = ArchiveFeature::from_str(value)
                    .ok_or_else(|| err(file, line_no, value_col + 1, format!("'{value}' is not a feature level")))?;
                ParsedLine::Feature(name.to_string(), feature)
            }
        };
        out.push(parsed);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blending_shading_and_features() {
        let text = "\
# a comment
BlendingMode=opaque
ShadingModel=lit

hasBaseColorMap=required
hasNormalMap=optional
";
        let parsed = parse("material.spec", text).unwrap();
        assert_eq!(
            parsed,
            vec![
                ParsedLine::BlendingMode(Blending::Opaque),
                ParsedLine::ShadingModel(Shading::Lit),
                ParsedLine::Feature("hasBaseColorMap".to_string(), ArchiveFeature::Required),
                ParsedLine::Feature("hasNormalMap".to_string(), ArchiveFeature::Optional),
            ]
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("material.spec", "BlendingMode=opaque extra").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_unknown_value() {
        let err = parse("material.spec", "ShadingModel=bogus").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn rejects_missing_equals() {
        let err = parse("material.spec", "not an assignment").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
