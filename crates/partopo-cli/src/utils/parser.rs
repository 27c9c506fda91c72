use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid color '{0}'. Expected 'R,G,B' with components in [0, 1] (e.g., '0.6,0.6,0.6').")]
    InvalidColor(String),

    #[error("Invalid index '{0}'. Expected a non-negative integer or a range 'A-B'.")]
    InvalidIndex(String),

    #[error("Range '{0}' is reversed; the start must not exceed the end.")]
    ReversedRange(String),

    #[error("Index list cannot be empty.")]
    EmptyList,
}

/// Parses `R,G,B` into a color with components in `[0, 1]`.
pub fn parse_color(s: &str) -> Result<[f64; 3], ParseError> {
    let invalid = || ParseError::InvalidColor(s.to_string());
    let components: Vec<f64> = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    let color: [f64; 3] = components.try_into().map_err(|_| invalid())?;
    if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(invalid());
    }
    Ok(color)
}

/// Parses a comma-separated list of indices and inclusive ranges such as
/// `0,4,7-9`. Duplicates are kept; order follows the input.
pub fn parse_index_list(s: &str) -> Result<Vec<usize>, ParseError> {
    let mut indices = Vec::new();
    for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let parse = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidIndex(item.to_string()))
        };
        match item.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start > end {
                    return Err(ParseError::ReversedRange(item.to_string()));
                }
                indices.extend(start..=end);
            }
            None => indices.push(parse(item)?),
        }
    }
    if indices.is_empty() {
        return Err(ParseError::EmptyList);
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_color() {
        assert_eq!(parse_color("1, 0.5,0").unwrap(), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn rejects_malformed_or_out_of_range_color() {
        for input in ["1,0", "1,0,0,0", "red", "1.2,0,0", "-0.1,0,0"] {
            assert_eq!(
                parse_color(input),
                Err(ParseError::InvalidColor(input.to_string())),
                "input: {input}"
            );
        }
    }

    #[test]
    fn parses_indices_and_ranges() {
        assert_eq!(parse_index_list("0,4,7-9").unwrap(), vec![0, 4, 7, 8, 9]);
        assert_eq!(parse_index_list(" 3 , 3 ").unwrap(), vec![3, 3]);
        assert_eq!(parse_index_list("5-5").unwrap(), vec![5]);
    }

    #[test]
    fn rejects_invalid_index_lists() {
        assert_eq!(parse_index_list(""), Err(ParseError::EmptyList));
        assert_eq!(
            parse_index_list("1,x"),
            Err(ParseError::InvalidIndex("x".to_string()))
        );
        assert_eq!(
            parse_index_list("-1"),
            Err(ParseError::InvalidIndex("-1".to_string()))
        );
        assert_eq!(
            parse_index_list("9-2"),
            Err(ParseError::ReversedRange("9-2".to_string()))
        );
    }
}
