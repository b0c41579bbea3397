//! Field coordinates
//!
//! A coordinate addresses a field, or a component inside a field, of a
//! [`Document`](super::Document) using the familiar `SEG-N` / `SEG-N.C`
//! notation. Both indices are 1-based.

use super::errors::CoordinateError;
use std::fmt;
use std::str::FromStr;

/// Parsed `SEGMENT-field[.component]` path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    /// Segment name, e.g. `PID`
    pub segment: String,
    /// 1-based field index
    pub field: usize,
    /// 1-based component index within the field
    pub component: Option<usize>,
}

impl Coordinate {
    /// Parse a path such as `PID-5` or `PID-5.2`
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinateError`] when the separator is missing, the
    /// segment is empty, or an index is not a positive integer.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7bridge::domain::Coordinate;
    ///
    /// let coord = Coordinate::parse("PID-5.2").unwrap();
    /// assert_eq!(coord.segment, "PID");
    /// assert_eq!(coord.field, 5);
    /// assert_eq!(coord.component, Some(2));
    /// ```
    pub fn parse(path: &str) -> Result<Self, CoordinateError> {
        let path = path.trim();
        let (segment, rest) = path
            .split_once('-')
            .ok_or_else(|| CoordinateError::MissingSeparator(path.to_string()))?;

        if segment.is_empty() {
            return Err(CoordinateError::EmptySegment(path.to_string()));
        }

        let (field, component) = match rest.split_once('.') {
            Some((field, component)) => (field, Some(component)),
            None => (rest, None),
        };

        let field = parse_index(field)
            .ok_or_else(|| CoordinateError::InvalidField(path.to_string()))?;
        let component = component
            .map(|c| {
                parse_index(c).ok_or_else(|| CoordinateError::InvalidComponent(path.to_string()))
            })
            .transpose()?;

        Ok(Self {
            segment: segment.to_string(),
            field,
            component,
        })
    }

    /// Coordinate of a whole field
    pub fn field(segment: impl Into<String>, field: usize) -> Self {
        Self {
            segment: segment.into(),
            field,
            component: None,
        }
    }

    /// Coordinate of a single component
    pub fn component(segment: impl Into<String>, field: usize, component: usize) -> Self {
        Self {
            segment: segment.into(),
            field,
            component: Some(component),
        }
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(c) => write!(f, "{}-{}.{}", self.segment, self.field, c),
            None => write!(f, "{}-{}", self.segment, self.field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_only() {
        let coord = Coordinate::parse("PID-3").unwrap();
        assert_eq!(coord, Coordinate::field("PID", 3));
    }

    #[test]
    fn test_parse_with_component() {
        let coord: Coordinate = "OBX-5.2".parse().unwrap();
        assert_eq!(coord, Coordinate::component("OBX", 5, 2));
    }

    #[test]
    fn test_parse_rejects_non_numeric_field() {
        assert_eq!(
            Coordinate::parse("PID-x"),
            Err(CoordinateError::InvalidField("PID-x".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_zero_index() {
        assert!(matches!(
            Coordinate::parse("PID-0"),
            Err(CoordinateError::InvalidField(_))
        ));
        assert!(matches!(
            Coordinate::parse("PID-1.0"),
            Err(CoordinateError::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(matches!(
            Coordinate::parse("PID5"),
            Err(CoordinateError::MissingSeparator(_))
        ));
        assert!(matches!(
            Coordinate::parse("-5"),
            Err(CoordinateError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for path in ["PID-5", "PID-5.1", "ZZ1-12.3"] {
            assert_eq!(Coordinate::parse(path).unwrap().to_string(), path);
        }
    }
}
