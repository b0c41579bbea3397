//! Result type alias for hl7bridge

use super::errors::BridgeError;

/// Result type alias for hl7bridge operations
///
/// # Examples
///
/// ```
/// use hl7bridge::domain::result::Result;
/// use hl7bridge::domain::errors::BridgeError;
///
/// fn failing_function() -> Result<()> {
///     Err(BridgeError::Configuration("missing endpoint".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
