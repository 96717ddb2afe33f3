use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input sequence could not be read or is not valid FASTA
    InputRead(String),
    /// The destination could not be opened or written
    OutputWrite(String),
    /// A run parameter is out of range (e.g., chunk size 0)
    InvalidConfig(String),
    /// The worker threads could not be started
    ThreadPool(String),
    /// The run was stopped through its cancellation token
    Cancelled,
    /// The run did not finish before its deadline
    DeadlineExceeded,
}

impl fmt::Display for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactError::InputRead(msg) => write!(f, "Input read error: {}", msg),
            ContactError::OutputWrite(msg) => write!(f, "Output write error: {}", msg),
            ContactError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ContactError::ThreadPool(msg) => {
                write!(f, "Thread pool error: could not start worker threads: {}", msg)
            }
            ContactError::Cancelled => write!(f, "Run cancelled"),
            ContactError::DeadlineExceeded => write!(f, "Run exceeded its deadline"),
        }
    }
}

impl std::error::Error for ContactError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ContactError::ThreadPool("Resource temporarily unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Thread pool error: could not start worker threads: Resource temporarily unavailable"
        );
        assert!(!err.to_string().contains("configuration"));

        let err = ContactError::InvalidConfig("chunk size must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: chunk size must be positive");
        assert_eq!(ContactError::DeadlineExceeded.to_string(), "Run exceeded its deadline");
    }
}
