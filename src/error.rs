use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The detector itself never fails: unrecognised instruction shapes, stale chains and
/// out-of-bounds instructions are designed no-ops. Errors only arise at the edges of the
/// library, when reading recorded traces, parsing register names and configuration, or
/// writing and reading result files.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - Structurally invalid input (result files, listings)
/// - [`Error::TraceFormat`] - A trace line that is not a valid record
/// - [`Error::Empty`] - Empty input provided where data was required
///
/// ## Configuration Errors
/// - [`Error::InvalidRegister`] - Unknown register name
/// - [`Error::InvalidConfig`] - Inconsistent detector configuration
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust
/// use dispatchscope::{Error, x86::X86Register};
///
/// match "r13q".parse::<X86Register>() {
///     Ok(reg) => println!("Parsed {}", reg),
///     Err(e) => eprintln!("Failed: {}", e),
/// }
///
/// match X86Register::from_name("r13q") {
///     Err(Error::InvalidRegister(name)) => assert_eq!(name, "r13q"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A line of a recorded trace could not be decoded.
    ///
    /// `line` is 1-based and refers to the trace file, not to this crate.
    #[error("Invalid trace record on line {line}: {source}")]
    TraceFormat {
        /// Line number inside the trace file
        line: usize,
        /// Underlying decoding failure
        source: serde_json::Error,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A register name did not match any known x86 register.
    #[error("Unknown register name - {0}")]
    InvalidRegister(String),

    /// The detector configuration is inconsistent.
    ///
    /// Raised by [`crate::DetectorConfig::validate`], e.g. when no accumulator
    /// is configured or the index register doubles as an accumulator.
    #[error("Invalid detector configuration - {0}")]
    InvalidConfig(String),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading traces, writing results or permission issues.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
