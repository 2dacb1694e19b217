// Crate-level error type.
//
// Each stage owns a narrow error enum; `Error` aggregates them for the
// pipeline and file-level entry points, and adds the failures that only
// exist once the stages are chained.

use std::io;

use thiserror::Error;

use crate::compress::CompressError;
use crate::fec::FecError;
use crate::io::ContainerError;
use crate::matrix::LayoutError;
use crate::metadata::HeaderError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Fec(#[from] FecError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// One or more codewords had more symbol errors than the code corrects.
    #[error("uncorrectable codeword(s) {blocks:?} ({corrected_errors} symbol errors corrected elsewhere)")]
    UncorrectableBlock {
        blocks: Vec<usize>,
        corrected_errors: usize,
    },

    /// The header declares more codewords than the matrix carries.
    #[error("codeword stream truncated: need {needed} bytes, matrix holds {available}")]
    CodewordStreamTruncated { needed: usize, available: usize },

    /// Decompressed payload disagrees with the header's original size.
    #[error("payload length {actual} does not match header original size {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures caused by damaged or unreadable symbol data, as
    /// opposed to caller misuse.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::Header(_)
            | Self::Compress(_)
            | Self::Fec(_)
            | Self::Container(_)
            | Self::UncorrectableBlock { .. }
            | Self::CodewordStreamTruncated { .. }
            | Self::LengthMismatch { .. } => true,
            Self::Layout(e) => matches!(
                e,
                LayoutError::InsufficientMarkers { .. }
                    | LayoutError::InvalidMarkerGeometry { .. }
                    | LayoutError::ModuleCountMismatch { .. }
                    | LayoutError::ModuleOutOfRange { .. }
            ),
            Self::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_convert() {
        let e: Error = HeaderError::Truncated { len: 3 }.into();
        assert!(matches!(e, Error::Header(_)));
        assert!(e.is_data_error());
        assert_eq!(e.to_string(), HeaderError::Truncated { len: 3 }.to_string());

        let e: Error = LayoutError::SideOutOfRange { side: 9 }.into();
        assert!(!e.is_data_error());
    }

    #[test]
    fn uncorrectable_message_lists_blocks() {
        let e = Error::UncorrectableBlock {
            blocks: vec![0, 3],
            corrected_errors: 7,
        };
        assert!(e.to_string().contains("[0, 3]"));
    }
}
