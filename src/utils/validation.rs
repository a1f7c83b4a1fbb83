//! Validation of candidate files against a conversion kind

use crate::error::{AppError, Result};
use crate::models::{KindDescriptor, SourceFile};

/// Validate that a candidate file is accepted by the given kind
///
/// # Arguments
/// * `descriptor` - The active conversion kind
/// * `candidate` - The file chosen via picker or drop
///
/// # Returns
/// Ok(()) if the MIME type passes the kind's filter, Err with the kind's
/// advisory text if not
pub fn validate_candidate(descriptor: &KindDescriptor, candidate: &SourceFile) -> Result<()> {
    if !descriptor.accepts(&candidate.mime_type) {
        tracing::debug!(
            "File {} rifiutato per {}: MIME {}",
            candidate.name,
            descriptor.kind,
            candidate.mime_type
        );
        return Err(AppError::Validation(
            descriptor.invalid_file_message.to_string(),
        ));
    }

    Ok(())
}
