// ============================================================================
// Draft Boundary Errors
// ============================================================================
//
// The reducer itself never fails. These are raised by the handler before an
// action reaches the reducer.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Identifier contains the key delimiter: {0}")]
    AmbiguousId(String),

    #[error("Menu id cannot be blank")]
    BlankMenuId,
}
